//! Typed argument lists for constructors and factories.

use crate::error::{FixtureError, Result};
use crate::reflect::{Reflect, TypeKey};
use crate::value::Value;

/// A tuple of reflected types that can be rebuilt from resolved values
///
/// Implemented for `()` and tuples of up to eight [`Reflect`] types.
pub trait ParameterList: Sized + 'static {
    /// Parameter types in order
    fn types() -> Vec<TypeKey>;

    /// Rebuild the typed arguments from resolved values
    fn from_values(values: Vec<Value>) -> Result<Self>;
}

impl ParameterList for () {
    fn types() -> Vec<TypeKey> {
        Vec::new()
    }

    fn from_values(values: Vec<Value>) -> Result<Self> {
        check_arity(0, values.len())
    }
}

fn check_arity(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(FixtureError::configuration(format!(
            "expected {} arguments, got {}",
            expected, actual
        )));
    }
    Ok(())
}

fn next_value<T: Reflect>(values: &mut std::vec::IntoIter<Value>) -> Result<T> {
    values
        .next()
        .ok_or_else(|| FixtureError::configuration("argument list ended early"))?
        .into_typed::<T>()
}

macro_rules! impl_parameter_list {
    ($($name:ident),+) => {
        impl<$($name: Reflect),+> ParameterList for ($($name,)+) {
            fn types() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            fn from_values(values: Vec<Value>) -> Result<Self> {
                check_arity(Self::types().len(), values.len())?;
                let mut values = values.into_iter();
                Ok(($(next_value::<$name>(&mut values)?,)+))
            }
        }
    };
}

impl_parameter_list!(A);
impl_parameter_list!(A, B);
impl_parameter_list!(A, B, C);
impl_parameter_list!(A, B, C, D);
impl_parameter_list!(A, B, C, D, E);
impl_parameter_list!(A, B, C, D, E, F);
impl_parameter_list!(A, B, C, D, E, F, G);
impl_parameter_list!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_list() {
        assert!(<()>::types().is_empty());
        assert!(<()>::from_values(Vec::new()).is_ok());
        assert!(<()>::from_values(vec![Value::new(1u8)]).is_err());
    }

    #[test]
    fn test_tuple_types_in_order() {
        let types = <(u8, String, bool)>::types();
        assert_eq!(
            types,
            vec![
                TypeKey::of::<u8>(),
                TypeKey::of::<String>(),
                TypeKey::of::<bool>()
            ]
        );
    }

    #[test]
    fn test_tuple_from_values() {
        let args = <(u8, String)>::from_values(vec![
            Value::new(3u8),
            Value::new("three".to_string()),
        ])
        .unwrap();
        assert_eq!(args, (3, "three".to_string()));
    }

    #[test]
    fn test_tuple_from_values_rejects_wrong_types() {
        let result = <(u8,)>::from_values(vec![Value::new(3u16)]);
        assert!(matches!(result, Err(FixtureError::TypeMismatch { .. })));
    }

    #[test]
    fn test_tuple_from_values_rejects_wrong_arity() {
        let result = <(u8, u8)>::from_values(vec![Value::new(3u8)]);
        assert!(matches!(result, Err(FixtureError::Configuration(_))));
    }
}
