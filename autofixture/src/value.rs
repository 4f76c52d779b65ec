//! Type-erased specimen values, the specimen sentinel and request seeds.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::{FixtureError, Result};

/// An owned, type-erased specimen
pub struct Value {
    inner: Box<dyn Any>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Value {
    /// Wrap a concrete value
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` of the wrapped value
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The full type name of the wrapped value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the wrapped value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Take the wrapped value out, or get the value back if it is not a `T`
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Value> {
        let Value {
            inner,
            type_id,
            type_name,
        } = self;
        match inner.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(inner) => Err(Value {
                inner,
                type_id,
                type_name,
            }),
        }
    }

    /// Borrow the wrapped value as a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Mutably borrow the wrapped value as a `T`
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Take the wrapped value out, reporting a type mismatch as an error
    pub fn into_typed<T: Any>(self) -> Result<T> {
        self.downcast::<T>().map_err(|value| {
            FixtureError::type_mismatch(std::any::type_name::<T>(), value.type_name())
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.type_name)
    }
}

/// The outcome of asking a builder for a specimen
#[derive(Debug)]
pub enum Specimen {
    /// A produced value
    Value(Value),
    /// The builder does not know how to handle the request
    NoSpecimen,
    /// The request should be skipped by whoever asked for it
    Omit,
}

impl Specimen {
    /// Wrap a concrete value as a specimen
    pub fn of<T: Any>(value: T) -> Self {
        Specimen::Value(Value::new(value))
    }

    /// Whether the builder declined the request
    pub fn is_no_specimen(&self) -> bool {
        matches!(self, Specimen::NoSpecimen)
    }

    /// Whether the request should be skipped
    pub fn is_omitted(&self) -> bool {
        matches!(self, Specimen::Omit)
    }

    /// The produced value, if any
    pub fn into_value(self) -> Option<Value> {
        match self {
            Specimen::Value(value) => Some(value),
            Specimen::NoSpecimen | Specimen::Omit => None,
        }
    }
}

impl From<Value> for Specimen {
    fn from(value: Value) -> Self {
        Specimen::Value(value)
    }
}

/// A seed attached to a request, compared by value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    /// Textual seed, e.g. a member name
    Text(String),
    /// Integral seed
    Integer(i128),
    /// Boolean seed
    Bool(bool),
}

impl Seed {
    /// The seed as text, if it is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Seed::Text(text) => Some(text),
            Seed::Integer(_) | Seed::Bool(_) => None,
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Text(text) => write!(f, "\"{}\"", text),
            Seed::Integer(n) => write!(f, "{}", n),
            Seed::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Seed::Text(text.to_string())
    }
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        Seed::Text(text)
    }
}

impl From<bool> for Seed {
    fn from(value: bool) -> Self {
        Seed::Bool(value)
    }
}

macro_rules! impl_integer_seed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Seed {
                fn from(value: $t) -> Self {
                    Seed::Integer(value as i128)
                }
            }
        )*
    };
}

impl_integer_seed!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_downcast() {
        let value = Value::new(42u32);
        assert!(value.is::<u32>());
        assert!(!value.is::<i32>());
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));

        let value = value.downcast::<i32>().unwrap_err();
        assert_eq!(value.downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn test_value_downcast_mut() {
        let mut value = Value::new(String::from("abc"));
        value.downcast_mut::<String>().unwrap().push('d');
        assert_eq!(value.into_typed::<String>().unwrap(), "abcd");
    }

    #[test]
    fn test_into_typed_reports_mismatch() {
        let error = Value::new(1u8).into_typed::<String>().unwrap_err();
        match error {
            FixtureError::TypeMismatch { expected, actual } => {
                assert_eq!(expected, "alloc::string::String");
                assert_eq!(actual, "u8");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_specimen_helpers() {
        assert!(Specimen::NoSpecimen.is_no_specimen());
        assert!(Specimen::Omit.is_omitted());
        assert!(Specimen::Omit.into_value().is_none());
        assert!(Specimen::of(1i64).into_value().unwrap().is::<i64>());
    }

    #[test]
    fn test_seed_conversions_and_equality() {
        assert_eq!(Seed::from("name"), Seed::Text("name".to_string()));
        assert_eq!(Seed::from(7u8), Seed::from(7i64));
        assert_eq!(Seed::from(true), Seed::Bool(true));
        assert_eq!(Seed::from("name").as_text(), Some("name"));
        assert_eq!(Seed::from(3).as_text(), None);
        assert_eq!(Seed::from("x").to_string(), "\"x\"");
    }
}
