//! `Reflect` implementations for primitives and standard library types.
//!
//! Primitives carry empty models: they are produced by the dedicated
//! generators in [`primitives`](crate::primitives). Containers describe how
//! to build themselves from their contents.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::FixtureError;
use crate::reflect::{CollectionKind, ModelBuilder, Reflect};

macro_rules! impl_reflect_primitive {
    ($($t:ty),*) => {
        $(
            impl Reflect for $t {}
        )*
    };
}

impl_reflect_primitive!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String
);

impl Reflect for uuid::Uuid {}

impl Reflect for () {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.constructor(&[], |(): ()| ());
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.constructor(&["value"], |(value,): (T,)| Some(value));
        model.factory("none", &[], |(): ()| None);
    }
}

impl<T: Reflect> Reflect for Rc<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.constructor(&["value"], |(value,): (T,)| Rc::new(value));
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.constructor(&["value"], |(value,): (T,)| Arc::new(value));
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.collection(CollectionKind::List, |items: Vec<T>| items);
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.collection(CollectionKind::Deque, |items: Vec<T>| {
            items.into_iter().collect()
        });
    }
}

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.collection(CollectionKind::Set, |items: Vec<T>| {
            items.into_iter().collect()
        });
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.collection(CollectionKind::Set, |items: Vec<T>| {
            items.into_iter().collect()
        });
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.collection(CollectionKind::Map, |entries: Vec<(K, V)>| {
            entries.into_iter().collect()
        });
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.collection(CollectionKind::Map, |entries: Vec<(K, V)>| {
            entries.into_iter().collect()
        });
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.try_collection(CollectionKind::Array(N), |items: Vec<T>| {
            <[T; N]>::try_from(items).map_err(|items: Vec<T>| {
                FixtureError::configuration(format!(
                    "an array of {} elements cannot be built from {} elements",
                    N,
                    items.len()
                ))
            })
        });
    }
}

macro_rules! impl_reflect_tuple {
    ($($name:ident : $label:literal),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn reflect(model: &mut ModelBuilder<Self>) {
                model.constructor(&[$($label),+], |items: Self| items);
            }
        }
    };
}

impl_reflect_tuple!(A: "item1");
impl_reflect_tuple!(A: "item1", B: "item2");
impl_reflect_tuple!(A: "item1", B: "item2", C: "item3");
impl_reflect_tuple!(A: "item1", B: "item2", C: "item3", D: "item4");
impl_reflect_tuple!(A: "item1", B: "item2", C: "item3", D: "item4", E: "item5");
impl_reflect_tuple!(A: "item1", B: "item2", C: "item3", D: "item4", E: "item5", F: "item6");
impl_reflect_tuple!(
    A: "item1", B: "item2", C: "item3", D: "item4", E: "item5", F: "item6", G: "item7"
);
impl_reflect_tuple!(
    A: "item1", B: "item2", C: "item3", D: "item4", E: "item5", F: "item6", G: "item7",
    H: "item8"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeKey;
    use crate::value::Value;

    #[test]
    fn test_primitives_are_abstract() {
        assert!(TypeKey::of::<u32>().describe().is_abstract());
        assert!(TypeKey::of::<String>().describe().is_abstract());
        assert!(TypeKey::of::<uuid::Uuid>().describe().is_abstract());
    }

    #[test]
    fn test_option_prefers_some_and_falls_back_to_none() {
        let model = TypeKey::of::<Option<u8>>().describe();
        assert_eq!(model.constructors().len(), 1);
        assert_eq!(model.factories().len(), 1);

        let none = model.factories()[0].invoke(Vec::new()).unwrap();
        assert_eq!(none.into_typed::<Option<u8>>().unwrap(), None);
    }

    #[test]
    fn test_collection_shapes() {
        let vec = TypeKey::of::<Vec<String>>().describe();
        let shape = vec.collection().unwrap();
        assert_eq!(shape.element(), TypeKey::of::<String>());
        assert_eq!(shape.kind(), CollectionKind::List);
        assert_eq!(shape.fixed_len(), None);

        let map = TypeKey::of::<HashMap<u8, bool>>().describe();
        assert_eq!(
            map.collection().unwrap().element(),
            TypeKey::of::<(u8, bool)>()
        );

        let array = TypeKey::of::<[u16; 4]>().describe();
        assert_eq!(array.collection().unwrap().fixed_len(), Some(4));
    }

    #[test]
    fn test_array_assembly_checks_length() {
        let model = TypeKey::of::<[u8; 2]>().describe();
        let shape = model.collection().unwrap();

        let array = shape
            .assemble(vec![Value::new(1u8), Value::new(2u8)])
            .unwrap();
        assert_eq!(array.into_typed::<[u8; 2]>().unwrap(), [1, 2]);
        assert!(shape.assemble(vec![Value::new(1u8)]).is_err());
    }

    #[test]
    fn test_set_assembly_deduplicates() {
        let model = TypeKey::of::<BTreeSet<u8>>().describe();
        let set = model
            .collection()
            .unwrap()
            .assemble(vec![Value::new(1u8), Value::new(1u8), Value::new(2u8)])
            .unwrap()
            .into_typed::<BTreeSet<u8>>()
            .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_tuple_constructor_parameter_names() {
        let model = TypeKey::of::<(u8, String)>().describe();
        let names: Vec<_> = model.constructors()[0]
            .parameters()
            .iter()
            .map(|parameter| parameter.name)
            .collect();
        assert_eq!(names, vec!["item1", "item2"]);
    }
}
