//! Type metadata that stands in for runtime reflection.
//!
//! A type takes part in resolution by implementing [`Reflect`]. Its
//! [`reflect`](Reflect::reflect) function fills a [`ModelBuilder`] with the
//! constructors, factory methods, members, variants, collection shape and
//! conversions the engine may use. The resulting [`TypeModel`] is built once
//! per fixture and memoised in a [`ModelCache`].
//!
//! ```rust
//! use autofixture::{Fixture, ModelBuilder, Reflect};
//!
//! #[derive(Debug)]
//! struct Money {
//!     amount: u32,
//!     currency: String,
//! }
//!
//! impl Reflect for Money {
//!     fn reflect(model: &mut ModelBuilder<Self>) {
//!         model.constructor(&["amount", "currency"], |(amount, currency): (u32, String)| {
//!             Money { amount, currency }
//!         });
//!     }
//! }
//!
//! let fixture = Fixture::new();
//! let money: Money = fixture.create().unwrap();
//! assert!(money.amount > 0);
//! assert!(money.currency.starts_with("currency"));
//! ```
//!
//! A type with an empty model is abstract: only a customization, a relay or a
//! residue collector can satisfy it. This is how trait objects are declared:
//!
//! ```rust
//! use autofixture::Reflect;
//!
//! trait Clock {
//!     fn now(&self) -> u64;
//! }
//!
//! impl Reflect for Box<dyn Clock> {}
//! ```

mod model;
mod params;
mod std_impls;

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub use model::{
    CollectionKind, CollectionShape, Conversion, Member, MemberInfo, MemberKind, ModelBuilder,
    Parameter, TypeModel,
};
pub use params::ParameterList;

/// Opt-in metadata for types that can be resolved by a fixture
pub trait Reflect: Sized + 'static {
    /// Describe how instances of this type are built and populated
    fn reflect(model: &mut ModelBuilder<Self>) {
        let _ = model;
    }

    /// Readable name used in diagnostics
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Copyable handle identifying a reflected type
///
/// Equality and hashing only consider the underlying `TypeId`.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TypeModel,
}

impl TypeKey {
    /// The key of a reflected type
    pub fn of<T: Reflect>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::type_name(),
            describe: describe::<T>,
        }
    }

    /// The underlying `TypeId`
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without module paths
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Check whether this key identifies `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Build a fresh model for this type
    ///
    /// Prefer [`ModelCache::model`], which builds each model once.
    pub fn describe(&self) -> TypeModel {
        (self.describe)()
    }
}

fn describe<T: Reflect>() -> TypeModel {
    let mut builder = ModelBuilder::<T>::new();
    T::reflect(&mut builder);
    builder.finish()
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from a type name: `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

/// Fixture-scoped memo of type models
#[derive(Default)]
pub struct ModelCache {
    models: RefCell<HashMap<TypeId, Rc<TypeModel>>>,
}

impl ModelCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the model for a type, building it on first use
    pub fn model(&self, key: &TypeKey) -> Rc<TypeModel> {
        if let Some(model) = self.models.borrow().get(&key.id()) {
            return Rc::clone(model);
        }

        let model = Rc::new(key.describe());
        self.models
            .borrow_mut()
            .insert(key.id(), Rc::clone(&model));
        model
    }

    /// Number of cached models
    pub fn len(&self) -> usize {
        self.models.borrow().len()
    }

    /// Check if no model has been built yet
    pub fn is_empty(&self) -> bool {
        self.models.borrow().is_empty()
    }

    /// Drop every cached model
    pub fn clear(&self) {
        self.models.borrow_mut().clear();
    }
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache")
            .field("models", &self.len())
            .finish()
    }
}
