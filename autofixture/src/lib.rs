#![allow(clippy::result_large_err)]

//! # AutoFixture - Anonymous Test Data for Rust
//!
//! AutoFixture builds "anonymous" values of arbitrary types so that tests only
//! spell out the data they actually care about. Types opt in through
//! [`Reflect`], usually derived with `#[derive(Specimen)]`; the [`Fixture`]
//! then resolves whole object graphs by pushing requests through an ordered
//! pipeline of [`SpecimenBuilder`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use autofixture::{Fixture, Specimen};
//!
//! #[derive(Debug, Specimen)]
//! struct Invoice {
//!     number: u32,
//!     customer: String,
//!     lines: Vec<Line>,
//! }
//!
//! #[derive(Debug, Specimen)]
//! struct Line {
//!     sku: String,
//!     quantity: u16,
//! }
//!
//! let fixture = Fixture::new();
//! let invoice: Invoice = fixture.create().unwrap();
//! assert!(invoice.number > 0);
//! assert!(invoice.customer.starts_with("customer"));
//! assert_eq!(invoice.lines.len(), 3);
//!
//! let custom = fixture
//!     .build::<Invoice>()
//!     .with("number", 7u32)
//!     .create()
//!     .unwrap();
//! assert_eq!(custom.number, 7);
//! ```

// Public modules
pub mod behavior;
pub mod builder;
pub mod composer;
pub mod config;
pub mod context;
pub mod customization;
pub mod error;
pub mod fixture;
pub mod freeze;
pub mod method;
pub mod populate;
pub mod primitives;
pub mod reflect;
pub mod relays;
pub mod request;
pub mod rng;
pub mod specification;
pub mod value;

// Re-export the main public API
pub use behavior::{
    Behavior, OmitOnRecursionBehavior, OmitOnRecursionHandler, RecursionGuard, RecursionHandler,
    ThrowingRecursionBehavior, ThrowingRecursionHandler, TracingBehavior,
};
pub use builder::{
    CompositeBuilder, DelegatingBuilder, FactoryBuilder, FilteringBuilder, FirstOf, FixedBuilder,
    Postprocessor, SpecimenBuilder, SpecimenBuilderExt, SpecimenCommand,
};
pub use composer::{ComposedBuilder, Composer};
pub use config::{ConfigError, FixtureConfig};
pub use context::SpecimenContext;
pub use customization::{
    CompositeCustomization, ConstructorCustomization, Customization, CustomizationFn,
    CustomizationPriority, FavorArrays, FavorEnumerables, FavorLists, GreedyConstructors,
    NumericSequenceCustomization, OmitAutoPropertiesCustomization,
    RandomNumericSequenceCustomization, TypeRelayCustomization,
};
pub use error::{FixtureError, Result};
pub use fixture::Fixture;
pub use freeze::{FreezeOnMatchCustomization, FrozenBuilder, Matching};
pub use method::{
    ArrayFavoringConstructorQuery, CompositeMethodQuery, DelegatingMethod,
    EnumerableFavoringConstructorQuery, FactoryMethodQuery, GreedyConstructorQuery,
    ListFavoringConstructorQuery, Method, MethodInvoker, MethodQuery, ModestConstructorQuery,
};
pub use populate::AutoPropertiesCommand;
pub use reflect::{
    CollectionKind, Member, MemberInfo, MemberKind, ModelBuilder, ModelCache, Parameter,
    ParameterList, Reflect, TypeKey, TypeModel,
};
pub use request::Request;
pub use rng::{DefaultRngProvider, RngProvider, SharedRng};
pub use specification::{
    AndSpecification, AnyTypeSpecification, ExactTypeSpecification, FieldSpecification,
    InverseSpecification, OrSpecification, ParameterSpecification, PropertySpecification,
    RequestPredicate, RequestSpecification, SeededRequestSpecification,
};
pub use value::{Seed, Specimen, Value};

// Re-export derive macro from separate crate when derive feature is enabled
#[cfg(feature = "derive")]
pub use autofixture_derive::Specimen;
