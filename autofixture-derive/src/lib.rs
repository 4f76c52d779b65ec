//! Derive macros for the autofixture specimen engine
//!
//! This crate provides `#[derive(Specimen)]`, which implements
//! `autofixture::Reflect` so that a fixture can build the type.

use proc_macro::TokenStream;

mod derive;

/// Derive macro for automatically implementing the `Reflect` trait
///
/// # Basic Usage
///
/// Structs get a memberwise constructor. Each field becomes a constructor
/// parameter named after it, so anonymous strings start with the field name.
///
/// ```rust
/// use autofixture::{Fixture, Specimen};
///
/// #[derive(Specimen)]
/// struct User {
///     id: u32,
///     name: String,
///     active: bool,
/// }
///
/// let user: User = Fixture::new().create().unwrap();
/// assert!(user.name.starts_with("name"));
/// ```
///
/// # Supported Attributes
///
/// - `#[specimen(default)]` on a struct: build it with `Default::default()`
///   and populate every field afterwards
/// - `#[specimen(implements = "Box<dyn Trait>")]` on a type: the type can
///   stand in for the given interface
/// - `#[specimen(base_type = "Base")]` on a type: the type converts into
///   `Base` with `Into`
/// - `#[specimen(skip)]` on a field: never resolved, left at its default
///
/// # Enums
///
/// Fieldless enums produce their variants in declaration order:
///
/// ```rust
/// use autofixture::Specimen;
///
/// #[derive(Specimen)]
/// enum Status {
///     Active,
///     Inactive,
/// }
/// ```
///
/// # Generic Types
///
/// Type parameters receive a `Reflect` bound:
///
/// ```rust
/// use autofixture::Specimen;
///
/// #[derive(Specimen)]
/// struct Pair<T, U> {
///     first: T,
///     second: U,
/// }
/// ```
#[proc_macro_derive(Specimen, attributes(specimen))]
pub fn derive_specimen(input: TokenStream) -> TokenStream {
    derive::derive_specimen_impl(input)
}
