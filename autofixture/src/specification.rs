//! Request specifications: predicates over requests used to filter builders.

use crate::reflect::{Reflect, TypeKey};
use crate::request::Request;
use crate::value::Seed;

/// A predicate over requests
pub trait RequestSpecification {
    /// Whether the request satisfies this specification
    fn is_satisfied_by(&self, request: &Request) -> bool;
}

impl<S: RequestSpecification + ?Sized> RequestSpecification for Box<S> {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        (**self).is_satisfied_by(request)
    }
}

impl<S: RequestSpecification + ?Sized> RequestSpecification for &S {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        (**self).is_satisfied_by(request)
    }
}

/// Matches plain and seeded requests for exactly one type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactTypeSpecification {
    ty: TypeKey,
}

impl ExactTypeSpecification {
    /// Match requests for `ty`
    pub fn new(ty: TypeKey) -> Self {
        Self { ty }
    }

    /// Match requests for `T`
    pub fn of<T: Reflect>() -> Self {
        Self::new(TypeKey::of::<T>())
    }
}

impl RequestSpecification for ExactTypeSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        request.is_for_type(&self.ty)
    }
}

/// Matches plain and seeded requests for any of a set of types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnyTypeSpecification {
    types: Vec<TypeKey>,
}

impl AnyTypeSpecification {
    /// Match requests for any type in `types`
    pub fn new(types: Vec<TypeKey>) -> Self {
        Self { types }
    }

    /// Whether the set is empty, in which case nothing matches
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl RequestSpecification for AnyTypeSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        self.types.iter().any(|ty| request.is_for_type(ty))
    }
}

/// Matches seeded requests for a type, optionally with one specific seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRequestSpecification {
    ty: TypeKey,
    seed: Option<Seed>,
}

impl SeededRequestSpecification {
    /// Match seeded requests for `ty` with any seed
    pub fn new(ty: TypeKey) -> Self {
        Self { ty, seed: None }
    }

    /// Only match requests carrying `seed`
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = Some(seed.into());
        self
    }
}

impl RequestSpecification for SeededRequestSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        match request {
            Request::Seeded { ty, seed } => {
                *ty == self.ty && self.seed.as_ref().is_none_or(|expected| expected == seed)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MemberCriteria {
    name: Option<String>,
    ty: Option<TypeKey>,
}

impl MemberCriteria {
    fn matches(&self, name: &str, ty: &TypeKey) -> bool {
        self.name.as_deref().is_none_or(|expected| expected == name)
            && self.ty.as_ref().is_none_or(|expected| expected == ty)
    }
}

macro_rules! member_specification {
    ($(#[$doc:meta])* $name:ident, $variant:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            criteria: MemberCriteria,
        }

        impl $name {
            /// Match every request of this kind
            pub fn new() -> Self {
                Self::default()
            }

            /// Only match members with this name
            pub fn named(mut self, name: impl Into<String>) -> Self {
                self.criteria.name = Some(name.into());
                self
            }

            /// Only match members of this type
            pub fn of_type(mut self, ty: TypeKey) -> Self {
                self.criteria.ty = Some(ty);
                self
            }
        }

        impl RequestSpecification for $name {
            fn is_satisfied_by(&self, request: &Request) -> bool {
                match request {
                    Request::$variant(member) => self.criteria.matches(member.name, &member.ty),
                    _ => false,
                }
            }
        }
    };
}

member_specification!(
    /// Matches constructor and factory parameter requests
    ParameterSpecification,
    Parameter
);
member_specification!(
    /// Matches property requests
    PropertySpecification,
    Property
);
member_specification!(
    /// Matches field requests
    FieldSpecification,
    Field
);

/// Satisfied when any inner specification is
#[derive(Default)]
pub struct OrSpecification {
    specifications: Vec<Box<dyn RequestSpecification>>,
}

impl OrSpecification {
    /// Combine specifications
    pub fn new(specifications: Vec<Box<dyn RequestSpecification>>) -> Self {
        Self { specifications }
    }

    /// Add another alternative
    pub fn or<S: RequestSpecification + 'static>(mut self, specification: S) -> Self {
        self.specifications.push(Box::new(specification));
        self
    }

    /// Number of alternatives
    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    /// Whether there are no alternatives, in which case nothing matches
    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}

impl RequestSpecification for OrSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        self.specifications
            .iter()
            .any(|specification| specification.is_satisfied_by(request))
    }
}

/// Satisfied when every inner specification is
#[derive(Default)]
pub struct AndSpecification {
    specifications: Vec<Box<dyn RequestSpecification>>,
}

impl AndSpecification {
    /// Combine specifications
    pub fn new(specifications: Vec<Box<dyn RequestSpecification>>) -> Self {
        Self { specifications }
    }

    /// Add another requirement
    pub fn and<S: RequestSpecification + 'static>(mut self, specification: S) -> Self {
        self.specifications.push(Box::new(specification));
        self
    }
}

impl RequestSpecification for AndSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        self.specifications
            .iter()
            .all(|specification| specification.is_satisfied_by(request))
    }
}

/// Negates a specification
pub struct InverseSpecification<S> {
    inner: S,
}

impl<S: RequestSpecification> InverseSpecification<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: RequestSpecification> RequestSpecification for InverseSpecification<S> {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        !self.inner.is_satisfied_by(request)
    }
}

/// A specification backed by a closure
pub struct RequestPredicate<F> {
    predicate: F,
}

impl<F: Fn(&Request) -> bool> RequestPredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F: Fn(&Request) -> bool> RequestSpecification for RequestPredicate<F> {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        (self.predicate)(request)
    }
}
