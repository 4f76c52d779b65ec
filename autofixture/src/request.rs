//! Requests: descriptions of the specimen a caller wants.

use std::fmt;

use crate::reflect::{MemberInfo, Parameter, Reflect, TypeKey};
use crate::value::Seed;

/// A description of a desired specimen
///
/// Requests compare by value so that builders can match on them and
/// recursion tracking can recognise a request it has already seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
    /// An instance of a type
    Type(TypeKey),
    /// An instance of a type, with a hint such as a member name
    Seeded { ty: TypeKey, seed: Seed },
    /// A sequence of the inner request, sized by the fixture's repeat count
    Multiple(Box<Request>),
    /// Exactly `count` specimens of the inner request
    FiniteSequence { request: Box<Request>, count: usize },
    /// A value for a constructor or factory parameter
    Parameter(Parameter),
    /// A value for a property
    Property(MemberInfo),
    /// A value for a field
    Field(MemberInfo),
}

impl Request {
    /// A request for an instance of `T`
    pub fn of<T: Reflect>() -> Self {
        Request::Type(TypeKey::of::<T>())
    }

    /// A seeded request for an instance of `T`
    pub fn seeded<T: Reflect>(seed: impl Into<Seed>) -> Self {
        Request::Seeded {
            ty: TypeKey::of::<T>(),
            seed: seed.into(),
        }
    }

    /// A request for a default-sized sequence of `inner`
    pub fn multiple(inner: Request) -> Self {
        Request::Multiple(Box::new(inner))
    }

    /// A request for exactly `count` specimens of `inner`
    pub fn finite_sequence(inner: Request, count: usize) -> Self {
        Request::FiniteSequence {
            request: Box::new(inner),
            count,
        }
    }

    /// The type a single-value request asks for; `None` for sequence requests
    pub fn target_type(&self) -> Option<TypeKey> {
        match self {
            Request::Type(ty) | Request::Seeded { ty, .. } => Some(*ty),
            Request::Parameter(parameter) => Some(parameter.ty),
            Request::Property(member) | Request::Field(member) => Some(member.ty),
            Request::Multiple(_) | Request::FiniteSequence { .. } => None,
        }
    }

    /// Whether this is a plain or seeded request for `key`
    pub fn is_for_type(&self, key: &TypeKey) -> bool {
        match self {
            Request::Type(ty) | Request::Seeded { ty, .. } => ty == key,
            _ => false,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Type(ty) => write!(f, "{}", ty),
            Request::Seeded { ty, seed } => write!(f, "{} (seed {})", ty, seed),
            Request::Multiple(inner) => write!(f, "many of {}", inner),
            Request::FiniteSequence { request, count } => write!(f, "{} of {}", count, request),
            Request::Parameter(parameter) => write!(
                f,
                "parameter {}: {} of {}::{}",
                parameter.name, parameter.ty, parameter.declaring, parameter.method
            ),
            Request::Property(member) | Request::Field(member) => write!(f, "{}", member),
        }
    }
}
