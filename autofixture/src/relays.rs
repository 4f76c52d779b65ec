//! Relays: builders that answer a request by resolving a different one.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::builder::SpecimenBuilder;
use crate::context::SpecimenContext;
use crate::error::{FixtureError, Result};
use crate::reflect::{Reflect, TypeKey};
use crate::request::Request;
use crate::value::{Seed, Specimen, Value};

fn seeded_by_name(ty: TypeKey, name: &str) -> Request {
    Request::Seeded {
        ty,
        seed: Seed::Text(name.to_string()),
    }
}

/// Resolves a parameter as a request for its type, seeded with its name
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterRequestRelay;

impl SpecimenBuilder for ParameterRequestRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Parameter(parameter) => {
                context.resolve(&seeded_by_name(parameter.ty, parameter.name))
            }
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Resolves a property as a request for its type, seeded with its name
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyRequestRelay;

impl SpecimenBuilder for PropertyRequestRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Property(member) => context.resolve(&seeded_by_name(member.ty, member.name)),
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Resolves a field as a request for its type, seeded with its name
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRequestRelay;

impl SpecimenBuilder for FieldRequestRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Field(member) => context.resolve(&seeded_by_name(member.ty, member.name)),
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Answers a text-seeded `String` request with the seed followed by an anonymous string
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSeedRelay;

impl SpecimenBuilder for StringSeedRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Request::Seeded {
            ty,
            seed: Seed::Text(seed),
        } = request
        else {
            return Ok(Specimen::NoSpecimen);
        };
        if !ty.is::<String>() {
            return Ok(Specimen::NoSpecimen);
        }

        match context.resolve(&Request::of::<String>())? {
            Specimen::Value(value) => match value.downcast::<String>() {
                Ok(suffix) => Ok(Specimen::of(format!("{}{}", seed, suffix))),
                Err(_) => Ok(Specimen::NoSpecimen),
            },
            other => Ok(other),
        }
    }
}

/// Drops the seed of a seeded request and resolves the bare type
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedIgnoringRelay;

impl SpecimenBuilder for SeedIgnoringRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Seeded { ty, .. } => context.resolve(&Request::Type(*ty)),
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Turns a request for "many" into a sequence of a fixed size
#[derive(Debug, Clone, Copy)]
pub struct MultipleRelay {
    count: usize,
}

impl MultipleRelay {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl SpecimenBuilder for MultipleRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Multiple(inner) => context.resolve(&Request::FiniteSequence {
                request: inner.clone(),
                count: self.count,
            }),
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Resolves a finite sequence into a `Vec<Value>`
///
/// Omitted elements are left out; an element nobody can build makes the
/// whole sequence unresolvable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteSequenceRelay;

impl SpecimenBuilder for FiniteSequenceRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Request::FiniteSequence { request, count } = request else {
            return Ok(Specimen::NoSpecimen);
        };

        let mut elements = Vec::new();
        for _ in 0..*count {
            match context.resolve(request)? {
                Specimen::Value(value) => elements.push(value),
                Specimen::Omit => continue,
                Specimen::NoSpecimen => return Ok(Specimen::NoSpecimen),
            }
        }
        Ok(Specimen::of(elements))
    }
}

/// Builds collection types from a sequence of their elements
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionRelay;

impl SpecimenBuilder for CollectionRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Request::Type(ty) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        let model = context.model(ty);
        let Some(shape) = model.collection() else {
            return Ok(Specimen::NoSpecimen);
        };

        let element = Request::Type(shape.element());
        let sequence = match shape.fixed_len() {
            Some(len) => Request::finite_sequence(element, len),
            None => Request::multiple(element),
        };

        let elements = match context.resolve(&sequence)? {
            Specimen::Value(value) => value.into_typed::<Vec<Value>>()?,
            other => return Ok(other),
        };
        if shape.fixed_len().is_some_and(|len| len != elements.len()) {
            return Ok(Specimen::NoSpecimen);
        }
        shape.assemble(elements).map(Specimen::Value)
    }
}

/// Produces enum variants in declaration order, cycling per type
#[derive(Debug, Default)]
pub struct EnumGenerator {
    positions: RefCell<HashMap<TypeId, usize>>,
}

impl EnumGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpecimenBuilder for EnumGenerator {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Request::Type(ty) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        let model = context.model(ty);
        let count = model.variant_count();
        if count == 0 {
            return Ok(Specimen::NoSpecimen);
        }

        let mut positions = self.positions.borrow_mut();
        let position = positions.entry(ty.id()).or_insert(0);
        let index = *position % count;
        *position = index + 1;
        Ok(model
            .variant(index)
            .map_or(Specimen::NoSpecimen, Specimen::Value))
    }
}

/// Satisfies requests for `from` by building a `to` and converting it
///
/// `to` must declare a conversion to `from` with
/// [`implements`](crate::ModelBuilder::implements) or
/// [`base_type`](crate::ModelBuilder::base_type).
#[derive(Debug, Clone, Copy)]
pub struct TypeRelay {
    from: TypeKey,
    to: TypeKey,
}

impl TypeRelay {
    /// Relay requests for `From` to `To`
    pub fn new<From: Reflect, To: Reflect>() -> Self {
        Self {
            from: TypeKey::of::<From>(),
            to: TypeKey::of::<To>(),
        }
    }

    pub fn from_type(&self) -> TypeKey {
        self.from
    }

    pub fn to_type(&self) -> TypeKey {
        self.to
    }
}

impl SpecimenBuilder for TypeRelay {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        if !request.is_for_type(&self.from) {
            return Ok(Specimen::NoSpecimen);
        }

        let value = match context.resolve(&Request::Type(self.to))? {
            Specimen::Value(value) => value,
            other => return Ok(other),
        };
        let model = context.model(&self.to);
        let conversion = model.conversion_to(&self.from).ok_or_else(|| {
            FixtureError::configuration(format!("{} cannot stand in for {}", self.to, self.from))
        })?;
        conversion.apply(value).map(Specimen::Value)
    }
}
