//! Core specimen builder infrastructure and combinators.

use std::marker::PhantomData;
use std::rc::Rc;

use crate::context::SpecimenContext;
use crate::error::Result;
use crate::request::Request;
use crate::specification::RequestSpecification;
use crate::value::{Specimen, Value};

/// The basic unit of the resolution pipeline
///
/// A builder either produces a specimen for a request or declines with
/// [`Specimen::NoSpecimen`]. Declining is not an error: it lets the next
/// builder in the chain try. Errors are reserved for genuine failures such
/// as recursion or a rejected constructor call.
pub trait SpecimenBuilder {
    /// Produce a specimen for `request`, resolving sub-requests through `context`
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen>;
}

impl<B: SpecimenBuilder + ?Sized> SpecimenBuilder for Box<B> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        (**self).create(request, context)
    }
}

impl<B: SpecimenBuilder + ?Sized> SpecimenBuilder for Rc<B> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        (**self).create(request, context)
    }
}

impl<B: SpecimenBuilder + ?Sized> SpecimenBuilder for &B {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        (**self).create(request, context)
    }
}

/// Ask each builder in turn and return the first answer that is not `NoSpecimen`
pub fn first_specimen<'b, I>(
    builders: I,
    request: &Request,
    context: &SpecimenContext<'_>,
) -> Result<Specimen>
where
    I: IntoIterator<Item = &'b dyn SpecimenBuilder>,
{
    for builder in builders {
        match builder.create(request, context)? {
            Specimen::NoSpecimen => continue,
            specimen => return Ok(specimen),
        }
    }
    Ok(Specimen::NoSpecimen)
}

/// Combinators available on every builder
pub trait SpecimenBuilderExt: SpecimenBuilder + Sized {
    /// Try this builder, then `next` if this one declines
    fn or<B: SpecimenBuilder>(self, next: B) -> FirstOf<Self, B> {
        FirstOf {
            first: self,
            second: next,
        }
    }

    /// Only consult this builder for requests satisfying `specification`
    fn filtered<S: RequestSpecification>(self, specification: S) -> FilteringBuilder<Self, S> {
        FilteringBuilder::new(self, specification)
    }

    /// Run `command` on every value this builder produces
    fn postprocessed<C: SpecimenCommand>(self, command: C) -> Postprocessor<Self, C> {
        Postprocessor::new(self, command)
    }
}

impl<T: SpecimenBuilder> SpecimenBuilderExt for T {}

/// An ordered chain of builders; the first non-`NoSpecimen` answer wins
#[derive(Default)]
pub struct CompositeBuilder {
    builders: Vec<Box<dyn SpecimenBuilder>>,
}

impl CompositeBuilder {
    /// Create an empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a composite from an ordered list of builders
    pub fn from_builders(builders: Vec<Box<dyn SpecimenBuilder>>) -> Self {
        Self { builders }
    }

    /// Append a builder with the lowest priority
    pub fn push<B: SpecimenBuilder + 'static>(&mut self, builder: B) {
        self.builders.push(Box::new(builder));
    }

    /// Append a builder, builder-style
    pub fn with<B: SpecimenBuilder + 'static>(mut self, builder: B) -> Self {
        self.push(builder);
        self
    }

    /// Number of builders in the chain
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl SpecimenBuilder for CompositeBuilder {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        first_specimen(
            self.builders.iter().map(|builder| builder.as_ref()),
            request,
            context,
        )
    }
}

/// Two builders tried in order
pub struct FirstOf<A, B> {
    first: A,
    second: B,
}

impl<A: SpecimenBuilder, B: SpecimenBuilder> SpecimenBuilder for FirstOf<A, B> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match self.first.create(request, context)? {
            Specimen::NoSpecimen => self.second.create(request, context),
            specimen => Ok(specimen),
        }
    }
}

/// A builder consulted only for requests matching a specification
pub struct FilteringBuilder<B, S> {
    builder: B,
    specification: S,
}

impl<B, S> FilteringBuilder<B, S> {
    /// Create a filtering builder
    pub fn new(builder: B, specification: S) -> Self {
        Self {
            builder,
            specification,
        }
    }
}

impl<B: SpecimenBuilder, S: RequestSpecification> SpecimenBuilder for FilteringBuilder<B, S> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        if !self.specification.is_satisfied_by(request) {
            return Ok(Specimen::NoSpecimen);
        }
        self.builder.create(request, context)
    }
}

/// An action applied to a freshly produced value
pub trait SpecimenCommand {
    /// Mutate `specimen`, resolving anything it needs through `context`
    fn execute(
        &self,
        specimen: &mut Value,
        request: &Request,
        context: &SpecimenContext<'_>,
    ) -> Result<()>;
}

impl<C: SpecimenCommand> SpecimenCommand for Option<C> {
    fn execute(
        &self,
        specimen: &mut Value,
        request: &Request,
        context: &SpecimenContext<'_>,
    ) -> Result<()> {
        match self {
            Some(command) => command.execute(specimen, request, context),
            None => Ok(()),
        }
    }
}

/// Decorates a builder with a command run on every value it produces
pub struct Postprocessor<B, C> {
    builder: B,
    command: C,
}

impl<B, C> Postprocessor<B, C> {
    /// Create a postprocessor
    pub fn new(builder: B, command: C) -> Self {
        Self { builder, command }
    }
}

impl<B: SpecimenBuilder, C: SpecimenCommand> SpecimenBuilder for Postprocessor<B, C> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        match self.builder.create(request, context)? {
            Specimen::Value(mut value) => {
                self.command.execute(&mut value, request, context)?;
                Ok(Specimen::Value(value))
            }
            other => Ok(other),
        }
    }
}

/// Returns a clone of the same value for every request
#[derive(Debug, Clone)]
pub struct FixedBuilder<T> {
    value: T,
}

impl<T: Clone + 'static> FixedBuilder<T> {
    /// Create a fixed builder
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + 'static> SpecimenBuilder for FixedBuilder<T> {
    fn create(&self, _request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        Ok(Specimen::of(self.value.clone()))
    }
}

/// A builder backed by a closure
pub struct DelegatingBuilder<F> {
    create: F,
}

impl<F> DelegatingBuilder<F> {
    /// Create a builder from a closure
    pub fn new(create: F) -> Self
    where
        F: Fn(&Request, &SpecimenContext<'_>) -> Result<Specimen>,
    {
        Self { create }
    }
}

impl<F> SpecimenBuilder for DelegatingBuilder<F>
where
    F: Fn(&Request, &SpecimenContext<'_>) -> Result<Specimen>,
{
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        (self.create)(request, context)
    }
}

/// Produces values of `T` from a factory closure
pub struct FactoryBuilder<T, F> {
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> FactoryBuilder<T, F>
where
    T: 'static,
    F: Fn() -> T,
{
    /// Create a factory builder
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: PhantomData,
        }
    }
}

impl<T, F> SpecimenBuilder for FactoryBuilder<T, F>
where
    T: 'static,
    F: Fn() -> T,
{
    fn create(&self, _request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        Ok(Specimen::of((self.factory)()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::ModelCache;
    use crate::specification::ExactTypeSpecification;

    struct Declining;

    impl SpecimenBuilder for Declining {
        fn create(&self, _request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
            Ok(Specimen::NoSpecimen)
        }
    }

    struct Omitting;

    impl SpecimenBuilder for Omitting {
        fn create(&self, _request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
            Ok(Specimen::Omit)
        }
    }

    struct Doubling;

    impl SpecimenCommand for Doubling {
        fn execute(
            &self,
            specimen: &mut Value,
            _request: &Request,
            _context: &SpecimenContext<'_>,
        ) -> Result<()> {
            if let Some(n) = specimen.downcast_mut::<u32>() {
                *n *= 2;
            }
            Ok(())
        }
    }

    fn resolve<B: SpecimenBuilder>(builder: &B, request: &Request) -> Specimen {
        let models = ModelCache::new();
        let context = SpecimenContext::new(builder, &models);
        context.resolve(request).unwrap()
    }

    #[test]
    fn test_composite_returns_first_answer() {
        let composite = CompositeBuilder::new()
            .with(Declining)
            .with(FixedBuilder::new(1u32))
            .with(FixedBuilder::new(2u32));
        assert_eq!(composite.len(), 3);

        let value = resolve(&composite, &Request::of::<u32>()).into_value().unwrap();
        assert_eq!(value.into_typed::<u32>().unwrap(), 1);
    }

    #[test]
    fn test_empty_composite_declines() {
        let composite = CompositeBuilder::new();
        assert!(composite.is_empty());
        assert!(resolve(&composite, &Request::of::<u32>()).is_no_specimen());
    }

    #[test]
    fn test_omit_counts_as_an_answer() {
        let composite = CompositeBuilder::new()
            .with(Omitting)
            .with(FixedBuilder::new(1u32));
        assert!(resolve(&composite, &Request::of::<u32>()).is_omitted());
    }

    #[test]
    fn test_or_combinator() {
        let builder = Declining.or(FixedBuilder::new(5u32));
        let value = resolve(&builder, &Request::of::<u32>()).into_value().unwrap();
        assert_eq!(value.into_typed::<u32>().unwrap(), 5);
    }

    #[test]
    fn test_filtered_builder() {
        let builder = FixedBuilder::new(5u32).filtered(ExactTypeSpecification::of::<u32>());
        assert!(resolve(&builder, &Request::of::<u32>()).into_value().is_some());
        assert!(resolve(&builder, &Request::of::<u64>()).is_no_specimen());
    }

    #[test]
    fn test_postprocessor_runs_command() {
        let builder = FixedBuilder::new(21u32).postprocessed(Doubling);
        let value = resolve(&builder, &Request::of::<u32>()).into_value().unwrap();
        assert_eq!(value.into_typed::<u32>().unwrap(), 42);

        let skipped = FixedBuilder::new(21u32).postprocessed(None::<Doubling>);
        let value = resolve(&skipped, &Request::of::<u32>()).into_value().unwrap();
        assert_eq!(value.into_typed::<u32>().unwrap(), 21);
    }

    #[test]
    fn test_factory_builder_calls_factory_each_time() {
        let counter = std::cell::Cell::new(0u32);
        let builder = FactoryBuilder::new(|| {
            counter.set(counter.get() + 1);
            counter.get()
        });
        resolve(&builder, &Request::of::<u32>());
        let value = resolve(&builder, &Request::of::<u32>()).into_value().unwrap();
        assert_eq!(value.into_typed::<u32>().unwrap(), 2);
    }
}
