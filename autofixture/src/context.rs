//! The specimen context: the single entry point for resolving sub-requests.

use std::rc::Rc;

use crate::builder::SpecimenBuilder;
use crate::error::{FixtureError, Result};
use crate::reflect::{ModelCache, Reflect, TypeKey, TypeModel};
use crate::request::Request;
use crate::value::Specimen;

/// Resolves requests against one composed builder graph
///
/// Builders never call each other directly for sub-requests; they go back
/// through the context so that the whole object graph of a root request is
/// built by the same pipeline.
pub struct SpecimenContext<'a> {
    builder: &'a dyn SpecimenBuilder,
    models: &'a ModelCache,
    auto_properties: bool,
}

impl<'a> SpecimenContext<'a> {
    /// Create a context over a builder graph and a model cache
    pub fn new(builder: &'a dyn SpecimenBuilder, models: &'a ModelCache) -> Self {
        Self {
            builder,
            models,
            auto_properties: true,
        }
    }

    /// Enable or disable member population for this resolution
    pub fn with_auto_properties(mut self, enabled: bool) -> Self {
        self.auto_properties = enabled;
        self
    }

    /// Whether freshly built values get their members populated
    pub fn auto_properties(&self) -> bool {
        self.auto_properties
    }

    /// Resolve a request through the whole graph
    pub fn resolve(&self, request: &Request) -> Result<Specimen> {
        self.builder.create(request, self)
    }

    /// The fixture's model cache
    pub fn models(&self) -> &ModelCache {
        self.models
    }

    /// The model of a type
    pub fn model(&self, key: &TypeKey) -> Rc<TypeModel> {
        self.models.model(key)
    }

    /// Resolve an instance of `T`, failing if the graph cannot provide one
    pub fn create<T: Reflect>(&self) -> Result<T> {
        let request = Request::of::<T>();
        match self.resolve(&request)? {
            Specimen::Value(value) => value.into_typed::<T>(),
            Specimen::NoSpecimen | Specimen::Omit => Err(FixtureError::object_creation(
                &request,
                std::slice::from_ref(&request),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DelegatingBuilder;

    #[test]
    fn test_context_dispatches_to_builder() {
        let builder = DelegatingBuilder::new(|request: &Request, _context: &SpecimenContext<'_>| {
            Ok(match request.target_type() {
                Some(ty) if ty.is::<u8>() => Specimen::of(7u8),
                _ => Specimen::NoSpecimen,
            })
        });
        let models = ModelCache::new();
        let context = SpecimenContext::new(&builder, &models);

        assert_eq!(context.create::<u8>().unwrap(), 7);
        assert!(context.create::<u16>().unwrap_err().is_object_creation());
    }

    #[test]
    fn test_context_shares_model_cache() {
        let builder = DelegatingBuilder::new(|_: &Request, _: &SpecimenContext<'_>| {
            Ok(Specimen::NoSpecimen)
        });
        let models = ModelCache::new();
        let context = SpecimenContext::new(&builder, &models);

        context.model(&TypeKey::of::<Option<u8>>());
        assert_eq!(models.len(), 1);
    }
}
