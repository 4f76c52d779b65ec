//! Behaviors: decorators applied to the whole builder graph of a fixture.

use std::cell::{Cell, RefCell};

use crate::builder::SpecimenBuilder;
use crate::config::{ConfigError, DEFAULT_RECURSION_DEPTH};
use crate::context::SpecimenContext;
use crate::error::{FixtureError, Result};
use crate::request::Request;
use crate::value::Specimen;

/// Wraps the composed graph of a fixture for the duration of one resolution
pub trait Behavior {
    /// Decorate `builder`
    fn transform<'a>(&self, builder: Box<dyn SpecimenBuilder + 'a>) -> Box<dyn SpecimenBuilder + 'a>;

    /// Whether this behavior guards against recursive request graphs
    ///
    /// A fixture keeps at most one such behavior, see
    /// [`Fixture::set_recursion_behavior`](crate::Fixture::set_recursion_behavior).
    fn guards_recursion(&self) -> bool {
        false
    }
}

/// Decides what a recursion guard returns when it detects a cycle
pub trait RecursionHandler {
    /// `path` holds the in-flight requests, outermost first
    fn handle_recursion(&self, request: &Request, path: &[Request]) -> Result<Specimen>;
}

/// Fails the resolution with [`FixtureError::Recursion`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThrowingRecursionHandler;

impl RecursionHandler for ThrowingRecursionHandler {
    fn handle_recursion(&self, request: &Request, path: &[Request]) -> Result<Specimen> {
        let mut path = path.to_vec();
        path.push(request.clone());
        Err(FixtureError::recursion(request, &path))
    }
}

/// Answers the recursive request with [`Specimen::Omit`]
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitOnRecursionHandler;

impl RecursionHandler for OmitOnRecursionHandler {
    fn handle_recursion(&self, _request: &Request, _path: &[Request]) -> Result<Specimen> {
        Ok(Specimen::Omit)
    }
}

/// Pops the request pushed by [`RecursionGuard`] when resolution unwinds
struct InFlight<'g> {
    stack: &'g RefCell<Vec<Request>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Tracks in-flight requests and hands repeated ones to a [`RecursionHandler`]
///
/// A request is recursive once it already appears `depth` times among the
/// requests currently being resolved.
pub struct RecursionGuard<'a, H> {
    inner: Box<dyn SpecimenBuilder + 'a>,
    handler: H,
    depth: usize,
    stack: RefCell<Vec<Request>>,
}

impl<'a, H: RecursionHandler> RecursionGuard<'a, H> {
    pub fn new(inner: Box<dyn SpecimenBuilder + 'a>, handler: H, depth: usize) -> Self {
        Self {
            inner,
            handler,
            depth,
            stack: RefCell::new(Vec::new()),
        }
    }
}

impl<H: RecursionHandler> SpecimenBuilder for RecursionGuard<'_, H> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let seen = self
            .stack
            .borrow()
            .iter()
            .filter(|in_flight| *in_flight == request)
            .count();
        if seen >= self.depth {
            let path = self.stack.borrow().clone();
            return self.handler.handle_recursion(request, &path);
        }

        self.stack.borrow_mut().push(request.clone());
        let _in_flight = InFlight { stack: &self.stack };
        self.inner.create(request, context)
    }
}

fn checked_depth(depth: usize) -> std::result::Result<usize, ConfigError> {
    if depth == 0 {
        return Err(ConfigError::InvalidRecursionDepth(depth));
    }
    Ok(depth)
}

/// Fails with a recursion error when a request graph contains a cycle
#[derive(Debug, Clone, Copy)]
pub struct ThrowingRecursionBehavior {
    depth: usize,
}

impl ThrowingRecursionBehavior {
    pub fn new() -> Self {
        Self {
            depth: DEFAULT_RECURSION_DEPTH,
        }
    }

    /// Allow each request to appear `depth` times before failing
    pub fn with_depth(depth: usize) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            depth: checked_depth(depth)?,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for ThrowingRecursionBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for ThrowingRecursionBehavior {
    fn transform<'a>(&self, builder: Box<dyn SpecimenBuilder + 'a>) -> Box<dyn SpecimenBuilder + 'a> {
        Box::new(RecursionGuard::new(builder, ThrowingRecursionHandler, self.depth))
    }

    fn guards_recursion(&self) -> bool {
        true
    }
}

/// Omits the recursive request instead of failing
///
/// Typically makes an `Option` member resolve to `None` or leaves a
/// collection shorter, which breaks the cycle.
#[derive(Debug, Clone, Copy)]
pub struct OmitOnRecursionBehavior {
    depth: usize,
}

impl OmitOnRecursionBehavior {
    pub fn new() -> Self {
        Self {
            depth: DEFAULT_RECURSION_DEPTH,
        }
    }

    /// Allow each request to appear `depth` times before omitting it
    pub fn with_depth(depth: usize) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            depth: checked_depth(depth)?,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for OmitOnRecursionBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for OmitOnRecursionBehavior {
    fn transform<'a>(&self, builder: Box<dyn SpecimenBuilder + 'a>) -> Box<dyn SpecimenBuilder + 'a> {
        Box::new(RecursionGuard::new(builder, OmitOnRecursionHandler, self.depth))
    }

    fn guards_recursion(&self) -> bool {
        true
    }
}

/// Emits a `trace` event for every request and its outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

impl Behavior for TracingBehavior {
    fn transform<'a>(&self, builder: Box<dyn SpecimenBuilder + 'a>) -> Box<dyn SpecimenBuilder + 'a> {
        Box::new(TracingBuilder {
            inner: builder,
            depth: Cell::new(0),
        })
    }
}

struct TracingBuilder<'a> {
    inner: Box<dyn SpecimenBuilder + 'a>,
    depth: Cell<usize>,
}

impl SpecimenBuilder for TracingBuilder<'_> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let depth = self.depth.get();
        tracing::trace!(depth, %request, "resolving");

        self.depth.set(depth + 1);
        let result = self.inner.create(request, context);
        self.depth.set(depth);

        match &result {
            Ok(Specimen::Value(value)) => {
                tracing::trace!(depth, %request, produced = value.type_name(), "resolved")
            }
            Ok(Specimen::NoSpecimen) => tracing::trace!(depth, %request, "declined"),
            Ok(Specimen::Omit) => tracing::trace!(depth, %request, "omitted"),
            Err(error) => tracing::trace!(depth, %request, %error, "failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CompositeBuilder, DelegatingBuilder};
    use crate::reflect::ModelCache;

    /// Resolves `u8` by resolving `u8` again, forever
    fn looping() -> Box<dyn SpecimenBuilder> {
        Box::new(DelegatingBuilder::new(
            |request: &Request, context: &SpecimenContext<'_>| {
                match request {
                    Request::Type(ty) if ty.is::<u8>() => {
                        context.resolve(&Request::seeded::<u8>(1u8))
                    }
                    Request::Seeded { ty, .. } => context.resolve(&Request::Type(*ty)),
                    _ => Ok(Specimen::NoSpecimen),
                }
            },
        ))
    }

    #[test]
    fn test_throwing_behavior_reports_path() {
        let graph = ThrowingRecursionBehavior::new().transform(looping());
        let models = ModelCache::new();
        let context = SpecimenContext::new(graph.as_ref(), &models);

        let error = context.resolve(&Request::of::<u8>()).unwrap_err();
        assert!(error.is_recursion());
        match error {
            FixtureError::Recursion { request, path } => {
                assert_eq!(request, "u8");
                assert_eq!(path, vec!["u8", "u8 (seed 1)", "u8"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_depth_allows_repeated_requests() {
        let graph = ThrowingRecursionBehavior::with_depth(3)
            .unwrap()
            .transform(looping());
        let models = ModelCache::new();
        let context = SpecimenContext::new(graph.as_ref(), &models);

        match context.resolve(&Request::of::<u8>()).unwrap_err() {
            FixtureError::Recursion { path, .. } => assert_eq!(path.len(), 7),
            other => panic!("unexpected error: {}", other),
        }
        assert!(ThrowingRecursionBehavior::with_depth(0).is_err());
        assert!(OmitOnRecursionBehavior::with_depth(0).is_err());
    }

    #[test]
    fn test_omit_behavior_omits() {
        let graph = OmitOnRecursionBehavior::new().transform(looping());
        let models = ModelCache::new();
        let context = SpecimenContext::new(graph.as_ref(), &models);

        assert!(context.resolve(&Request::of::<u8>()).unwrap().is_omitted());
    }

    #[test]
    fn test_stack_unwinds_between_resolutions() {
        let inner = CompositeBuilder::new().with(DelegatingBuilder::new(
            |request: &Request, _context: &SpecimenContext<'_>| {
                Ok(if request.is_for_type(&crate::reflect::TypeKey::of::<u8>()) {
                    Specimen::of(1u8)
                } else {
                    Specimen::NoSpecimen
                })
            },
        ));
        let graph = ThrowingRecursionBehavior::new().transform(Box::new(inner));
        let models = ModelCache::new();
        let context = SpecimenContext::new(graph.as_ref(), &models);

        for _ in 0..3 {
            assert_eq!(context.create::<u8>().unwrap(), 1);
        }
    }

    #[test]
    fn test_tracing_behavior_is_transparent() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();

        let graph = TracingBehavior.transform(Box::new(DelegatingBuilder::new(
            |_: &Request, _: &SpecimenContext<'_>| Ok(Specimen::of(5u8)),
        )));
        let models = ModelCache::new();
        let context = SpecimenContext::new(graph.as_ref(), &models);
        assert_eq!(context.create::<u8>().unwrap(), 5);
        assert!(!TracingBehavior.guards_recursion());
        assert!(OmitOnRecursionBehavior::new().guards_recursion());
    }
}
