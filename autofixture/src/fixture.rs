//! The fixture: composition root of the specimen pipeline.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::behavior::{Behavior, ThrowingRecursionBehavior};
use crate::builder::{Postprocessor, SpecimenBuilder, SpecimenBuilderExt, first_specimen};
use crate::composer::Composer;
use crate::config::FixtureConfig;
use crate::context::SpecimenContext;
use crate::customization::Customization;
use crate::error::{FixtureError, Result};
use crate::freeze::{FreezeOnMatchCustomization, FrozenBuilder, Matching};
use crate::method::{MethodInvoker, MethodQuery};
use crate::populate::AutoPropertiesCommand;
use crate::primitives::{
    BooleanSwitch, CharSequenceGenerator, RandomNumericSequenceGenerator, StringGenerator,
    UuidGenerator,
};
use crate::reflect::{ModelCache, ParameterList, Reflect, TypeKey};
use crate::relays::{
    CollectionRelay, EnumGenerator, FieldRequestRelay, FiniteSequenceRelay, MultipleRelay,
    ParameterRequestRelay, PropertyRequestRelay, SeedIgnoringRelay, StringSeedRelay,
};
use crate::request::Request;
use crate::rng::{DefaultRngProvider, RngProvider, SharedRng};
use crate::specification::ExactTypeSpecification;
use crate::value::{Seed, Specimen, Value};

/// Creates anonymous specimens of arbitrary types
///
/// Every request goes through one ordered pipeline:
///
/// 1. customizations, most recently added first;
/// 2. the engine: primitive generators and relays;
/// 3. construction through the selected constructor or factory, followed by
///    auto-population of members;
/// 4. residue collectors, consulted only when everything else declined.
///
/// The pipeline is wrapped by the fixture's behaviors, by default a guard
/// that fails on recursive request graphs.
///
/// # Examples
///
/// ```rust
/// use autofixture::{Fixture, Specimen};
///
/// #[derive(Debug, Specimen)]
/// struct Customer {
///     name: String,
///     orders: Vec<u32>,
/// }
///
/// let fixture = Fixture::new();
/// let customer: Customer = fixture.create().unwrap();
/// assert!(customer.name.starts_with("name"));
/// assert_eq!(customer.orders.len(), 3);
///
/// let names: Vec<String> = fixture.create_many_seeded("tag").unwrap();
/// assert_eq!(names.len(), 3);
/// assert_ne!(names[0], names[1]);
/// ```
pub struct Fixture {
    config: FixtureConfig,
    customizations: Vec<Box<dyn SpecimenBuilder>>,
    engine: Vec<Box<dyn SpecimenBuilder>>,
    residue_collectors: Vec<Box<dyn SpecimenBuilder>>,
    behaviors: Vec<Box<dyn Behavior>>,
    models: ModelCache,
    rng: SharedRng,
    invoker: MethodInvoker,
}

impl Fixture {
    /// Create a fixture with the default configuration
    pub fn new() -> Self {
        Self::assemble(FixtureConfig::default(), ThrowingRecursionBehavior::new())
    }

    /// Create a fixture from a validated configuration
    pub fn with_config(config: FixtureConfig) -> Result<Self> {
        config.validate()?;
        let recursion = ThrowingRecursionBehavior::with_depth(config.recursion_depth)?;
        Ok(Self::assemble(config, recursion))
    }

    fn assemble(config: FixtureConfig, recursion: ThrowingRecursionBehavior) -> Self {
        let rng = DefaultRngProvider.create_shared(config.seed);
        let engine: Vec<Box<dyn SpecimenBuilder>> = vec![
            Box::new(RandomNumericSequenceGenerator::new(Rc::clone(&rng))),
            Box::new(StringGenerator::new(Rc::clone(&rng))),
            Box::new(BooleanSwitch::default()),
            Box::new(CharSequenceGenerator::default()),
            Box::new(UuidGenerator::new(Rc::clone(&rng))),
            Box::new(StringSeedRelay),
            Box::new(ParameterRequestRelay),
            Box::new(PropertyRequestRelay),
            Box::new(FieldRequestRelay),
            Box::new(FiniteSequenceRelay),
            Box::new(CollectionRelay),
            Box::new(EnumGenerator::new()),
            Box::new(SeedIgnoringRelay),
        ];

        Self {
            config,
            customizations: Vec::new(),
            engine,
            residue_collectors: Vec::new(),
            behaviors: vec![Box::new(recursion)],
            models: ModelCache::new(),
            rng,
            invoker: MethodInvoker::default(),
        }
    }

    /// Compose the pipeline for one resolution and hand it to `run`
    fn with_graph<R>(
        &self,
        front: Option<&dyn SpecimenBuilder>,
        run: impl FnOnce(&dyn SpecimenBuilder) -> R,
    ) -> R {
        let multiple = MultipleRelay::new(self.config.repeat_count);
        let construction = Postprocessor::new(&self.invoker, AutoPropertiesCommand);

        let mut builders: Vec<&dyn SpecimenBuilder> = Vec::with_capacity(
            self.customizations.len() + self.engine.len() + self.residue_collectors.len() + 3,
        );
        if let Some(front) = front {
            builders.push(front);
        }
        for builder in &self.customizations {
            builders.push(builder.as_ref());
        }
        for builder in &self.engine {
            builders.push(builder.as_ref());
        }
        builders.push(&multiple);
        builders.push(&construction);
        for builder in &self.residue_collectors {
            builders.push(builder.as_ref());
        }

        let mut graph: Box<dyn SpecimenBuilder + '_> = Box::new(Chain { builders });
        for behavior in &self.behaviors {
            graph = behavior.transform(graph);
        }
        run(graph.as_ref())
    }

    fn context<'a>(
        &self,
        graph: &'a dyn SpecimenBuilder,
        models: &'a ModelCache,
    ) -> SpecimenContext<'a> {
        SpecimenContext::new(graph, models).with_auto_properties(!self.config.omit_auto_properties)
    }

    /// Resolve a raw request through the pipeline
    ///
    /// Unlike the `create` family, a request nobody can satisfy is returned
    /// as [`Specimen::NoSpecimen`] instead of an error.
    pub fn resolve(&self, request: &Request) -> Result<Specimen> {
        self.with_graph(None, |graph| {
            self.context(graph, &self.models).resolve(request)
        })
    }

    /// Resolve a root request, consulting `front` before anything else
    pub(crate) fn resolve_root(
        &self,
        front: Option<&dyn SpecimenBuilder>,
        request: &Request,
    ) -> Result<Value> {
        self.with_graph(front, |graph| {
            let tracker = PathTracker::new(graph);
            let context = self.context(&tracker, &self.models);
            match context.resolve(request)? {
                Specimen::Value(value) => Ok(value),
                Specimen::NoSpecimen | Specimen::Omit => Err(tracker.unresolved(request)),
            }
        })
    }

    fn create_from<T: Reflect>(&self, request: &Request) -> Result<T> {
        self.resolve_root(None, request)?.into_typed()
    }

    fn create_sequence<T: Reflect>(&self, request: &Request) -> Result<Vec<T>> {
        let values = self.resolve_root(None, request)?.into_typed::<Vec<Value>>()?;
        values.into_iter().map(Value::into_typed).collect()
    }

    /// Create an anonymous `T`
    pub fn create<T: Reflect>(&self) -> Result<T> {
        self.create_from(&Request::of::<T>())
    }

    /// Create an anonymous `T` from a seed
    ///
    /// Seeded strings start with the seed text.
    pub fn create_seeded<T: Reflect>(&self, seed: impl Into<Seed>) -> Result<T> {
        self.create_from(&Request::seeded::<T>(seed))
    }

    /// Create as many anonymous `T`s as the repeat count
    pub fn create_many<T: Reflect>(&self) -> Result<Vec<T>> {
        self.create_sequence(&Request::multiple(Request::of::<T>()))
    }

    /// Create as many seeded `T`s as the repeat count
    pub fn create_many_seeded<T: Reflect>(&self, seed: impl Into<Seed>) -> Result<Vec<T>> {
        self.create_sequence(&Request::multiple(Request::seeded::<T>(seed)))
    }

    /// Create exactly `count` anonymous `T`s
    pub fn create_many_count<T: Reflect>(&self, count: usize) -> Result<Vec<T>> {
        self.create_sequence(&Request::finite_sequence(Request::of::<T>(), count))
    }

    /// Create exactly `count` seeded `T`s
    pub fn create_many_seeded_count<T: Reflect>(
        &self,
        seed: impl Into<Seed>,
        count: usize,
    ) -> Result<Vec<T>> {
        self.create_sequence(&Request::finite_sequence(Request::seeded::<T>(seed), count))
    }

    /// Describe a one-off build of `T`
    pub fn build<T: Reflect>(&self) -> Composer<'_, T> {
        let model = self.models.model(&TypeKey::of::<T>());
        Composer::create_for(Some(self), model, !self.config.omit_auto_properties)
    }

    /// Change how every subsequent `T` is built
    ///
    /// # Examples
    ///
    /// ```rust
    /// use autofixture::{Fixture, Specimen};
    ///
    /// #[derive(Debug, Default, Specimen)]
    /// #[specimen(default)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// let mut fixture = Fixture::new();
    /// fixture
    ///     .customize::<Server, _>(|c| c.with("host", "localhost".to_string()))
    ///     .unwrap();
    ///
    /// let servers: Vec<Server> = fixture.create_many().unwrap();
    /// assert!(servers.iter().all(|server| server.host == "localhost"));
    /// ```
    pub fn customize<T, F>(&mut self, compose: F) -> Result<&mut Self>
    where
        T: Reflect,
        F: FnOnce(Composer<'static, T>) -> Composer<'static, T>,
    {
        let model = self.models.model(&TypeKey::of::<T>());
        let composer = compose(Composer::create_for(
            None,
            model,
            !self.config.omit_auto_properties,
        ));
        let builder = composer.into_builder()?;
        tracing::debug!(ty = %TypeKey::of::<T>(), "customizing");
        self.insert_customization(builder);
        Ok(self)
    }

    /// Apply a customization
    pub fn customize_with(&mut self, customization: impl Customization) -> Result<&mut Self> {
        customization.customize(self)?;
        Ok(self)
    }

    /// Build every `T` with `factory`, without populating its members
    pub fn register<T, F>(&mut self, factory: F) -> Result<&mut Self>
    where
        T: Reflect,
        F: Fn() -> T + 'static,
    {
        tracing::debug!(ty = %TypeKey::of::<T>(), "registering a factory");
        self.customize::<T, _>(|composer| composer.from_factory(factory).omit_auto_properties())
    }

    /// Build every `T` with `factory`, resolving its arguments through the fixture
    pub fn register_with<A, T, F>(&mut self, factory: F) -> Result<&mut Self>
    where
        A: ParameterList,
        T: Reflect,
        F: Fn(A) -> T + 'static,
    {
        tracing::debug!(ty = %TypeKey::of::<T>(), "registering a factory");
        self.customize::<T, _>(|composer| {
            composer
                .from_factory_with(factory)
                .omit_auto_properties()
        })
    }

    /// Answer every request for `T` with a clone of `value`
    pub fn inject<T: Reflect + Clone>(&mut self, value: T) -> &mut Self {
        tracing::debug!(ty = %TypeKey::of::<T>(), "injecting a value");
        self.insert_customization(
            FrozenBuilder::new(value).filtered(ExactTypeSpecification::of::<T>()),
        );
        self
    }

    /// Create a `T` and answer every later request for `T` with a clone of it
    ///
    /// ```rust
    /// use std::rc::Rc;
    ///
    /// use autofixture::Fixture;
    ///
    /// let mut fixture = Fixture::new();
    /// let frozen: Rc<String> = fixture.freeze().unwrap();
    /// let again: Rc<String> = fixture.create().unwrap();
    /// assert!(Rc::ptr_eq(&frozen, &again));
    /// ```
    pub fn freeze<T: Reflect + Clone>(&mut self) -> Result<T> {
        self.freeze_matching(FreezeOnMatchCustomization::new(Matching::EXACT_TYPE))
    }

    /// Like [`freeze`](Fixture::freeze), creating the value from a seed
    pub fn freeze_seeded<T: Reflect + Clone>(&mut self, seed: impl Into<Seed>) -> Result<T> {
        self.freeze_matching(FreezeOnMatchCustomization::new(Matching::EXACT_TYPE).with_seed(seed))
    }

    /// Freeze a value for the requests selected by `customization`
    pub fn freeze_matching<T: Reflect + Clone>(
        &mut self,
        customization: FreezeOnMatchCustomization<T>,
    ) -> Result<T> {
        customization.freeze(self)
    }

    /// Add a builder in front of every other customization
    pub fn insert_customization<B: SpecimenBuilder + 'static>(&mut self, builder: B) {
        self.customizations.insert(0, Box::new(builder));
    }

    /// Customization builders, highest priority first
    pub fn customizations_mut(&mut self) -> &mut Vec<Box<dyn SpecimenBuilder>> {
        &mut self.customizations
    }

    /// The default generators and relays, in order
    pub fn engine_mut(&mut self) -> &mut Vec<Box<dyn SpecimenBuilder>> {
        &mut self.engine
    }

    /// Builders consulted after everything else declined
    pub fn residue_collectors_mut(&mut self) -> &mut Vec<Box<dyn SpecimenBuilder>> {
        &mut self.residue_collectors
    }

    /// Behaviors, innermost first
    pub fn behaviors(&self) -> &[Box<dyn Behavior>] {
        &self.behaviors
    }

    pub fn behaviors_mut(&mut self) -> &mut Vec<Box<dyn Behavior>> {
        &mut self.behaviors
    }

    /// Replace the recursion guard
    ///
    /// ```rust
    /// use autofixture::{Fixture, OmitOnRecursionBehavior};
    ///
    /// let mut fixture = Fixture::new();
    /// fixture.set_recursion_behavior(OmitOnRecursionBehavior::new());
    /// assert_eq!(fixture.behaviors().len(), 1);
    /// ```
    pub fn set_recursion_behavior(&mut self, behavior: impl Behavior + 'static) -> &mut Self {
        self.behaviors.retain(|existing| !existing.guards_recursion());
        self.behaviors.push(Box::new(behavior));
        self
    }

    /// Number of elements produced for "many" requests
    pub fn repeat_count(&self) -> usize {
        self.config.repeat_count
    }

    pub fn set_repeat_count(&mut self, repeat_count: usize) -> &mut Self {
        self.config.repeat_count = repeat_count;
        self
    }

    /// Whether members are left alone after construction
    pub fn omit_auto_properties(&self) -> bool {
        self.config.omit_auto_properties
    }

    pub fn set_omit_auto_properties(&mut self, omit: bool) -> &mut Self {
        self.config.omit_auto_properties = omit;
        self
    }

    /// Select constructors of every type not customized otherwise with `query`
    pub fn set_constructor_query(&mut self, query: Rc<dyn MethodQuery>) -> &mut Self {
        self.invoker = MethodInvoker::new(query);
        self
    }

    /// The fixture's model cache
    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    /// The random number generator shared by the fixture's generators
    pub fn rng(&self) -> SharedRng {
        Rc::clone(&self.rng)
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("config", &self.config)
            .field("customizations", &self.customizations.len())
            .field("engine", &self.engine.len())
            .field("residue_collectors", &self.residue_collectors.len())
            .field("behaviors", &self.behaviors.len())
            .field("models", &self.models)
            .finish()
    }
}

/// The ordered builders of one resolution
struct Chain<'a> {
    builders: Vec<&'a dyn SpecimenBuilder>,
}

impl SpecimenBuilder for Chain<'_> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        first_specimen(self.builders.iter().copied(), request, context)
    }
}

/// Remembers the deepest request path that ended without a specimen
///
/// A path is forgotten as soon as one of its requests is resolved after all.
struct PathTracker<'a> {
    inner: &'a dyn SpecimenBuilder,
    stack: RefCell<Vec<Request>>,
    deepest: RefCell<Vec<Request>>,
}

impl<'a> PathTracker<'a> {
    fn new(inner: &'a dyn SpecimenBuilder) -> Self {
        Self {
            inner,
            stack: RefCell::new(Vec::new()),
            deepest: RefCell::new(Vec::new()),
        }
    }

    fn unresolved(&self, root: &Request) -> FixtureError {
        let deepest = self.deepest.borrow();
        match deepest.last() {
            Some(innermost) => FixtureError::object_creation(innermost, &deepest),
            None => FixtureError::object_creation(root, std::slice::from_ref(root)),
        }
    }
}

impl SpecimenBuilder for PathTracker<'_> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        self.stack.borrow_mut().push(request.clone());
        let result = self.inner.create(request, context);

        {
            let stack = self.stack.borrow();
            let mut deepest = self.deepest.borrow_mut();
            match &result {
                Ok(Specimen::NoSpecimen) => {
                    if stack.len() > deepest.len() {
                        *deepest = stack.to_vec();
                    }
                }
                // recovered
                Ok(_) if deepest.starts_with(&stack) => deepest.clear(),
                _ => {}
            }
        }
        self.stack.borrow_mut().pop();
        result
    }
}
