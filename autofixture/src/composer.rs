//! Fluent composer for building or customizing one type.
//!
//! A [`Composer`] describes how instances of a type are made: which factory
//! builds them, which members receive explicit values, which members are left
//! alone and which actions run on the finished instance. It is obtained from
//! [`Fixture::build`] for a one-off build, or handed to the closure given to
//! [`Fixture::customize`] to change how the fixture builds the type from then
//! on.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::rc::Rc;

use crate::builder::SpecimenBuilder;
use crate::context::SpecimenContext;
use crate::error::{FixtureError, Result};
use crate::fixture::Fixture;
use crate::method::MethodInvoker;
use crate::populate::resolve_member;
use crate::reflect::{ParameterList, Reflect, TypeKey, TypeModel};
use crate::request::Request;
use crate::value::{Seed, Specimen, Value};

enum Factory<T> {
    Plain(Box<dyn Fn() -> T>),
    WithArgs {
        types: Vec<TypeKey>,
        build: Box<dyn Fn(Vec<Value>) -> Result<T>>,
    },
    Seeded(Box<dyn Fn(Option<&Seed>) -> T>),
}

enum Assignment {
    Provided(Box<dyn Fn() -> Value>),
    Resolved,
}

/// Fluent description of how to build a `T`
///
/// # Examples
///
/// ```rust
/// use autofixture::{Fixture, Specimen};
///
/// #[derive(Debug, Default, Specimen)]
/// #[specimen(default)]
/// struct Order {
///     id: u32,
///     customer: String,
///     notes: String,
/// }
///
/// let fixture = Fixture::new();
/// let order = fixture
///     .build::<Order>()
///     .with("id", 42u32)
///     .without("notes")
///     .perform(|order| order.customer.make_ascii_uppercase())
///     .create()
///     .unwrap();
///
/// assert_eq!(order.id, 42);
/// assert!(order.notes.is_empty());
/// assert!(order.customer.starts_with("CUSTOMER"));
/// ```
pub struct Composer<'f, T> {
    fixture: Option<&'f Fixture>,
    model: Rc<TypeModel>,
    factory: Option<Factory<T>>,
    assignments: HashMap<&'static str, Assignment>,
    excluded: HashSet<&'static str>,
    actions: Vec<Box<dyn Fn(&mut T)>>,
    auto_properties: bool,
    errors: Vec<String>,
}

impl<T: Reflect> Composer<'static, T> {
    /// Create a composer that is not bound to a fixture
    ///
    /// Such a composer can only be turned into a builder with
    /// [`into_builder`](Composer::into_builder).
    pub fn new() -> Self {
        Self::create_for(None, Rc::new(TypeKey::of::<T>().describe()), true)
    }
}

impl<T: Reflect> Default for Composer<'static, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f, T: Reflect> Composer<'f, T> {
    pub(crate) fn create_for(
        fixture: Option<&'f Fixture>,
        model: Rc<TypeModel>,
        auto_properties: bool,
    ) -> Self {
        Self {
            fixture,
            model,
            factory: None,
            assignments: HashMap::new(),
            excluded: HashSet::new(),
            actions: Vec::new(),
            auto_properties,
            errors: Vec::new(),
        }
    }

    /// Build instances with `factory` instead of a constructor
    pub fn from_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        self.factory = Some(Factory::Plain(Box::new(factory)));
        self
    }

    /// Build instances with `factory`, resolving its arguments through the fixture
    ///
    /// # Examples
    ///
    /// ```rust
    /// use autofixture::{Fixture, Specimen};
    ///
    /// #[derive(Debug, Specimen)]
    /// struct Port(u16);
    ///
    /// let fixture = Fixture::new();
    /// let port = fixture
    ///     .build::<Port>()
    ///     .from_factory_with(|(n,): (u16,)| Port(8000 + n % 1000))
    ///     .create()
    ///     .unwrap();
    /// assert!(port.0 >= 8000);
    /// ```
    pub fn from_factory_with<A, F>(mut self, factory: F) -> Self
    where
        A: ParameterList,
        F: Fn(A) -> T + 'static,
    {
        self.factory = Some(Factory::WithArgs {
            types: A::types(),
            build: Box::new(move |values| A::from_values(values).map(&factory)),
        });
        self
    }

    /// Build instances from the seed of the request, if any
    pub fn from_seed<F>(mut self, factory: F) -> Self
    where
        F: Fn(Option<&Seed>) -> T + 'static,
    {
        self.factory = Some(Factory::Seeded(Box::new(factory)));
        self
    }

    fn member_name<V: Reflect>(&mut self, member: &str) -> Option<&'static str> {
        let found = self
            .model
            .member(member)
            .map(|m| (m.name(), m.info().ty));
        match found {
            None => {
                self.errors
                    .push(format!("{} has no member `{}`", self.model.key(), member));
                None
            }
            Some((name, ty)) if ty != TypeKey::of::<V>() => {
                self.errors.push(format!(
                    "member `{}` of {} is {}, not {}",
                    name,
                    self.model.key(),
                    ty,
                    TypeKey::of::<V>()
                ));
                None
            }
            Some((name, _)) => Some(name),
        }
    }

    fn member_name_any(&mut self, member: &str) -> Option<&'static str> {
        match self.model.member(member).map(|m| m.name()) {
            Some(name) => Some(name),
            None => {
                self.errors
                    .push(format!("{} has no member `{}`", self.model.key(), member));
                None
            }
        }
    }

    fn assign(&mut self, name: &'static str, assignment: Assignment) {
        self.excluded.remove(name);
        self.assignments.insert(name, assignment);
    }

    /// Assign a clone of `value` to `member`
    pub fn with<V>(mut self, member: &str, value: V) -> Self
    where
        V: Reflect + Clone,
    {
        if let Some(name) = self.member_name::<V>(member) {
            self.assign(
                name,
                Assignment::Provided(Box::new(move || Value::new(value.clone()))),
            );
        }
        self
    }

    /// Assign the result of `factory` to `member`
    pub fn with_factory<V, F>(mut self, member: &str, factory: F) -> Self
    where
        V: Reflect,
        F: Fn() -> V + 'static,
    {
        if let Some(name) = self.member_name::<V>(member) {
            self.assign(
                name,
                Assignment::Provided(Box::new(move || Value::new(factory()))),
            );
        }
        self
    }

    /// Assign an anonymous value to `member`, even if auto-population would skip it
    pub fn with_auto(mut self, member: &str) -> Self {
        if let Some(name) = self.member_name_any(member) {
            self.assign(name, Assignment::Resolved);
        }
        self
    }

    /// Leave `member` as the factory or constructor left it
    pub fn without(mut self, member: &str) -> Self {
        if let Some(name) = self.member_name_any(member) {
            self.assignments.remove(name);
            self.excluded.insert(name);
        }
        self
    }

    /// Run `action` on every built instance, after member assignment
    pub fn perform<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut T) + 'static,
    {
        self.actions.push(Box::new(action));
        self
    }

    /// Only assign members given explicitly
    pub fn omit_auto_properties(mut self) -> Self {
        self.auto_properties = false;
        self
    }

    /// Populate every auto-populated member not given explicitly
    pub fn with_auto_properties(mut self) -> Self {
        self.auto_properties = true;
        self
    }

    /// Turn the composer into a builder for `T`
    pub fn into_builder(self) -> Result<ComposedBuilder<T>> {
        if !self.errors.is_empty() {
            return Err(FixtureError::configuration(self.errors.join("; ")));
        }
        Ok(ComposedBuilder {
            model: self.model,
            factory: self.factory,
            invoker: MethodInvoker::default(),
            assignments: self.assignments,
            excluded: self.excluded,
            actions: self.actions,
            auto_properties: self.auto_properties,
            _marker: PhantomData,
        })
    }

    fn split(self) -> Result<(&'f Fixture, ComposedBuilder<T>)> {
        let fixture = self.fixture.ok_or_else(|| {
            FixtureError::configuration("the composer is not bound to a fixture, use Fixture::build")
        })?;
        Ok((fixture, self.into_builder()?))
    }

    /// Build one instance
    pub fn create(self) -> Result<T> {
        let (fixture, builder) = self.split()?;
        fixture
            .resolve_root(Some(&builder), &Request::of::<T>())?
            .into_typed()
    }

    /// Build as many instances as the fixture's repeat count
    pub fn create_many(self) -> Result<Vec<T>> {
        let (fixture, builder) = self.split()?;
        let values = fixture
            .resolve_root(Some(&builder), &Request::multiple(Request::of::<T>()))?
            .into_typed::<Vec<Value>>()?;
        values.into_iter().map(Value::into_typed).collect()
    }
}

/// The builder produced by a [`Composer`]
///
/// Answers plain and seeded requests for `T` and declines everything else.
pub struct ComposedBuilder<T> {
    model: Rc<TypeModel>,
    factory: Option<Factory<T>>,
    invoker: MethodInvoker,
    assignments: HashMap<&'static str, Assignment>,
    excluded: HashSet<&'static str>,
    actions: Vec<Box<dyn Fn(&mut T)>>,
    auto_properties: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> ComposedBuilder<T> {
    fn instantiate(
        &self,
        seed: Option<&Seed>,
        context: &SpecimenContext<'_>,
    ) -> Result<Specimen> {
        let value = match &self.factory {
            None => return self.invoker.create(&Request::of::<T>(), context),
            Some(Factory::Plain(factory)) => Value::new(factory()),
            Some(Factory::Seeded(factory)) => Value::new(factory(seed)),
            Some(Factory::WithArgs { types, build }) => {
                let mut arguments = Vec::with_capacity(types.len());
                for ty in types {
                    match context.resolve(&Request::Type(*ty))? {
                        Specimen::Value(value) => arguments.push(value),
                        other => return Ok(other),
                    }
                }
                Value::new(build(arguments)?)
            }
        };
        Ok(Specimen::Value(value))
    }
}

impl<T: Reflect> SpecimenBuilder for ComposedBuilder<T> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let seed = match request {
            Request::Type(ty) if ty.is::<T>() => None,
            Request::Seeded { ty, seed } if ty.is::<T>() => Some(seed),
            _ => return Ok(Specimen::NoSpecimen),
        };

        let mut value = match self.instantiate(seed, context)? {
            Specimen::Value(value) => value,
            other => return Ok(other),
        };

        for member in self.model.members() {
            if self.excluded.contains(member.name()) {
                continue;
            }
            match self.assignments.get(member.name()) {
                Some(Assignment::Provided(make)) => member.assign(&mut value, make())?,
                Some(Assignment::Resolved) => {
                    resolve_member(member, &mut value, context)?;
                }
                None if self.auto_properties && member.auto_populate() => {
                    resolve_member(member, &mut value, context)?;
                }
                None => {}
            }
        }

        if let Some(instance) = value.downcast_mut::<T>() {
            for action in &self.actions {
                action(instance);
            }
        }
        Ok(Specimen::Value(value))
    }
}
