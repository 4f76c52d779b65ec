//! Customizations: named, composable changes to a fixture.

use std::rc::Rc;

use crate::builder::SpecimenBuilderExt;
use crate::error::{FixtureError, Result};
use crate::fixture::Fixture;
use crate::method::{
    ArrayFavoringConstructorQuery, EnumerableFavoringConstructorQuery, GreedyConstructorQuery,
    ListFavoringConstructorQuery, MethodInvoker, MethodQuery,
};
use crate::populate::AutoPropertiesCommand;
use crate::primitives::{NumericSequenceGenerator, RandomNumericSequenceGenerator};
use crate::reflect::{Reflect, TypeKey};
use crate::relays::TypeRelay;
use crate::specification::ExactTypeSpecification;

/// Order in which customizations are applied; higher values are applied later
///
/// A customization applied later installs its builders in front of those
/// installed earlier, so it wins when both match a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomizationPriority(pub i32);

impl CustomizationPriority {
    /// Ordinary customizations
    pub const DEFAULT: Self = Self(0);
    /// Freezing customizations, applied after every ordinary one
    pub const FROZEN: Self = Self(1_000);
}

impl Default for CustomizationPriority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A reusable change to a fixture
pub trait Customization {
    /// Apply the change
    fn customize(&self, fixture: &mut Fixture) -> Result<()>;

    /// When the change is applied relative to others in the same batch
    fn priority(&self) -> CustomizationPriority {
        CustomizationPriority::DEFAULT
    }
}

impl<C: Customization + ?Sized> Customization for Box<C> {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        (**self).customize(fixture)
    }

    fn priority(&self) -> CustomizationPriority {
        (**self).priority()
    }
}

impl<C: Customization + ?Sized> Customization for &C {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        (**self).customize(fixture)
    }

    fn priority(&self) -> CustomizationPriority {
        (**self).priority()
    }
}

/// Apply customizations in ascending priority, keeping the given order among equals
pub fn apply_ordered(customizations: &[&dyn Customization], fixture: &mut Fixture) -> Result<()> {
    let mut ordered = customizations.to_vec();
    ordered.sort_by_key(|customization| customization.priority());
    for customization in ordered {
        customization.customize(fixture)?;
    }
    Ok(())
}

/// Several customizations applied as one
#[derive(Default)]
pub struct CompositeCustomization {
    customizations: Vec<Box<dyn Customization>>,
}

impl CompositeCustomization {
    pub fn new(customizations: Vec<Box<dyn Customization>>) -> Self {
        Self { customizations }
    }

    /// Add a customization
    pub fn with<C: Customization + 'static>(mut self, customization: C) -> Self {
        self.customizations.push(Box::new(customization));
        self
    }

    pub fn len(&self) -> usize {
        self.customizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customizations.is_empty()
    }
}

impl Customization for CompositeCustomization {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        let customizations: Vec<&dyn Customization> = self
            .customizations
            .iter()
            .map(|customization| customization.as_ref())
            .collect();
        apply_ordered(&customizations, fixture)
    }
}

/// Numbers become 1, 2, 3, ... across every numeric type
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericSequenceCustomization;

impl Customization for NumericSequenceCustomization {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        fixture.insert_customization(NumericSequenceGenerator::new());
        Ok(())
    }
}

/// Numbers are drawn at random from rolling ranges
///
/// This is the default numeric behavior; the customization restores it after
/// [`NumericSequenceCustomization`] or changes the range limits.
#[derive(Debug, Clone, Default)]
pub struct RandomNumericSequenceCustomization {
    limits: Option<Vec<i128>>,
}

impl RandomNumericSequenceCustomization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom range boundaries
    pub fn with_limits(limits: &[i128]) -> Self {
        Self {
            limits: Some(limits.to_vec()),
        }
    }
}

impl Customization for RandomNumericSequenceCustomization {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        let rng = fixture.rng();
        let generator = match &self.limits {
            Some(limits) => RandomNumericSequenceGenerator::with_limits(rng, limits)?,
            None => RandomNumericSequenceGenerator::new(rng),
        };
        fixture.insert_customization(generator);
        Ok(())
    }
}

/// Disables auto-population of members for every type
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitAutoPropertiesCustomization;

impl Customization for OmitAutoPropertiesCustomization {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        fixture.set_omit_auto_properties(true);
        Ok(())
    }
}

/// Changes how constructors are selected, for one type or for all of them
#[derive(Clone)]
pub struct ConstructorCustomization {
    target: Option<TypeKey>,
    query: Rc<dyn MethodQuery>,
}

impl ConstructorCustomization {
    /// Select the constructors of `T` with `query`
    pub fn for_type<T: Reflect>(query: impl MethodQuery + 'static) -> Self {
        Self {
            target: Some(TypeKey::of::<T>()),
            query: Rc::new(query),
        }
    }

    /// Select the constructors of every type with `query`
    pub fn for_all(query: impl MethodQuery + 'static) -> Self {
        Self {
            target: None,
            query: Rc::new(query),
        }
    }
}

impl Customization for ConstructorCustomization {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        let Some(target) = self.target else {
            fixture.set_constructor_query(Rc::clone(&self.query));
            return Ok(());
        };

        let invoker = MethodInvoker::new(Rc::clone(&self.query))
            .postprocessed(AutoPropertiesCommand)
            .filtered(ExactTypeSpecification::new(target));
        tracing::debug!(ty = %target, "installing a constructor query");
        fixture.insert_customization(invoker);
        Ok(())
    }
}

macro_rules! constructor_preference {
    ($(#[$doc:meta])* $name:ident => $query:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Customization for $name {
            fn customize(&self, fixture: &mut Fixture) -> Result<()> {
                ConstructorCustomization::for_all($query).customize(fixture)
            }
        }
    };
}

constructor_preference!(
    /// Prefer the constructors with the most parameters
    GreedyConstructors => GreedyConstructorQuery
);
constructor_preference!(
    /// Prefer constructors taking fixed-size arrays
    FavorArrays => ArrayFavoringConstructorQuery
);
constructor_preference!(
    /// Prefer constructors taking lists
    FavorLists => ListFavoringConstructorQuery
);
constructor_preference!(
    /// Prefer constructors taking any collection
    FavorEnumerables => EnumerableFavoringConstructorQuery
);

/// Satisfies requests for an abstraction with a concrete type
#[derive(Debug, Clone, Copy)]
pub struct TypeRelayCustomization {
    relay: TypeRelay,
}

impl TypeRelayCustomization {
    /// Build a `To` whenever a `From` is requested
    ///
    /// `To` must declare a conversion to `From`.
    pub fn new<From: Reflect, To: Reflect>() -> Self {
        Self {
            relay: TypeRelay::new::<From, To>(),
        }
    }
}

impl Customization for TypeRelayCustomization {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        let from = self.relay.from_type();
        let to = self.relay.to_type();
        if fixture.models().model(&to).conversion_to(&from).is_none() {
            return Err(FixtureError::configuration(format!(
                "{} declares no conversion to {}",
                to, from
            )));
        }
        tracing::debug!(%from, %to, "relaying requests");
        fixture.insert_customization(self.relay);
        Ok(())
    }
}

/// A customization backed by a closure
pub struct CustomizationFn<F> {
    apply: F,
    priority: CustomizationPriority,
}

impl<F: Fn(&mut Fixture) -> Result<()>> CustomizationFn<F> {
    pub fn new(apply: F) -> Self {
        Self {
            apply,
            priority: CustomizationPriority::DEFAULT,
        }
    }

    /// Change the priority of the customization
    pub fn with_priority(mut self, priority: CustomizationPriority) -> Self {
        self.priority = priority;
        self
    }
}

impl<F: Fn(&mut Fixture) -> Result<()>> Customization for CustomizationFn<F> {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        (self.apply)(fixture)
    }

    fn priority(&self) -> CustomizationPriority {
        self.priority
    }
}
