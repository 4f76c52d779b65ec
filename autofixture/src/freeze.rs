//! Freezing: pinning one resolved value to every matching request.

use std::marker::PhantomData;

use bitflags::bitflags;

use crate::builder::{SpecimenBuilder, SpecimenBuilderExt};
use crate::context::SpecimenContext;
use crate::customization::{Customization, CustomizationPriority};
use crate::error::{FixtureError, Result};
use crate::fixture::Fixture;
use crate::reflect::{Reflect, TypeKey};
use crate::request::Request;
use crate::specification::{
    AnyTypeSpecification, ExactTypeSpecification, FieldSpecification, OrSpecification,
    ParameterSpecification, PropertySpecification,
};
use crate::value::{Seed, Specimen, Value};

bitflags! {
    /// Which requests a frozen value answers; the criteria are OR-combined
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Matching: u8 {
        /// Plain and seeded requests for the frozen type itself
        const EXACT_TYPE = 1;
        /// Requests for a base type the frozen type declares
        const DIRECT_BASE_TYPE = 1 << 1;
        /// Requests for an interface the frozen type implements
        const IMPLEMENTED_INTERFACES = 1 << 2;
        /// Constructor and factory parameters with the configured name
        const PARAMETER_NAME = 1 << 3;
        /// Properties with the configured name
        const PROPERTY_NAME = 1 << 4;
        /// Fields with the configured name
        const FIELD_NAME = 1 << 5;
        /// Parameters, properties and fields with the configured name
        const MEMBER_NAME = Self::PARAMETER_NAME.bits()
            | Self::PROPERTY_NAME.bits()
            | Self::FIELD_NAME.bits();
    }
}

impl Default for Matching {
    fn default() -> Self {
        Matching::EXACT_TYPE
    }
}

/// Creates one `T` and answers every matching request with it
///
/// The value is cloned for each request, so freezing an `Rc<T>` shares one
/// allocation between every consumer.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
///
/// use autofixture::{Fixture, FreezeOnMatchCustomization, Matching, Specimen};
///
/// #[derive(Debug, Specimen)]
/// struct Account {
///     owner: String,
/// }
///
/// #[derive(Debug, Specimen)]
/// struct Transfer {
///     from: Rc<Account>,
///     to: Rc<Account>,
/// }
///
/// let mut fixture = Fixture::new();
/// let account = fixture
///     .freeze_matching(FreezeOnMatchCustomization::<Rc<Account>>::new(Matching::EXACT_TYPE))
///     .unwrap();
/// let transfer: Transfer = fixture.create().unwrap();
/// assert!(Rc::ptr_eq(&transfer.from, &account));
/// assert!(Rc::ptr_eq(&transfer.to, &account));
/// ```
pub struct FreezeOnMatchCustomization<T> {
    matching: Matching,
    name: Option<String>,
    seed: Option<Seed>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect + Clone> FreezeOnMatchCustomization<T> {
    pub fn new(matching: Matching) -> Self {
        Self {
            matching,
            name: None,
            seed: None,
            _marker: PhantomData,
        }
    }

    /// The member name used by the name-based criteria
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Create the frozen value from a seeded request
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn matching(&self) -> Matching {
        self.matching
    }

    fn validate(&self) -> Result<()> {
        if self.matching.is_empty() {
            return Err(FixtureError::configuration(format!(
                "freezing {} needs at least one matching criterion",
                TypeKey::of::<T>()
            )));
        }
        if self.matching.intersects(Matching::MEMBER_NAME) && self.name.is_none() {
            return Err(FixtureError::configuration(format!(
                "freezing {} by member name needs a name",
                TypeKey::of::<T>()
            )));
        }
        Ok(())
    }

    fn specification(&self, fixture: &Fixture) -> OrSpecification {
        let target = TypeKey::of::<T>();
        let model = fixture.models().model(&target);
        let mut specification = OrSpecification::default();

        if self.matching.contains(Matching::EXACT_TYPE) {
            specification = specification.or(ExactTypeSpecification::new(target));
        }
        if self.matching.contains(Matching::DIRECT_BASE_TYPE) {
            let bases = model.base_types().iter().map(|c| c.target()).collect();
            specification = specification.or(AnyTypeSpecification::new(bases));
        }
        if self.matching.contains(Matching::IMPLEMENTED_INTERFACES) {
            let interfaces = model.interfaces().iter().map(|c| c.target()).collect();
            specification = specification.or(AnyTypeSpecification::new(interfaces));
        }

        let Some(name) = &self.name else {
            return specification;
        };
        let assignable: Vec<TypeKey> = std::iter::once(target)
            .chain(model.interfaces().iter().map(|c| c.target()))
            .chain(model.base_types().iter().map(|c| c.target()))
            .collect();
        for ty in assignable {
            if self.matching.contains(Matching::PARAMETER_NAME) {
                specification =
                    specification.or(ParameterSpecification::new().named(name.as_str()).of_type(ty));
            }
            if self.matching.contains(Matching::PROPERTY_NAME) {
                specification =
                    specification.or(PropertySpecification::new().named(name.as_str()).of_type(ty));
            }
            if self.matching.contains(Matching::FIELD_NAME) {
                specification =
                    specification.or(FieldSpecification::new().named(name.as_str()).of_type(ty));
            }
        }
        specification
    }

    /// Create the value, pin it into `fixture` and return a copy of it
    pub fn freeze(&self, fixture: &mut Fixture) -> Result<T> {
        self.validate()?;

        let value: T = match &self.seed {
            Some(seed) => fixture.create_seeded::<T>(seed.clone())?,
            None => fixture.create::<T>()?,
        };
        let specification = self.specification(fixture);
        tracing::debug!(
            ty = %TypeKey::of::<T>(),
            matching = ?self.matching,
            name = self.name.as_deref(),
            "freezing"
        );
        fixture.insert_customization(FrozenBuilder::new(value.clone()).filtered(specification));
        Ok(value)
    }
}

impl<T: Reflect + Clone> Customization for FreezeOnMatchCustomization<T> {
    fn customize(&self, fixture: &mut Fixture) -> Result<()> {
        self.freeze(fixture).map(|_| ())
    }

    fn priority(&self) -> CustomizationPriority {
        CustomizationPriority::FROZEN
    }
}

/// Answers requests for `T`, or for a type `T` converts to, with a clone of one value
///
/// Requests are not filtered here; pair it with a specification.
#[derive(Debug, Clone)]
pub struct FrozenBuilder<T> {
    value: T,
}

impl<T: Reflect + Clone> FrozenBuilder<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Reflect + Clone> SpecimenBuilder for FrozenBuilder<T> {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Some(ty) = request.target_type() else {
            return Ok(Specimen::NoSpecimen);
        };
        if ty.is::<T>() {
            return Ok(Specimen::of(self.value.clone()));
        }

        let model = context.model(&TypeKey::of::<T>());
        match model.conversion_to(&ty) {
            Some(conversion) => conversion
                .apply(Value::new(self.value.clone()))
                .map(Specimen::Value),
            None => Ok(Specimen::NoSpecimen),
        }
    }
}
