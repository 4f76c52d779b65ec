//! Generators for primitive types.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use num_traits::{Bounded, NumCast, ToPrimitive};
use rand::{Rng, RngCore};

use crate::builder::SpecimenBuilder;
use crate::context::SpecimenContext;
use crate::error::{FixtureError, Result};
use crate::reflect::{Reflect, TypeKey};
use crate::request::Request;
use crate::rng::SharedRng;
use crate::value::{Specimen, Value};

/// Default boundaries of the rolling ranges used by [`RandomNumericSequenceGenerator`]
pub const DEFAULT_NUMERIC_LIMITS: [i128; 4] = [1, 255, 32_767, 2_147_483_647];

trait Numeric: Reflect + NumCast + Bounded + Copy {}

impl<T: Reflect + NumCast + Bounded + Copy> Numeric for T {}

macro_rules! dispatch_numeric {
    ($ty:expr, $f:ident $args:tt) => {
        dispatch_numeric!(
            $ty, $f $args;
            i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
        )
    };
    ($ty:expr, $f:ident $args:tt; $($t:ty),+) => {{
        let ty: &TypeKey = $ty;
        $(
            if ty.is::<$t>() {
                Some($f::<$t> $args)
            } else
        )+
        {
            None
        }
    }};
}

fn cast<T: Numeric>(n: i128) -> Option<Value> {
    <T as NumCast>::from(n).map(Value::new)
}

fn upper_bound<T: Numeric>() -> i128 {
    T::max_value().to_i128().unwrap_or(i128::MAX)
}

/// Whether `ty` is one of the built-in numeric types
pub fn is_numeric(ty: &TypeKey) -> bool {
    dispatch_numeric!(ty, upper_bound()).is_some()
}

fn numeric_type(request: &Request) -> Option<TypeKey> {
    match request {
        Request::Type(ty) if is_numeric(ty) => Some(*ty),
        _ => None,
    }
}

/// Produces 1, 2, 3, ... across every numeric type
///
/// The counter is shared by all numeric types and restarts at 1 when the
/// next number does not fit the requested type.
#[derive(Debug)]
pub struct NumericSequenceGenerator {
    next: Cell<i128>,
}

impl NumericSequenceGenerator {
    pub fn new() -> Self {
        Self { next: Cell::new(1) }
    }
}

impl Default for NumericSequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecimenBuilder for NumericSequenceGenerator {
    fn create(&self, request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Some(ty) = numeric_type(request) else {
            return Ok(Specimen::NoSpecimen);
        };

        let value = match dispatch_numeric!(&ty, cast(self.next.get())).flatten() {
            Some(value) => {
                self.next.set(self.next.get() + 1);
                value
            }
            None => {
                self.next.set(2);
                dispatch_numeric!(&ty, cast(1)).flatten().ok_or_else(|| {
                    FixtureError::configuration(format!("{} cannot represent 1", ty))
                })?
            }
        };
        Ok(Specimen::Value(value))
    }
}

#[derive(Debug)]
struct RollingRanges {
    ranges: Vec<(i128, i128)>,
    index: usize,
    used: HashSet<i128>,
}

impl RollingRanges {
    fn new(limits: &[i128], max: i128) -> Self {
        let ranges = limits
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let low = if i == 0 { pair[0] } else { pair[0] + 1 };
                (low, pair[1].min(max))
            })
            .filter(|(low, high)| low <= high)
            .collect();
        Self {
            ranges,
            index: 0,
            used: HashSet::new(),
        }
    }

    fn next(&mut self, rng: &mut dyn rand::RngCore) -> Option<i128> {
        let &(low, high) = self.ranges.get(self.index)?;
        if self.used.len() as i128 > high - low {
            self.used.clear();
            self.index = (self.index + 1) % self.ranges.len();
            return self.next(rng);
        }

        loop {
            let candidate = rng.gen_range(low..=high);
            if self.used.insert(candidate) {
                return Some(candidate);
            }
        }
    }
}

/// Produces random numbers that do not repeat within a range
///
/// Numbers are drawn from `[1, 255]` until it is exhausted, then from
/// `[256, 32767]`, then from `[32768, 2147483647]`, after which the cycle
/// restarts. Ranges are clipped to the bounds of each numeric type and every
/// type keeps its own history.
pub struct RandomNumericSequenceGenerator {
    limits: Vec<i128>,
    rng: SharedRng,
    ranges: RefCell<HashMap<TypeId, RollingRanges>>,
}

impl RandomNumericSequenceGenerator {
    /// Create a generator with the default limits
    pub fn new(rng: SharedRng) -> Self {
        Self {
            limits: DEFAULT_NUMERIC_LIMITS.to_vec(),
            rng,
            ranges: RefCell::new(HashMap::new()),
        }
    }

    /// Create a generator with custom range boundaries
    ///
    /// At least two strictly ascending limits are required.
    pub fn with_limits(rng: SharedRng, limits: &[i128]) -> Result<Self> {
        if limits.len() < 2 {
            return Err(FixtureError::configuration(
                "at least two numeric limits are required",
            ));
        }
        if limits.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(FixtureError::configuration(
                "numeric limits must be strictly ascending",
            ));
        }
        Ok(Self {
            limits: limits.to_vec(),
            rng,
            ranges: RefCell::new(HashMap::new()),
        })
    }

    /// Range boundaries in use
    pub fn limits(&self) -> &[i128] {
        &self.limits
    }
}

impl SpecimenBuilder for RandomNumericSequenceGenerator {
    fn create(&self, request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Some(ty) = numeric_type(request) else {
            return Ok(Specimen::NoSpecimen);
        };
        let max = dispatch_numeric!(&ty, upper_bound()).unwrap_or(i128::MAX);

        let mut ranges = self.ranges.borrow_mut();
        let state = ranges
            .entry(ty.id())
            .or_insert_with(|| RollingRanges::new(&self.limits, max));

        let mut rng = self.rng.borrow_mut();
        let Some(n) = state.next(&mut *rng) else {
            return Ok(Specimen::NoSpecimen);
        };
        Ok(dispatch_numeric!(&ty, cast(n))
            .flatten()
            .map_or(Specimen::NoSpecimen, Specimen::Value))
    }
}

fn random_uuid(rng: &SharedRng) -> uuid::Uuid {
    let mut bytes = [0u8; 16];
    rng.borrow_mut().fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Produces a fresh UUID text for every `String` request
///
/// The UUIDs are drawn from the fixture's generator, so a seeded fixture
/// produces the same strings on every run.
#[derive(Clone)]
pub struct StringGenerator {
    rng: SharedRng,
}

impl StringGenerator {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

impl SpecimenBuilder for StringGenerator {
    fn create(&self, request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Type(ty) if ty.is::<String>() => {
                Ok(Specimen::of(random_uuid(&self.rng).to_string()))
            }
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Alternates `true` and `false`, starting with `true`
#[derive(Debug)]
pub struct BooleanSwitch {
    next: Cell<bool>,
}

impl Default for BooleanSwitch {
    fn default() -> Self {
        Self {
            next: Cell::new(true),
        }
    }
}

impl SpecimenBuilder for BooleanSwitch {
    fn create(&self, request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Type(ty) if ty.is::<bool>() => {
                let value = self.next.get();
                self.next.set(!value);
                Ok(Specimen::of(value))
            }
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

const FIRST_PRINTABLE: u8 = b'!';
const LAST_PRINTABLE: u8 = b'~';

/// Cycles through the printable ASCII characters `'!'..='~'`
#[derive(Debug)]
pub struct CharSequenceGenerator {
    next: Cell<u8>,
}

impl Default for CharSequenceGenerator {
    fn default() -> Self {
        Self {
            next: Cell::new(FIRST_PRINTABLE),
        }
    }
}

impl SpecimenBuilder for CharSequenceGenerator {
    fn create(&self, request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Type(ty) if ty.is::<char>() => {
                let current = self.next.get();
                let following = if current >= LAST_PRINTABLE {
                    FIRST_PRINTABLE
                } else {
                    current + 1
                };
                self.next.set(following);
                Ok(Specimen::of(char::from(current)))
            }
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Produces random v4 UUIDs
#[derive(Clone)]
pub struct UuidGenerator {
    rng: SharedRng,
}

impl UuidGenerator {
    pub fn new(rng: SharedRng) -> Self {
        Self { rng }
    }
}

impl SpecimenBuilder for UuidGenerator {
    fn create(&self, request: &Request, _context: &SpecimenContext<'_>) -> Result<Specimen> {
        match request {
            Request::Type(ty) if ty.is::<uuid::Uuid>() => Ok(Specimen::of(random_uuid(&self.rng))),
            _ => Ok(Specimen::NoSpecimen),
        }
    }
}
