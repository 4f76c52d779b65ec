//! RNG backend integration for the random generators of a fixture.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// A random number generator shared by the generators of one fixture
pub type SharedRng = Rc<RefCell<dyn rand::RngCore>>;

/// Trait for providing random number generators
pub trait RngProvider {
    /// The type of RNG this provider creates
    type Rng: rand::RngCore + 'static;

    /// Create a new RNG instance with an optional seed
    fn create_rng(&self, seed: Option<u64>) -> Self::Rng;

    /// Create an RNG that several generators can draw from
    fn create_shared(&self, seed: Option<u64>) -> SharedRng {
        Rc::new(RefCell::new(self.create_rng(seed)))
    }
}

/// Default RNG provider using `StdRng`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRngProvider;

impl RngProvider for DefaultRngProvider {
    type Rng = StdRng;

    fn create_rng(&self, seed: Option<u64>) -> Self::Rng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
