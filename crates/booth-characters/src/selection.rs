use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::CHARACTER_IDS;

/// Fallback character selection used when a request names no explicit target.
///
/// Holds its own RNG so tests can pin the outcome with a fixed seed while
/// production seeds from entropy.
#[derive(Debug)]
pub struct SelectionPolicy {
    rng: Mutex<StdRng>,
}

impl SelectionPolicy {
    /// Entropy-seeded policy for production use.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic policy; the same seed always yields the same sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Resolves a requested character id: a known explicit id wins, anything
    /// else falls back to a random pick from the closed set.
    pub fn resolve(&self, requested: Option<&str>) -> &'static str {
        if let Some(id) = requested {
            if let Some(known) = CHARACTER_IDS.iter().find(|known| **known == id) {
                return known;
            }
        }
        self.pick()
    }

    /// Picks one character id at random from the closed set.
    pub fn pick(&self) -> &'static str {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = rng.gen_range(0..CHARACTER_IDS.len());
        CHARACTER_IDS[index]
    }
}
