use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The single source of randomness of a generation run.
///
/// Everything random in entseed goes through these primitives, so a run
/// seeded with the same value makes the same structural choices.
pub struct Chance {
    rng: StdRng,
}

impl Chance {
    /// Deterministic source for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Fair coin flip.
    pub fn coin_flip(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    /// Uniform pick from a slice; `None` when it is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            let idx = self.index(items.len());
            items.get(idx)
        }
    }

    /// Underlying generator, for value providers that take an `Rng`.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
