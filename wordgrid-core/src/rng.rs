use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic source of integers in `[0, n)`.
///
/// The search reseeds it at the start of every widening pass so that a pass
/// with a larger branching cap replays the same random decisions as the
/// pass it retries.
#[derive(Debug)]
pub struct SearchRng {
    inner: StdRng,
}

impl SearchRng {
    pub fn seeded(seed: u64) -> SearchRng {
        SearchRng {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn uniform(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        self.inner.gen_range(0..n)
    }
}
