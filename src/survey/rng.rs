//! Seeded random stream for persona generation.
//!
//! Every draw made while building a population goes through one `SurveyRng`
//! handle that the caller owns and passes down by `&mut`. The generator is
//! Xoshiro256++ seeded through SplitMix64, which is portable: the same seed
//! gives the same values on every platform. Draws use `rand` and
//! `rand_distr`, so the sequence for a seed depends only on the order of
//! calls:
//!
//! | primitive          | draw                                   |
//! |--------------------|----------------------------------------|
//! | `uniform`          | `gen_range(lo..hi)`                    |
//! | `bernoulli`        | `gen_bool(p)`                          |
//! | `gaussian`         | `StandardNormal` (ziggurat)            |
//! | `shuffle`/`choose` | `SliceRandom`                          |
//! | `sample_distinct`  | `seq::index::sample`                   |
//! | `uuid`             | 16 random bytes                        |

use rand::seq::{index, SliceRandom};
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use rand_xoshiro::Xoshiro256PlusPlus;
use uuid::Uuid;

/// The one random stream of a generation run.
#[derive(Debug, Clone)]
pub struct SurveyRng {
    inner: Xoshiro256PlusPlus,
}

impl SurveyRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform float in [lo, hi). Returns `lo` when the range is empty.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if lo < hi {
            self.inner.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// `true` with probability `p`, clamped to [0, 1].
    pub fn bernoulli(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.inner.gen_bool(p)
    }

    /// Normal draw with the given mean and standard deviation.
    pub fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.inner.sample(StandardNormal);
        mean + sd * z
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Pick one element uniformly. `None` for an empty slice (no draw made).
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// `k` distinct indices from `0..n`, `k` capped at `n`.
    pub fn sample_distinct(&mut self, n: usize, k: usize) -> Vec<usize> {
        index::sample(&mut self.inner, n, k.min(n)).into_vec()
    }

    /// Version-4 UUID whose random bits come from this stream.
    pub fn uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}
