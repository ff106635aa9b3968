//! Seeded pseudo-random number generation for resampling.
//!
//! This module provides [`SeededRng`], a reproducible PRNG wrapper, and
//! [`derive_seed`], which splits one master seed into independent per-task
//! seeds. Giving every bootstrap iteration its own stream makes results
//! identical for identical master seeds regardless of how Rayon schedules
//! the iterations.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, StandardNormal};

/// SplitMix64 increment (golden ratio).
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Derive the seed of stream `index` from a master seed.
///
/// Uses the SplitMix64 finaliser, so neighbouring indices give unrelated
/// seeds.
///
/// # Examples
///
/// ```rust
/// use merton_core::rng::derive_seed;
///
/// assert_eq!(derive_seed(42, 7), derive_seed(42, 7));
/// assert_ne!(derive_seed(42, 7), derive_seed(42, 8));
/// ```
#[inline]
pub fn derive_seed(master: u64, index: u64) -> u64 {
    let mut z = master.wrapping_add(GOLDEN_GAMMA.wrapping_mul(index.wrapping_add(1)));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draw a fresh master seed from operating-system entropy.
pub fn entropy_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Reproducible random number generator.
///
/// # Examples
///
/// ```rust
/// use merton_core::rng::SeededRng;
///
/// let mut rng1 = SeededRng::from_seed(12345);
/// let mut rng2 = SeededRng::from_seed(12345);
/// assert_eq!(rng1.gen_normal(), rng2.gen_normal());
///
/// // Stream 3 of master seed 12345
/// let mut stream = SeededRng::for_stream(12345, 3);
/// let _ = stream.gen_uniform();
/// ```
#[derive(Debug, Clone)]
pub struct SeededRng {
    /// The underlying PRNG instance.
    inner: StdRng,
    /// The seed used for initialisation.
    seed: u64,
}

impl SeededRng {
    /// Creates a new RNG initialised with the given seed.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates the generator for stream `index` of `master`.
    #[inline]
    pub fn for_stream(master: u64, index: u64) -> Self {
        Self::from_seed(derive_seed(master, index))
    }

    /// Returns the seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Uniform index in `0..upper`.
    #[inline]
    pub fn gen_index(&mut self, upper: usize) -> usize {
        self.inner.gen_range(0..upper.max(1))
    }

    /// Standard normal variate.
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Normal variate with the given mean and standard deviation.
    #[inline]
    pub fn gen_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.gen_normal()
    }

    /// Normal variate redrawn until strictly positive.
    ///
    /// Returns `None` if `max_attempts` draws are all non-positive (only
    /// plausible when `mean` is many standard deviations below zero).
    pub fn gen_positive_gaussian(
        &mut self,
        mean: f64,
        std_dev: f64,
        max_attempts: usize,
    ) -> Option<f64> {
        (0..max_attempts)
            .map(|_| self.gen_gaussian(mean, std_dev))
            .find(|v| *v > 0.0)
    }

    /// Exponential variate with the given scale (mean).
    ///
    /// Returns `None` for a non-positive or non-finite scale.
    pub fn gen_exponential(&mut self, scale: f64) -> Option<f64> {
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let dist = Exp::new(1.0 / scale).ok()?;
        Some(dist.sample(&mut self.inner))
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededRng::from_seed(7);
        let mut b = SeededRng::from_seed(7);
        for _ in 0..100 {
            assert_eq!(a.gen_normal(), b.gen_normal());
        }
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_derived_seeds_are_distinct() {
        let seeds: HashSet<u64> = (0..10_000).map(|i| derive_seed(42, i)).collect();
        assert_eq!(seeds.len(), 10_000);
        assert_ne!(derive_seed(1, 0), derive_seed(2, 0));
    }

    #[test]
    fn test_stream_matches_derived_seed() {
        let rng = SeededRng::for_stream(99, 5);
        assert_eq!(rng.seed(), derive_seed(99, 5));
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = SeededRng::from_seed(1);
        for _ in 0..1000 {
            let u = rng.gen_uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = SeededRng::from_seed(2024);
        let n = 50_000;
        let draws: Vec<f64> = (0..n).map(|_| rng.gen_gaussian(3.0, 0.5)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 3.0).abs() < 0.02);
        assert!((var.sqrt() - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_positive_gaussian() {
        let mut rng = SeededRng::from_seed(3);
        for _ in 0..1000 {
            let v = rng.gen_positive_gaussian(0.05, 0.1, 1000).unwrap();
            assert!(v > 0.0);
        }
        // Practically impossible to hit a positive value
        assert!(rng.gen_positive_gaussian(-1e6, 1.0, 10).is_none());
    }

    #[test]
    fn test_exponential() {
        let mut rng = SeededRng::from_seed(4);
        let n = 20_000;
        let mean = (0..n).map(|_| rng.gen_exponential(1.5).unwrap()).sum::<f64>() / n as f64;
        assert!((mean - 1.5).abs() < 0.05);
        assert!(rng.gen_exponential(0.0).is_none());
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SeededRng::from_seed(5);
        let mut items: Vec<usize> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_reproducible() {
        let shuffled = |seed| {
            let mut items: Vec<usize> = (0..50).collect();
            SeededRng::from_seed(seed).shuffle(&mut items);
            items
        };
        assert_eq!(shuffled(11), shuffled(11));
        assert_ne!(shuffled(11), (0..50).collect::<Vec<_>>());
    }
}
