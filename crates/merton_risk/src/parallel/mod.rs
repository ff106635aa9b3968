//! Rayon-based parallelisation utilities.
//!
//! Every helper here preserves input order, so downstream results line up
//! with the inputs that produced them regardless of scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Default minimum item count before switching to the Rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// Apply `mapper` to every item on the Rayon pool; output follows input order.
pub fn parallel_map<T, R, F>(items: &[T], mapper: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(mapper).collect()
}

/// Apply `mapper` to each index in `0..n` on the Rayon pool.
pub fn parallel_map_indices<R, F>(n: usize, mapper: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    (0..n).into_par_iter().map(mapper).collect()
}

/// When a batch is large enough to fan out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Batches smaller than this run on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ParallelConfig {
    /// Threshold of `parallel_threshold` items.
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Always run sequentially.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
        }
    }

    /// Whether a batch of `n_items` goes to the pool.
    #[inline]
    pub fn should_parallelize(&self, n_items: usize) -> bool {
        self.parallel_threshold <= n_items
    }

    /// Order-preserving map, parallel only above the threshold.
    pub fn map<T, R, F>(&self, items: &[T], mapper: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if self.should_parallelize(items.len()) {
            parallel_map(items, mapper)
        } else {
            items.iter().map(mapper).collect()
        }
    }
}
