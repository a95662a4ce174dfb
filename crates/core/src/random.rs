//! Randomness as an injected capability.
//!
//! Template choice, decoration choice, hashtag sampling and worker jitter
//! all draw from a `RandomSource`, so tests can pin them with a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send + Sync {
    /// Uniform integer in `0..upper`. `upper` must be non-zero.
    fn below(&mut self, upper: usize) -> usize;

    /// Uniform integer in `low..=high`.
    fn between(&mut self, low: u64, high: u64) -> u64;
}

/// `StdRng`-backed source, seeded from the OS or from a fixed seed.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_os()
    }
}

impl RandomSource for StdRandom {
    fn below(&mut self, upper: usize) -> usize {
        self.rng.random_range(0..upper)
    }

    fn between(&mut self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }
}

/// Pick one element uniformly. `None` for an empty slice.
pub fn pick<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.below(items.len()))
}

/// Sample `count` distinct elements (partial Fisher-Yates), in draw order.
pub fn sample<'a, T>(rng: &mut dyn RandomSource, items: &'a [T], count: usize) -> Vec<&'a T> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    let count = count.min(items.len());
    for i in 0..count {
        let j = i + rng.below(indices.len() - i);
        indices.swap(i, j);
    }
    indices[..count].iter().map(|&i| &items[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seeded_sources_agree() {
        let mut a = StdRandom::seeded(7);
        let mut b = StdRandom::seeded(7);
        let xs: Vec<usize> = (0..16).map(|_| a.below(100)).collect();
        let ys: Vec<usize> = (0..16).map(|_| b.below(100)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn between_is_inclusive_and_bounded() {
        let mut rng = StdRandom::seeded(1);
        for _ in 0..200 {
            let v = rng.between(10, 30);
            assert!((10..=30).contains(&v));
        }
        assert_eq!(rng.between(5, 5), 5);
    }

    #[test]
    fn sample_without_replacement() {
        let mut rng = StdRandom::seeded(42);
        let pool = ["#a", "#b", "#c", "#d", "#e"];
        for _ in 0..50 {
            let picked = sample(&mut rng, &pool, 3);
            assert_eq!(picked.len(), 3);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), 3);
        }
        assert_eq!(sample(&mut rng, &pool, 9).len(), pool.len());
    }

    #[test]
    fn pick_empty_is_none() {
        let mut rng = StdRandom::seeded(0);
        let empty: [u8; 0] = [];
        assert!(pick(&mut rng, &empty).is_none());
        assert_eq!(pick(&mut rng, &[9]), Some(&9));
    }
}
