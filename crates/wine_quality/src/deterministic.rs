//! Deterministic utilities for reproducible splitting and training
//!
//! Provides the seeded RNG used by the splitter and the tie-breaking order
//! used by the tree builder, so identical inputs give identical models.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Ordering;

/// Seeded RNG; reproducible for a fixed seed and `rand` version
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Deterministic tie-breaker for split selection
/// Orders candidates by (feature_idx, threshold, node_id)
#[derive(Debug, Clone, Copy)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            node_id,
        }
    }
}

impl PartialEq for SplitTieBreaker {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SplitTieBreaker {}

impl PartialOrd for SplitTieBreaker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SplitTieBreaker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = seeded_rng(42);
        let mut rng2 = seeded_rng(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen::<u64>(), rng2.gen::<u64>());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let a: Vec<u64> = (0..8).map({
            let mut rng = seeded_rng(42);
            move |_| rng.gen()
        }).collect();
        let b: Vec<u64> = (0..8).map({
            let mut rng = seeded_rng(43);
            move |_| rng.gen()
        }).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tie_breaker_ordering() {
        let t1 = SplitTieBreaker::new(0, 0.25, 0);
        let t2 = SplitTieBreaker::new(0, 0.25, 1);
        let t3 = SplitTieBreaker::new(1, 0.10, 0);
        let t4 = SplitTieBreaker::new(0, 0.50, 0);

        assert!(t1 < t2);
        assert!(t1 < t3);
        assert!(t1 < t4);
        assert!(t4 < t3);
        assert_eq!(t1, SplitTieBreaker::new(0, 0.25, 0));
    }
}
