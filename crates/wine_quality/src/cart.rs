//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression trees over gradient/hessian statistics, as used
//! by second-order boosting:
//!
//! - leaf weight `w = -G / (H + λ)`
//! - split gain `½ [G_L²/(H_L+λ) + G_R²/(H_R+λ) - G²/(H+λ)] - γ`
//!
//! Candidate thresholds are midpoints between consecutive distinct values.
//! Equal gains are resolved by [`SplitTieBreaker`] so builds are reproducible.

use crate::deterministic::SplitTieBreaker;
use crate::gbdt::{Node, Tree};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    /// Minimum hessian sum required in each child
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum gain required to split
    pub gamma: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold, node_id),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Build a regression tree using exact-greedy CART algorithm.
///
/// `features` rows must all have the same width, at most `u16::MAX + 1`.
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(features.len(), gradients.len());
        debug_assert_eq!(features.len(), hessians.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        }
    }

    /// Build tree and return nodes
    pub fn build(&self) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.features.len()).collect();

        self.build_node(&indices, 0, &mut nodes, 0);

        Tree { nodes }
    }

    /// Recursively build tree nodes
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        node_id: usize,
    ) -> u32 {
        let current_idx = nodes.len() as u32;

        let (sum_g, sum_h) = self.sum_gradients_hessians(indices);
        let leaf_value = self.leaf_weight(sum_g, sum_h);

        // Check stopping conditions
        if depth >= self.config.max_depth || indices.len() < 2 {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices, sum_g, sum_h, node_id) else {
            nodes.push(Node::leaf(leaf_value));
            return current_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.features[i][split.feature_idx] <= split.threshold);

        // Reserve space for current node
        nodes.push(Node::split(split.feature_idx as u16, split.threshold));

        let left_id = node_id.saturating_mul(2).saturating_add(1);
        let right_id = node_id.saturating_mul(2).saturating_add(2);
        let left_idx = self.build_node(&left_indices, depth + 1, nodes, left_id);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, right_id);

        // Update current node with child indices
        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Sweep each feature in sorted order and keep the highest-gain split
    fn find_best_split(
        &self,
        indices: &[usize],
        sum_g: f64,
        sum_h: f64,
        node_id: usize,
    ) -> Option<SplitCandidate> {
        let parent_score = self.score(sum_g, sum_h);
        let mut best_split: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in 0..self.feature_count {
            let value = |i: usize| self.features[i][feature_idx];
            sorted.sort_by(|&a, &b| value(a).total_cmp(&value(b)).then(a.cmp(&b)));

            let mut g_left = 0.0;
            let mut h_left = 0.0;

            for pos in 0..sorted.len() - 1 {
                let idx = sorted[pos];
                g_left += self.gradients[idx];
                h_left += self.hessians[idx];

                let lo = value(idx);
                let hi = value(sorted[pos + 1]);
                if lo == hi {
                    continue;
                }

                let h_right = sum_h - h_left;
                if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                    continue;
                }

                let g_right = sum_g - g_left;
                let gain = 0.5
                    * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent_score)
                    - self.config.gamma;
                if gain <= 0.0 {
                    continue;
                }

                let candidate =
                    SplitCandidate::new(feature_idx, midpoint(lo, hi), gain, node_id);
                if best_split.as_ref().map_or(true, |best| candidate.beats(best)) {
                    best_split = Some(candidate);
                }
            }
        }

        best_split
    }

    /// Structure score `G² / (H + λ)`
    fn score(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.config.reg_lambda;
        if denom > 0.0 {
            g * g / denom
        } else {
            0.0
        }
    }

    /// Sum gradients and hessians for a set of samples
    fn sum_gradients_hessians(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(g, h), &idx| {
            (g + self.gradients[idx], h + self.hessians[idx])
        })
    }

    /// Calculate optimal leaf value: -G/(H+λ)
    fn leaf_weight(&self, sum_g: f64, sum_h: f64) -> f64 {
        let denom = sum_h + self.config.reg_lambda;
        if denom > 0.0 {
            -sum_g / denom
        } else {
            0.0
        }
    }
}

/// Threshold between two adjacent distinct values; falls back to `lo` when
/// the midpoint rounds onto `hi`
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi {
        mid
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_reg() -> TreeConfig {
        TreeConfig {
            max_depth: 2,
            min_child_weight: 0.0,
            reg_lambda: 0.0,
            gamma: 0.0,
        }
    }

    #[test]
    fn test_simple_tree() {
        let features = vec![vec![0.1, 0.9], vec![0.2, 0.8], vec![0.7, 0.2], vec![0.8, 0.1]];
        let gradients = vec![-1.0, -1.0, 1.0, 1.0];
        let hessians = vec![1.0; 4];

        let config = TreeConfig {
            max_depth: 1,
            ..no_reg()
        };
        let tree = CartBuilder::new(&features, &gradients, &hessians, config).build();

        // Perfect separation on feature 0 (ties with feature 1 broken by index)
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[0].feature_index, 0);
        assert!((tree.nodes[0].threshold - 0.45).abs() < 1e-12);
        assert_eq!(tree.evaluate(&[0.0, 0.0]), 1.0);
        assert_eq!(tree.evaluate(&[1.0, 0.0]), -1.0);
    }

    #[test]
    fn test_leaf_only_tree() {
        let features = vec![vec![0.5]];
        let gradients = vec![-0.5];
        let hessians = vec![0.25];

        let tree = CartBuilder::new(&features, &gradients, &hessians, TreeConfig::default()).build();

        assert_eq!(tree.nodes.len(), 1);
        // -(-0.5) / (0.25 + 1.0)
        assert_eq!(tree.nodes[0].value, Some(0.4));
    }

    #[test]
    fn test_constant_feature_never_splits() {
        let features = vec![vec![0.3]; 6];
        let gradients = vec![-1.0, 1.0, -1.0, 1.0, -1.0, 1.0];
        let hessians = vec![1.0; 6];

        let tree = CartBuilder::new(&features, &gradients, &hessians, no_reg()).build();
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_min_child_weight_blocks_split() {
        let features = vec![vec![0.0], vec![1.0]];
        let gradients = vec![-1.0, 1.0];
        let hessians = vec![0.25, 0.25];

        let config = TreeConfig {
            min_child_weight: 1.0,
            ..no_reg()
        };
        let tree = CartBuilder::new(&features, &gradients, &hessians, config).build();
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_gamma_prunes_weak_split() {
        let features = vec![vec![0.0], vec![1.0]];
        let gradients = vec![-0.1, 0.1];
        let hessians = vec![1.0, 1.0];

        let config = TreeConfig {
            gamma: 10.0,
            ..no_reg()
        };
        let tree = CartBuilder::new(&features, &gradients, &hessians, config).build();
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let gradients: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        let hessians = vec![1.0; 16];

        let tree = CartBuilder::new(&features, &gradients, &hessians, no_reg()).build();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        let lo = 1.0f64;
        let hi = f64::from_bits(lo.to_bits() + 1);
        assert_eq!(midpoint(lo, hi), lo);
    }
}
