//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Implements deterministic binary log-loss boosting with second-order
//! gradients and exact-greedy CART splits.

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Label;
use crate::errors::{PipelineError, Result};
use crate::gbdt::{BoostedModel, Tree};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Probability clamp for the initial margin and the loss
const PROB_EPS: f64 = 1e-7;

/// Lower bound on per-sample hessians
const HESSIAN_FLOOR: f64 = 1e-16;

/// GBDT training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtConfig {
    pub num_trees: usize,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    pub gamma: f64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
        }
    }
}

impl GbdtConfig {
    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_child_weight: self.min_child_weight,
            reg_lambda: self.reg_lambda,
            gamma: self.gamma,
        }
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    config: GbdtConfig,
}

impl GbdtTrainer {
    pub fn new(config: GbdtConfig) -> Self {
        Self { config }
    }

    /// Train a boosted classifier on scaled feature rows
    pub fn train(&self, features: &[Vec<f64>], labels: &[Label]) -> Result<BoostedModel> {
        let feature_count = self.check_inputs(features, labels)?;
        let n_samples = features.len();

        let targets: Vec<f64> = labels.iter().map(|l| l.as_target()).collect();
        let base_margin = self.calculate_base_margin(&targets);
        let mut margins = vec![base_margin; n_samples];

        let mut trees = Vec::with_capacity(self.config.num_trees);
        let tree_config = self.config.tree_config();

        for tree_idx in 0..self.config.num_trees {
            let (gradients, hessians) = self.calculate_gradients_hessians(&targets, &margins);

            let builder = CartBuilder::new(features, &gradients, &hessians, tree_config.clone());
            let mut tree = builder.build();
            self.shrink(&mut tree);

            // Update margins with the shrunken tree output
            for (margin, row) in margins.iter_mut().zip(features) {
                *margin += tree.evaluate(row);
            }

            debug!(
                "Tree {}/{}: {} nodes, train log-loss {:.5}",
                tree_idx + 1,
                self.config.num_trees,
                tree.nodes.len(),
                log_loss(&targets, &margins)
            );

            trees.push(tree);
        }

        info!(
            "Trained {} trees on {} samples x {} features (train log-loss {:.5})",
            trees.len(),
            n_samples,
            feature_count,
            log_loss(&targets, &margins)
        );

        Ok(BoostedModel {
            base_margin,
            trees,
            feature_count,
        })
    }

    fn check_inputs(&self, features: &[Vec<f64>], labels: &[Label]) -> Result<usize> {
        if features.is_empty() {
            return Err(PipelineError::InsufficientData(
                "cannot train on an empty training set".to_string(),
            ));
        }
        if features.len() != labels.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }

        let width = features[0].len();
        if width == 0 || width > usize::from(u16::MAX) + 1 {
            return Err(PipelineError::InvalidInput(format!(
                "unsupported feature count {}",
                width
            )));
        }
        for (i, row) in features.iter().enumerate() {
            if row.len() != width {
                return Err(PipelineError::InvalidInput(format!(
                    "training row {} has {} values, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(PipelineError::InvalidInput(format!(
                    "training row {} contains a non-finite value",
                    i
                )));
            }
        }

        Ok(width)
    }

    /// Initial margin: log-odds of the positive rate
    fn calculate_base_margin(&self, targets: &[f64]) -> f64 {
        let p = (targets.iter().sum::<f64>() / targets.len() as f64).clamp(PROB_EPS, 1.0 - PROB_EPS);
        (p / (1.0 - p)).ln()
    }

    /// Calculate gradients and hessians for log-loss
    /// gradient = p - y
    /// hessian = p * (1 - p)
    fn calculate_gradients_hessians(&self, targets: &[f64], margins: &[f64]) -> (Vec<f64>, Vec<f64>) {
        targets
            .iter()
            .zip(margins)
            .map(|(&y, &m)| {
                let p = sigmoid(m);
                (p - y, (p * (1.0 - p)).max(HESSIAN_FLOOR))
            })
            .unzip()
    }

    /// Apply the learning rate to every leaf
    fn shrink(&self, tree: &mut Tree) {
        for node in &mut tree.nodes {
            if let Some(value) = node.value.as_mut() {
                *value *= self.config.learning_rate;
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Mean binary cross-entropy of margins against {0, 1} targets
pub fn log_loss(targets: &[f64], margins: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let total: f64 = targets
        .iter()
        .zip(margins)
        .map(|(&y, &m)| {
            let p = sigmoid(m).clamp(PROB_EPS, 1.0 - PROB_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / targets.len() as f64
}
