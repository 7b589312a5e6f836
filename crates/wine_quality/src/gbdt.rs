//! Boosted tree ensemble for binary classification
//!
//! Trees are stored as flat node arrays (node 0 is the root). The ensemble
//! output is a log-odds margin: `base_margin + Σ tree(x)`, with leaf values
//! already scaled by the learning rate. A positive margin means `Good`.

use crate::dataset::Label;
use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes send `x[feature_index] <= threshold` left, everything else
/// right. Leaf nodes carry `value` and ignore the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub feature_index: u16,
    pub threshold: f64,
    pub left: u32,
    pub right: u32,
    pub value: Option<f64>,
}

impl Node {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }

    pub fn split(feature_index: u16, threshold: f64) -> Self {
        Self {
            feature_index,
            threshold,
            left: 0,
            right: 0,
            value: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }
}

/// A single regression tree over scaled features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Evaluate this tree on a feature vector
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0; // Invalid tree structure
            };

            if let Some(value) = node.value {
                return value;
            }

            let Some(&x) = features.get(node.feature_index as usize) else {
                return 0.0;
            };

            idx = if x <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                None => 0,
                Some(n) if n.is_leaf() => 0,
                Some(n) => 1 + walk(nodes, n.left as usize).max(walk(nodes, n.right as usize)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Trained ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedModel {
    /// Initial log-odds (logit of the training base rate)
    pub base_margin: f64,
    pub trees: Vec<Tree>,
    pub feature_count: usize,
}

impl BoostedModel {
    /// Raw log-odds for one scaled feature vector
    pub fn margin(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.feature_count {
            return Err(PipelineError::InvalidInput(format!(
                "expected {} feature values, got {}",
                self.feature_count,
                features.len()
            )));
        }

        Ok(self
            .trees
            .iter()
            .fold(self.base_margin, |acc, tree| acc + tree.evaluate(features)))
    }

    /// Predicted class: `Good` iff the probability exceeds 0.5
    pub fn predict(&self, features: &[f64]) -> Result<Label> {
        Ok(if self.margin(features)? > 0.0 {
            Label::Good
        } else {
            Label::Bad
        })
    }

    /// BLAKE3 hex digest of the model's JSON form
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Ok(hex::encode(blake3::hash(&json).as_bytes()))
    }
}
