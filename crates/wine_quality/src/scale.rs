//! Min-max scaling fitted on the imputed training partition
//!
//! Maps `v` to `(v - min) / (max - min)` with bounds from training data only.
//! Inputs outside the training bounds map outside `[0, 1]` unless clamping is
//! enabled.

use crate::config::{DegeneratePolicy, ScalingConfig};
use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Training bounds of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureBounds {
    pub min: f64,
    pub max: f64,
}

impl FeatureBounds {
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Bounds learned by [`MinMaxScaler::fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingState {
    pub bounds: Vec<FeatureBounds>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinMaxScaler {
    config: ScalingConfig,
    state: Option<ScalingState>,
}

impl MinMaxScaler {
    pub fn new(config: ScalingConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Learn per-feature bounds. `names` labels features in error messages.
    pub fn fit(&mut self, rows: &[Vec<f64>], names: &[String]) -> Result<&mut Self> {
        let Some(first) = rows.first() else {
            return Err(PipelineError::InsufficientData(
                "cannot fit scaler on an empty training set".to_string(),
            ));
        };

        let mut bounds: Vec<FeatureBounds> = first
            .iter()
            .map(|&v| FeatureBounds { min: v, max: v })
            .collect();

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != bounds.len() {
                return Err(PipelineError::InvalidInput(format!(
                    "training row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    bounds.len()
                )));
            }
            for (b, &v) in bounds.iter_mut().zip(row) {
                b.min = b.min.min(v);
                b.max = b.max.max(v);
            }
        }

        for (j, b) in bounds.iter().enumerate() {
            if !b.is_degenerate() {
                continue;
            }
            let feature = names
                .get(j)
                .cloned()
                .unwrap_or_else(|| format!("#{}", j));
            match self.config.degenerate {
                DegeneratePolicy::Reject => {
                    return Err(PipelineError::DegenerateFeature {
                        feature,
                        value: b.min,
                    });
                }
                DegeneratePolicy::Zero => {
                    warn!(
                        "Feature '{}' is constant ({}) in training data; scaling it to 0.0",
                        feature, b.min
                    );
                }
            }
        }

        self.state = Some(ScalingState { bounds });
        Ok(self)
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        let state = self.state()?;
        if row.len() != state.bounds.len() {
            return Err(PipelineError::InvalidInput(format!(
                "expected {} feature values, got {}",
                state.bounds.len(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .zip(&state.bounds)
            .map(|(&v, b)| {
                // Only reachable under DegeneratePolicy::Zero
                if b.is_degenerate() {
                    return 0.0;
                }
                let scaled = (v - b.min) / (b.max - b.min);
                if self.config.clamp {
                    scaled.clamp(0.0, 1.0)
                } else {
                    scaled
                }
            })
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    pub fn state(&self) -> Result<&ScalingState> {
        self.state.as_ref().ok_or(PipelineError::NotFitted("scaler"))
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
