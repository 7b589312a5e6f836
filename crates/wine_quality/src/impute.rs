//! Mean imputation fitted on the training partition

use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Per-feature fill values learned by [`MeanImputer::fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationState {
    pub means: Vec<f64>,
}

/// Replaces missing slots with the training-set mean of that feature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanImputer {
    state: Option<ImputationState>,
}

impl MeanImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn per-feature means over observed training values.
    /// Refitting replaces the previous state wholesale.
    pub fn fit<R: AsRef<[Option<f64>]>>(&mut self, rows: &[R]) -> Result<&mut Self> {
        let Some(first) = rows.first() else {
            return Err(PipelineError::InsufficientData(
                "cannot fit imputer on an empty training set".to_string(),
            ));
        };
        let width = first.as_ref().len();

        let mut sums = vec![0.0f64; width];
        let mut counts = vec![0usize; width];

        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(PipelineError::InvalidInput(format!(
                    "training row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    width
                )));
            }
            for (j, value) in row.iter().enumerate() {
                if let Some(v) = value {
                    sums[j] += v;
                    counts[j] += 1;
                }
            }
        }

        let means = sums
            .iter()
            .zip(&counts)
            .enumerate()
            .map(|(j, (&sum, &count))| {
                if count == 0 {
                    Err(PipelineError::InsufficientData(format!(
                        "feature {} has no observed values in the training partition",
                        j
                    )))
                } else {
                    Ok(sum / count as f64)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        self.state = Some(ImputationState { means });
        Ok(self)
    }

    /// Fill missing slots; observed values pass through unchanged
    pub fn transform(&self, row: &[Option<f64>]) -> Result<Vec<f64>> {
        let state = self.state()?;
        if row.len() != state.means.len() {
            return Err(PipelineError::InvalidInput(format!(
                "expected {} feature values, got {}",
                state.means.len(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .zip(&state.means)
            .map(|(value, &mean)| value.unwrap_or(mean))
            .collect())
    }

    /// Transform every row
    pub fn transform_all<R: AsRef<[Option<f64>]>>(&self, rows: &[R]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform(row.as_ref())).collect()
    }

    pub fn state(&self) -> Result<&ImputationState> {
        self.state.as_ref().ok_or(PipelineError::NotFitted("imputer"))
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
