//! Pipeline configuration
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields the reference setup: `Id`/`quality` columns, seed 42, strict
//! degenerate-feature handling and XGBoost-like boosting parameters.

use crate::errors::{PipelineError, Result};
use crate::trainer::GbdtConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column naming in the source CSV
    pub dataset: DatasetConfig,
    /// Train/test split
    pub split: SplitConfig,
    /// Min-max scaling behaviour
    pub scaling: ScalingConfig,
    /// Boosting hyperparameters
    pub gbdt: GbdtConfig,
}

/// Column naming in the source CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Identifier column; synthesized from row order when absent
    pub id_column: String,
    /// Continuous quality score column
    pub quality_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            id_column: "Id".to_string(),
            quality_column: "quality".to_string(),
        }
    }
}

/// Train/test split settings. The 80/20 ratio is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// What to do with a feature whose training min equals its max
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Fail the fit with `DegenerateFeature`
    #[default]
    Reject,
    /// Scale the feature to a constant 0.0
    Zero,
}

/// Min-max scaling behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub degenerate: DegeneratePolicy,
    /// Clamp scaled values to [0, 1]; off means out-of-range inputs pass through
    pub clamp: bool,
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: PipelineConfig = toml::from_str(&content).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        info!("Loaded pipeline configuration from {}", path.display());
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.dataset.id_column.trim().is_empty() {
            return Err(PipelineError::Config("dataset.id_column must not be empty".into()));
        }
        if self.dataset.quality_column.trim().is_empty() {
            return Err(PipelineError::Config(
                "dataset.quality_column must not be empty".into(),
            ));
        }
        if self.dataset.id_column == self.dataset.quality_column {
            return Err(PipelineError::Config(
                "dataset.id_column and dataset.quality_column must differ".into(),
            ));
        }

        let gbdt = &self.gbdt;
        if gbdt.num_trees == 0 {
            return Err(PipelineError::Config("gbdt.num_trees must be positive".into()));
        }
        if gbdt.max_depth == 0 {
            return Err(PipelineError::Config("gbdt.max_depth must be positive".into()));
        }
        if !(gbdt.learning_rate.is_finite() && gbdt.learning_rate > 0.0) {
            return Err(PipelineError::Config(format!(
                "gbdt.learning_rate must be positive, got {}",
                gbdt.learning_rate
            )));
        }
        for (name, value) in [
            ("gbdt.min_child_weight", gbdt.min_child_weight),
            ("gbdt.reg_lambda", gbdt.reg_lambda),
            ("gbdt.gamma", gbdt.gamma),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PipelineError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
