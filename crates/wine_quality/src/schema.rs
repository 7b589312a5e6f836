//! Ordered feature schema shared by training, inference and lookup

use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Ordered feature names, excluding the identifier and quality columns.
///
/// Fixed once derived from the dataset header. Every vector handed to the
/// imputer, scaler or classifier must have exactly `len()` slots in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(PipelineError::DataUnavailable(
                "dataset has no feature columns".to_string(),
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::DataUnavailable(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Reject vectors whose length differs from the schema
    pub fn check_len(&self, len: usize) -> Result<()> {
        if len != self.names.len() {
            return Err(PipelineError::InvalidInput(format!(
                "expected {} feature values, got {}",
                self.names.len(),
                len
            )));
        }
        Ok(())
    }
}
