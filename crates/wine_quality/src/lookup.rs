//! Identifier lookup of raw (unimputed, unscaled) feature vectors

use crate::dataset::Record;
use crate::errors::{PipelineError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    raw: BTreeMap<i64, Vec<Option<f64>>>,
}

impl LookupIndex {
    pub fn build(records: &[Record]) -> Self {
        let raw = records
            .iter()
            .map(|r| (r.id, r.features.clone()))
            .collect();
        Self { raw }
    }

    /// Raw feature vector for `id`, missing slots kept as `None`
    pub fn lookup(&self, id: i64) -> Result<&[Option<f64>]> {
        self.raw
            .get(&id)
            .map(Vec::as_slice)
            .ok_or(PipelineError::NotFound(id))
    }

    /// All ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.raw.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
