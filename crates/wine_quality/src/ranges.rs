//! Advisory per-feature ranges over the whole dataset
//!
//! Computed once, before the split, for input hints. Scaling never reads
//! these bounds; the scaler fits its own from the training partition.

use crate::dataset::Record;
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observed `(min, max)` of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// Display hint, e.g. `(Range: 4.60 - 15.90)`
    pub fn hint(&self) -> String {
        format!("(Range: {:.2} - {:.2})", self.min, self.max)
    }
}

/// Read-only `{feature name: range}` index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRangeIndex {
    ranges: BTreeMap<String, FeatureRange>,
}

impl FeatureRangeIndex {
    /// Build over every record's observed values. Features with no observed
    /// value get no entry.
    pub fn build(schema: &FeatureSchema, records: &[Record]) -> Self {
        let mut stats: Vec<Option<FeatureRange>> = vec![None; schema.len()];

        for record in records {
            for (slot, value) in stats.iter_mut().zip(&record.features) {
                let Some(v) = *value else { continue };
                *slot = Some(match *slot {
                    None => FeatureRange { min: v, max: v },
                    Some(r) => FeatureRange {
                        min: r.min.min(v),
                        max: r.max.max(v),
                    },
                });
            }
        }

        let ranges = schema
            .names()
            .iter()
            .zip(stats)
            .filter_map(|(name, range)| range.map(|r| (name.clone(), r)))
            .collect();

        Self { ranges }
    }

    pub fn get(&self, name: &str) -> Option<FeatureRange> {
        self.ranges.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
