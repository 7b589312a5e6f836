//! Fitted pipeline: the single owner of all trained state
//!
//! [`FittedPipeline::build`] runs load → split → impute → scale → train once
//! and returns an immutable value. Prediction and lookup take `&self`, so a
//! built pipeline can be shared across threads without locking. Rebuilding
//! means constructing a new value and replacing the old one wholesale.

use crate::classifier::GbdtClassifier;
use crate::config::PipelineConfig;
use crate::dataset::{parse_value, Dataset, Label};
use crate::errors::{PipelineError, Result};
use crate::gbdt::BoostedModel;
use crate::impute::{ImputationState, MeanImputer};
use crate::lookup::LookupIndex;
use crate::ranges::{FeatureRange, FeatureRangeIndex};
use crate::scale::{MinMaxScaler, ScalingState};
use crate::schema::FeatureSchema;
use crate::split::{stratified_split, SplitIndices};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Held-out performance computed once at build time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl EvaluationReport {
    fn record(&mut self, actual: Label, predicted: Label) {
        match (actual, predicted) {
            (Label::Good, Label::Good) => self.true_positive += 1,
            (Label::Bad, Label::Bad) => self.true_negative += 1,
            (Label::Bad, Label::Good) => self.false_positive += 1,
            (Label::Good, Label::Bad) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => (self.true_positive + self.true_negative) as f64 / n as f64,
        }
    }
}

/// Immutable, fully fitted pipeline
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    schema: FeatureSchema,
    ranges: FeatureRangeIndex,
    split: SplitIndices,
    imputer: MeanImputer,
    scaler: MinMaxScaler,
    classifier: GbdtClassifier,
    lookup: LookupIndex,
    evaluation: EvaluationReport,
    fingerprint: String,
}

impl FittedPipeline {
    /// Load the CSV at `path` and fit every stage
    pub fn from_csv<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let dataset = Dataset::from_csv(path, &config.dataset)?;
        Self::build(dataset, config)
    }

    /// Fit every stage on an already loaded dataset.
    ///
    /// Records must match the schema width and carry unique ids, as the CSV
    /// loader guarantees; hand-built datasets are checked here too.
    pub fn build(dataset: Dataset, config: &PipelineConfig) -> Result<Self> {
        check_records(&dataset)?;

        let ranges = FeatureRangeIndex::build(&dataset.schema, &dataset.records);
        let labels = dataset.labels();
        let split = stratified_split(&labels, config.split.seed)?;

        let raw_rows = |idx: &[usize]| -> Vec<&[Option<f64>]> {
            idx.iter()
                .map(|&i| dataset.records[i].features.as_slice())
                .collect()
        };
        let pick_labels = |idx: &[usize]| -> Vec<Label> { idx.iter().map(|&i| labels[i]).collect() };

        // Imputer, then scaler, then classifier; all fit on train rows only
        let mut imputer = MeanImputer::new();
        imputer.fit(&raw_rows(&split.train))?;
        let train_imputed = imputer.transform_all(&raw_rows(&split.train))?;
        info!("Fitted imputer on {} training rows", train_imputed.len());

        let mut scaler = MinMaxScaler::new(config.scaling.clone());
        scaler.fit(&train_imputed, dataset.schema.names())?;
        let train_scaled = scaler.transform_all(&train_imputed)?;
        info!("Fitted min-max scaler");

        let mut classifier = GbdtClassifier::new(config.gbdt.clone());
        classifier.fit(&train_scaled, &pick_labels(&split.train))?;

        let mut evaluation = EvaluationReport::default();
        let test_scaled = scaler.transform_all(&imputer.transform_all(&raw_rows(&split.test))?)?;
        for (row, actual) in test_scaled.iter().zip(pick_labels(&split.test)) {
            evaluation.record(actual, classifier.predict(row)?);
        }

        let fingerprint = classifier.model()?.fingerprint()?;
        info!(
            "Held-out accuracy {:.4} on {} records; model fingerprint {}",
            evaluation.accuracy(),
            evaluation.total(),
            fingerprint
        );

        let lookup = LookupIndex::build(&dataset.records);

        Ok(Self {
            schema: dataset.schema,
            ranges,
            split,
            imputer,
            scaler,
            classifier,
            lookup,
            evaluation,
            fingerprint,
        })
    }

    /// Ordered feature names
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Advisory whole-dataset range of a feature
    pub fn feature_range(&self, name: &str) -> Option<FeatureRange> {
        self.ranges.get(name)
    }

    /// Classify a raw feature vector in schema order; `None` slots are imputed
    pub fn predict(&self, raw: &[Option<f64>]) -> Result<Label> {
        self.schema.check_len(raw.len())?;
        if let Some(pos) = raw.iter().position(|v| v.is_some_and(|x| !x.is_finite())) {
            return Err(PipelineError::InvalidInput(format!(
                "value for '{}' is not a finite number",
                self.schema.names()[pos]
            )));
        }

        let imputed = self.imputer.transform(raw)?;
        let scaled = self.scaler.transform(&imputed)?;
        self.classifier.predict(&scaled)
    }

    /// Parse display-side text cells, then [`predict`](Self::predict).
    /// Blank or `NA`-like cells count as missing.
    pub fn predict_text<S: AsRef<str>>(&self, cells: &[S]) -> Result<Label> {
        self.schema.check_len(cells.len())?;

        let raw = cells
            .iter()
            .zip(self.schema.names())
            .map(|(cell, name)| {
                parse_value(cell.as_ref()).map_err(|e| {
                    PipelineError::InvalidInput(format!("value for '{}': {}", name, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.predict(&raw)
    }

    /// Raw stored vector for a record id
    pub fn lookup(&self, id: i64) -> Result<&[Option<f64>]> {
        self.lookup.lookup(id)
    }

    pub fn lookup_index(&self) -> &LookupIndex {
        &self.lookup
    }

    pub fn split(&self) -> &SplitIndices {
        &self.split
    }

    pub fn imputation_state(&self) -> Result<&ImputationState> {
        self.imputer.state()
    }

    pub fn scaling_state(&self) -> Result<&ScalingState> {
        self.scaler.state()
    }

    pub fn model(&self) -> Result<&BoostedModel> {
        self.classifier.model()
    }

    pub fn evaluation(&self) -> &EvaluationReport {
        &self.evaluation
    }

    /// BLAKE3 hex digest of the trained model
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn check_records(dataset: &Dataset) -> Result<()> {
    let width = dataset.schema.len();
    let mut seen = HashSet::with_capacity(dataset.records.len());

    for (pos, record) in dataset.records.iter().enumerate() {
        if record.features.len() != width {
            return Err(PipelineError::DataUnavailable(format!(
                "record {} (id {}) has {} feature values, schema has {}",
                pos,
                record.id,
                record.features.len(),
                width
            )));
        }
        if !seen.insert(record.id) {
            return Err(PipelineError::DataUnavailable(format!(
                "duplicate id {} at record {}",
                record.id, pos
            )));
        }
    }

    Ok(())
}
