//! CSV dataset loading and label derivation
//!
//! Reads the wine table into fixed-schema records, assigns identifiers when
//! the source has none, and derives the binary quality label. Missing cells
//! are kept as `None`; only the train-fitted imputer fills them.

use crate::config::DatasetConfig;
use crate::errors::{PipelineError, Result};
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Quality scores strictly above this are labelled good
pub const QUALITY_THRESHOLD: f64 = 5.0;

/// Cell spellings treated as a missing value (compared case-insensitively)
const MISSING_MARKERS: [&str; 6] = ["", "na", "n/a", "nan", "null", "none"];

/// Binary quality label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Bad = 0,
    Good = 1,
}

impl Label {
    /// `Good` iff `quality > 5`
    pub fn from_quality(quality: f64) -> Self {
        if quality > QUALITY_THRESHOLD {
            Label::Good
        } else {
            Label::Bad
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Training target in {0.0, 1.0}
    pub fn as_target(self) -> f64 {
        f64::from(self.as_u8())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Good => write!(f, "good"),
            Label::Bad => write!(f, "bad"),
        }
    }
}

/// One wine sample as loaded from the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    /// Raw feature values in schema order; `None` marks a missing cell
    pub features: Vec<Option<f64>>,
    pub quality: f64,
    pub label: Label,
}

/// Loaded dataset with its feature schema
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub records: Vec<Record>,
    /// True when ids were assigned from row order
    pub ids_synthesized: bool,
}

impl Dataset {
    /// Load a dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P, config: &DatasetConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            PipelineError::DataUnavailable(format!("failed to open {}: {}", path.display(), e))
        })?;

        info!("Loading dataset from {}", path.display());
        Self::from_reader(file, config)
    }

    /// Load a dataset from any CSV byte stream
    pub fn from_reader<R: Read>(source: R, config: &DatasetConfig) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| PipelineError::DataUnavailable(format!("invalid header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let quality_idx = columns
            .iter()
            .position(|c| c == &config.quality_column)
            .ok_or_else(|| {
                PipelineError::DataUnavailable(format!(
                    "missing '{}' column",
                    config.quality_column
                ))
            })?;
        let id_idx = columns.iter().position(|c| c == &config.id_column);

        let feature_idx: Vec<usize> = (0..columns.len())
            .filter(|&i| i != quality_idx && Some(i) != id_idx)
            .collect();
        let schema = FeatureSchema::new(feature_idx.iter().map(|&i| columns[i].clone()).collect())?;

        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();

        for (row_idx, row) in reader.records().enumerate() {
            // Header occupies line 1
            let line = row_idx + 2;
            let row = row
                .map_err(|e| PipelineError::DataUnavailable(format!("line {}: {}", line, e)))?;

            let id = match id_idx {
                Some(i) => parse_id(cell(&row, i, line)?, line)?,
                None => row_idx as i64,
            };
            if !seen_ids.insert(id) {
                return Err(PipelineError::DataUnavailable(format!(
                    "line {}: duplicate id {}",
                    line, id
                )));
            }

            let quality = parse_value(cell(&row, quality_idx, line)?)
                .map_err(|e| {
                    PipelineError::DataUnavailable(format!(
                        "line {}, column '{}': {}",
                        line, config.quality_column, e
                    ))
                })?
                .ok_or_else(|| {
                    PipelineError::DataUnavailable(format!(
                        "line {}: missing '{}' value",
                        line, config.quality_column
                    ))
                })?;

            let features = feature_idx
                .iter()
                .map(|&i| {
                    parse_value(cell(&row, i, line)?).map_err(|e| {
                        PipelineError::DataUnavailable(format!(
                            "line {}, column '{}': {}",
                            line, columns[i], e
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            records.push(Record {
                id,
                features,
                quality,
                label: Label::from_quality(quality),
            });
        }

        if records.is_empty() {
            return Err(PipelineError::DataUnavailable(
                "dataset contains no records".to_string(),
            ));
        }

        if id_idx.is_none() {
            warn!(
                "No '{}' column; assigned ids 0..{} in row order",
                config.id_column,
                records.len() - 1
            );
        }

        let dataset = Self {
            schema,
            records,
            ids_synthesized: id_idx.is_none(),
        };

        let (bad, good) = dataset.label_counts();
        info!(
            "Loaded {} records with {} features ({} good, {} bad, {} missing cells)",
            dataset.len(),
            dataset.schema.len(),
            good,
            bad,
            dataset.missing_cells()
        );

        Ok(dataset)
    }

    /// Get number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Labels in record order
    pub fn labels(&self) -> Vec<Label> {
        self.records.iter().map(|r| r.label).collect()
    }

    /// `(bad, good)` record counts
    pub fn label_counts(&self) -> (usize, usize) {
        let good = self.records.iter().filter(|r| r.label == Label::Good).count();
        (self.records.len() - good, good)
    }

    /// Total number of missing feature cells
    pub fn missing_cells(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.features.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

/// Parse one numeric cell. Missing markers yield `Ok(None)`.
pub fn parse_value(raw: &str) -> std::result::Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return Ok(None);
    }

    let value = trimmed
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", trimmed))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", trimmed));
    }
    Ok(Some(value))
}

fn cell<'a>(row: &'a csv::StringRecord, idx: usize, line: usize) -> Result<&'a str> {
    row.get(idx).ok_or_else(|| {
        PipelineError::DataUnavailable(format!("line {}: missing column {}", line, idx + 1))
    })
}

fn parse_id(raw: &str, line: usize) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        PipelineError::DataUnavailable(format!("line {}: invalid id '{}'", line, raw.trim()))
    })
}
