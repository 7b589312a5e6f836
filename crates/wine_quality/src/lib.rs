//! Wine quality classifier
//!
//! Loads a wine measurements CSV, derives a binary good/bad label from the
//! quality score, and fits a deterministic pipeline on a stratified training
//! partition: mean imputation, min-max scaling, then a boosted tree ensemble.
//!
//! Modules:
//! - `dataset`: CSV loading, id assignment and label derivation
//! - `schema`: ordered feature schema
//! - `ranges`: advisory whole-dataset feature ranges
//! - `split`: seeded stratified train/test split
//! - `impute`, `scale`: train-fitted preprocessing
//! - `cart`, `trainer`, `gbdt`, `classifier`: boosted trees
//! - `lookup`: id to raw vector index
//! - `pipeline`: the fitted, immutable pipeline

pub mod cart;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod gbdt;
pub mod impute;
pub mod lookup;
pub mod pipeline;
pub mod ranges;
pub mod scale;
pub mod schema;
pub mod split;
pub mod trainer;

pub use classifier::GbdtClassifier;
pub use config::{DatasetConfig, DegeneratePolicy, PipelineConfig, ScalingConfig, SplitConfig};
pub use dataset::{Dataset, Label, Record, QUALITY_THRESHOLD};
pub use errors::{PipelineError, Result};
pub use gbdt::BoostedModel;
pub use impute::{ImputationState, MeanImputer};
pub use lookup::LookupIndex;
pub use pipeline::{EvaluationReport, FittedPipeline};
pub use ranges::{FeatureRange, FeatureRangeIndex};
pub use scale::{FeatureBounds, MinMaxScaler, ScalingState};
pub use schema::FeatureSchema;
pub use split::{stratified_split, SplitIndices};
pub use trainer::{GbdtConfig, GbdtTrainer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
