//! Integration tests for the fitted wine quality pipeline
//!
//! Builds pipelines from on-disk CSV fixtures and checks the end-to-end
//! contracts: split proportions, train-only statistics, lookup and predict.

use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;
use wine_quality::{
    Dataset, DatasetConfig, DegeneratePolicy, FittedPipeline, Label, MeanImputer,
    PipelineConfig, PipelineError,
};

const WINE_FEATURES: [&str; 11] = [
    "fixed acidity",
    "volatile acidity",
    "citric acid",
    "residual sugar",
    "chlorides",
    "free sulfur dioxide",
    "total sulfur dioxide",
    "density",
    "pH",
    "sulphates",
    "alcohol",
];

/// Synthetic wine table: one row per quality score, no id column.
/// Feature `j` of row `r` is `(j + 1) * (1 + r / 10)`, so every column varies.
fn wine_csv(qualities: &[u32], missing: &[(usize, usize)]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{},quality", WINE_FEATURES.join(","))?;

    for (r, quality) in qualities.iter().enumerate() {
        let cells: Vec<String> = (0..WINE_FEATURES.len())
            .map(|j| {
                if missing.contains(&(r, j)) {
                    String::new()
                } else {
                    format!("{}", (j + 1) as f64 * (1.0 + r as f64 / 10.0))
                }
            })
            .collect();
        writeln!(file, "{},{}", cells.join(","), quality)?;
    }

    file.flush()?;
    Ok(file)
}

/// 6 records with quality 7 and 4 with quality 4
fn ten_record_csv() -> Result<NamedTempFile> {
    wine_csv(&[7, 4, 7, 7, 4, 7, 4, 7, 4, 7], &[])
}

fn load(file: &NamedTempFile) -> Result<Dataset> {
    Ok(Dataset::from_csv(file.path(), &DatasetConfig::default())?)
}

#[test]
fn test_ten_record_stratified_split() -> Result<()> {
    let file = ten_record_csv()?;
    let dataset = load(&file)?;
    let labels = dataset.labels();
    let pipeline = FittedPipeline::build(dataset, &PipelineConfig::default())?;

    let split = pipeline.split();
    let good = |idx: &[usize]| idx.iter().filter(|&&i| labels[i] == Label::Good).count();

    assert_eq!(split.train.len(), 8);
    assert_eq!(split.test.len(), 2);
    assert_eq!(good(&split.train), 5);
    assert_eq!(split.train.len() - good(&split.train), 3);
    assert_eq!(good(&split.test), 1);
    assert_eq!(split.test.len() - good(&split.test), 1);
    Ok(())
}

#[test]
fn test_synthesized_ids_and_lookup() -> Result<()> {
    let file = ten_record_csv()?;
    let dataset = load(&file)?;
    assert!(dataset.ids_synthesized);

    let expected: Vec<Vec<Option<f64>>> = dataset.records.iter().map(|r| r.features.clone()).collect();
    let pipeline = FittedPipeline::build(dataset, &PipelineConfig::default())?;

    let ids: Vec<i64> = pipeline.lookup_index().ids().collect();
    assert_eq!(ids, (0..10).collect::<Vec<i64>>());

    for (id, raw) in expected.iter().enumerate() {
        assert_eq!(pipeline.lookup(id as i64)?, raw.as_slice());
    }
    assert_eq!(pipeline.lookup(99999), Err(PipelineError::NotFound(99999)));
    Ok(())
}

#[test]
fn test_lookup_then_predict_round_trip() -> Result<()> {
    let file = wine_csv(
        &[5, 6, 7, 4, 5, 6, 8, 3, 6, 5, 7, 5, 6, 4, 7],
        &[(0, 3), (4, 8), (9, 0), (9, 10)],
    )?;
    let pipeline = FittedPipeline::build(load(&file)?, &PipelineConfig::default())?;

    let ids: Vec<i64> = pipeline.lookup_index().ids().collect();
    for id in ids {
        let raw = pipeline.lookup(id)?;
        pipeline.predict(raw)?;
    }

    // Missing slots survive lookup untouched
    assert_eq!(pipeline.lookup(9)?[0], None);
    Ok(())
}

#[test]
fn test_wrong_length_is_invalid_input() -> Result<()> {
    let file = ten_record_csv()?;
    let pipeline = FittedPipeline::build(load(&file)?, &PipelineConfig::default())?;
    assert_eq!(pipeline.schema().len(), 11);

    let ten_values = vec![Some(1.0); 10];
    assert!(matches!(
        pipeline.predict(&ten_values),
        Err(PipelineError::InvalidInput(_))
    ));

    let twelve_cells = vec!["1.0"; 12];
    assert!(matches!(
        pipeline.predict_text(&twelve_cells),
        Err(PipelineError::InvalidInput(_))
    ));
    Ok(())
}

#[test]
fn test_statistics_ignore_test_partition() -> Result<()> {
    let file = wine_csv(&[7, 4, 7, 7, 4, 7, 4, 7, 4, 7, 6, 5, 3, 8, 6], &[(2, 1)])?;
    let config = PipelineConfig::default();

    let original = load(&file)?;
    let baseline = FittedPipeline::build(original.clone(), &config)?;
    let test_idx = baseline.split().test[0];
    let train_idx = baseline.split().train[0];

    // Perturb a test-only record: fitted statistics must not move
    let mut perturbed = original.clone();
    perturbed.records[test_idx].features[0] = Some(1_000.0);
    perturbed.records[test_idx].features[1] = None;
    let rebuilt = FittedPipeline::build(perturbed, &config)?;

    assert_eq!(rebuilt.split(), baseline.split());
    assert_eq!(rebuilt.imputation_state()?, baseline.imputation_state()?);
    assert_eq!(rebuilt.scaling_state()?, baseline.scaling_state()?);
    assert_eq!(rebuilt.fingerprint(), baseline.fingerprint());

    // The advisory range does see the whole dataset
    assert_eq!(
        rebuilt.feature_range("fixed acidity").map(|r| r.max),
        Some(1_000.0)
    );

    // Perturbing a training record does move them
    let mut perturbed = original;
    perturbed.records[train_idx].features[0] = Some(1_000.0);
    let moved = FittedPipeline::build(perturbed, &config)?;
    assert_ne!(moved.imputation_state()?, baseline.imputation_state()?);
    assert_ne!(moved.scaling_state()?, baseline.scaling_state()?);
    Ok(())
}

#[test]
fn test_missing_value_gets_exact_training_mean() -> Result<()> {
    let file = wine_csv(&[7, 4, 7, 7, 4, 7, 4, 7, 4, 7], &[(0, 4), (3, 4)])?;
    let dataset = load(&file)?;
    let pipeline = FittedPipeline::build(dataset.clone(), &PipelineConfig::default())?;

    let train_rows: Vec<&[Option<f64>]> = pipeline
        .split()
        .train
        .iter()
        .map(|&i| dataset.records[i].features.as_slice())
        .collect();

    let observed: Vec<f64> = train_rows.iter().filter_map(|row| row[4]).collect();
    let expected_mean = observed.iter().sum::<f64>() / observed.len() as f64;
    assert_eq!(pipeline.imputation_state()?.means[4], expected_mean);

    let mut imputer = MeanImputer::new();
    imputer.fit(&train_rows)?;
    let mut vector = vec![Some(2.0); 11];
    vector[4] = None;
    let filled = imputer.transform(&vector)?;
    assert_eq!(filled[4], expected_mean);
    assert_eq!(filled[0], 2.0);
    Ok(())
}

#[test]
fn test_rebuild_is_reproducible() -> Result<()> {
    let file = wine_csv(&[5, 6, 7, 4, 5, 6, 8, 3, 6, 5, 7, 5, 6, 4, 7, 6, 5, 7], &[])?;
    let config = PipelineConfig::default();

    let first = FittedPipeline::build(load(&file)?, &config)?;
    let second = FittedPipeline::build(load(&file)?, &config)?;

    assert_eq!(first.split(), second.split());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.model()?, second.model()?);
    assert_eq!(first.evaluation(), second.evaluation());
    Ok(())
}

#[test]
fn test_fatal_construction_errors() -> Result<()> {
    let config = PipelineConfig::default();

    let missing = FittedPipeline::from_csv("/no/such/dir/WineQT.csv", &config);
    assert!(matches!(missing, Err(PipelineError::DataUnavailable(_))));

    let one_class = wine_csv(&[7, 7, 8, 6, 7, 7, 6, 8], &[])?;
    assert!(matches!(
        FittedPipeline::from_csv(one_class.path(), &config),
        Err(PipelineError::InsufficientData(_))
    ));

    Ok(())
}

#[test]
fn test_degenerate_feature_policy() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "alcohol,sulphates,quality")?;
    for (i, q) in [7, 4, 7, 7, 4, 7, 4, 7, 4, 7].iter().enumerate() {
        writeln!(file, "{},0.5,{}", 9.0 + i as f64 * 0.3, q)?;
    }
    file.flush()?;

    let strict = PipelineConfig::default();
    match FittedPipeline::from_csv(file.path(), &strict) {
        Err(PipelineError::DegenerateFeature { feature, value }) => {
            assert_eq!(feature, "sulphates");
            assert_eq!(value, 0.5);
        }
        other => panic!("expected DegenerateFeature, got {:?}", other.map(|_| ())),
    }

    let mut lenient = PipelineConfig::default();
    lenient.scaling.degenerate = DegeneratePolicy::Zero;
    let pipeline = FittedPipeline::from_csv(file.path(), &lenient)?;
    pipeline.predict(&[Some(10.0), Some(0.9)])?;
    Ok(())
}

#[test]
fn test_shared_across_threads() -> Result<()> {
    let file = ten_record_csv()?;
    let pipeline = std::sync::Arc::new(FittedPipeline::build(load(&file)?, &PipelineConfig::default())?);
    let expected = pipeline.predict(pipeline.lookup(3)?)?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = std::sync::Arc::clone(&pipeline);
            std::thread::spawn(move || -> wine_quality::Result<Label> {
                pipeline.predict(pipeline.lookup(3)?)
            })
        })
        .collect();

    for handle in handles {
        let label = handle.join().map_err(|_| anyhow::anyhow!("worker panicked"))??;
        assert_eq!(label, expected);
    }
    Ok(())
}
