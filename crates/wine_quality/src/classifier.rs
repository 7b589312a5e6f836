//! Fit/predict wrapper around the boosted ensemble

use crate::dataset::Label;
use crate::errors::{PipelineError, Result};
use crate::gbdt::BoostedModel;
use crate::trainer::{GbdtConfig, GbdtTrainer};

/// Binary classifier over scaled feature vectors
#[derive(Debug, Clone, Default)]
pub struct GbdtClassifier {
    config: GbdtConfig,
    model: Option<BoostedModel>,
}

impl GbdtClassifier {
    pub fn new(config: GbdtConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Train on scaled rows; replaces any previous model
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[Label]) -> Result<&mut Self> {
        let model = GbdtTrainer::new(self.config.clone()).train(features, labels)?;
        self.model = Some(model);
        Ok(self)
    }

    pub fn predict(&self, features: &[f64]) -> Result<Label> {
        self.model()?.predict(features)
    }

    pub fn model(&self) -> Result<&BoostedModel> {
        self.model
            .as_ref()
            .ok_or(PipelineError::NotFitted("classifier"))
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_before_fit() {
        let classifier = GbdtClassifier::default();
        assert!(!classifier.is_fitted());
        assert_eq!(
            classifier.predict(&[0.5]),
            Err(PipelineError::NotFitted("classifier"))
        );
    }

    #[test]
    fn test_fit_then_predict() -> Result<()> {
        let features = vec![vec![0.0], vec![0.1], vec![0.2], vec![0.8], vec![0.9], vec![1.0]];
        let labels = vec![Label::Bad, Label::Bad, Label::Bad, Label::Good, Label::Good, Label::Good];

        let mut classifier = GbdtClassifier::new(GbdtConfig {
            num_trees: 5,
            min_child_weight: 0.1,
            ..Default::default()
        });
        classifier.fit(&features, &labels)?;

        assert!(classifier.is_fitted());
        assert_eq!(classifier.predict(&[0.05])?, Label::Bad);
        assert_eq!(classifier.predict(&[0.95])?, Label::Good);
        assert!(matches!(
            classifier.predict(&[0.5, 0.5]),
            Err(PipelineError::InvalidInput(_))
        ));
        Ok(())
    }
}
