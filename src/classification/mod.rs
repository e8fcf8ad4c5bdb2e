mod common;
pub mod factory;
pub mod hybrid;
pub mod pattern_based;
pub mod retry_policy;
pub mod rule_based;
pub mod types;

use std::collections::HashMap;

pub use factory::{Classifier, ClassifierAlgorithm, ClassifierFactory};
pub use hybrid::HybridClassifier;
pub use pattern_based::{LearnedPattern, PatternBasedClassifier};
pub use retry_policy::{ClassificationDetails, ErrorClassification};
pub use rule_based::{Rule, RuleBasedClassifier};
pub use types::{ClassificationResult, TrainingData};

use crate::error::{Error, Result};
use crate::taxonomy::ErrorType;
use crate::Context;

/// Maps free-text error messages onto the error taxonomy.
///
/// Every method except `fit` fails with [`Error::NotFitted`] until the
/// classifier has been trained.
pub trait ErrorClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool;

    /// Rebuilds internal tables from scratch.
    fn fit(&mut self, training_data: &TrainingData) -> Result<()>;

    fn predict(&self, message: &str, context: Option<&Context>) -> Result<ClassificationResult>;

    fn predict_proba(
        &self,
        message: &str,
        context: Option<&Context>,
    ) -> Result<HashMap<ErrorType, f64>>;

    /// Fraction of test messages whose predicted type equals the label.
    fn score(&self, test_data: &TrainingData) -> Result<f64> {
        if !self.is_fitted() {
            return Err(Error::NotFitted(self.name().to_string()));
        }
        test_data.validate()?;

        if test_data.is_empty() {
            return Ok(0.0);
        }

        let mut correct = 0usize;
        for (message, expected) in test_data.error_messages.iter().zip(&test_data.error_types) {
            if self.predict(message, None)?.error_type == *expected {
                correct += 1;
            }
        }

        Ok(correct as f64 / test_data.len() as f64)
    }
}
