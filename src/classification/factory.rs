use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::hybrid::HybridClassifier;
use super::pattern_based::PatternBasedClassifier;
use super::rule_based::RuleBasedClassifier;
use super::types::{ClassificationResult, TrainingData};
use super::ErrorClassifier;
use crate::error::{Error, Result};
use crate::taxonomy::{ErrorType, ErrorTypeRegistry};
use crate::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierAlgorithm {
    RuleBased,
    PatternBased,
    Hybrid,
}

impl ClassifierAlgorithm {
    pub const ALL: [ClassifierAlgorithm; 3] = [
        ClassifierAlgorithm::RuleBased,
        ClassifierAlgorithm::PatternBased,
        ClassifierAlgorithm::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierAlgorithm::RuleBased => "rule_based",
            ClassifierAlgorithm::PatternBased => "pattern_based",
            ClassifierAlgorithm::Hybrid => "hybrid",
        }
    }

    fn default_name(&self) -> String {
        format!("{}_classifier", self.as_str())
    }
}

impl std::fmt::Display for ClassifierAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClassifierAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ClassifierAlgorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnknownAlgorithm(s.to_string()))
    }
}

/// The closed set of classifiers the factory can build.
pub enum Classifier {
    RuleBased(RuleBasedClassifier),
    PatternBased(PatternBasedClassifier),
    Hybrid(HybridClassifier),
}

impl Classifier {
    pub fn algorithm(&self) -> ClassifierAlgorithm {
        match self {
            Classifier::RuleBased(_) => ClassifierAlgorithm::RuleBased,
            Classifier::PatternBased(_) => ClassifierAlgorithm::PatternBased,
            Classifier::Hybrid(_) => ClassifierAlgorithm::Hybrid,
        }
    }
}

impl ErrorClassifier for Classifier {
    fn name(&self) -> &str {
        match self {
            Classifier::RuleBased(c) => c.name(),
            Classifier::PatternBased(c) => c.name(),
            Classifier::Hybrid(c) => c.name(),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Classifier::RuleBased(c) => c.is_fitted(),
            Classifier::PatternBased(c) => c.is_fitted(),
            Classifier::Hybrid(c) => c.is_fitted(),
        }
    }

    fn fit(&mut self, training_data: &TrainingData) -> Result<()> {
        match self {
            Classifier::RuleBased(c) => c.fit(training_data),
            Classifier::PatternBased(c) => c.fit(training_data),
            Classifier::Hybrid(c) => c.fit(training_data),
        }
    }

    fn predict(&self, message: &str, context: Option<&Context>) -> Result<ClassificationResult> {
        match self {
            Classifier::RuleBased(c) => c.predict(message, context),
            Classifier::PatternBased(c) => c.predict(message, context),
            Classifier::Hybrid(c) => c.predict(message, context),
        }
    }

    fn predict_proba(
        &self,
        message: &str,
        context: Option<&Context>,
    ) -> Result<HashMap<ErrorType, f64>> {
        match self {
            Classifier::RuleBased(c) => c.predict_proba(message, context),
            Classifier::PatternBased(c) => c.predict_proba(message, context),
            Classifier::Hybrid(c) => c.predict_proba(message, context),
        }
    }
}

pub struct ClassifierFactory;

impl ClassifierFactory {
    /// Builds an unfitted classifier. `name` defaults to `<algorithm>_classifier`.
    pub fn create_classifier(
        algorithm: &str,
        name: Option<&str>,
        registry: Arc<ErrorTypeRegistry>,
    ) -> Result<Classifier> {
        let algorithm: ClassifierAlgorithm = algorithm.parse()?;
        let name = name.map_or_else(|| algorithm.default_name(), str::to_string);

        tracing::debug!("Creating {} classifier '{}'", algorithm, name);

        Ok(match algorithm {
            ClassifierAlgorithm::RuleBased => {
                Classifier::RuleBased(RuleBasedClassifier::new(name, registry))
            }
            ClassifierAlgorithm::PatternBased => {
                Classifier::PatternBased(PatternBasedClassifier::new(name, registry))
            }
            ClassifierAlgorithm::Hybrid => {
                Classifier::Hybrid(HybridClassifier::new(name, registry))
            }
        })
    }

    pub fn get_available_algorithms() -> Vec<&'static str> {
        ClassifierAlgorithm::ALL.iter().map(|a| a.as_str()).collect()
    }
}
