use std::collections::HashMap;
use std::sync::Arc;

use super::pattern_based::PatternBasedClassifier;
use super::rule_based::RuleBasedClassifier;
use super::types::{ClassificationResult, TrainingData};
use super::ErrorClassifier;
use crate::error::{Error, Result};
use crate::taxonomy::{ErrorType, ErrorTypeRegistry};
use crate::Context;

pub const RULE_WEIGHT: f64 = 0.4;
pub const PATTERN_WEIGHT: f64 = 0.6;

/// Blends a rule-based and a pattern-based classifier.
///
/// The sub-result with the higher raw confidence supplies the error type.
/// Its confidence is replaced by the weighted blend and the other result's
/// evidence is appended without deduplication.
pub struct HybridClassifier {
    name: String,
    rule: RuleBasedClassifier,
    pattern: PatternBasedClassifier,
    fitted: bool,
}

impl HybridClassifier {
    pub fn new(name: impl Into<String>, registry: Arc<ErrorTypeRegistry>) -> Self {
        let name = name.into();
        Self {
            rule: RuleBasedClassifier::new(format!("{}_rule", name), Arc::clone(&registry)),
            pattern: PatternBasedClassifier::new(format!("{}_pattern", name), registry),
            name,
            fitted: false,
        }
    }

    pub fn rule_classifier(&self) -> &RuleBasedClassifier {
        &self.rule
    }

    pub fn pattern_classifier(&self) -> &PatternBasedClassifier {
        &self.pattern
    }

    fn blend(rule_confidence: f64, pattern_confidence: f64) -> f64 {
        rule_confidence * RULE_WEIGHT + pattern_confidence * PATTERN_WEIGHT
    }
}

impl ErrorClassifier for HybridClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self, training_data: &TrainingData) -> Result<()> {
        tracing::info!("Fitting {} with {} samples", self.name, training_data.len());

        self.rule.fit(training_data)?;
        self.pattern.fit(training_data)?;
        self.fitted = true;

        tracing::info!("Fitted {} with hybrid approach", self.name);
        Ok(())
    }

    fn predict(&self, message: &str, context: Option<&Context>) -> Result<ClassificationResult> {
        if !self.fitted {
            return Err(Error::NotFitted(self.name.clone()));
        }

        let rule_result = self.rule.predict(message, context)?;
        let pattern_result = self.pattern.predict(message, context)?;
        let blended = Self::blend(rule_result.confidence, pattern_result.confidence);

        let (mut base, other) = if rule_result.confidence > pattern_result.confidence {
            (rule_result, pattern_result)
        } else {
            (pattern_result, rule_result)
        };

        base.confidence = blended;
        for (key, value) in other.metadata {
            base.metadata.entry(key).or_insert(value);
        }
        base.classification_path.extend(other.classification_path);
        base.matched_patterns.extend(other.matched_patterns);
        base.suggested_actions.extend(other.suggested_actions);

        Ok(base)
    }

    fn predict_proba(
        &self,
        message: &str,
        context: Option<&Context>,
    ) -> Result<HashMap<ErrorType, f64>> {
        if !self.fitted {
            return Err(Error::NotFitted(self.name.clone()));
        }

        let rule_proba = self.rule.predict_proba(message, context)?;
        let pattern_proba = self.pattern.predict_proba(message, context)?;

        let mut combined = HashMap::new();
        for error_type in rule_proba.keys().chain(pattern_proba.keys()) {
            let rule_confidence = rule_proba.get(error_type).copied().unwrap_or(0.0);
            let pattern_confidence = pattern_proba.get(error_type).copied().unwrap_or(0.0);
            combined.insert(*error_type, Self::blend(rule_confidence, pattern_confidence));
        }

        Ok(combined)
    }
}
