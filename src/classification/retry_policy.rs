use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::ClassificationResult;
use crate::taxonomy::ErrorType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationDetails {
    pub classification_path: Vec<String>,
    pub matched_patterns: Vec<String>,
    pub suggested_actions: Vec<String>,
    pub confidence: f64,
}

/// Retry decision handed to the source-control error handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorClassification {
    pub error_type: ErrorType,
    pub is_retryable: bool,
    pub retry_delay: f64,
    pub max_retries: u32,
    pub should_open_circuit: bool,
    pub details: ClassificationDetails,
}

impl From<&ClassificationResult> for ErrorClassification {
    fn from(result: &ClassificationResult) -> Self {
        let flag = |key: &str| result.metadata.get(key).and_then(Value::as_bool).unwrap_or(false);

        Self {
            error_type: result.error_type,
            is_retryable: flag("is_retryable"),
            retry_delay: result
                .metadata
                .get("retry_delay")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            max_retries: result
                .metadata
                .get("max_retries")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            should_open_circuit: flag("should_open_circuit"),
            details: ClassificationDetails {
                classification_path: result.classification_path.clone(),
                matched_patterns: result.matched_patterns.clone(),
                suggested_actions: result.suggested_actions.clone(),
                confidence: result.confidence,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::classification::{ErrorClassifier, RuleBasedClassifier, TrainingData};
    use crate::taxonomy::ErrorTypeRegistry;

    #[test]
    fn test_reads_retry_policy_from_metadata() {
        let mut classifier = RuleBasedClassifier::new("rules", Arc::new(ErrorTypeRegistry::new()));
        classifier
            .fit(&TrainingData::new(vec![(
                "API rate limit exceeded".to_string(),
                ErrorType::RateLimitError,
            )]))
            .unwrap();

        let result = classifier.predict("rate limit hit for token", None).unwrap();
        let classification = ErrorClassification::from(&result);

        assert_eq!(classification.error_type, ErrorType::RateLimitError);
        assert!(classification.is_retryable);
        assert_eq!(classification.retry_delay, 60.0);
        assert_eq!(classification.max_retries, 1);
        assert!(!classification.should_open_circuit);
        assert_eq!(classification.details.confidence, result.confidence);
        assert_eq!(classification.details.matched_patterns, result.matched_patterns);
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let result = ClassificationResult {
            error_type: ErrorType::UnknownError,
            confidence: 0.0,
            metadata: serde_json::Map::new(),
            classification_path: Vec::new(),
            matched_patterns: Vec::new(),
            suggested_actions: vec!["Investigate error details".to_string()],
        };

        let classification = ErrorClassification::from(&result);
        assert!(!classification.is_retryable);
        assert_eq!(classification.retry_delay, 0.0);
        assert_eq!(classification.max_retries, 0);
        assert_eq!(classification.details.suggested_actions.len(), 1);
    }
}
