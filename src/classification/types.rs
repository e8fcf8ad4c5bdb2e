use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::taxonomy::ErrorType;
use crate::Context;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub error_type: ErrorType,
    pub confidence: f64,
    pub metadata: Map<String, Value>,
    pub classification_path: Vec<String>,
    pub matched_patterns: Vec<String>,
    pub suggested_actions: Vec<String>,
}

/// Parallel sequences: entry `i` of each list describes the same sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingData {
    pub error_messages: Vec<String>,
    pub error_types: Vec<ErrorType>,
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl TrainingData {
    pub fn new(samples: Vec<(String, ErrorType)>) -> Self {
        let (error_messages, error_types) = samples.into_iter().unzip();
        Self {
            error_messages,
            error_types,
            contexts: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Parses and validates a JSON training set.
    pub fn from_json(raw: &str) -> Result<Self> {
        let data: TrainingData = serde_json::from_str(raw)?;
        data.validate()?;
        Ok(data)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::debug!("Loaded {} samples from {}", data.len(), path.display());
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.error_messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.error_messages.is_empty()
    }

    /// Contexts and labels are optional but, when present, must line up.
    pub fn validate(&self) -> Result<()> {
        let n = self.error_messages.len();
        if self.error_types.len() != n {
            return Err(Error::InvalidTrainingData(format!(
                "{} messages but {} error types",
                n,
                self.error_types.len()
            )));
        }
        if !self.contexts.is_empty() && self.contexts.len() != n {
            return Err(Error::InvalidTrainingData(format!(
                "{} messages but {} contexts",
                n,
                self.contexts.len()
            )));
        }
        if !self.labels.is_empty() && self.labels.len() != n {
            return Err(Error::InvalidTrainingData(format!(
                "{} messages but {} labels",
                n,
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// Messages grouped by true error type, in first-seen type order.
    pub(crate) fn grouped_by_type(&self) -> Vec<(ErrorType, Vec<&str>)> {
        let mut groups: Vec<(ErrorType, Vec<&str>)> = Vec::new();

        for (message, error_type) in self.error_messages.iter().zip(&self.error_types) {
            match groups.iter_mut().find(|(t, _)| t == error_type) {
                Some((_, messages)) => messages.push(message.as_str()),
                None => groups.push((*error_type, vec![message.as_str()])),
            }
        }

        groups
    }
}
