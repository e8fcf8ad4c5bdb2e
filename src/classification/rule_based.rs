use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::common::{compile_pattern, extract_keywords, metadata_map, suggested_actions};
use super::types::{ClassificationResult, TrainingData};
use super::ErrorClassifier;
use crate::error::{Error, Result};
use crate::taxonomy::{ErrorType, ErrorTypeRegistry};
use crate::Context;

/// Minimum fraction of a type's training messages a pattern must match.
const MIN_SUPPORT: f64 = 0.3;

const KEYWORD_CONFIDENCE: f64 = 0.5;

const PATTERN_LIBRARY: &[&str] = &[
    r"timeout|timed out|deadline exceeded",
    r"connection.*reset|reset by peer",
    r"network.*error|connection.*failed",
    r"dns.*error|name resolution",
    r"ssl.*error|tls.*error|certificate.*error",
    r"auth.*failed|invalid.*credentials|unauthorized",
    r"forbidden|access.*denied|permission.*denied",
    r"not.*found|404|missing.*resource",
    r"validation.*error|invalid.*input|bad.*request",
    r"config.*error|configuration.*error",
    r"file.*not.*found|no.*such.*file",
    r"disk.*space|no.*space|device.*full",
    r"rate.*limit|quota.*exceeded|throttle",
    r"server.*error|500|internal.*error",
    r"merge.*conflict|conflict.*github|conflict.*gitlab",
    r"git.*error|local.*git",
    r"ssh.*error|key.*error",
];

const KEYWORD_STOPWORDS: &[&str] = &["error", "failed", "invalid"];

// Checked in order; the first substring hit decides.
const KEYWORD_FALLBACK: &[(&str, ErrorType)] = &[
    ("timeout", ErrorType::TimeoutError),
    ("network", ErrorType::NetworkError),
    ("connection", ErrorType::NetworkError),
    ("auth", ErrorType::AuthenticationError),
    ("unauthorized", ErrorType::AuthenticationError),
    ("forbidden", ErrorType::AuthorizationError),
    ("permission", ErrorType::PermissionDeniedError),
    ("not found", ErrorType::NotFoundError),
    ("validation", ErrorType::ValidationError),
    ("invalid", ErrorType::InvalidInputError),
    ("config", ErrorType::ConfigurationError),
    ("file", ErrorType::FileNotFoundError),
    ("disk", ErrorType::DiskSpaceError),
    ("rate", ErrorType::RateLimitError),
    ("server", ErrorType::ServerError),
    ("merge", ErrorType::GithubMergeConflict),
    ("git", ErrorType::LocalGitError),
    ("ssh", ErrorType::GithubSshError),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub pattern: String,
    pub error_type: ErrorType,
    /// Fraction of the type's training messages the pattern matched.
    pub confidence: f64,
    pub keywords: Vec<String>,
}

/// Picks the best-supported pattern from a fixed regex library, falling back
/// to keyword lookup when no learned rule fires.
pub struct RuleBasedClassifier {
    name: String,
    registry: Arc<ErrorTypeRegistry>,
    pattern_library: Vec<String>,
    rules: Vec<Rule>,
    compiled: HashMap<String, Regex>,
    fitted: bool,
}

impl RuleBasedClassifier {
    pub fn new(name: impl Into<String>, registry: Arc<ErrorTypeRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
            pattern_library: PATTERN_LIBRARY.iter().map(|p| p.to_string()).collect(),
            rules: Vec::new(),
            compiled: HashMap::new(),
            fitted: false,
        }
    }

    /// Replaces the candidate patterns tested during `fit`.
    pub fn with_pattern_library(mut self, patterns: Vec<String>) -> Self {
        self.pattern_library = patterns;
        self
    }

    /// Learned rules, highest confidence first.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn build_rules(&mut self, training_data: &TrainingData) {
        self.rules.clear();
        self.compiled.clear();

        for pattern in &self.pattern_library {
            if let Some(regex) = compile_pattern(pattern, &self.name) {
                self.compiled.insert(pattern.clone(), regex);
            }
        }

        for (error_type, messages) in training_data.grouped_by_type() {
            for pattern in &self.pattern_library {
                let Some(regex) = self.compiled.get(pattern) else {
                    continue;
                };

                let matches = messages.iter().filter(|m| regex.is_match(m)).count();
                let total = messages.len() as f64;
                if matches == 0 || (matches as f64) < total * MIN_SUPPORT {
                    continue;
                }

                self.rules.push(Rule {
                    pattern: pattern.clone(),
                    error_type,
                    confidence: matches as f64 / total,
                    keywords: extract_keywords(pattern, KEYWORD_STOPWORDS),
                });
            }
        }

        // Stable: equal confidences keep training order.
        self.rules.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    }

    fn matching_rules<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| {
            self.compiled
                .get(&rule.pattern)
                .is_some_and(|regex| regex.is_match(message))
        })
    }

    fn keyword_fallback(message: &str) -> Option<(ErrorType, &'static str)> {
        let lower = message.to_lowercase();
        KEYWORD_FALLBACK
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(keyword, error_type)| (*error_type, *keyword))
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(Error::NotFitted(self.name.clone()))
        }
    }
}

impl ErrorClassifier for RuleBasedClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self, training_data: &TrainingData) -> Result<()> {
        training_data.validate()?;
        tracing::info!("Fitting {} with {} samples", self.name, training_data.len());

        self.build_rules(training_data);
        self.fitted = true;

        tracing::info!("Fitted {} with {} rules", self.name, self.rules.len());
        Ok(())
    }

    fn predict(&self, message: &str, _context: Option<&Context>) -> Result<ClassificationResult> {
        self.ensure_fitted()?;

        let mut best: Option<ErrorType> = None;
        let mut best_confidence = 0.0;
        let mut matched_patterns = Vec::new();
        let mut classification_path = Vec::new();

        for rule in self.matching_rules(message) {
            if rule.confidence > best_confidence {
                best = Some(rule.error_type);
                best_confidence = rule.confidence;
                matched_patterns = vec![rule.pattern.clone()];
                classification_path = vec![format!("matched_pattern:{}", rule.pattern)];
            } else if best.is_some() && rule.confidence == best_confidence {
                // Ties add evidence but keep the first winner.
                matched_patterns.push(rule.pattern.clone());
                classification_path.push(format!("matched_pattern:{}", rule.pattern));
            }
        }

        if best.is_none() {
            if let Some((error_type, keyword)) = Self::keyword_fallback(message) {
                best = Some(error_type);
                best_confidence = KEYWORD_CONFIDENCE;
                matched_patterns = vec![keyword.to_string()];
                classification_path = vec![format!("keyword_match:{}", keyword)];
            }
        }

        let metadata = best.and_then(|t| self.registry.metadata(t));

        Ok(ClassificationResult {
            error_type: best.unwrap_or(ErrorType::UnknownError),
            confidence: best_confidence,
            metadata: metadata_map(metadata),
            classification_path,
            matched_patterns,
            suggested_actions: suggested_actions(metadata),
        })
    }

    fn predict_proba(
        &self,
        message: &str,
        context: Option<&Context>,
    ) -> Result<HashMap<ErrorType, f64>> {
        let result = self.predict(message, context)?;

        let mut probabilities = HashMap::new();
        probabilities.insert(result.error_type, result.confidence);

        for rule in self.matching_rules(message) {
            let entry = probabilities.entry(rule.error_type).or_insert(rule.confidence);
            if rule.confidence > *entry {
                *entry = rule.confidence;
            }
        }

        Ok(probabilities)
    }
}
