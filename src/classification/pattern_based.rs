use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;

use super::common::{compile_pattern, extract_keywords, metadata_map, suggested_actions};
use super::types::{ClassificationResult, TrainingData};
use super::ErrorClassifier;
use crate::error::{Error, Result};
use crate::taxonomy::{ErrorType, ErrorTypeRegistry};
use crate::Context;

/// Minimum fraction of a type's messages a phrase must appear in.
const MIN_PHRASE_FREQUENCY: f64 = 0.3;
const MIN_PHRASE_CHARS: usize = 5;
const PHRASE_WORDS: std::ops::RangeInclusive<usize> = 2..=4;

/// Generic signals with their base confidence weight.
const SIGNALS: &[(&str, f64)] = &[
    (r"\d{3}", 0.1),
    (r"error|failed|exception", 0.2),
    (r"timeout|timed out", 0.3),
    (r"connection.*reset", 0.4),
    (r"permission.*denied", 0.5),
    (r"not.*found", 0.4),
    (r"invalid.*input", 0.3),
];

const KEYWORD_STOPWORDS: &[&str] = &["error", "failed"];

#[derive(Debug, Clone)]
pub struct LearnedPattern {
    pub pattern: String,
    pub confidence: f64,
    pub keywords: Vec<String>,
    regex: Option<Regex>,
}

impl LearnedPattern {
    fn new(pattern: String, confidence: f64, owner: &str) -> Self {
        let regex = compile_pattern(&pattern, owner);
        let keywords = extract_keywords(&pattern, KEYWORD_STOPWORDS);
        Self {
            pattern,
            confidence,
            keywords,
            regex,
        }
    }

    fn is_match(&self, message: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(message))
    }
}

/// Scores each error type by summing the confidence of its learned phrases
/// and generic signals that match the message.
pub struct PatternBasedClassifier {
    name: String,
    registry: Arc<ErrorTypeRegistry>,
    patterns: Vec<(ErrorType, Vec<LearnedPattern>)>,
    fitted: bool,
}

impl PatternBasedClassifier {
    pub fn new(name: impl Into<String>, registry: Arc<ErrorTypeRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
            patterns: Vec::new(),
            fitted: false,
        }
    }

    pub fn patterns(&self, error_type: ErrorType) -> &[LearnedPattern] {
        self.patterns
            .iter()
            .find(|(t, _)| *t == error_type)
            .map(|(_, patterns)| patterns.as_slice())
            .unwrap_or(&[])
    }

    fn learn_patterns(&self, messages: &[&str]) -> Vec<LearnedPattern> {
        let total = messages.len() as f64;
        let mut learned = Vec::new();

        for (phrase, frequency) in phrase_frequencies(messages) {
            if frequency as f64 >= total * MIN_PHRASE_FREQUENCY {
                learned.push(LearnedPattern::new(
                    regex::escape(&phrase),
                    frequency as f64 / total,
                    &self.name,
                ));
            }
        }

        for (pattern, base_confidence) in SIGNALS {
            let Some(regex) = compile_pattern(pattern, &self.name) else {
                continue;
            };
            let matches = messages.iter().filter(|m| regex.is_match(m)).count();
            if matches > 0 {
                learned.push(LearnedPattern::new(
                    pattern.to_string(),
                    matches as f64 / total * base_confidence,
                    &self.name,
                ));
            }
        }

        learned
    }

    /// Uncapped summed confidence and matched patterns per type, training order.
    fn type_scores(&self, message: &str) -> Vec<(ErrorType, f64, Vec<String>)> {
        self.patterns
            .iter()
            .map(|(error_type, patterns)| {
                let mut total = 0.0;
                let mut matched = Vec::new();
                for pattern in patterns.iter().filter(|p| p.is_match(message)) {
                    total += pattern.confidence;
                    matched.push(pattern.pattern.clone());
                }
                (*error_type, total, matched)
            })
            .collect()
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(Error::NotFitted(self.name.clone()))
        }
    }
}

/// Lowercased 2-4 word phrases, counted at most once per message, in
/// first-seen order.
fn phrase_frequencies(messages: &[&str]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let lower = message.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let mut seen = HashSet::new();

        for start in 0..words.len() {
            for len in PHRASE_WORDS {
                if start + len > words.len() {
                    break;
                }
                let phrase = words[start..start + len].join(" ");
                if phrase.chars().count() <= MIN_PHRASE_CHARS || !seen.insert(phrase.clone()) {
                    continue;
                }
                match index.get(&phrase) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(phrase.clone(), counts.len());
                        counts.push((phrase, 1));
                    }
                }
            }
        }
    }

    counts
}

impl ErrorClassifier for PatternBasedClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self, training_data: &TrainingData) -> Result<()> {
        training_data.validate()?;
        tracing::info!("Fitting {} with {} samples", self.name, training_data.len());

        let patterns: Vec<_> = training_data
            .grouped_by_type()
            .into_iter()
            .map(|(error_type, messages)| (error_type, self.learn_patterns(&messages)))
            .collect();
        self.patterns = patterns;
        self.fitted = true;

        tracing::info!(
            "Fitted {} with patterns for {} error types",
            self.name,
            self.patterns.len()
        );
        Ok(())
    }

    fn predict(&self, message: &str, _context: Option<&Context>) -> Result<ClassificationResult> {
        self.ensure_fitted()?;

        let mut best: Option<(ErrorType, f64, Vec<String>)> = None;
        for (error_type, total, matched) in self.type_scores(message) {
            let best_total = best.as_ref().map_or(0.0, |(_, t, _)| *t);
            if total > best_total {
                best = Some((error_type, total, matched));
            }
        }

        let (error_type, confidence, matched_patterns) =
            best.unwrap_or((ErrorType::UnknownError, 0.0, Vec::new()));
        let metadata = self.registry.metadata(error_type);

        Ok(ClassificationResult {
            error_type,
            confidence: confidence.min(1.0),
            metadata: metadata_map(metadata),
            classification_path: matched_patterns
                .iter()
                .map(|p| format!("pattern_match:{}", p))
                .collect(),
            matched_patterns,
            suggested_actions: suggested_actions(metadata),
        })
    }

    fn predict_proba(
        &self,
        message: &str,
        _context: Option<&Context>,
    ) -> Result<HashMap<ErrorType, f64>> {
        self.ensure_fitted()?;

        Ok(self
            .type_scores(message)
            .into_iter()
            .filter(|(_, total, _)| *total > 0.0)
            .map(|(error_type, total, _)| (error_type, total.min(1.0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PatternBasedClassifier {
        PatternBasedClassifier::new("pattern_based_classifier", Arc::new(ErrorTypeRegistry::new()))
    }

    fn training(samples: &[(&str, ErrorType)]) -> TrainingData {
        TrainingData::new(samples.iter().map(|(m, t)| (m.to_string(), *t)).collect())
    }

    fn confidence_of(
        classifier: &PatternBasedClassifier,
        t: ErrorType,
        pattern: &str,
    ) -> Option<f64> {
        classifier
            .patterns(t)
            .iter()
            .find(|p| p.pattern == pattern)
            .map(|p| p.confidence)
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let classifier = classifier();
        assert!(matches!(classifier.predict("boom", None), Err(Error::NotFitted(_))));
        assert!(classifier.predict_proba("boom", None).is_err());
    }

    #[test]
    fn test_phrases_counted_once_per_message() {
        let frequencies = phrase_frequencies(&["timed out and timed out", "request was slow"]);
        let timed_out = frequencies.iter().find(|(p, _)| p == "timed out").unwrap();
        assert_eq!(timed_out.1, 1);
        assert!(frequencies.iter().all(|(p, _)| p.split(' ').count() >= 2));
        assert!(frequencies.iter().all(|(p, _)| p.len() > 5));
    }

    #[test]
    fn test_learns_phrases_and_signals() {
        let mut classifier = classifier();
        classifier
            .fit(&training(&[
                ("HTTP 504 timed out", ErrorType::TimeoutError),
                ("gateway 504 timeout", ErrorType::TimeoutError),
            ]))
            .unwrap();

        let t = ErrorType::TimeoutError;
        assert_eq!(confidence_of(&classifier, t, "timed out"), Some(0.5));
        assert_eq!(confidence_of(&classifier, t, "gateway 504"), Some(0.5));
        assert!((confidence_of(&classifier, t, r"\d{3}").unwrap() - 0.1).abs() < 1e-9);
        assert!((confidence_of(&classifier, t, "timeout|timed out").unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(confidence_of(&classifier, t, "permission.*denied"), None);
    }

    #[test]
    fn test_highest_sum_wins_and_is_capped() {
        let mut classifier = classifier();
        classifier
            .fit(&training(&[
                ("Connection timed out after 30s", ErrorType::TimeoutError),
                ("Read timed out after 10s", ErrorType::TimeoutError),
                ("Permission denied for user", ErrorType::PermissionDeniedError),
            ]))
            .unwrap();

        let result = classifier.predict("Request timed out after 5s", None).unwrap();
        assert_eq!(result.error_type, ErrorType::TimeoutError);
        assert_eq!(result.confidence, 1.0);
        assert!(result.matched_patterns.contains(&"timed out".to_string()));
        assert_eq!(result.classification_path.len(), result.matched_patterns.len());
        assert!(result.classification_path.contains(&"pattern_match:timed out".to_string()));

        let proba = classifier.predict_proba("Permission denied for admin", None).unwrap();
        assert_eq!(proba.len(), 1);
        assert_eq!(proba.get(&ErrorType::PermissionDeniedError), Some(&1.0));
    }

    #[test]
    fn test_no_match_is_unknown() {
        let mut classifier = classifier();
        classifier
            .fit(&training(&[("Permission denied for user", ErrorType::PermissionDeniedError)]))
            .unwrap();

        let result = classifier.predict("zzz", None).unwrap();
        assert_eq!(result.error_type, ErrorType::UnknownError);
        assert_eq!(result.confidence, 0.0);
        assert!(result.classification_path.is_empty());
        assert_eq!(result.suggested_actions, vec!["Do not retry - fix underlying issue"]);
        assert!(classifier.predict_proba("zzz", None).unwrap().is_empty());
    }
}
