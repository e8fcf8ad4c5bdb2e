use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::taxonomy::{ErrorCategory, ErrorTypeMetadata};

/// Case-insensitive compile. Malformed patterns are logged and dropped.
pub(crate) fn compile_pattern(pattern: &str, owner: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("{}: failed to compile pattern '{}': {}", owner, pattern, e);
            None
        }
    }
}

pub(crate) fn extract_keywords(text: &str, stopwords: &[&str]) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().count() > 3 && !stopwords.contains(word))
        .map(str::to_string)
        .collect()
}

pub(crate) fn metadata_map(metadata: Option<&ErrorTypeMetadata>) -> Map<String, Value> {
    metadata
        .and_then(|m| serde_json::to_value(m).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}

pub(crate) fn suggested_actions(metadata: Option<&ErrorTypeMetadata>) -> Vec<String> {
    let Some(metadata) = metadata else {
        return vec![
            "Investigate error details".to_string(),
            "Check logs for more information".to_string(),
        ];
    };

    let mut actions = Vec::new();

    if metadata.is_retryable {
        actions.push(format!("Retry after {:.1} seconds", metadata.retry_delay));
        actions.push(format!("Maximum retries: {}", metadata.max_retries));
    } else {
        actions.push("Do not retry - fix underlying issue".to_string());
    }

    let hints: &[&str] = match metadata.category {
        ErrorCategory::Network => &["Check network connectivity", "Verify DNS resolution"],
        ErrorCategory::Authentication => &["Verify credentials", "Check token validity"],
        ErrorCategory::Authorization => &["Check permissions", "Verify access rights"],
        ErrorCategory::Validation => &["Validate input parameters", "Check request format"],
        ErrorCategory::Configuration => {
            &["Check configuration settings", "Verify environment variables"]
        }
        ErrorCategory::FileSystem => &["Check file permissions", "Verify disk space"],
        ErrorCategory::Api => &["Check API status", "Verify rate limits"],
        _ => &[],
    };
    actions.extend(hints.iter().map(|s| s.to_string()));

    actions
}
