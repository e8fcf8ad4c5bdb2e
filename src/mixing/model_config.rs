use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::{LLMRequest, ModelType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MixingStrategy {
    /// Every model at once
    Parallel,
    /// One model after another, failures skipped
    Sequential,
    /// Each result feeds the next prompt, stops on first failure
    Cascade,
    /// Parallel run, caller applies majority vote
    Voting,
    /// Parallel run, caller applies model weights
    Weighted,
    /// Specialized groups in parallel, general models sequentially
    Hierarchical,
}

impl MixingStrategy {
    pub const ALL: [MixingStrategy; 6] = [
        MixingStrategy::Parallel,
        MixingStrategy::Sequential,
        MixingStrategy::Cascade,
        MixingStrategy::Voting,
        MixingStrategy::Weighted,
        MixingStrategy::Hierarchical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MixingStrategy::Parallel => "parallel",
            MixingStrategy::Sequential => "sequential",
            MixingStrategy::Cascade => "cascade",
            MixingStrategy::Voting => "voting",
            MixingStrategy::Weighted => "weighted",
            MixingStrategy::Hierarchical => "hierarchical",
        }
    }
}

impl std::fmt::Display for MixingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MixingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        MixingStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == lower)
            .ok_or_else(|| Error::UnsupportedStrategy(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub model_type: ModelType,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Hard limit for a single generation call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default)]
    pub specialized_for: Option<String>,
    #[serde(default)]
    pub cost_limit: Option<f64>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> f64 {
    30.0
}

fn default_retry_attempts() -> u32 {
    2
}

impl ModelConfig {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        model_type: ModelType,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            model_type,
            weight: default_weight(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            specialized_for: None,
            cost_limit: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    pub fn specialized_for(mut self, specialization: impl Into<String>) -> Self {
        self.specialized_for = Some(specialization.into());
        self
    }

    pub fn with_cost_limit(mut self, cost_limit: f64) -> Self {
        self.cost_limit = Some(cost_limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.weight.is_nan() || self.weight < 0.0 {
            return Err(Error::InvalidModelConfig(format!(
                "{}: weight must be >= 0, got {}",
                self.label(),
                self.weight
            )));
        }
        if self.max_tokens == 0 {
            return Err(Error::InvalidModelConfig(format!(
                "{}: max_tokens must be > 0",
                self.label()
            )));
        }
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            return Err(Error::InvalidModelConfig(format!(
                "{}: timeout must be a positive number of seconds, got {}",
                self.label(),
                self.timeout
            )));
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX`; non-positive or NaN timeouts map to zero.
    pub fn timeout_duration(&self) -> Duration {
        match Duration::try_from_secs_f64(self.timeout) {
            Ok(duration) => duration,
            Err(_) if self.timeout > 0.0 => Duration::MAX,
            Err(_) => Duration::ZERO,
        }
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }

    /// Empty and missing specializations both mean a general-purpose model.
    pub fn specialization(&self) -> Option<&str> {
        self.specialized_for.as_deref().filter(|s| !s.is_empty())
    }

    pub fn to_request(&self, prompt: &str) -> LLMRequest {
        LLMRequest {
            prompt: prompt.to_string(),
            model_type: self.model_type,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
