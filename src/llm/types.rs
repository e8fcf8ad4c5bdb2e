use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Fast,
    Smart,
    DeepThinking,
    Code,
    Analysis,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Fast => write!(f, "fast"),
            ModelType::Smart => write!(f, "smart"),
            ModelType::DeepThinking => write!(f, "deep_thinking"),
            ModelType::Code => write!(f, "code"),
            ModelType::Analysis => write!(f, "analysis"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub prompt: String,
    pub model_type: ModelType,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LLMResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
}

impl LLMResponse {
    pub fn new(
        content: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            provider: provider.into(),
            model: model.into(),
        }
    }
}
