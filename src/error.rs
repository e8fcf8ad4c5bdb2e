use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider {0} not available")]
    ProviderUnavailable(String),

    #[error("Model {provider}:{model} timed out after {timeout_secs}s")]
    Timeout {
        provider: String,
        model: String,
        timeout_secs: f64,
    },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Unsupported mixing strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("Concurrency gate closed")]
    ConcurrencyGateClosed,

    #[error("Invalid model config: {0}")]
    InvalidModelConfig(String),

    #[error("Classifier {0} must be fitted before use")]
    NotFitted(String),

    #[error("Unknown classifier algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown error type: {0}")]
    UnknownErrorType(String),

    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Generation(_))
    }
}
