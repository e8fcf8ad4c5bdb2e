use std::collections::HashMap;

pub mod classification;
pub mod config;
pub mod error;
pub mod llm;
pub mod mixing;
pub mod taxonomy;

pub use classification::{
    ClassificationResult, ClassifierFactory, ErrorClassification, ErrorClassifier, TrainingData,
};
pub use config::{Config, MixingConfig};
pub use error::{Error, Result};
pub use llm::{LLMProvider, ProviderFactory, ProviderRegistry};
pub use mixing::{MixingEngine, MixingStrategy, MixingStrategyFactory, ModelConfig};
pub use taxonomy::{ErrorType, ErrorTypeRegistry};

/// Free-form key/value context passed alongside prompts and error messages.
pub type Context = HashMap<String, serde_json::Value>;
