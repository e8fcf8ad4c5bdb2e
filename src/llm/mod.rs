pub mod provider;
pub mod registry;
pub mod types;

pub use provider::{LLMProvider, SharedProvider};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use types::{LLMRequest, LLMResponse, ModelType};
