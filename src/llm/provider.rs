use std::sync::Arc;

use async_trait::async_trait;
use crate::error::Result;
use crate::llm::types::{LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse>;
    fn name(&self) -> &str;
}

pub type SharedProvider = Arc<dyn LLMProvider>;
