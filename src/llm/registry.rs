use std::collections::HashMap;

use crate::llm::provider::SharedProvider;

/// Resolves a provider name to a callable generation interface.
pub trait ProviderFactory: Send + Sync {
    fn get_provider(&self, name: &str) -> Option<SharedProvider>;
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, SharedProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: SharedProvider) {
        let name = provider.name().to_string();
        tracing::debug!("Registering provider: {}", name);
        self.providers.insert(name, provider);
    }

    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ProviderFactory for ProviderRegistry {
    fn get_provider(&self, name: &str) -> Option<SharedProvider> {
        self.providers.get(name).cloned()
    }
}
