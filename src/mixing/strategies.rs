use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::llm::{LLMResponse, ProviderFactory};
use crate::mixing::model_config::{MixingStrategy, ModelConfig};
use crate::Context;

/// Runs a batch of model configs against one prompt under a given strategy.
///
/// Output slots line up with the input configs; `None` marks a model that
/// failed. Per-model failures are logged here and never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyExecutor {
    strategy: MixingStrategy,
}

impl StrategyExecutor {
    pub(crate) fn new(strategy: MixingStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MixingStrategy {
        self.strategy
    }

    pub async fn execute(
        &self,
        model_configs: &[ModelConfig],
        prompt: &str,
        context: Option<&Context>,
        providers: &dyn ProviderFactory,
        gate: &Semaphore,
    ) -> Vec<Option<LLMResponse>> {
        tracing::debug!(
            "Executing {} models with {} strategy",
            model_configs.len(),
            self.strategy
        );

        match self.strategy {
            // Voting and weighted aggregation is left to the caller
            MixingStrategy::Parallel | MixingStrategy::Voting | MixingStrategy::Weighted => {
                execute_parallel(model_configs, prompt, context, providers, gate).await
            }
            MixingStrategy::Sequential => {
                execute_sequential(model_configs, prompt, context, providers, gate).await
            }
            MixingStrategy::Cascade => {
                execute_cascade(model_configs, prompt, context, providers, gate).await
            }
            MixingStrategy::Hierarchical => {
                execute_hierarchical(model_configs, prompt, context, providers, gate).await
            }
        }
    }
}

async fn execute_parallel(
    model_configs: &[ModelConfig],
    prompt: &str,
    context: Option<&Context>,
    providers: &dyn ProviderFactory,
    gate: &Semaphore,
) -> Vec<Option<LLMResponse>> {
    let futures = model_configs
        .iter()
        .map(|config| execute_single_model(config, prompt, context, providers, gate));

    // join_all keeps input order and lets every future finish on its own
    let results = join_all(futures).await;

    results
        .into_iter()
        .zip(model_configs)
        .map(|(result, config)| match result {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::error!(
                    "Model {} failed (retryable: {}): {}",
                    config.label(),
                    e.is_retryable(),
                    e
                );
                None
            }
        })
        .collect()
}

async fn execute_sequential(
    model_configs: &[ModelConfig],
    prompt: &str,
    context: Option<&Context>,
    providers: &dyn ProviderFactory,
    gate: &Semaphore,
) -> Vec<Option<LLMResponse>> {
    let mut results = Vec::with_capacity(model_configs.len());

    for config in model_configs {
        match execute_single_model(config, prompt, context, providers, gate).await {
            Ok(response) => results.push(Some(response)),
            Err(e) => {
                tracing::error!(
                    "Model {} failed (retryable: {}): {}",
                    config.label(),
                    e.is_retryable(),
                    e
                );
                results.push(None);
            }
        }
    }

    results
}

async fn execute_cascade(
    model_configs: &[ModelConfig],
    prompt: &str,
    context: Option<&Context>,
    providers: &dyn ProviderFactory,
    gate: &Semaphore,
) -> Vec<Option<LLMResponse>> {
    let mut results = Vec::with_capacity(model_configs.len());
    let mut current_prompt = prompt.to_string();

    for config in model_configs {
        match execute_single_model(config, &current_prompt, context, providers, gate).await {
            Ok(response) => {
                if !response.content.is_empty() {
                    current_prompt = cascade_prompt(&response.content, prompt);
                }
                results.push(Some(response));
            }
            Err(e) => {
                tracing::error!(
                    "Model {} failed, stopping cascade (retryable: {}): {}",
                    config.label(),
                    e.is_retryable(),
                    e
                );
                results.push(None);
                break;
            }
        }
    }

    results
}

async fn execute_hierarchical(
    model_configs: &[ModelConfig],
    prompt: &str,
    context: Option<&Context>,
    providers: &dyn ProviderFactory,
    gate: &Semaphore,
) -> Vec<Option<LLMResponse>> {
    let (specialized, general) = group_by_specialization(model_configs);
    let mut results = Vec::with_capacity(model_configs.len());

    for (specialization, configs) in specialized {
        tracing::debug!(
            "Running {} models specialized for {} in parallel",
            configs.len(),
            specialization
        );
        results.extend(execute_parallel(&configs, prompt, context, providers, gate).await);
    }

    if !general.is_empty() {
        results.extend(execute_sequential(&general, prompt, context, providers, gate).await);
    }

    results
}

/// Specialized groups in first-seen tag order, then the general group.
fn group_by_specialization(
    model_configs: &[ModelConfig],
) -> (Vec<(String, Vec<ModelConfig>)>, Vec<ModelConfig>) {
    let mut specialized: Vec<(String, Vec<ModelConfig>)> = Vec::new();
    let mut general = Vec::new();

    for config in model_configs {
        match config.specialization() {
            Some(tag) => match specialized.iter_mut().find(|(existing, _)| existing == tag) {
                Some((_, group)) => group.push(config.clone()),
                None => specialized.push((tag.to_string(), vec![config.clone()])),
            },
            None => general.push(config.clone()),
        }
    }

    (specialized, general)
}

fn cascade_prompt(previous: &str, original: &str) -> String {
    format!("Previous result: {}\n\nOriginal task: {}", previous, original)
}

async fn execute_single_model(
    config: &ModelConfig,
    prompt: &str,
    _context: Option<&Context>,
    providers: &dyn ProviderFactory,
    gate: &Semaphore,
) -> Result<LLMResponse> {
    // A malformed config never takes a permit
    config.validate()?;

    // Permit is released when dropped, on every exit path
    let _permit = gate.acquire().await.map_err(|_| Error::ConcurrencyGateClosed)?;

    let provider = providers
        .get_provider(&config.provider)
        .ok_or_else(|| Error::ProviderUnavailable(config.provider.clone()))?;

    let request = config.to_request(prompt);

    match timeout(config.timeout_duration(), provider.generate(request)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            provider: config.provider.clone(),
            model: config.model.clone(),
            timeout_secs: config.timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMProvider, LLMRequest, ModelType, ProviderRegistry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    enum Behavior {
        Echo,
        Sleep(Duration),
        Fail,
    }

    struct MockProvider {
        name: String,
        behavior: Behavior,
        prompts: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MockProvider {
        fn new(name: &str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                behavior,
                prompts: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for MockProvider {
        async fn generate(&self, request: LLMRequest) -> Result<LLMResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let result = match &self.behavior {
                Behavior::Echo => Ok(LLMResponse::new(
                    format!("{} answered", self.name),
                    self.name.clone(),
                    "mock-model",
                )),
                Behavior::Sleep(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(LLMResponse::new("slow answer", self.name.clone(), "mock-model"))
                }
                Behavior::Fail => Err(Error::Generation("backend exploded".to_string())),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn registry(providers: &[Arc<MockProvider>]) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider.clone());
        }
        registry
    }

    fn config(provider: &str) -> ModelConfig {
        ModelConfig::new(provider, "mock-model", ModelType::Smart)
    }

    #[tokio::test]
    async fn test_parallel_all_succeed() {
        let providers = registry(&[
            MockProvider::new("a", Behavior::Echo),
            MockProvider::new("b", Behavior::Echo),
            MockProvider::new("c", Behavior::Echo),
        ]);
        let gate = Semaphore::new(10);
        let configs = vec![config("a"), config("b"), config("c")];

        let results = StrategyExecutor::new(MixingStrategy::Parallel)
            .execute(&configs, "diagnose", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_some()));
        assert_eq!(results[1].as_ref().unwrap().provider, "b");
    }

    #[tokio::test]
    async fn test_parallel_timeout_only_nulls_that_slot() {
        let providers = registry(&[
            MockProvider::new("fast", Behavior::Echo),
            MockProvider::new("slow", Behavior::Sleep(Duration::from_secs(5))),
        ]);
        let gate = Semaphore::new(10);
        let configs = vec![
            config("fast"),
            config("slow").with_timeout(0.05),
            config("fast"),
        ];

        let results = StrategyExecutor::new(MixingStrategy::Parallel)
            .execute(&configs, "diagnose", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
        // Permits come back even for the timed-out call
        assert_eq!(gate.available_permits(), 10);
    }

    #[tokio::test]
    async fn test_unknown_provider_yields_empty_slot() {
        let providers = registry(&[MockProvider::new("a", Behavior::Echo)]);
        let gate = Semaphore::new(2);
        let configs = vec![config("missing"), config("a")];

        for strategy in [
            MixingStrategy::Parallel,
            MixingStrategy::Sequential,
            MixingStrategy::Voting,
            MixingStrategy::Weighted,
        ] {
            let results = StrategyExecutor::new(strategy)
                .execute(&configs, "diagnose", None, &providers, &gate)
                .await;
            assert_eq!(results.len(), 2, "{}", strategy);
            assert!(results[0].is_none(), "{}", strategy);
            assert!(results[1].is_some(), "{}", strategy);
        }
    }

    #[tokio::test]
    async fn test_gate_bounds_concurrency() {
        let slow = MockProvider::new("slow", Behavior::Sleep(Duration::from_millis(20)));
        let providers = registry(&[slow.clone()]);
        let gate = Semaphore::new(2);
        let configs: Vec<_> = (0..6).map(|_| config("slow")).collect();

        let results = StrategyExecutor::new(MixingStrategy::Parallel)
            .execute(&configs, "diagnose", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.is_some()));
        assert!(slow.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_sequential_continues_after_failure() {
        let ok = MockProvider::new("ok", Behavior::Echo);
        let providers = registry(&[ok.clone(), MockProvider::new("bad", Behavior::Fail)]);
        let gate = Semaphore::new(1);
        let configs = vec![config("bad"), config("ok"), config("bad"), config("ok")];

        let results = StrategyExecutor::new(MixingStrategy::Sequential)
            .execute(&configs, "diagnose", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 4);
        assert!(results[0].is_none());
        assert!(results[1].is_some());
        assert!(results[2].is_none());
        assert!(results[3].is_some());
        assert_eq!(ok.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_cascade_feeds_previous_result() {
        let first = MockProvider::new("first", Behavior::Echo);
        let second = MockProvider::new("second", Behavior::Echo);
        let providers = registry(&[first.clone(), second.clone()]);
        let gate = Semaphore::new(4);
        let configs = vec![config("first"), config("second")];

        let results = StrategyExecutor::new(MixingStrategy::Cascade)
            .execute(&configs, "find root cause", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(first.prompts(), vec!["find root cause"]);
        assert_eq!(
            second.prompts(),
            vec!["Previous result: first answered\n\nOriginal task: find root cause"]
        );
    }

    #[tokio::test]
    async fn test_cascade_stops_on_first_failure() {
        let tail = MockProvider::new("tail", Behavior::Echo);
        let providers = registry(&[
            MockProvider::new("head", Behavior::Echo),
            MockProvider::new("bad", Behavior::Fail),
            tail.clone(),
        ]);
        let gate = Semaphore::new(4);
        let configs = vec![config("head"), config("bad"), config("tail"), config("tail")];

        let results = StrategyExecutor::new(MixingStrategy::Cascade)
            .execute(&configs, "remediate", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(tail.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_hierarchical_orders_specialized_groups_first() {
        let providers = registry(&[
            MockProvider::new("general", Behavior::Echo),
            MockProvider::new("coder", Behavior::Echo),
            MockProvider::new("analyst", Behavior::Echo),
        ]);
        let gate = Semaphore::new(4);
        let configs = vec![
            config("general"),
            config("coder").specialized_for("code"),
            config("analyst").specialized_for("analysis"),
            config("general").specialized_for(""),
            config("coder").specialized_for("code"),
        ];

        let results = StrategyExecutor::new(MixingStrategy::Hierarchical)
            .execute(&configs, "triage", None, &providers, &gate)
            .await;

        let order: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().provider.as_str())
            .collect();
        assert_eq!(order, vec!["coder", "coder", "analyst", "general", "general"]);
    }

    #[tokio::test]
    async fn test_invalid_config_yields_empty_slot_without_calling_provider() {
        let a = MockProvider::new("a", Behavior::Echo);
        let providers = registry(&[a.clone()]);
        let gate = Semaphore::new(2);
        let configs = vec![
            config("a").with_timeout(-1.0),
            config("a").with_max_tokens(0),
            config("a").with_weight(f64::NAN),
            config("a"),
        ];

        for strategy in [MixingStrategy::Parallel, MixingStrategy::Sequential] {
            let results = StrategyExecutor::new(strategy)
                .execute(&configs, "diagnose", None, &providers, &gate)
                .await;
            assert_eq!(results.len(), 4, "{}", strategy);
            assert!(results[..3].iter().all(|r| r.is_none()), "{}", strategy);
            assert!(results[3].is_some(), "{}", strategy);
        }

        assert_eq!(a.prompts().len(), 2);
        assert_eq!(gate.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_huge_timeout_still_runs() {
        let providers = registry(&[MockProvider::new("a", Behavior::Echo)]);
        let gate = Semaphore::new(1);
        let configs = vec![config("a").with_timeout(1e30)];

        let results = StrategyExecutor::new(MixingStrategy::Parallel)
            .execute(&configs, "diagnose", None, &providers, &gate)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().content, "a answered");
    }

    #[tokio::test]
    async fn test_hierarchical_failures_null_only_their_slots() {
        let coder = MockProvider::new("coder", Behavior::Echo);
        let general = MockProvider::new("general", Behavior::Echo);
        let providers = registry(&[
            coder.clone(),
            general.clone(),
            MockProvider::new("broken", Behavior::Fail),
        ]);
        let gate = Semaphore::new(4);
        let configs = vec![
            config("general"),
            config("coder").specialized_for("code"),
            config("broken").specialized_for("code"),
            config("broken"),
            config("coder").specialized_for("code"),
            config("missing").specialized_for("analysis"),
            config("general"),
        ];

        let results = StrategyExecutor::new(MixingStrategy::Hierarchical)
            .execute(&configs, "triage", None, &providers, &gate)
            .await;

        // code group, then analysis group, then the general group in order
        let slots: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().map(|response| response.provider.as_str()))
            .collect();
        assert_eq!(
            slots,
            vec![
                Some("coder"),
                None,
                Some("coder"),
                None,
                Some("general"),
                None,
                Some("general"),
            ]
        );
        assert_eq!(coder.prompts().len(), 2);
        // General models keep running after a failure in their group
        assert_eq!(general.prompts().len(), 2);
        assert_eq!(gate.available_permits(), 4);
    }

    #[test]
    fn test_group_by_specialization_preserves_relative_order() {
        let configs = vec![
            ModelConfig::new("p1", "m1", ModelType::Fast).specialized_for("logs"),
            ModelConfig::new("p2", "m2", ModelType::Fast),
            ModelConfig::new("p3", "m3", ModelType::Fast).specialized_for("logs"),
        ];

        let (specialized, general) = group_by_specialization(&configs);
        assert_eq!(specialized.len(), 1);
        assert_eq!(specialized[0].0, "logs");
        let models: Vec<_> = specialized[0].1.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(models, vec!["m1", "m3"]);
        assert_eq!(general.len(), 1);
    }
}
