use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::config::MixingConfig;
use crate::error::Result;
use crate::llm::{LLMResponse, ProviderFactory};
use crate::mixing::factory::MixingStrategyFactory;
use crate::mixing::model_config::{MixingStrategy, ModelConfig};
use crate::mixing::monitor::StrategyPerformanceMonitor;
use crate::Context;

/// Owns the process-wide concurrency gate shared by every mixing call.
pub struct MixingEngine {
    providers: Arc<dyn ProviderFactory>,
    gate: Arc<Semaphore>,
    monitor: StrategyPerformanceMonitor,
    config: MixingConfig,
}

impl MixingEngine {
    /// Gate capacity is clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(providers: Arc<dyn ProviderFactory>, config: MixingConfig) -> Self {
        let permits = config
            .max_concurrent_requests
            .clamp(1, Semaphore::MAX_PERMITS);
        if permits != config.max_concurrent_requests {
            tracing::warn!(
                "Concurrency limit {} out of range, using {}",
                config.max_concurrent_requests,
                permits
            );
        }

        Self {
            providers,
            gate: Arc::new(Semaphore::new(permits)),
            monitor: StrategyPerformanceMonitor::new(),
            config,
        }
    }

    pub fn monitor(&self) -> &StrategyPerformanceMonitor {
        &self.monitor
    }

    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    pub async fn mix(
        &self,
        strategy: MixingStrategy,
        model_configs: &[ModelConfig],
        prompt: &str,
        context: Option<&Context>,
    ) -> Vec<Option<LLMResponse>> {
        let executor = MixingStrategyFactory::create_executor(strategy);

        let started = Instant::now();
        let results = executor
            .execute(model_configs, prompt, context, self.providers.as_ref(), &self.gate)
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        let succeeded = results.iter().filter(|r| r.is_some()).count();
        tracing::info!(
            "{} mixing finished: {}/{} models responded in {:.2}s",
            strategy,
            succeeded,
            model_configs.len(),
            elapsed
        );

        self.monitor
            .record_execution(strategy, elapsed, succeeded > 0)
            .await;

        results
    }

    pub async fn mix_by_name(
        &self,
        strategy: &str,
        model_configs: &[ModelConfig],
        prompt: &str,
        context: Option<&Context>,
    ) -> Result<Vec<Option<LLMResponse>>> {
        let executor = MixingStrategyFactory::create_executor_by_name(strategy)?;
        Ok(self
            .mix(executor.strategy(), model_configs, prompt, context)
            .await)
    }

    pub async fn mix_default(
        &self,
        model_configs: &[ModelConfig],
        prompt: &str,
        context: Option<&Context>,
    ) -> Vec<Option<LLMResponse>> {
        self.mix(self.config.default_strategy, model_configs, prompt, context)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::llm::{LLMProvider, LLMRequest, ModelType, ProviderRegistry};
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn generate(&self, request: LLMRequest) -> Result<LLMResponse> {
            Ok(LLMResponse::new(request.prompt, "echo", "echo-1"))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn engine() -> MixingEngine {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(EchoProvider));
        MixingEngine::new(
            Arc::new(registry),
            MixingConfig {
                max_concurrent_requests: 3,
                default_strategy: MixingStrategy::Sequential,
            },
        )
    }

    #[tokio::test]
    async fn test_mix_records_outcome() {
        let engine = engine();
        let configs = vec![
            ModelConfig::new("echo", "echo-1", ModelType::Fast),
            ModelConfig::new("nowhere", "x", ModelType::Fast),
        ];

        let results = engine.mix(MixingStrategy::Voting, &configs, "ping", None).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().content, "ping");
        assert!(results[1].is_none());

        let metrics = engine.monitor().get_strategy_metrics(MixingStrategy::Voting).await;
        assert_eq!(metrics.total_executions, 1);
        assert_eq!(metrics.successful_executions, 1);
        assert_eq!(engine.available_permits(), 3);
    }

    #[tokio::test]
    async fn test_all_failed_batch_counts_as_failure() {
        let engine = engine();
        let configs = vec![ModelConfig::new("nowhere", "x", ModelType::Fast)];

        let results = engine.mix_default(&configs, "ping", None).await;
        assert_eq!(results, vec![None]);

        let metrics = engine
            .monitor()
            .get_strategy_metrics(MixingStrategy::Sequential)
            .await;
        assert_eq!(metrics.failed_executions, 1);
    }

    #[tokio::test]
    async fn test_mix_by_name_rejects_before_running() {
        let engine = engine();
        let configs = vec![ModelConfig::new("echo", "echo-1", ModelType::Fast)];

        let err = engine
            .mix_by_name("majority", &configs, "ping", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedStrategy(_)));
        assert_eq!(engine.monitor().get_best_strategy().await, None);

        let results = engine.mix_by_name("cascade", &configs, "ping", None).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_gate_capacity_is_clamped() {
        let engine = MixingEngine::new(
            Arc::new(ProviderRegistry::new()),
            MixingConfig {
                max_concurrent_requests: usize::MAX,
                default_strategy: MixingStrategy::Parallel,
            },
        );
        assert_eq!(engine.available_permits(), Semaphore::MAX_PERMITS);

        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(EchoProvider));
        let engine = MixingEngine::new(
            Arc::new(registry),
            MixingConfig {
                max_concurrent_requests: 0,
                default_strategy: MixingStrategy::Parallel,
            },
        );
        assert_eq!(engine.available_permits(), 1);

        let configs = vec![ModelConfig::new("echo", "echo-1", ModelType::Fast)];
        let results = engine.mix_default(&configs, "ping", None).await;
        assert_eq!(results[0].as_ref().unwrap().content, "ping");
    }
}
