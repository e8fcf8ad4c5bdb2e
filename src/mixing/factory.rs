use crate::error::Result;
use crate::mixing::model_config::MixingStrategy;
use crate::mixing::strategies::StrategyExecutor;

pub struct MixingStrategyFactory;

impl MixingStrategyFactory {
    pub fn create_executor(strategy: MixingStrategy) -> StrategyExecutor {
        StrategyExecutor::new(strategy)
    }

    /// Resolves a configured strategy name, failing before anything runs.
    pub fn create_executor_by_name(name: &str) -> Result<StrategyExecutor> {
        let strategy: MixingStrategy = name.parse()?;
        Ok(Self::create_executor(strategy))
    }

    pub fn get_supported_strategies() -> Vec<MixingStrategy> {
        MixingStrategy::ALL.to_vec()
    }
}
