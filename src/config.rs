use crate::classification::ClassifierAlgorithm;
use crate::error::{Error, Result};
use crate::mixing::{MixingStrategy, MixingStrategyFactory};
use std::env;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct Config {
    pub max_concurrent_requests: usize,
    pub default_mixing_strategy: MixingStrategy,
    pub classifier_algorithm: ClassifierAlgorithm,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_concurrent_requests = var("MAX_CONCURRENT_REQUESTS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        if max_concurrent_requests == 0 || max_concurrent_requests > Semaphore::MAX_PERMITS {
            return Err(Error::Config(format!(
                "MAX_CONCURRENT_REQUESTS must be between 1 and {}",
                Semaphore::MAX_PERMITS
            )));
        }

        let strategy_name =
            var("DEFAULT_MIXING_STRATEGY").unwrap_or_else(|| "parallel".to_string());
        let default_mixing_strategy = MixingStrategyFactory::create_executor_by_name(&strategy_name)
            .map_err(|e| Error::Config(format!("DEFAULT_MIXING_STRATEGY: {}", e)))?
            .strategy();

        let algorithm_name = var("CLASSIFIER_ALGORITHM").unwrap_or_else(|| "hybrid".to_string());
        let classifier_algorithm = algorithm_name
            .parse::<ClassifierAlgorithm>()
            .map_err(|e| Error::Config(format!("CLASSIFIER_ALGORITHM: {}", e)))?;

        Ok(Self {
            max_concurrent_requests,
            default_mixing_strategy,
            classifier_algorithm,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MixingConfig {
    pub max_concurrent_requests: usize,
    pub default_strategy: MixingStrategy,
}

impl From<&Config> for MixingConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrent_requests: config.max_concurrent_requests,
            default_strategy: config.default_mixing_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.default_mixing_strategy, MixingStrategy::Parallel);
        assert_eq!(config.classifier_algorithm, ClassifierAlgorithm::Hybrid);

        let mixing = MixingConfig::from(&config);
        assert_eq!(mixing.max_concurrent_requests, 10);
        assert_eq!(mixing.default_strategy, MixingStrategy::Parallel);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("MAX_CONCURRENT_REQUESTS", "4"),
            ("DEFAULT_MIXING_STRATEGY", "Cascade"),
            ("CLASSIFIER_ALGORITHM", "rule_based"),
        ])
        .unwrap();
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.default_mixing_strategy, MixingStrategy::Cascade);
        assert_eq!(config.classifier_algorithm, ClassifierAlgorithm::RuleBased);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(
            load(&[("DEFAULT_MIXING_STRATEGY", "majority")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            load(&[("CLASSIFIER_ALGORITHM", "neural")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            load(&[("MAX_CONCURRENT_REQUESTS", "0")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            load(&[("MAX_CONCURRENT_REQUESTS", "18446744073709551615")]),
            Err(Error::Config(_))
        ));
        let above_cap = (Semaphore::MAX_PERMITS + 1).to_string();
        assert!(matches!(
            load(&[("MAX_CONCURRENT_REQUESTS", above_cap.as_str())]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_gate_capacity_at_cap_is_accepted() {
        let cap = Semaphore::MAX_PERMITS.to_string();
        let config = load(&[("MAX_CONCURRENT_REQUESTS", cap.as_str())]).unwrap();
        assert_eq!(config.max_concurrent_requests, Semaphore::MAX_PERMITS);
    }
}
