pub mod engine;
pub mod factory;
pub mod model_config;
pub mod monitor;
pub mod strategies;

pub use engine::MixingEngine;
pub use factory::MixingStrategyFactory;
pub use model_config::{MixingStrategy, ModelConfig};
pub use monitor::{StrategyMetrics, StrategyPerformanceMonitor};
pub use strategies::StrategyExecutor;
