use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::mixing::model_config::MixingStrategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StrategyMetrics {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    /// Seconds
    pub total_execution_time: f64,
    pub average_execution_time: f64,
    /// Percentage, 0 to 100
    pub success_rate: f64,
    pub last_execution: Option<DateTime<Utc>>,
}

impl StrategyMetrics {
    fn record(&mut self, execution_time: f64, success: bool) {
        self.total_executions += 1;
        self.total_execution_time += execution_time;

        if success {
            self.successful_executions += 1;
        } else {
            self.failed_executions += 1;
        }

        self.average_execution_time = self.total_execution_time / self.total_executions as f64;
        self.success_rate =
            self.successful_executions as f64 / self.total_executions as f64 * 100.0;
        self.last_execution = Some(Utc::now());
    }

    /// Weighs reliability over speed 7:3. The speed term is not clamped and
    /// goes negative once the average passes 10 seconds.
    pub fn score(&self) -> f64 {
        self.success_rate * 0.7 + (100.0 - self.average_execution_time * 10.0) * 0.3
    }
}

/// Per-strategy execution counters, safe to share across concurrent batches.
#[derive(Clone)]
pub struct StrategyPerformanceMonitor {
    metrics: Arc<Mutex<BTreeMap<MixingStrategy, StrategyMetrics>>>,
}

impl StrategyPerformanceMonitor {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(empty_metrics())),
        }
    }

    pub async fn reset_metrics(&self) {
        let mut metrics = self.metrics.lock().await;
        *metrics = empty_metrics();
    }

    pub async fn record_execution(
        &self,
        strategy: MixingStrategy,
        execution_time: f64,
        success: bool,
    ) {
        let mut metrics = self.metrics.lock().await;
        metrics
            .entry(strategy)
            .or_default()
            .record(execution_time, success);
    }

    pub async fn get_strategy_metrics(&self, strategy: MixingStrategy) -> StrategyMetrics {
        let metrics = self.metrics.lock().await;
        metrics.get(&strategy).cloned().unwrap_or_default()
    }

    pub async fn get_all_metrics(&self) -> BTreeMap<MixingStrategy, StrategyMetrics> {
        self.metrics.lock().await.clone()
    }

    pub async fn get_best_strategy(&self) -> Option<MixingStrategy> {
        let metrics = self.metrics.lock().await;

        let mut best: Option<(MixingStrategy, f64)> = None;
        for strategy in MixingStrategy::ALL {
            let Some(m) = metrics.get(&strategy) else {
                continue;
            };
            if m.total_executions == 0 {
                continue;
            }
            let score = m.score();
            // First strategy wins a tie
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((strategy, score));
            }
        }

        best.map(|(strategy, _)| strategy)
    }
}

impl Default for StrategyPerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_metrics() -> BTreeMap<MixingStrategy, StrategyMetrics> {
    MixingStrategy::ALL
        .iter()
        .map(|strategy| (*strategy, StrategyMetrics::default()))
        .collect()
}
