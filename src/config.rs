//! Engine configuration.
//!
//! The engine consumes configuration; it never loads it. Callers build a
//! [`SchedulerConfig`] in code or deserialize one from whatever source
//! they own. Missing fields fall back to the defaults below.
//!
//! | Field | Default |
//! |-------|---------|
//! | `time_budget_secs` | 30.0 |
//! | `max_backtrack_depth` | 10 |
//! | `seed` | 42 |
//! | `workload.strict_max_empty_days` | 1 |
//! | `workload.relaxed_max_empty_days` | 2 |
//! | `workload.balance_tolerance` | `None` (completion wins) |
//! | `max_passes` | 3 |
//! | `max_nodes_per_pattern` | 2000 |
//! | `max_rebalance_steps` | 200 |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{BlockPatternTable, RelaxationLevel};

/// Teacher empty-day policy.
///
/// An "empty day" is a day on which a teacher has neither a lesson hour
/// nor a fixed placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadPolicy {
    /// Empty days allowed at `strict`.
    pub strict_max_empty_days: usize,
    /// Empty days allowed from `workload_flex` upward.
    pub relaxed_max_empty_days: usize,
    /// Empty-day cap applied by the final rescue pass.
    ///
    /// `None` lets completion take precedence over balance: the rescue
    /// pass ignores empty days. `Some(k)` abandons a lesson rather than
    /// leave one of its teachers with more than `k` empty days.
    pub balance_tolerance: Option<usize>,
}

impl WorkloadPolicy {
    /// Empty-day threshold for a level (before the per-teacher floor).
    pub fn threshold(&self, level: RelaxationLevel) -> usize {
        if level.relaxes_workload() {
            self.relaxed_max_empty_days
        } else {
            self.strict_max_empty_days
        }
    }
}

impl Default for WorkloadPolicy {
    fn default() -> Self {
        Self {
            strict_max_empty_days: 1,
            relaxed_max_empty_days: 2,
            balance_tolerance: None,
        }
    }
}

/// Candidate-window scoring weights.
///
/// Scores are integers so that ranking is exact and reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Bonus for a day the class or teacher already uses.
    pub day_reuse: i64,
    /// Bonus for touching an existing run of the class or teacher.
    pub adjacency: i64,
    /// Bonus for filling an empty teacher day while the teacher is over the strict limit.
    pub fill_empty_day: i64,
    /// Penalty per projected empty day above the strict limit.
    pub workload_excess: i64,
    /// Penalty per unplaced neighbouring lesson losing a feasible cell.
    pub collateral: i64,
    /// Penalty per hour placed inside an unavailable window.
    pub soft_availability: i64,
    /// Penalty for a non-contiguous piece.
    pub split_piece: i64,
    /// Penalty for a piece on a day that already holds a piece of the same lesson.
    pub same_day_piece: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            day_reuse: 4,
            adjacency: 6,
            fill_empty_day: 20,
            workload_excess: 25,
            collateral: 1,
            soft_availability: 100,
            split_piece: 50,
            same_day_piece: 30,
        }
    }
}

/// Configuration surface consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wall-clock budget in seconds.
    pub time_budget_secs: f64,
    /// Undo operations allowed while resolving one lesson.
    pub max_backtrack_depth: usize,
    /// Seed of the run's random generator.
    pub seed: u64,
    /// Empty-day policy.
    pub workload: WorkloadPolicy,
    /// Search passes before the rescue pass.
    pub max_passes: usize,
    /// In-lesson search nodes per pattern attempt.
    pub max_nodes_per_pattern: usize,
    /// Accepted rebalancing steps at most.
    pub max_rebalance_steps: usize,
    /// Candidate scoring weights.
    pub weights: ScoreWeights,
    /// Block pattern alternatives.
    pub patterns: BlockPatternTable,
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time budget in seconds.
    pub fn with_time_budget_secs(mut self, secs: f64) -> Self {
        self.time_budget_secs = secs;
        self
    }

    /// Sets the time budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_secs = budget.as_secs_f64();
        self
    }

    /// Sets the backtracking depth limit.
    pub fn with_max_backtrack_depth(mut self, depth: usize) -> Self {
        self.max_backtrack_depth = depth;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the workload policy.
    pub fn with_workload(mut self, workload: WorkloadPolicy) -> Self {
        self.workload = workload;
        self
    }

    /// Sets the number of search passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    /// Sets the pattern table.
    pub fn with_patterns(mut self, patterns: BlockPatternTable) -> Self {
        self.patterns = patterns;
        self
    }

    /// Sets the scoring weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Time budget as a duration. Negative or non-finite values yield zero.
    pub fn time_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_budget_secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: 30.0,
            max_backtrack_depth: 10,
            seed: 42,
            workload: WorkloadPolicy::default(),
            max_passes: 3,
            max_nodes_per_pattern: 2_000,
            max_rebalance_steps: 200,
            weights: ScoreWeights::default(),
            patterns: BlockPatternTable::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_backtrack_depth, 10);
        assert_eq!(config.workload.strict_max_empty_days, 1);
        assert_eq!(config.workload.relaxed_max_empty_days, 2);
        assert!(config.workload.balance_tolerance.is_none());
        assert_eq!(config.time_budget(), Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .with_time_budget(Duration::from_millis(250))
            .with_seed(7)
            .with_max_backtrack_depth(4)
            .with_max_passes(1);
        assert_eq!(config.time_budget(), Duration::from_millis(250));
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_backtrack_depth, 4);
        assert_eq!(config.max_passes, 1);
    }

    #[test]
    fn test_invalid_budget_is_zero() {
        let config = SchedulerConfig::new().with_time_budget_secs(-1.0);
        assert_eq!(config.time_budget(), Duration::ZERO);
        let config = SchedulerConfig::new().with_time_budget_secs(f64::NAN);
        assert_eq!(config.time_budget(), Duration::ZERO);
    }

    #[test]
    fn test_threshold_per_level() {
        let policy = WorkloadPolicy::default();
        assert_eq!(policy.threshold(RelaxationLevel::Strict), 1);
        assert_eq!(policy.threshold(RelaxationLevel::WorkloadFlex), 2);
        assert_eq!(policy.threshold(RelaxationLevel::AvailabilityFlex), 2);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"seed": 9, "workload": {"balance_tolerance": 3}}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.workload.balance_tolerance, Some(3));
        assert_eq!(config.workload.strict_max_empty_days, 1);
        assert_eq!(config.max_backtrack_depth, 10);
    }
}
