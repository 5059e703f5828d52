//! Performance Monitor.
//!
//! Tracks wall-clock time against a fixed budget. The search asks
//! [`PerformanceMonitor::is_exhausted`] at its safe points (before each
//! lesson attempt and each rebalancing step); the monitor never interrupts
//! work on its own.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::warn;

/// Elapsed time of one named phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    /// Phase name.
    pub name: String,
    /// Time spent.
    pub elapsed: Duration,
}

/// Timing summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Configured budget.
    pub budget: Duration,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Phases in execution order.
    pub phases: Vec<PhaseTiming>,
    /// Whether the budget ran out.
    pub exhausted: bool,
}

impl PerformanceSummary {
    /// Elapsed time of a phase, if it ran.
    pub fn phase(&self, name: &str) -> Option<Duration> {
        self.phases.iter().find(|p| p.name == name).map(|p| p.elapsed)
    }
}

/// Wall-clock budget tracker.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    budget: Duration,
    started: Option<Instant>,
    phases: Vec<PhaseTiming>,
    exhausted: bool,
}

impl PerformanceMonitor {
    /// Creates a monitor for a budget. The clock starts at [`start`](Self::start).
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            started: None,
            phases: Vec::new(),
            exhausted: false,
        }
    }

    /// Starts (or restarts) the clock.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.exhausted = false;
    }

    /// Time since [`start`](Self::start); zero before it.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Budget left; zero once exhausted.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// Whether no time is left. Latches: once true it stays true.
    pub fn is_exhausted(&mut self) -> bool {
        if !self.exhausted && self.remaining().is_zero() {
            self.exhausted = true;
            warn!(
                budget_ms = self.budget.as_millis() as u64,
                "time budget exhausted"
            );
        }
        self.exhausted
    }

    /// Runs `f` and records its elapsed time under `name`.
    ///
    /// `f` receives the monitor so it can keep checking the budget.
    pub fn phase<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        let begin = Instant::now();
        let out = f(self);
        self.phases.push(PhaseTiming {
            name: name.to_string(),
            elapsed: begin.elapsed(),
        });
        out
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary {
            budget: self.budget,
            elapsed: self.elapsed(),
            phases: self.phases.clone(),
            exhausted: self.exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_is_exhausted() {
        let mut monitor = PerformanceMonitor::new(Duration::ZERO);
        monitor.start();
        assert!(monitor.is_exhausted());
        assert_eq!(monitor.remaining(), Duration::ZERO);
        assert!(monitor.summary().exhausted);
    }

    #[test]
    fn test_generous_budget() {
        let mut monitor = PerformanceMonitor::new(Duration::from_secs(3600));
        monitor.start();
        assert!(!monitor.is_exhausted());
        assert!(monitor.remaining() > Duration::from_secs(3500));
    }

    #[test]
    fn test_unstarted_monitor_has_full_budget() {
        let monitor = PerformanceMonitor::new(Duration::from_secs(5));
        assert_eq!(monitor.elapsed(), Duration::ZERO);
        assert_eq!(monitor.remaining(), Duration::from_secs(5));
    }

    #[test]
    fn test_phase_records_timing() {
        let mut monitor = PerformanceMonitor::new(Duration::from_secs(10));
        monitor.start();
        let value = monitor.phase("ordering", |m| {
            assert!(!m.is_exhausted());
            41 + 1
        });
        assert_eq!(value, 42);
        monitor.phase("validation", |_| ());
        let summary = monitor.summary();
        assert_eq!(summary.phases.len(), 2);
        assert_eq!(summary.phases[0].name, "ordering");
        assert!(summary.phase("validation").is_some());
        assert!(summary.phase("rebalance").is_none());
    }
}
