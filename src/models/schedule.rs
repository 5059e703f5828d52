//! Schedule result model.
//!
//! [`ScheduleResult`] is the immutable output of one run: the placed
//! entries, what could not be placed and why, workload deviations from
//! the strict policy, utilization, and the diagnostics bundle. Fields are
//! read through accessors only; the value is meant to be serialized as-is
//! for reporting and rendering.
//!
//! # Failure taxonomy
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `BlockPlacementFailure` | No window for any pattern at the level tried |
//! | `TeacherConflict` / `ClassConflict` | Double booking (rejected before commit) |
//! | `WorkloadViolation` | Teacher empty days above the strict limit (soft) |
//! | `AvailabilityViolation` | Placement inside an unavailable window |
//! | `DepthLimitExceeded` | Backtracking gave up on a lesson for one pass |
//! | `TimeBudgetExceeded` | Global early termination |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{RelaxationLevel, ScheduleEntry};
use crate::engine::{BacktrackStats, DiagnosticsReport, PerformanceSummary};
use crate::validation::ValidationReport;

/// Failure and violation taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// No window found for any pattern at the current level.
    BlockPlacementFailure,
    /// Teacher double booking.
    TeacherConflict,
    /// Class double booking.
    ClassConflict,
    /// Teacher empty days above the strict policy.
    WorkloadViolation,
    /// Teacher scheduled inside an unavailable window.
    AvailabilityViolation,
    /// Backtracking exhausted its depth for the lesson in one pass.
    DepthLimitExceeded,
    /// The time budget ran out before the lesson was attempted.
    TimeBudgetExceeded,
}

/// Category used in per-category violation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// Two entries (or an entry and a fixed placement) share a teacher slot.
    TeacherConflict,
    /// Two entries (or an entry and a fixed placement) share a class slot.
    ClassConflict,
    /// A lesson's scheduled hours differ from its requirement.
    HourMismatch,
    /// A block is not one contiguous run on one day.
    BlockContiguity,
    /// A teacher is scheduled while unavailable.
    Availability,
    /// A teacher has more empty days than allowed.
    Workload,
}

/// A lesson that is not fully placed in the final schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedLesson {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Class identifier.
    pub class_id: String,
    /// Teacher identifier.
    pub teacher_id: String,
    /// Required weekly hours.
    pub required_hours: usize,
    /// Hours that did get placed (partial placement).
    pub scheduled_hours: usize,
    /// Final reason.
    pub reason: FailureKind,
}

/// A teacher whose empty-day count exceeds the strict policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadViolation {
    /// Teacher identifier.
    pub teacher_id: String,
    /// Days (0-based) without any hour for the teacher.
    pub empty_days: Vec<usize>,
    /// Empty days allowed by the strict policy.
    pub allowed: usize,
    /// Empty days the teacher's preferred block layouts cannot cover.
    pub unavoidable: usize,
    /// Suggested manual adjustment.
    pub suggestion: String,
}

impl WorkloadViolation {
    /// Number of empty days above the allowance.
    pub fn excess(&self) -> usize {
        self.empty_days.len().saturating_sub(self.allowed)
    }

    /// Whether the load is too small to fill more days with preferred layouts.
    pub fn is_unavoidable(&self) -> bool {
        self.empty_days.len() <= self.unavoidable
    }
}

/// How a rebalancing step moved blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// The block moved into free cells.
    Relocate,
    /// The block traded cells with a block of another lesson.
    Swap {
        /// Lesson of the other block.
        other_lesson_id: String,
        /// The other block.
        other_block_id: usize,
    },
}

/// One accepted rebalancing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadAdjustment {
    /// Teacher whose empty days were reduced.
    pub teacher_id: String,
    /// Lesson of the moved block.
    pub lesson_id: String,
    /// Moved block.
    pub block_id: usize,
    /// Day the block left.
    pub from_day: usize,
    /// Day the block moved to.
    pub to_day: usize,
    /// Move type.
    pub kind: AdjustmentKind,
}

/// Immutable result of one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub(crate) entries: Vec<ScheduleEntry>,
    pub(crate) completion_rate: f64,
    pub(crate) total_hours: usize,
    pub(crate) scheduled_hours: usize,
    pub(crate) failed_lessons: Vec<FailedLesson>,
    pub(crate) workload_violations: Vec<WorkloadViolation>,
    pub(crate) adjustments: Vec<WorkloadAdjustment>,
    pub(crate) violation_counts: BTreeMap<ViolationCategory, usize>,
    pub(crate) teacher_utilization: BTreeMap<String, f64>,
    pub(crate) class_utilization: BTreeMap<String, f64>,
    pub(crate) backtrack: BacktrackStats,
    pub(crate) reporting_level: RelaxationLevel,
    pub(crate) highest_level_used: RelaxationLevel,
    pub(crate) relaxed_entries: usize,
    pub(crate) timed_out: bool,
    pub(crate) validation: ValidationReport,
    pub(crate) diagnostics: DiagnosticsReport,
    #[serde(skip)]
    pub(crate) performance: PerformanceSummary,
}

impl ScheduleResult {
    /// All placed entries, ordered by slot, class, teacher.
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Fill rate: scheduled hours / required hours (1.0 for an empty roster).
    pub fn completion_rate(&self) -> f64 {
        self.completion_rate
    }

    /// Required hours across the roster.
    pub fn total_hours(&self) -> usize {
        self.total_hours
    }

    /// Placed hours.
    pub fn scheduled_hours(&self) -> usize {
        self.scheduled_hours
    }

    /// Whether every lesson is fully placed.
    pub fn is_complete(&self) -> bool {
        self.failed_lessons.is_empty()
    }

    /// Lessons not fully placed.
    pub fn failed_lessons(&self) -> &[FailedLesson] {
        &self.failed_lessons
    }

    /// Strict-policy workload deviations.
    pub fn workload_violations(&self) -> &[WorkloadViolation] {
        &self.workload_violations
    }

    /// Accepted rebalancing steps.
    pub fn adjustments(&self) -> &[WorkloadAdjustment] {
        &self.adjustments
    }

    /// Violation counts by category (final validation plus search rejections).
    pub fn violation_counts(&self) -> &BTreeMap<ViolationCategory, usize> {
        &self.violation_counts
    }

    /// Count for one category.
    pub fn violation_count(&self, category: ViolationCategory) -> usize {
        self.violation_counts.get(&category).copied().unwrap_or(0)
    }

    /// Teacher id → scheduled hours / available slots.
    pub fn teacher_utilization(&self) -> &BTreeMap<String, f64> {
        &self.teacher_utilization
    }

    /// Class id → scheduled hours / grid slots.
    pub fn class_utilization(&self) -> &BTreeMap<String, f64> {
        &self.class_utilization
    }

    /// Backtracking statistics.
    pub fn backtrack_stats(&self) -> &BacktrackStats {
        &self.backtrack
    }

    /// Level the report is expressed against (always `strict`).
    pub fn reporting_level(&self) -> RelaxationLevel {
        self.reporting_level
    }

    /// Most permissive level any entry was placed under.
    pub fn highest_level_used(&self) -> RelaxationLevel {
        self.highest_level_used
    }

    /// Entries placed under a level above `strict`.
    pub fn relaxed_entries(&self) -> usize {
        self.relaxed_entries
    }

    /// Whether the time budget stopped the search.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Independent validation of the final entries.
    pub fn validation(&self) -> &ValidationReport {
        &self.validation
    }

    /// Diagnostics bundle.
    pub fn diagnostics(&self) -> &DiagnosticsReport {
        &self.diagnostics
    }

    /// Wall-clock timings (not serialized).
    pub fn performance(&self) -> &PerformanceSummary {
        &self.performance
    }

    /// Entries of one lesson.
    pub fn entries_for_lesson(&self, lesson_id: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.lesson_id == lesson_id)
            .collect()
    }

    /// Entries of one teacher.
    pub fn entries_for_teacher(&self, teacher_id: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.teacher_id == teacher_id)
            .collect()
    }

    /// Entries of one class.
    pub fn entries_for_class(&self, class_id: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.class_id == class_id)
            .collect()
    }

    /// Hours placed for one lesson.
    pub fn hours_for_lesson(&self, lesson_id: &str) -> usize {
        self.entries.iter().filter(|e| e.lesson_id == lesson_id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_violation_excess() {
        let v = WorkloadViolation {
            teacher_id: "T1".into(),
            empty_days: vec![3, 4],
            allowed: 1,
            unavoidable: 0,
            suggestion: "move a block".into(),
        };
        assert_eq!(v.excess(), 1);
        assert!(!v.is_unavoidable());

        let layout_bound = WorkloadViolation {
            unavoidable: 2,
            ..v
        };
        assert_eq!(layout_bound.excess(), 1);
        assert!(layout_bound.is_unavoidable());
    }

    #[test]
    fn test_category_serde_as_map_key() {
        let mut counts = BTreeMap::new();
        counts.insert(ViolationCategory::TeacherConflict, 2usize);
        counts.insert(ViolationCategory::Workload, 1usize);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"teacher_conflict":2,"workload":1}"#);
    }

    #[test]
    fn test_adjustment_kind_serde() {
        let kind = AdjustmentKind::Swap {
            other_lesson_id: "L2".into(),
            other_block_id: 7,
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("swap"));
        let back: AdjustmentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
