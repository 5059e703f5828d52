//! Scheduling Diagnostics.
//!
//! Accumulates what the search did: every pattern attempt in order,
//! escalations, failure records, candidate rejections by category and
//! backtracking statistics. At the end of a run the accumulator is turned
//! into a read-only [`DiagnosticsReport`] with derived improvement
//! suggestions.
//!
//! # Report contents
//!
//! | Field | Content |
//! |-------|---------|
//! | `pattern_attempts` | Chronological log of `(lesson, pattern, level, ok)` |
//! | `failures` | Patterns, levels and backtracks tried per failure; deferrals later resolved are flagged |
//! | `search_rejections` | Candidate windows rejected, by category |
//! | `violation_counts` | Findings of the final validation, by category |
//! | `suggestions` | Human-readable remedies |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConstraintViolation;
use crate::models::{
    BlockPattern, FailedLesson, FailureKind, RelaxationLevel, ViolationCategory, WorkloadViolation,
};
use crate::validation::ValidationReport;

/// Backtracking statistics of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktrackStats {
    /// Decisions undone in total.
    pub backtracks: usize,
    /// Times a lesson exhausted its undo budget for a pass.
    pub depth_limit_hits: usize,
    /// Most undone decisions in flight at once.
    pub max_in_flight: usize,
    /// Most undo operations performed on behalf of one lesson in one pass.
    pub max_undos_for_one_lesson: usize,
    /// Placement attempts with randomized candidate order.
    pub randomized_attempts: usize,
    /// Search passes run (rescue pass excluded).
    pub passes: usize,
}

/// One pattern attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAttempt {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Lesson hours.
    pub hours: usize,
    /// Sequence number of the placement attempt this pattern belongs to.
    pub attempt: usize,
    /// Pattern tried.
    pub pattern: BlockPattern,
    /// Level in force.
    pub level: RelaxationLevel,
    /// Whether the pattern was placed.
    pub succeeded: bool,
}

/// Explanation of one lesson failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Failure kind.
    pub kind: FailureKind,
    /// Distinct patterns tried so far, in first-tried order.
    pub patterns_tried: Vec<BlockPattern>,
    /// Distinct levels tried so far, ascending.
    pub levels_tried: Vec<RelaxationLevel>,
    /// Undo operations performed on behalf of the lesson.
    pub backtrack_attempts: usize,
    /// Required hours.
    pub required_hours: usize,
    /// Hours placed when the record was written.
    pub scheduled_hours: usize,
    /// Search pass that deferred the lesson; `None` for a final outcome.
    pub pass: Option<usize>,
    /// The lesson was fully placed later in the run.
    pub resolved: bool,
    /// Summary line.
    pub message: String,
}

/// A relaxation escalation triggered by a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    /// Lesson whose failure triggered it.
    pub lesson_id: String,
    /// Previous level.
    pub from: RelaxationLevel,
    /// New level.
    pub to: RelaxationLevel,
    /// Pass number (0-based).
    pub pass: usize,
}

/// Read-only diagnostics bundle of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Failure records in the order they were written.
    pub failures: Vec<FailureRecord>,
    /// Chronological pattern attempt log.
    pub pattern_attempts: Vec<PatternAttempt>,
    /// Escalations in order.
    pub escalations: Vec<EscalationRecord>,
    /// Pattern each placed lesson ended up with.
    pub successful_patterns: BTreeMap<String, BlockPattern>,
    /// Candidate windows rejected during search, by category.
    pub search_rejections: BTreeMap<ViolationCategory, usize>,
    /// Final validation findings, by category.
    pub violation_counts: BTreeMap<ViolationCategory, usize>,
    /// Teacher utilization (scheduled hours / available slots).
    pub teacher_utilization: BTreeMap<String, f64>,
    /// Class utilization (scheduled hours / grid slots).
    pub class_utilization: BTreeMap<String, f64>,
    /// Backtracking statistics.
    pub backtrack: BacktrackStats,
    /// Derived remedies.
    pub suggestions: Vec<String>,
}

impl DiagnosticsReport {
    /// Pattern attempts of one lesson, in the order they were made.
    pub fn attempts_for(&self, lesson_id: &str) -> Vec<&PatternAttempt> {
        self.pattern_attempts
            .iter()
            .filter(|a| a.lesson_id == lesson_id)
            .collect()
    }

    /// Failure records of a kind that still hold at the end of the run.
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &FailureRecord> {
        self.failures
            .iter()
            .filter(move |f| f.kind == kind && !f.resolved)
    }

    /// Deferrals of lessons that a later pass placed after all.
    pub fn resolved_deferrals(&self) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(|f| f.resolved)
    }

    /// Whether any failure of the kind was recorded.
    pub fn has_failure(&self, kind: FailureKind) -> bool {
        self.failures_of(kind).next().is_some()
    }
}

#[derive(Debug, Clone, Default)]
struct LessonTrace {
    patterns: Vec<BlockPattern>,
    levels: Vec<RelaxationLevel>,
    backtracks: usize,
}

/// Diagnostics accumulator.
#[derive(Debug, Default)]
pub struct Diagnostics {
    report: DiagnosticsReport,
    traces: BTreeMap<String, LessonTrace>,
    attempts: usize,
}

impl Diagnostics {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new placement attempt and returns its sequence number.
    pub fn next_attempt(&mut self) -> usize {
        self.attempts += 1;
        self.attempts
    }

    /// Records one pattern attempt.
    pub fn record_pattern_attempt(
        &mut self,
        lesson_id: &str,
        hours: usize,
        pattern: &BlockPattern,
        level: RelaxationLevel,
        attempt: usize,
        succeeded: bool,
    ) {
        let trace = self.traces.entry(lesson_id.to_string()).or_default();
        if !trace.patterns.contains(pattern) {
            trace.patterns.push(pattern.clone());
        }
        if !trace.levels.contains(&level) {
            trace.levels.push(level);
            trace.levels.sort();
        }
        self.report.pattern_attempts.push(PatternAttempt {
            lesson_id: lesson_id.to_string(),
            hours,
            attempt,
            pattern: pattern.clone(),
            level,
            succeeded,
        });
    }

    /// Records the pattern a lesson was placed with.
    pub fn record_success(&mut self, lesson_id: &str, pattern: &BlockPattern) {
        self.report
            .successful_patterns
            .insert(lesson_id.to_string(), pattern.clone());
    }

    /// Records an escalation.
    pub fn record_escalation(
        &mut self,
        lesson_id: &str,
        from: RelaxationLevel,
        to: RelaxationLevel,
        pass: usize,
    ) {
        self.report.escalations.push(EscalationRecord {
            lesson_id: lesson_id.to_string(),
            from,
            to,
            pass,
        });
    }

    /// Records an undo performed on behalf of a lesson.
    pub fn record_backtrack(&mut self, lesson_id: &str) {
        self.traces
            .entry(lesson_id.to_string())
            .or_default()
            .backtracks += 1;
    }

    /// Counts a rejected candidate window.
    pub fn record_rejection(&mut self, violation: &ConstraintViolation) {
        *self
            .report
            .search_rejections
            .entry(violation.category())
            .or_insert(0) += 1;
    }

    /// Adds rejection counts collected elsewhere.
    pub fn merge_rejections(&mut self, counts: &BTreeMap<ViolationCategory, usize>) {
        for (category, count) in counts {
            *self.report.search_rejections.entry(*category).or_insert(0) += count;
        }
    }

    /// Writes a failure record from the lesson's trace and returns it.
    ///
    /// `pass` is set when the lesson is only deferred to a later pass.
    pub fn record_failure(
        &mut self,
        lesson_id: &str,
        kind: FailureKind,
        required_hours: usize,
        scheduled_hours: usize,
        pass: Option<usize>,
    ) -> &FailureRecord {
        let trace = self.traces.get(lesson_id).cloned().unwrap_or_default();
        let patterns = trace
            .patterns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let levels = trace
            .levels
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!(
            "{kind:?} for lesson {lesson_id}: {scheduled_hours}/{required_hours}h placed; \
             patterns tried [{patterns}] at levels [{levels}]; {} backtrack(s)",
            trace.backtracks
        );
        let index = self.report.failures.len();
        self.report.failures.push(FailureRecord {
            lesson_id: lesson_id.to_string(),
            kind,
            patterns_tried: trace.patterns,
            levels_tried: trace.levels,
            backtrack_attempts: trace.backtracks,
            required_hours,
            scheduled_hours,
            pass,
            resolved: false,
            message,
        });
        &self.report.failures[index]
    }

    /// Copies validation counts in and turns fatal findings into suggestions.
    pub fn merge_validation(&mut self, validation: &ValidationReport) {
        for (category, count) in validation.counts() {
            *self.report.violation_counts.entry(*category).or_insert(0) += count;
        }
        for finding in validation.fatal() {
            self.report.suggestions.push(format!(
                "Internal defect: {} ({}); please report this input",
                finding.message, finding.entity
            ));
        }
    }

    /// Stores utilization ratios.
    pub fn set_utilization(
        &mut self,
        teacher: BTreeMap<String, f64>,
        class: BTreeMap<String, f64>,
    ) {
        self.report.teacher_utilization = teacher;
        self.report.class_utilization = class;
    }

    /// Stores backtracking statistics.
    pub fn set_backtrack_stats(&mut self, stats: BacktrackStats) {
        self.report.backtrack = stats;
    }

    /// Derives suggestions and closes the report.
    pub fn finish(
        mut self,
        failed: &[FailedLesson],
        workload: &[WorkloadViolation],
    ) -> DiagnosticsReport {
        for record in &mut self.report.failures {
            record.resolved = !failed.iter().any(|f| f.lesson_id == record.lesson_id);
        }

        let timed_out = failed
            .iter()
            .filter(|f| f.reason == FailureKind::TimeBudgetExceeded)
            .count();
        if timed_out > 0 {
            self.report.suggestions.push(format!(
                "Time budget ran out with {timed_out} lesson(s) unplaced; raise time_budget_secs"
            ));
        }

        for lesson in failed.iter().filter(|f| f.reason != FailureKind::TimeBudgetExceeded) {
            self.report.suggestions.push(format!(
                "Lesson {} ({}/{}) placed {}/{}h: free more slots for class {} or teacher {}, \
                 or allow a more split pattern",
                lesson.lesson_id,
                lesson.class_id,
                lesson.teacher_id,
                lesson.scheduled_hours,
                lesson.required_hours,
                lesson.class_id,
                lesson.teacher_id,
            ));
        }

        if !workload.is_empty() {
            let layout_bound = workload.iter().filter(|v| v.is_unavoidable()).count();
            self.report.suggestions.push(format!(
                "{} teacher(s) exceed the strict empty-day policy, {layout_bound} of them only \
                 because of their block layouts; see workload_violations",
                workload.len()
            ));
        }

        if !failed.is_empty() {
            let bottleneck = self
                .report
                .search_rejections
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(category, _)| *category);
            if let Some(category) = bottleneck {
                self.report.suggestions.push(format!(
                    "Most rejected candidate windows hit {}",
                    bottleneck_hint(category)
                ));
            }
        }

        let busy: Vec<String> = self
            .report
            .teacher_utilization
            .iter()
            .filter(|(_, u)| **u >= 0.9)
            .map(|(t, u)| format!("{t} ({:.0}%)", u * 100.0))
            .collect();
        if !busy.is_empty() {
            self.report.suggestions.push(format!(
                "Near-saturated teachers limit placement freedom: {}",
                busy.join(", ")
            ));
        }

        self.report
    }
}

fn bottleneck_hint(category: ViolationCategory) -> &'static str {
    match category {
        ViolationCategory::TeacherConflict => "teacher double-booking; teacher timetables are tight",
        ViolationCategory::ClassConflict => "class double-booking; class timetables are tight",
        ViolationCategory::HourMismatch => "hour mismatches",
        ViolationCategory::BlockContiguity => "the one-piece-per-day rule; days are too fragmented",
        ViolationCategory::Availability => "teacher unavailability windows",
        ViolationCategory::Workload => "the empty-day policy; consider a looser workload threshold",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeSlot;

    fn failed(id: &str, reason: FailureKind) -> FailedLesson {
        FailedLesson {
            lesson_id: id.into(),
            class_id: "9A".into(),
            teacher_id: "T1".into(),
            required_hours: 4,
            scheduled_hours: 1,
            reason,
        }
    }

    #[test]
    fn test_trace_feeds_failure_record() {
        let mut diag = Diagnostics::new();
        let attempt = diag.next_attempt();
        let p1 = BlockPattern::new(vec![2, 2]);
        let p2 = BlockPattern::new(vec![3, 1]);
        diag.record_pattern_attempt("L1", 4, &p1, RelaxationLevel::WorkloadFlex, attempt, false);
        diag.record_pattern_attempt("L1", 4, &p2, RelaxationLevel::WorkloadFlex, attempt, false);
        diag.record_pattern_attempt("L1", 4, &p1, RelaxationLevel::Strict, attempt, false);
        diag.record_backtrack("L1");

        let record = diag.record_failure("L1", FailureKind::BlockPlacementFailure, 4, 0, None);
        assert_eq!(record.patterns_tried, vec![p1, p2]);
        assert_eq!(
            record.levels_tried,
            vec![RelaxationLevel::Strict, RelaxationLevel::WorkloadFlex]
        );
        assert_eq!(record.backtrack_attempts, 1);
        assert!(record.message.contains("[2,2], [3,1]"));

        let report = diag.finish(&[failed("L1", FailureKind::BlockPlacementFailure)], &[]);
        assert_eq!(report.attempts_for("L1").len(), 3);
        assert!(report.has_failure(FailureKind::BlockPlacementFailure));
    }

    #[test]
    fn test_deferral_resolved_when_placed_later() {
        let mut diag = Diagnostics::new();
        diag.record_failure("L1", FailureKind::DepthLimitExceeded, 4, 0, Some(0));
        diag.record_failure("L2", FailureKind::DepthLimitExceeded, 2, 0, Some(0));
        diag.record_failure("L2", FailureKind::BlockPlacementFailure, 2, 1, None);

        // Only L2 is still unplaced when the run ends.
        let report = diag.finish(&[failed("L2", FailureKind::BlockPlacementFailure)], &[]);
        assert!(report.failures[0].resolved);
        assert_eq!(report.failures[0].pass, Some(0));
        assert!(!report.failures[1].resolved);
        assert!(!report.failures[2].resolved);

        let depth: Vec<_> = report.failures_of(FailureKind::DepthLimitExceeded).collect();
        assert_eq!(depth.len(), 1);
        assert_eq!(depth[0].lesson_id, "L2");
        assert_eq!(report.resolved_deferrals().count(), 1);
    }

    #[test]
    fn test_rejections_by_category() {
        let mut diag = Diagnostics::new();
        diag.record_rejection(&ConstraintViolation::SameDayPiece { day: 0 });
        diag.record_rejection(&ConstraintViolation::TeacherConflict {
            teacher: "T1".into(),
            slot: TimeSlot::new(0, 0),
        });
        diag.record_rejection(&ConstraintViolation::TeacherConflict {
            teacher: "T1".into(),
            slot: TimeSlot::new(0, 1),
        });
        let report = diag.finish(&[failed("L1", FailureKind::BlockPlacementFailure)], &[]);
        assert_eq!(report.search_rejections[&ViolationCategory::TeacherConflict], 2);
        assert_eq!(report.search_rejections[&ViolationCategory::BlockContiguity], 1);
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("teacher double-booking")));
    }

    #[test]
    fn test_timeout_suggestion() {
        let report = Diagnostics::new().finish(
            &[
                failed("L1", FailureKind::TimeBudgetExceeded),
                failed("L2", FailureKind::TimeBudgetExceeded),
            ],
            &[],
        );
        assert!(report.suggestions[0].contains("2 lesson(s)"));
        assert_eq!(report.suggestions.len(), 1);
    }

    #[test]
    fn test_saturated_teacher_suggestion() {
        let mut diag = Diagnostics::new();
        let teachers = BTreeMap::from([("T1".to_string(), 0.95), ("T2".to_string(), 0.2)]);
        diag.set_utilization(teachers, BTreeMap::new());
        let report = diag.finish(&[], &[]);
        assert_eq!(report.suggestions.len(), 1);
        assert!(report.suggestions[0].contains("T1 (95%)"));
    }
}
