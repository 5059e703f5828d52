//! Scheduling Orchestrator.
//!
//! Sequences the engine components into one run:
//!
//! 1. Validate the snapshot, start the monitor.
//! 2. Order lessons: hours descending, then fewest open windows for the
//!    largest preferred piece, then lesson id.
//! 3. Search passes. Every lesson is first tried at `strict`; a lesson
//!    that fails escalates its own level, and one that fails at the top
//!    level undoes a competing decision. The next lesson starts at
//!    `strict` again, and an undone lesson resumes at the level its own
//!    sequence started from. A lesson out of undo budget is deferred to the
//!    next pass.
//! 4. Rescue pass for what is left, at the top level with partial
//!    placement as the last resort.
//! 5. Workload rebalancing when every lesson is placed but teachers remain
//!    above the strict empty-day policy.
//! 6. Restore `strict`, validate, assemble the result.
//!
//! The budget is checked before every lesson attempt and every
//! rebalancing step. When it runs out, the lessons not yet placed are
//! reported as [`FailureKind::TimeBudgetExceeded`] and everything already
//! committed is kept.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::backtracking::{BacktrackOutcome, BacktrackingManager, Placement, PlacementContext};
use super::blocks::FlexibleBlockManager;
use super::diagnostics::Diagnostics;
use super::monitor::{PerformanceMonitor, PerformanceSummary};
use super::relaxation::ConstraintRelaxationEngine;
use super::roster::Roster;
use crate::config::SchedulerConfig;
use crate::error::{ConstraintViolation, Result, ScheduleError};
use crate::models::{
    FailedLesson, FailureKind, RelaxationLevel, ScheduleEntry, ScheduleInput, ScheduleResult,
    TimeSlot, WorkloadAdjustment,
};
use crate::validation::{validate_input, SolutionValidator, ValidationReport};

/// Top-level scheduling workflow.
///
/// Holds only configuration; every call builds its own search state, so
/// one orchestrator can serve independent runs.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOrchestrator {
    config: SchedulerConfig,
}

impl ScheduleOrchestrator {
    /// Creates an orchestrator.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs with the configured time budget.
    pub fn schedule(&self, input: &ScheduleInput) -> Result<ScheduleResult> {
        self.generate_complete_schedule(input, self.config.time_budget())
    }

    /// Builds a complete timetable for `input` within `time_budget`.
    ///
    /// Fails only when the snapshot is malformed. Placement failures and
    /// budget exhaustion are reported inside the result.
    pub fn generate_complete_schedule(
        &self,
        input: &ScheduleInput,
        time_budget: Duration,
    ) -> Result<ScheduleResult> {
        validate_input(input).map_err(ScheduleError::InvalidInput)?;

        let mut monitor = PerformanceMonitor::new(time_budget);
        monitor.start();
        info!(
            lessons = input.lessons.len(),
            hours = input.total_hours(),
            budget_ms = time_budget.as_millis() as u64,
            seed = self.config.seed,
            "schedule generation started"
        );

        let mut run = SearchRun::new(input, &self.config);
        let order = monitor.phase("ordering", |_| run.order_lessons());
        monitor.phase("search", |m| run.search(order, m));
        if run.should_rebalance() {
            monitor.phase("rebalance", |m| run.rebalance(m));
        }
        run.relax.restore_to_strict();

        let entries = run.manager.entries(&run.roster);
        let unfinished: Vec<String> = run
            .failed
            .keys()
            .map(|&l| run.roster.lessons[l].id.clone())
            .collect();
        let validation = monitor.phase("validation", |_| {
            SolutionValidator::new(input, &self.config)
                .with_unfinished(unfinished)
                .validate(&entries)
        });
        for finding in validation.fatal() {
            warn!(entity = %finding.entity, category = ?finding.category, "{}", finding.message);
        }

        let result = run.assemble(entries, validation, monitor.summary());
        info!(
            scheduled = result.scheduled_hours(),
            total = result.total_hours(),
            failed = result.failed_lessons().len(),
            level = %result.highest_level_used(),
            elapsed_ms = result.performance().elapsed.as_millis() as u64,
            "schedule generation finished"
        );
        Ok(result)
    }
}

/// Runs [`ScheduleOrchestrator::schedule`] with `config`.
pub fn generate_complete_schedule(
    input: &ScheduleInput,
    config: &SchedulerConfig,
) -> Result<ScheduleResult> {
    ScheduleOrchestrator::new(config.clone()).schedule(input)
}

/// Outcome of one lesson attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Placed,
    /// The level went up; retry the same lesson.
    Escalated,
    /// A competing lesson was undone; retry this one, then it.
    Undid(usize),
    /// Out of options for this pass.
    Deferred,
}

/// Where one lesson's attempt sequence stands.
#[derive(Debug, Clone, Copy)]
struct Sequence {
    start: RelaxationLevel,
    current: RelaxationLevel,
}

impl Sequence {
    fn at(level: RelaxationLevel) -> Self {
        Self { start: level, current: level }
    }
}

/// Mutable state of one run.
struct SearchRun<'a> {
    config: &'a SchedulerConfig,
    blocks: FlexibleBlockManager,
    roster: Roster,
    manager: BacktrackingManager,
    relax: ConstraintRelaxationEngine,
    diagnostics: Diagnostics,
    /// lesson → failures at the top level plus times undone
    setbacks: Vec<usize>,
    /// lesson → levels of its unfinished attempt sequence; absent means
    /// the next attempt starts at `strict`
    sequences: BTreeMap<usize, Sequence>,
    failed: BTreeMap<usize, FailureKind>,
    adjustments: Vec<WorkloadAdjustment>,
    timed_out: bool,
    pass: usize,
}

impl<'a> SearchRun<'a> {
    fn new(input: &ScheduleInput, config: &'a SchedulerConfig) -> Self {
        let blocks = FlexibleBlockManager::new(config.patterns.clone());
        let roster = Roster::build(input, &blocks);
        let manager = BacktrackingManager::new(&roster, config);
        let lessons = roster.lessons.len();
        Self {
            config,
            blocks,
            roster,
            manager,
            relax: ConstraintRelaxationEngine::new(config.workload.clone()),
            diagnostics: Diagnostics::new(),
            setbacks: vec![0; lessons],
            sequences: BTreeMap::new(),
            failed: BTreeMap::new(),
            adjustments: Vec::new(),
            timed_out: false,
            pass: 0,
        }
    }

    fn order_lessons(&self) -> Vec<usize> {
        let scarcity: Vec<usize> = (0..self.roster.lessons.len())
            .map(|l| self.open_windows(l))
            .collect();
        let mut order: Vec<usize> = (0..self.roster.lessons.len()).collect();
        order.sort_by(|&a, &b| {
            let (la, lb) = (&self.roster.lessons[a], &self.roster.lessons[b]);
            lb.hours
                .cmp(&la.hours)
                .then(scarcity[a].cmp(&scarcity[b]))
                .then_with(|| la.id.cmp(&lb.id))
        });
        order
    }

    /// Strict-level windows for the largest piece of the preferred pattern.
    fn open_windows(&self, lesson: usize) -> usize {
        let grid = self.roster.grid;
        let info = &self.roster.lessons[lesson];
        let piece = info.patterns[0].largest_piece();
        let state = self.manager.state();
        let usable = |day: usize, period: usize| {
            let idx = grid.index(TimeSlot::new(day, period));
            state.teacher_free(info.teacher, idx)
                && state.class_free(info.class, idx)
                && !self.roster.is_unavailable(info.teacher, TimeSlot::new(day, period))
        };
        let Some(last_start) = grid.periods_per_day.checked_sub(piece) else {
            return 0;
        };
        (0..grid.days)
            .map(|day| {
                (0..=last_start)
                    .filter(|&start| (start..start + piece).all(|p| usable(day, p)))
                    .count()
            })
            .sum()
    }

    fn search(&mut self, order: Vec<usize>, monitor: &mut PerformanceMonitor) {
        let mut pending = order;
        for pass in 0..self.config.max_passes.max(1) {
            if pending.is_empty() {
                break;
            }
            self.pass = pass;
            self.sequences.clear();
            self.relax.restore_to_strict();
            self.manager.begin_pass();
            self.manager
                .apply_randomization(self.config.seed.wrapping_add(pass as u64));

            let before = pending.len();
            info!(pass, lessons = before, "search pass started");
            pending = self.run_pass(pending, monitor);
            info!(
                pass,
                deferred = pending.len(),
                highest = %self.relax.highest_used(),
                "search pass finished"
            );
            if self.timed_out || pending.len() >= before {
                break;
            }
        }
        if !self.timed_out && !pending.is_empty() {
            self.rescue_pass(pending, monitor);
        }
    }

    fn run_pass(&mut self, lessons: Vec<usize>, monitor: &mut PerformanceMonitor) -> Vec<usize> {
        let mut queue: VecDeque<usize> = lessons.into();
        let mut deferred = Vec::new();
        while let Some(lesson) = queue.pop_front() {
            if monitor.is_exhausted() {
                queue.push_front(lesson);
                self.stop_on_budget(queue.into_iter().chain(deferred));
                return Vec::new();
            }
            match self.attempt(lesson) {
                Step::Placed => {}
                Step::Escalated => queue.push_front(lesson),
                Step::Undid(undone) => {
                    queue.push_front(undone);
                    queue.push_front(lesson);
                }
                Step::Deferred => deferred.push(lesson),
            }
        }
        deferred
    }

    fn attempt(&mut self, lesson: usize) -> Step {
        let sequence = *self
            .sequences
            .entry(lesson)
            .or_insert(Sequence::at(RelaxationLevel::Strict));
        let level = sequence.current;
        self.relax.resume_at(level);
        let ctx = PlacementContext {
            level,
            workload_limit: self.relax.workload_limit(),
            randomize: self.setbacks[lesson] > 0,
        };
        if ctx.randomize {
            self.manager.note_randomized_attempt();
        }

        let found = self.blocks.try_alternatives(
            &self.roster,
            &mut self.manager,
            &mut self.diagnostics,
            lesson,
            &ctx,
        );
        if let Ok(placement) = found {
            return match self.commit(lesson, placement, level, sequence.start, false) {
                Ok(()) => {
                    self.sequences.remove(&lesson);
                    Step::Placed
                }
                Err(_) => self.defer(lesson, FailureKind::BlockPlacementFailure),
            };
        }

        let id = self.roster.lessons[lesson].id.clone();
        if self.relax.escalate() {
            let to = self.relax.current();
            if let Some(sequence) = self.sequences.get_mut(&lesson) {
                sequence.current = to;
            }
            debug!(lesson = %id, from = %level, to = %to, "relaxation escalated");
            self.diagnostics.record_escalation(&id, level, to, self.pass);
            return Step::Escalated;
        }

        self.setbacks[lesson] += 1;
        match self.manager.backtrack(&self.roster, lesson) {
            BacktrackOutcome::Undone {
                lesson: undone,
                level_before,
            } => {
                self.setbacks[undone] += 1;
                self.sequences.insert(undone, Sequence::at(level_before));
                self.diagnostics.record_backtrack(&id);
                debug!(
                    lesson = %id,
                    undone = %self.roster.lessons[undone].id,
                    resume = %level_before,
                    "decision undone"
                );
                Step::Undid(undone)
            }
            BacktrackOutcome::DepthExhausted => self.defer(lesson, FailureKind::DepthLimitExceeded),
            BacktrackOutcome::NothingToUndo => {
                self.defer(lesson, FailureKind::BlockPlacementFailure)
            }
        }
    }

    fn defer(&mut self, lesson: usize, kind: FailureKind) -> Step {
        self.manager.settle(lesson);
        self.sequences.remove(&lesson);
        let info = &self.roster.lessons[lesson];
        self.diagnostics
            .record_failure(&info.id, kind, info.hours, 0, Some(self.pass));
        debug!(lesson = %info.id, ?kind, pass = self.pass, "lesson deferred");
        Step::Deferred
    }

    /// Commits a found layout. A layout that would double-book a cell is
    /// refused, counted as a rejection and leaves the state unchanged.
    fn commit(
        &mut self,
        lesson: usize,
        placement: Placement,
        level: RelaxationLevel,
        level_before: RelaxationLevel,
        partial: bool,
    ) -> std::result::Result<(), ConstraintViolation> {
        let info = &self.roster.lessons[lesson];
        let pattern = placement.pattern.clone();
        if let Err(violation) =
            self.manager
                .commit(&self.roster, lesson, placement, level, level_before, partial)
        {
            error!(lesson = %info.id, %violation, "placement refused at commit");
            self.diagnostics.record_rejection(&violation);
            return Err(violation);
        }
        if !partial {
            self.diagnostics.record_success(&info.id, &pattern);
        }
        debug!(
            lesson = %info.id,
            pattern = %pattern,
            level = %level,
            partial,
            "lesson placed"
        );
        Ok(())
    }

    fn rescue_pass(&mut self, pending: Vec<usize>, monitor: &mut PerformanceMonitor) {
        self.relax.enter_rescue();
        let level = self.relax.current();
        info!(
            lessons = pending.len(),
            tolerance = ?self.config.workload.balance_tolerance,
            "rescue pass started"
        );

        let mut rest = pending.into_iter();
        while let Some(lesson) = rest.next() {
            if monitor.is_exhausted() {
                self.stop_on_budget(std::iter::once(lesson).chain(rest));
                return;
            }
            let ctx = PlacementContext {
                level,
                workload_limit: self.relax.workload_limit(),
                randomize: self.setbacks[lesson] > 0,
            };
            let found = self.blocks.try_alternatives(
                &self.roster,
                &mut self.manager,
                &mut self.diagnostics,
                lesson,
                &ctx,
            );
            if let Ok(placement) = found {
                if self.commit(lesson, placement, level, level, false).is_ok() {
                    continue;
                }
            }

            let partial = self
                .blocks
                .fill_partial(&self.roster, &mut self.manager, lesson, &ctx);
            let placed = match partial {
                Some(placement) => {
                    let hours = placement.windows.len();
                    match self.commit(lesson, placement, level, level, true) {
                        Ok(()) => hours,
                        Err(_) => 0,
                    }
                }
                None => 0,
            };
            self.failed.insert(lesson, FailureKind::BlockPlacementFailure);
            let info = &self.roster.lessons[lesson];
            self.diagnostics.record_failure(
                &info.id,
                FailureKind::BlockPlacementFailure,
                info.hours,
                placed,
                None,
            );
            warn!(
                lesson = %info.id,
                placed,
                required = info.hours,
                "lesson could not be fully placed"
            );
        }
    }

    fn stop_on_budget(&mut self, lessons: impl Iterator<Item = usize>) {
        self.timed_out = true;
        let mut count = 0;
        for lesson in lessons {
            self.manager.settle(lesson);
            self.failed.insert(lesson, FailureKind::TimeBudgetExceeded);
            let info = &self.roster.lessons[lesson];
            self.diagnostics.record_failure(
                &info.id,
                FailureKind::TimeBudgetExceeded,
                info.hours,
                self.manager.state().lesson_hours(lesson),
                None,
            );
            count += 1;
        }
        warn!(unplaced = count, "search stopped by time budget");
    }

    fn should_rebalance(&self) -> bool {
        !self.timed_out
            && self.failed.is_empty()
            && self.relax.strict_excess(&self.roster, self.manager.state()) > 0
    }

    fn rebalance(&mut self, monitor: &mut PerformanceMonitor) {
        self.adjustments = self.relax.rebalance_workload(
            &self.roster,
            &mut self.manager,
            monitor,
            self.config.max_rebalance_steps,
        );
    }

    fn assemble(
        mut self,
        entries: Vec<ScheduleEntry>,
        validation: ValidationReport,
        performance: PerformanceSummary,
    ) -> ScheduleResult {
        let grid = self.roster.grid;
        let total_hours: usize = self.roster.lessons.iter().map(|l| l.hours).sum();
        let scheduled_hours = entries.len();
        let completion_rate = if total_hours == 0 {
            1.0
        } else {
            scheduled_hours as f64 / total_hours as f64
        };

        let mut failed_lessons: Vec<FailedLesson> = self
            .failed
            .iter()
            .map(|(&lesson, &reason)| {
                let info = &self.roster.lessons[lesson];
                FailedLesson {
                    lesson_id: info.id.clone(),
                    class_id: info.class_id.clone(),
                    teacher_id: info.teacher_id.clone(),
                    required_hours: info.hours,
                    scheduled_hours: self.manager.state().lesson_hours(lesson),
                    reason,
                }
            })
            .collect();
        failed_lessons.sort_by(|a, b| a.lesson_id.cmp(&b.lesson_id));

        let mut teacher_hours: BTreeMap<&str, usize> = BTreeMap::new();
        let mut class_hours: BTreeMap<&str, usize> = BTreeMap::new();
        for e in &entries {
            *teacher_hours.entry(e.teacher_id.as_str()).or_insert(0) += 1;
            *class_hours.entry(e.class_id.as_str()).or_insert(0) += 1;
        }
        let teacher_utilization: BTreeMap<String, f64> = (0..self.roster.teachers.len())
            .filter(|&t| self.roster.teaches(t))
            .map(|t| {
                let id = &self.roster.teachers[t];
                let hours = teacher_hours.get(id.as_str()).copied().unwrap_or(0);
                let available = self.roster.available_slot_count(t);
                let ratio = if available == 0 {
                    0.0
                } else {
                    hours as f64 / available as f64
                };
                (id.clone(), ratio)
            })
            .collect();
        let slots = grid.slot_count().max(1) as f64;
        let class_utilization: BTreeMap<String, f64> = self
            .roster
            .classes
            .iter()
            .filter(|c| self.roster.lessons.iter().any(|l| &l.class_id == *c))
            .map(|c| {
                let hours = class_hours.get(c.as_str()).copied().unwrap_or(0);
                (c.clone(), hours as f64 / slots)
            })
            .collect();

        let relaxed_entries = entries
            .iter()
            .filter(|e| e.level > RelaxationLevel::Strict)
            .count();
        let workload_violations = validation.workload_violations().to_vec();
        let backtrack = self.manager.stats().clone();

        self.diagnostics.merge_rejections(self.manager.rejections());
        self.diagnostics.merge_validation(&validation);
        self.diagnostics
            .set_utilization(teacher_utilization.clone(), class_utilization.clone());
        self.diagnostics.set_backtrack_stats(backtrack.clone());
        let diagnostics = self.diagnostics.finish(&failed_lessons, &workload_violations);

        ScheduleResult {
            entries,
            completion_rate,
            total_hours,
            scheduled_hours,
            failed_lessons,
            workload_violations,
            adjustments: self.adjustments,
            violation_counts: validation.counts().clone(),
            teacher_utilization,
            class_utilization,
            backtrack,
            reporting_level: self.relax.current(),
            highest_level_used: self.relax.highest_used(),
            relaxed_entries,
            timed_out: self.timed_out,
            validation,
            diagnostics,
            performance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FixedPlacement, Lesson, ViolationCategory, WeekGrid};
    use crate::validation::ValidationErrorKind;

    fn budget() -> Duration {
        Duration::from_secs(10)
    }

    #[test]
    fn test_invalid_input_is_error() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 0));
        let err = ScheduleOrchestrator::default()
            .generate_complete_schedule(&input, budget())
            .unwrap_err();
        let ScheduleError::InvalidInput(errors) = err;
        assert_eq!(errors[0].kind, ValidationErrorKind::NonPositiveHours);
    }

    #[test]
    fn test_empty_roster() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6));
        let result = ScheduleOrchestrator::default()
            .generate_complete_schedule(&input, budget())
            .unwrap();
        assert!(result.is_complete());
        assert_eq!(result.completion_rate(), 1.0);
        assert!(result.entries().is_empty());
    }

    #[test]
    fn test_ordering_largest_then_scarcest() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("A", "9A", "T1", "math", 2))
            .with_lesson(Lesson::new("B", "9B", "T2", "art", 2))
            .with_lesson(Lesson::new("C", "9C", "T3", "bio", 4))
            .with_unavailable_day("T2", 0);
        let config = SchedulerConfig::default();
        let run = SearchRun::new(&input, &config);
        let order: Vec<&str> = run
            .order_lessons()
            .into_iter()
            .map(|l| run.roster.lessons[l].id.as_str())
            .collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_fixed_placements_respected() {
        let mut input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 4))
            .with_lesson(Lesson::new("L2", "9A", "T2", "art", 3));
        for day in 0..5 {
            input = input.with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(day, 0)));
        }
        let result = ScheduleOrchestrator::default()
            .generate_complete_schedule(&input, budget())
            .unwrap();
        assert!(result.is_complete());
        assert!(result.entries().iter().all(|e| e.period() != 0));
        assert!(result.validation().is_valid());
    }

    #[test]
    fn test_relaxed_levels_reported() {
        let mut input = ScheduleInput::new(WeekGrid::new(2, 3))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 2));
        // Only non-adjacent cells remain: the 2h lesson can be split or use [1,1].
        input = input
            .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(0, 1)))
            .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(1, 0)))
            .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(1, 1)))
            .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(1, 2)));
        let result = ScheduleOrchestrator::default()
            .generate_complete_schedule(&input, budget())
            .unwrap();
        assert!(result.is_complete());
        assert_eq!(result.reporting_level(), RelaxationLevel::Strict);
        assert!(result.highest_level_used() >= RelaxationLevel::BlockFlex);
        assert_eq!(result.relaxed_entries(), 2);
        assert_eq!(result.violation_count(ViolationCategory::BlockContiguity), 0);
    }

    #[test]
    fn test_each_lesson_starts_strict() {
        let mut input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("A", "9A", "T1", "math", 2))
            .with_lesson(Lesson::new("B", "9B", "T2", "art", 2));
        let grid = input.grid;
        for slot in grid.slots().collect::<Vec<_>>() {
            if slot != TimeSlot::new(0, 0) && slot != TimeSlot::new(0, 2) {
                input = input.with_fixed(FixedPlacement::class_only("9A", slot));
            }
        }
        let config = SchedulerConfig::default();
        let mut run = SearchRun::new(&input, &config);

        assert_eq!(run.attempt(0), Step::Escalated);
        assert_eq!(run.attempt(0), Step::Escalated);
        assert_eq!(run.attempt(0), Step::Placed);
        assert!(run.sequences.is_empty());

        assert_eq!(run.attempt(1), Step::Placed);
        let levels: Vec<(usize, RelaxationLevel)> = run
            .manager
            .decisions()
            .iter()
            .map(|d| (d.lesson, d.level))
            .collect();
        assert_eq!(
            levels,
            vec![(0, RelaxationLevel::BlockFlex), (1, RelaxationLevel::Strict)]
        );
        assert_eq!(run.relax.highest_used(), RelaxationLevel::BlockFlex);
    }

    #[test]
    fn test_undone_lesson_resumes_at_its_start_level() {
        // One cell for two lessons of 9A: the second undoes the first.
        let mut input = ScheduleInput::new(WeekGrid::new(1, 2))
            .with_lesson(Lesson::new("A", "9A", "T1", "math", 1))
            .with_lesson(Lesson::new("B", "9A", "T2", "art", 1));
        input = input.with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(0, 1)));
        let config = SchedulerConfig::default();
        let mut run = SearchRun::new(&input, &config);

        assert_eq!(run.attempt(0), Step::Placed);
        let mut step = run.attempt(1);
        while step == Step::Escalated {
            step = run.attempt(1);
        }
        assert_eq!(step, Step::Undid(0));
        assert_eq!(run.sequences[&0].current, RelaxationLevel::Strict);
        assert_eq!(run.sequences[&1].current, RelaxationLevel::MOST_PERMISSIVE);
        assert!(run.manager.decisions().is_empty());
    }
}
