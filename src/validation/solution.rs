//! Solution validation.
//!
//! Re-checks a finished entry set against the input snapshot, without
//! using any search-time bookkeeping.
//!
//! | Check | Failing means |
//! |-------|---------------|
//! | Teacher slot uniqueness (fixed placements included) | fatal |
//! | Class slot uniqueness (fixed placements included) | fatal |
//! | Hours per lesson | fatal |
//! | Block layout: one day, positions `0..n`, contiguous | fatal |
//! | Teacher availability | fatal, or soft when placed under `availability_flex` |
//! | Empty days at the strict policy | [`WorkloadViolation`] warning |
//!
//! A fatal finding on a result produced by the engine is an engine defect.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::SchedulerConfig;
use crate::engine::{FlexibleBlockManager, Roster};
use crate::models::{
    RelaxationLevel, ScheduleEntry, ScheduleInput, TimeSlot, ViolationCategory, WorkloadViolation,
};

/// One validator finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Category.
    pub category: ViolationCategory,
    /// Teacher, class, lesson or block the finding is about.
    pub entity: String,
    /// Description.
    pub message: String,
}

impl ValidationFinding {
    fn new(category: ViolationCategory, entity: impl Into<String>, message: String) -> Self {
        Self {
            category,
            entity: entity.into(),
            message,
        }
    }
}

/// Outcome of validating an entry set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    fatal: Vec<ValidationFinding>,
    soft: Vec<ValidationFinding>,
    workload: Vec<WorkloadViolation>,
    counts: BTreeMap<ViolationCategory, usize>,
    checked_entries: usize,
}

impl ValidationReport {
    /// Hard invariant failures.
    pub fn fatal(&self) -> &[ValidationFinding] {
        &self.fatal
    }

    /// Tolerated deviations (soft availability, workload).
    pub fn soft(&self) -> &[ValidationFinding] {
        &self.soft
    }

    /// Teachers above the strict empty-day allowance.
    pub fn workload_violations(&self) -> &[WorkloadViolation] {
        &self.workload
    }

    /// Findings per category (fatal and soft).
    pub fn counts(&self) -> &BTreeMap<ViolationCategory, usize> {
        &self.counts
    }

    /// Findings of one category.
    pub fn count(&self, category: ViolationCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Number of entries checked.
    pub fn checked_entries(&self) -> usize {
        self.checked_entries
    }

    /// `true` when no hard invariant fails.
    pub fn is_valid(&self) -> bool {
        self.fatal.is_empty()
    }

    fn fail(&mut self, finding: ValidationFinding) {
        *self.counts.entry(finding.category).or_insert(0) += 1;
        self.fatal.push(finding);
    }

    fn warn(&mut self, finding: ValidationFinding) {
        *self.counts.entry(finding.category).or_insert(0) += 1;
        self.soft.push(finding);
    }
}

/// Independent checker of final entry sets.
#[derive(Debug)]
pub struct SolutionValidator<'a> {
    input: &'a ScheduleInput,
    roster: Roster,
    strict_max_empty_days: usize,
    unfinished: BTreeSet<String>,
}

impl<'a> SolutionValidator<'a> {
    /// Creates a validator for a snapshot and configuration.
    pub fn new(input: &'a ScheduleInput, config: &SchedulerConfig) -> Self {
        let blocks = FlexibleBlockManager::new(config.patterns.clone());
        Self {
            input,
            roster: Roster::build(input, &blocks),
            strict_max_empty_days: config.workload.strict_max_empty_days,
            unfinished: BTreeSet::new(),
        }
    }

    /// Lessons known to be incomplete; they may have fewer hours than required.
    pub fn with_unfinished(mut self, lesson_ids: impl IntoIterator<Item = String>) -> Self {
        self.unfinished.extend(lesson_ids);
        self
    }

    /// Validates an entry set.
    pub fn validate(&self, entries: &[ScheduleEntry]) -> ValidationReport {
        let mut report = ValidationReport {
            checked_entries: entries.len(),
            ..ValidationReport::default()
        };
        self.check_slots(entries, &mut report);
        self.check_hours(entries, &mut report);
        self.check_blocks(entries, &mut report);
        self.check_availability(entries, &mut report);
        self.check_workload(entries, &mut report);
        report
    }

    fn check_slots(&self, entries: &[ScheduleEntry], report: &mut ValidationReport) {
        let mut teachers: BTreeMap<(&str, TimeSlot), usize> = BTreeMap::new();
        let mut classes: BTreeMap<(&str, TimeSlot), usize> = BTreeMap::new();
        for fixed in &self.input.fixed {
            if let Some(t) = &fixed.teacher_id {
                *teachers.entry((t.as_str(), fixed.slot)).or_insert(0) += 1;
            }
            if let Some(c) = &fixed.class_id {
                *classes.entry((c.as_str(), fixed.slot)).or_insert(0) += 1;
            }
        }
        for e in entries {
            *teachers.entry((e.teacher_id.as_str(), e.slot)).or_insert(0) += 1;
            *classes.entry((e.class_id.as_str(), e.slot)).or_insert(0) += 1;
        }
        for ((teacher, slot), n) in teachers.into_iter().filter(|(_, n)| *n > 1) {
            report.fail(ValidationFinding::new(
                ViolationCategory::TeacherConflict,
                teacher,
                format!("teacher {teacher} holds {slot} {n} times"),
            ));
        }
        for ((class, slot), n) in classes.into_iter().filter(|(_, n)| *n > 1) {
            report.fail(ValidationFinding::new(
                ViolationCategory::ClassConflict,
                class,
                format!("class {class} holds {slot} {n} times"),
            ));
        }
    }

    fn check_hours(&self, entries: &[ScheduleEntry], report: &mut ValidationReport) {
        let mut hours: BTreeMap<&str, usize> = BTreeMap::new();
        for e in entries {
            *hours.entry(e.lesson_id.as_str()).or_insert(0) += 1;
        }
        for (lesson_id, placed) in &hours {
            if self.input.lesson(lesson_id).is_none() {
                report.fail(ValidationFinding::new(
                    ViolationCategory::HourMismatch,
                    *lesson_id,
                    format!("{placed} entries reference unknown lesson {lesson_id}"),
                ));
            }
        }
        for lesson in &self.input.lessons {
            let placed = hours.get(lesson.id.as_str()).copied().unwrap_or(0);
            let finished = !self.unfinished.contains(&lesson.id);
            if placed > lesson.weekly_hours || (finished && placed != lesson.weekly_hours) {
                report.fail(ValidationFinding::new(
                    ViolationCategory::HourMismatch,
                    lesson.id.as_str(),
                    format!(
                        "lesson {} has {placed}h scheduled, {}h required",
                        lesson.id, lesson.weekly_hours
                    ),
                ));
            }
        }
    }

    fn check_blocks(&self, entries: &[ScheduleEntry], report: &mut ValidationReport) {
        let mut blocks: BTreeMap<usize, Vec<&ScheduleEntry>> = BTreeMap::new();
        for e in entries {
            blocks.entry(e.block_id).or_default().push(e);
        }

        // (lesson, day) → blocks and whether any of them was placed block-flexibly
        let mut lesson_days: BTreeMap<(&str, usize), (usize, bool)> = BTreeMap::new();

        for (block_id, mut members) in blocks {
            members.sort_by_key(|e| e.position);
            let head = members[0];
            let entity = format!("block {block_id}");

            if members.iter().any(|e| e.lesson_id != head.lesson_id) {
                report.fail(ValidationFinding::new(
                    ViolationCategory::BlockContiguity,
                    entity,
                    format!("block {block_id} mixes lessons"),
                ));
                continue;
            }
            if members.iter().any(|e| e.day() != head.day()) {
                report.fail(ValidationFinding::new(
                    ViolationCategory::BlockContiguity,
                    entity,
                    format!("block {block_id} of {} spans several days", head.lesson_id),
                ));
                continue;
            }
            if members.iter().enumerate().any(|(i, e)| e.position != i) {
                report.fail(ValidationFinding::new(
                    ViolationCategory::BlockContiguity,
                    entity.clone(),
                    format!("block {block_id} of {} has broken positions", head.lesson_id),
                ));
            }
            let flexible = members.iter().all(|e| e.is_block_flexible());
            let ordered = members.windows(2).all(|w| w[0].period() < w[1].period());
            let contiguous = members.windows(2).all(|w| w[1].period() == w[0].period() + 1);
            if !ordered || (!contiguous && !flexible) {
                report.fail(ValidationFinding::new(
                    ViolationCategory::BlockContiguity,
                    entity,
                    format!("block {block_id} of {} is not one contiguous run", head.lesson_id),
                ));
            }

            let slot = lesson_days
                .entry((head.lesson_id.as_str(), head.day()))
                .or_insert((0, false));
            slot.0 += 1;
            slot.1 |= flexible;
        }

        for ((lesson_id, day), (count, flexible)) in lesson_days {
            if count > 1 && !flexible {
                report.fail(ValidationFinding::new(
                    ViolationCategory::BlockContiguity,
                    lesson_id,
                    format!("lesson {lesson_id} has {count} blocks on day {}", day + 1),
                ));
            }
        }
    }

    fn check_availability(&self, entries: &[ScheduleEntry], report: &mut ValidationReport) {
        for e in entries {
            if !self.input.is_unavailable(&e.teacher_id, e.slot) {
                continue;
            }
            let finding = ValidationFinding::new(
                ViolationCategory::Availability,
                e.teacher_id.as_str(),
                format!(
                    "teacher {} teaches {} at {} while unavailable",
                    e.teacher_id, e.lesson_id, e.slot
                ),
            );
            if e.level.availability_is_soft() {
                report.warn(finding);
            } else {
                report.fail(finding);
            }
        }
    }

    fn check_workload(&self, entries: &[ScheduleEntry], report: &mut ValidationReport) {
        let grid = self.input.grid;
        let teachers: BTreeSet<&str> = self
            .input
            .lessons
            .iter()
            .map(|l| l.teacher_id.as_str())
            .collect();

        for teacher_id in teachers {
            let mut loads = vec![0usize; grid.days];
            for e in entries.iter().filter(|e| e.teacher_id == teacher_id) {
                loads[e.day()] += 1;
            }
            for fixed in self.input.fixed.iter().filter(|f| {
                f.teacher_id.as_deref() == Some(teacher_id) && grid.contains(f.slot)
            }) {
                loads[fixed.slot.day] += 1;
            }

            let empty_days: Vec<usize> = (0..grid.days).filter(|&d| loads[d] == 0).collect();
            let floor = self
                .roster
                .teacher_of(teacher_id)
                .map(|t| self.roster.unavoidable_empty[t])
                .unwrap_or(0);
            let allowed = self.strict_max_empty_days;
            if empty_days.len() <= allowed {
                continue;
            }

            let suggestion = if empty_days.len() <= floor {
                format!(
                    "{teacher_id}'s preferred block layouts cover only {} day(s); {} empty day(s) \
                     are unavoidable unless a more split pattern is allowed",
                    grid.days.saturating_sub(floor),
                    empty_days.len()
                )
            } else {
                self.suggest(teacher_id, &loads, &empty_days, allowed)
            };
            report.warn(ValidationFinding::new(
                ViolationCategory::Workload,
                teacher_id,
                format!(
                    "teacher {teacher_id} has {} empty day(s) at {} level, {allowed} allowed",
                    empty_days.len(),
                    RelaxationLevel::Strict
                ),
            ));
            report.workload.push(WorkloadViolation {
                teacher_id: teacher_id.to_string(),
                empty_days,
                allowed,
                unavoidable: floor,
                suggestion,
            });
        }
    }

    fn suggest(&self, teacher_id: &str, loads: &[usize], empty_days: &[usize], allowed: usize) -> String {
        let grid = self.input.grid;
        let reachable = empty_days.iter().copied().find(|&d| {
            grid.day_slots(d)
                .any(|slot| !self.input.is_unavailable(teacher_id, slot))
        });
        let busiest = (0..loads.len())
            .filter(|&d| loads[d] > 0)
            .max_by(|&a, &b| loads[a].cmp(&loads[b]).then(b.cmp(&a)));

        match (reachable, busiest) {
            (Some(to), Some(from)) => format!(
                "Move one of {teacher_id}'s blocks from day {} ({}h) to day {}; {} empty day(s), {allowed} allowed",
                from + 1,
                loads[from],
                to + 1,
                empty_days.len()
            ),
            (Some(to), None) => format!(
                "Schedule at least one of {teacher_id}'s lessons on day {}",
                to + 1
            ),
            (None, _) => {
                let days = empty_days
                    .iter()
                    .map(|d| (d + 1).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{teacher_id} is unavailable on every empty day ({days}); widen availability \
                     or accept {} empty day(s)",
                    empty_days.len()
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockPattern, FixedPlacement, Lesson, WeekGrid};

    fn entry(lesson: &Lesson, day: usize, period: usize, block: usize, position: usize) -> ScheduleEntry {
        ScheduleEntry {
            lesson_id: lesson.id.clone(),
            class_id: lesson.class_id.clone(),
            teacher_id: lesson.teacher_id.clone(),
            subject_id: lesson.subject_id.clone(),
            slot: TimeSlot::new(day, period),
            block_id: block,
            position,
            level: RelaxationLevel::Strict,
            depth: 0,
            pattern: BlockPattern::new(vec![2, 1]),
        }
    }

    fn lesson() -> Lesson {
        Lesson::new("L1", "9A", "T1", "math", 3)
    }

    fn input() -> ScheduleInput {
        ScheduleInput::new(WeekGrid::new(2, 4)).with_lesson(lesson())
    }

    #[test]
    fn test_valid_schedule() {
        let input = input();
        let l = lesson();
        let entries = vec![entry(&l, 0, 0, 0, 0), entry(&l, 0, 1, 0, 1), entry(&l, 1, 2, 1, 0)];
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&entries);
        assert!(report.is_valid(), "{:?}", report.fatal());
        assert_eq!(report.checked_entries(), 3);
        assert!(report.workload_violations().is_empty());
    }

    #[test]
    fn test_double_booking_with_fixed() {
        let input = input().with_fixed(FixedPlacement::teacher_only("T1", TimeSlot::new(0, 0)));
        let l = lesson();
        let entries = vec![entry(&l, 0, 0, 0, 0), entry(&l, 0, 1, 0, 1), entry(&l, 1, 2, 1, 0)];
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&entries);
        assert!(!report.is_valid());
        assert_eq!(report.count(ViolationCategory::TeacherConflict), 1);
        assert_eq!(report.count(ViolationCategory::ClassConflict), 0);
    }

    #[test]
    fn test_hour_mismatch_unless_unfinished() {
        let input = input();
        let l = lesson();
        let entries = vec![entry(&l, 0, 0, 0, 0), entry(&l, 0, 1, 0, 1)];
        let config = SchedulerConfig::default();
        let report = SolutionValidator::new(&input, &config).validate(&entries);
        assert_eq!(report.count(ViolationCategory::HourMismatch), 1);

        let report = SolutionValidator::new(&input, &config)
            .with_unfinished(["L1".to_string()])
            .validate(&entries);
        assert_eq!(report.count(ViolationCategory::HourMismatch), 0);
    }

    #[test]
    fn test_gap_in_block() {
        let input = input();
        let l = lesson();
        let entries = vec![entry(&l, 0, 0, 0, 0), entry(&l, 0, 2, 0, 1), entry(&l, 1, 2, 1, 0)];
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&entries);
        assert_eq!(report.count(ViolationCategory::BlockContiguity), 1);

        let mut relaxed = entries.clone();
        relaxed[0].level = RelaxationLevel::BlockFlex;
        relaxed[1].level = RelaxationLevel::BlockFlex;
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&relaxed);
        assert!(report.is_valid());
    }

    #[test]
    fn test_two_blocks_same_day() {
        let input = input();
        let l = lesson();
        let entries = vec![entry(&l, 0, 0, 0, 0), entry(&l, 0, 1, 0, 1), entry(&l, 0, 3, 1, 0)];
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&entries);
        assert_eq!(report.count(ViolationCategory::BlockContiguity), 1);
    }

    #[test]
    fn test_availability_soft_under_flex() {
        let input = input().with_unavailable("T1", TimeSlot::new(1, 2));
        let l = lesson();
        let mut entries = vec![entry(&l, 0, 0, 0, 0), entry(&l, 0, 1, 0, 1), entry(&l, 1, 2, 1, 0)];
        let config = SchedulerConfig::default();
        let report = SolutionValidator::new(&input, &config).validate(&entries);
        assert!(!report.is_valid());

        entries[2].level = RelaxationLevel::AvailabilityFlex;
        let report = SolutionValidator::new(&input, &config).validate(&entries);
        assert!(report.is_valid());
        assert_eq!(report.soft().len(), 1);
        assert_eq!(report.count(ViolationCategory::Availability), 1);
    }

    #[test]
    fn test_workload_warning_has_suggestion() {
        // Three single hours that could cover three of five days, all on day 0.
        // Two empty days are unavoidable, the other two are not.
        let lessons: Vec<Lesson> = (0..3)
            .map(|i| Lesson::new(format!("L{i}"), format!("C{i}"), "T1", "pe", 1))
            .collect();
        let input = ScheduleInput::new(WeekGrid::new(5, 6)).with_lessons(lessons.clone());
        let entries: Vec<ScheduleEntry> = lessons
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let mut e = entry(l, 0, i, i, 0);
                e.pattern = BlockPattern::new(vec![1]);
                e
            })
            .collect();
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&entries);
        assert!(report.is_valid());
        let violations = report.workload_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].teacher_id, "T1");
        assert_eq!(violations[0].empty_days, vec![1, 2, 3, 4]);
        assert_eq!(violations[0].allowed, 1);
        assert_eq!(violations[0].unavoidable, 2);
        assert!(!violations[0].is_unavoidable());
        assert!(violations[0].suggestion.contains("from day 1"));
        assert!(violations[0].suggestion.contains("to day 2"));
    }

    #[test]
    fn test_workload_reported_even_when_unavoidable() {
        // A 3h lesson prefers [3]: one day covered, four empty days by layout.
        let l = Lesson::new("L1", "9A", "T1", "math", 3);
        let input = ScheduleInput::new(WeekGrid::new(5, 6)).with_lesson(l.clone());
        let entries: Vec<ScheduleEntry> = (0..3)
            .map(|p| {
                let mut e = entry(&l, 0, p, 0, p);
                e.pattern = BlockPattern::new(vec![3]);
                e
            })
            .collect();
        let report = SolutionValidator::new(&input, &SchedulerConfig::default()).validate(&entries);
        assert!(report.is_valid());
        let violations = report.workload_violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].empty_days, vec![1, 2, 3, 4]);
        assert_eq!(violations[0].allowed, 1);
        assert_eq!(violations[0].unavoidable, 4);
        assert!(violations[0].is_unavoidable());
        assert!(violations[0].suggestion.contains("unavoidable"));
        assert_eq!(report.count(ViolationCategory::Workload), 1);
    }
}
