//! Flexible Block Manager.
//!
//! Resolves a lesson's block pattern alternatives and walks them in
//! preference order, asking the Backtracking Manager for a full layout of
//! each before moving on to the next (more split) pattern. Every attempt
//! is written to the diagnostics log.

use super::backtracking::{BacktrackingManager, Placement, PlacementContext};
use super::diagnostics::Diagnostics;
use super::roster::Roster;
use crate::models::{BlockPattern, BlockPatternTable, Lesson, WeekGrid};

/// Pattern selection over a [`BlockPatternTable`].
#[derive(Debug, Clone, Default)]
pub struct FlexibleBlockManager {
    table: BlockPatternTable,
}

impl FlexibleBlockManager {
    /// Creates a manager over a pattern table.
    pub fn new(table: BlockPatternTable) -> Self {
        Self { table }
    }

    /// The underlying table.
    pub fn table(&self) -> &BlockPatternTable {
        &self.table
    }

    /// Configured alternatives for an hour count, in table order.
    pub fn alternatives_for(&self, hours: usize) -> Vec<BlockPattern> {
        self.table.alternatives_for(hours)
    }

    /// Alternatives a lesson will actually try.
    ///
    /// The lesson's override replaces the table entry. Patterns that do
    /// not sum to the lesson's hours or have a piece longer than a day are
    /// dropped; if nothing usable remains the generated fallback list is
    /// used instead.
    pub fn patterns_for(&self, lesson: &Lesson, grid: WeekGrid) -> Vec<BlockPattern> {
        let hours = lesson.weekly_hours;
        let source = match &lesson.patterns {
            Some(patterns) if !patterns.is_empty() => patterns.clone(),
            _ => self.alternatives_for(hours),
        };
        let usable = |p: &BlockPattern| {
            p.total_hours() == hours && p.is_well_formed(grid.periods_per_day)
        };

        let mut patterns: Vec<BlockPattern> = Vec::new();
        for pattern in source.into_iter().filter(|p| usable(p)) {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
        if patterns.is_empty() {
            patterns = BlockPatternTable::fallback(hours)
                .into_iter()
                .filter(|p| usable(p))
                .collect();
        }
        if patterns.is_empty() {
            patterns.push(BlockPattern::singles(hours));
        }
        patterns
    }

    /// Tries each alternative of `lesson` in order at the context's level.
    ///
    /// Returns the first layout found, or every pattern tried.
    pub(crate) fn try_alternatives(
        &self,
        roster: &Roster,
        manager: &mut BacktrackingManager,
        diagnostics: &mut Diagnostics,
        lesson: usize,
        ctx: &PlacementContext,
    ) -> Result<Placement, Vec<BlockPattern>> {
        let info = &roster.lessons[lesson];
        let attempt = diagnostics.next_attempt();
        let mut tried = Vec::with_capacity(info.patterns.len());
        for pattern in &info.patterns {
            let found = manager.try_placement(roster, lesson, pattern, ctx);
            diagnostics.record_pattern_attempt(
                &info.id,
                info.hours,
                pattern,
                ctx.level,
                attempt,
                found.is_some(),
            );
            if let Some(windows) = found {
                return Ok(Placement {
                    pattern: pattern.clone(),
                    windows,
                });
            }
            tried.push(pattern.clone());
        }
        Err(tried)
    }

    /// Places as many single hours of `lesson` as still fit.
    pub(crate) fn fill_partial(
        &self,
        roster: &Roster,
        manager: &mut BacktrackingManager,
        lesson: usize,
        ctx: &PlacementContext,
    ) -> Option<Placement> {
        let hours = roster.lessons[lesson].hours;
        let windows = manager.fill_singles(roster, lesson, hours, ctx);
        if windows.is_empty() {
            return None;
        }
        Some(Placement {
            pattern: BlockPattern::singles(windows.len()),
            windows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::models::{FixedPlacement, RelaxationLevel, ScheduleInput, TimeSlot};

    fn manager() -> FlexibleBlockManager {
        FlexibleBlockManager::new(BlockPatternTable::standard())
    }

    #[test]
    fn test_alternatives_in_table_order() {
        let alts = manager().alternatives_for(5);
        assert_eq!(
            alts,
            vec![
                BlockPattern::new(vec![2, 2, 1]),
                BlockPattern::new(vec![3, 1, 1]),
                BlockPattern::new(vec![2, 1, 1, 1]),
            ]
        );
    }

    #[test]
    fn test_override_replaces_table() {
        let lesson = Lesson::new("L1", "9A", "T1", "math", 4)
            .with_patterns(vec![BlockPattern::new(vec![1, 1, 1, 1])]);
        let patterns = manager().patterns_for(&lesson, WeekGrid::new(5, 6));
        assert_eq!(patterns, vec![BlockPattern::new(vec![1, 1, 1, 1])]);
    }

    #[test]
    fn test_short_days_drop_long_pieces() {
        let lesson = Lesson::new("L1", "9A", "T1", "math", 6);
        let patterns = manager().patterns_for(&lesson, WeekGrid::new(5, 2));
        assert_eq!(
            patterns,
            vec![BlockPattern::new(vec![2, 2, 2]), BlockPattern::new(vec![2, 2, 1, 1])]
        );
    }

    #[test]
    fn test_unlisted_hours_use_fallback() {
        let lesson = Lesson::new("L1", "9A", "T1", "math", 9);
        let patterns = manager().patterns_for(&lesson, WeekGrid::new(5, 6));
        assert_eq!(patterns[0], BlockPattern::new(vec![2, 2, 2, 2, 1]));
        assert_eq!(patterns.last(), Some(&BlockPattern::singles(9)));
    }

    #[test]
    fn test_try_alternatives_descends_patterns() {
        // Only one free run of two cells per day: [3,1] is impossible, [2,2] is not.
        let mut input = ScheduleInput::new(WeekGrid::new(3, 4))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 4).with_patterns(vec![
                BlockPattern::new(vec![3, 1]),
                BlockPattern::new(vec![2, 2]),
            ]));
        for day in 0..3 {
            input = input
                .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(day, 2)))
                .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(day, 3)));
        }
        let config = SchedulerConfig::default();
        let blocks = FlexibleBlockManager::new(config.patterns.clone());
        let roster = Roster::build(&input, &blocks);
        let mut backtracking = BacktrackingManager::new(&roster, &config);
        let mut diagnostics = Diagnostics::new();
        let ctx = PlacementContext {
            level: RelaxationLevel::Strict,
            workload_limit: None,
            randomize: false,
        };

        let placement = blocks
            .try_alternatives(&roster, &mut backtracking, &mut diagnostics, 0, &ctx)
            .expect("placement");
        assert_eq!(placement.pattern, BlockPattern::new(vec![2, 2]));

        let report = diagnostics.finish(&[], &[]);
        let attempts = report.attempts_for("L1");
        assert_eq!(attempts.len(), 2);
        assert!(!attempts[0].succeeded);
        assert!(attempts[1].succeeded);
    }

    #[test]
    fn test_fill_partial_counts_hours() {
        let input = ScheduleInput::new(WeekGrid::new(1, 2))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 4));
        let config = SchedulerConfig::default();
        let blocks = FlexibleBlockManager::new(config.patterns.clone());
        let roster = Roster::build(&input, &blocks);
        let mut backtracking = BacktrackingManager::new(&roster, &config);
        let ctx = PlacementContext {
            level: RelaxationLevel::AvailabilityFlex,
            workload_limit: None,
            randomize: false,
        };
        let placement = blocks
            .fill_partial(&roster, &mut backtracking, 0, &ctx)
            .expect("partial");
        assert_eq!(placement.pattern, BlockPattern::singles(2));
        assert_eq!(placement.windows.len(), 2);
    }
}
