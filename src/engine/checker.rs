//! Constraint Checker.
//!
//! Pure predicates over the roster and the current occupancy. A candidate
//! window is rejected with a [`ConstraintViolation`] before it can become
//! a decision, so hard conflicts never reach a committed entry.
//!
//! # Workload projection
//!
//! Empty days are judged on where the teacher is heading, not only on the
//! current state. After a tentative placement the projection is
//!
//! ```text
//! projected = empty_after - min(remaining_pieces, open_empty_days)
//! ```
//!
//! where `remaining_pieces` counts the pieces of the teacher's preferred
//! layouts still to place and `open_empty_days` counts empty days that
//! still have a usable cell. The allowance is the level's threshold, but
//! never below the days the teacher's preferred layouts cannot cover.

use super::roster::Roster;
use super::state::SearchState;
use crate::config::WorkloadPolicy;
use crate::error::ConstraintViolation;
use crate::models::{RelaxationLevel, TimeSlot};

/// Read-only view used to test candidate placements.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConstraintChecker<'a> {
    roster: &'a Roster,
    state: &'a SearchState,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(roster: &'a Roster, state: &'a SearchState) -> Self {
        Self { roster, state }
    }

    /// Occupancy and availability of each cell of a window.
    ///
    /// Returns the number of cells that fall inside an unavailable window
    /// (only possible when availability is soft at `level`).
    pub fn check_cells(
        &self,
        lesson: usize,
        slots: &[TimeSlot],
        level: RelaxationLevel,
    ) -> Result<usize, ConstraintViolation> {
        let info = &self.roster.lessons[lesson];
        let mut soft = 0;
        for &slot in slots {
            let idx = self.roster.grid.index(slot);
            if !self.state.teacher_free(info.teacher, idx) {
                return Err(ConstraintViolation::TeacherConflict {
                    teacher: info.teacher_id.clone(),
                    slot,
                });
            }
            if !self.state.class_free(info.class, idx) {
                return Err(ConstraintViolation::ClassConflict {
                    class: info.class_id.clone(),
                    slot,
                });
            }
            if self.roster.unavailable[info.teacher][idx] {
                if !level.availability_is_soft() {
                    return Err(ConstraintViolation::TeacherUnavailable {
                        teacher: info.teacher_id.clone(),
                        slot,
                    });
                }
                soft += 1;
            }
        }
        Ok(soft)
    }

    /// Empty-day cap for a piece of `lesson` placed on `day`.
    ///
    /// `limit` is the level threshold; `None` disables the check.
    pub fn check_workload(
        &self,
        lesson: usize,
        day: usize,
        level: RelaxationLevel,
        limit: Option<usize>,
    ) -> Result<(), ConstraintViolation> {
        let Some(limit) = limit else {
            return Ok(());
        };
        let teacher = self.roster.lessons[lesson].teacher;
        let projected = self.projected_empty_days(teacher, Some(day), level);
        let allowed = self.allowed_empty_days(teacher, limit);
        if projected > allowed {
            return Err(ConstraintViolation::WorkloadExceeded {
                teacher: self.roster.teachers[teacher].clone(),
                projected,
                allowed,
            });
        }
        Ok(())
    }

    /// Projected final empty days of a teacher, optionally after one more
    /// piece on `day`.
    pub fn projected_empty_days(
        &self,
        teacher: usize,
        day: Option<usize>,
        level: RelaxationLevel,
    ) -> usize {
        let grid = self.roster.grid;
        let added = usize::from(day.is_some());
        let remaining = self.roster.coverage_target[teacher]
            .saturating_sub(self.state.teacher_pieces(teacher) + added);

        let mut empty_after = 0;
        let mut open = 0;
        for d in 0..grid.days {
            if Some(d) == day || self.state.teacher_day_load(teacher, d) > 0 {
                continue;
            }
            empty_after += 1;
            let usable = grid.day_slots(d).any(|slot| {
                let idx = grid.index(slot);
                self.state.teacher_free(teacher, idx)
                    && (level.availability_is_soft() || !self.roster.unavailable[teacher][idx])
            });
            if usable {
                open += 1;
            }
        }
        empty_after - remaining.min(open)
    }

    /// Allowance for a teacher: the threshold, floored by the days its
    /// preferred layouts cannot cover.
    pub fn allowed_empty_days(&self, teacher: usize, threshold: usize) -> usize {
        threshold.max(self.roster.unavoidable_empty[teacher])
    }

    /// Current empty days above the strict allowance.
    pub fn strict_excess(&self, teacher: usize, policy: &WorkloadPolicy) -> usize {
        if !self.roster.teaches(teacher) {
            return 0;
        }
        let allowed = self.allowed_empty_days(teacher, policy.strict_max_empty_days);
        self.state
            .teacher_empty_days(teacher)
            .len()
            .saturating_sub(allowed)
    }

    /// Sum of [`strict_excess`](Self::strict_excess) over all teachers.
    pub fn total_strict_excess(&self, policy: &WorkloadPolicy) -> usize {
        (0..self.roster.teachers.len())
            .map(|t| self.strict_excess(t, policy))
            .sum()
    }
}
