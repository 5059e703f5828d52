//! Constraint Relaxation Engine.
//!
//! Owns the current [`RelaxationLevel`] of a search pass and the
//! post-completion workload rebalancing.
//!
//! # Escalation
//!
//! Levels belong to one lesson's attempt sequence. Every lesson starts at
//! `strict` and the level only goes up while that lesson is being tried;
//! the next lesson starts over. A lesson undone by backtracking resumes at
//! the level its own sequence started from. The final report is always
//! expressed against `strict`. The rescue pass runs at the top level with
//! the configured balance tolerance as its empty-day cap.
//!
//! # Rebalancing
//!
//! Once every lesson is placed, teachers above the strict empty-day
//! allowance are improved one step at a time:
//!
//! 1. **Relocate**: move one of the teacher's blocks from a day on which
//!    the teacher keeps other hours to one of its empty days.
//! 2. **Swap**: trade cells with an equal-length block of the same class
//!    sitting on one of the teacher's empty days.
//!
//! A step is only proposed when every cell stays free of conflicts and
//! inside availability, the block layout rules of both lessons still hold,
//! and the total strict excess strictly drops. Proposals are computed on a
//! read-only view; nothing changes until the step is applied.

use tracing::{debug, info, warn};

use super::backtracking::{BacktrackingManager, BlockMove, Window};
use super::checker::ConstraintChecker;
use super::monitor::PerformanceMonitor;
use super::roster::Roster;
use super::state::SearchState;
use crate::config::WorkloadPolicy;
use crate::models::{AdjustmentKind, RelaxationLevel, TimeSlot, WorkloadAdjustment};

/// One accepted-if-applied rebalancing step.
#[derive(Debug, Clone)]
pub(crate) struct RebalanceStep {
    pub moves: Vec<BlockMove>,
    pub adjustment: WorkloadAdjustment,
    pub excess_after: usize,
}

#[derive(Debug, Clone, Copy)]
struct BlockRef<'a> {
    lesson: usize,
    block_id: usize,
    level: RelaxationLevel,
    window: &'a Window,
}

/// Relaxation level state and workload rebalancing.
#[derive(Debug, Clone)]
pub struct ConstraintRelaxationEngine {
    current: RelaxationLevel,
    highest: RelaxationLevel,
    policy: WorkloadPolicy,
    rescue: bool,
}

impl ConstraintRelaxationEngine {
    /// Creates an engine at `strict`.
    pub fn new(policy: WorkloadPolicy) -> Self {
        Self {
            current: RelaxationLevel::Strict,
            highest: RelaxationLevel::Strict,
            policy,
            rescue: false,
        }
    }

    /// Level in force.
    pub fn current(&self) -> RelaxationLevel {
        self.current
    }

    /// Highest level reached during the run.
    pub fn highest_used(&self) -> RelaxationLevel {
        self.highest
    }

    /// The workload policy.
    pub fn policy(&self) -> &WorkloadPolicy {
        &self.policy
    }

    /// Moves one level up. Returns `false` at the most permissive level.
    pub fn escalate(&mut self) -> bool {
        match self.current.next() {
            Some(next) => {
                self.current = next;
                self.highest = self.highest.max(next);
                true
            }
            None => false,
        }
    }

    /// Sets the level a lesson's attempt sequence starts from.
    pub fn resume_at(&mut self, level: RelaxationLevel) {
        self.current = level;
        self.highest = self.highest.max(level);
    }

    /// Returns to `strict` and leaves rescue mode.
    pub fn restore_to_strict(&mut self) {
        self.current = RelaxationLevel::Strict;
        self.rescue = false;
    }

    /// Switches to the rescue pass: top level, balance tolerance as cap.
    pub fn enter_rescue(&mut self) {
        self.current = RelaxationLevel::MOST_PERMISSIVE;
        self.highest = self.highest.max(self.current);
        self.rescue = true;
    }

    /// Whether the rescue pass is active.
    pub fn in_rescue(&self) -> bool {
        self.rescue
    }

    /// Empty-day threshold for the checker; `None` disables the check.
    pub fn workload_limit(&self) -> Option<usize> {
        if self.rescue {
            self.policy.balance_tolerance
        } else {
            Some(self.policy.threshold(self.current))
        }
    }

    /// Total empty days above the strict allowance.
    pub(crate) fn strict_excess(&self, roster: &Roster, state: &SearchState) -> usize {
        ConstraintChecker::new(roster, state).total_strict_excess(&self.policy)
    }

    /// Applies rebalancing steps until none improves, the step cap is
    /// reached, or the budget runs out.
    pub(crate) fn rebalance_workload(
        &self,
        roster: &Roster,
        manager: &mut BacktrackingManager,
        monitor: &mut PerformanceMonitor,
        max_steps: usize,
    ) -> Vec<WorkloadAdjustment> {
        let mut adjustments = Vec::new();
        let before = self.strict_excess(roster, manager.state());
        while adjustments.len() < max_steps && !monitor.is_exhausted() {
            let Some(step) = self.propose_rebalance(roster, manager) else {
                break;
            };
            debug!(
                teacher = %step.adjustment.teacher_id,
                block = step.adjustment.block_id,
                from = step.adjustment.from_day,
                to = step.adjustment.to_day,
                excess = step.excess_after,
                "rebalancing step"
            );
            if let Err(violation) = manager.apply_moves(roster, &step.moves) {
                warn!(%violation, "rebalancing step refused");
                break;
            }
            adjustments.push(step.adjustment);
        }
        let after = self.strict_excess(roster, manager.state());
        info!(steps = adjustments.len(), before, after, "workload rebalancing done");
        adjustments
    }

    /// Finds the first improving step, or `None`.
    pub(crate) fn propose_rebalance(
        &self,
        roster: &Roster,
        manager: &BacktrackingManager,
    ) -> Option<RebalanceStep> {
        let state = manager.state();
        let checker = ConstraintChecker::new(roster, state);
        let current = checker.total_strict_excess(&self.policy);
        if current == 0 {
            return None;
        }

        let blocks: Vec<BlockRef<'_>> = manager
            .decisions()
            .iter()
            .flat_map(|d| {
                d.blocks.iter().map(move |b| BlockRef {
                    lesson: d.lesson,
                    block_id: b.block_id,
                    level: d.level,
                    window: &b.window,
                })
            })
            .collect();

        for teacher in 0..roster.teachers.len() {
            if checker.strict_excess(teacher, &self.policy) == 0 {
                continue;
            }
            let empty_days = state.teacher_empty_days(teacher);
            let mut own: Vec<&BlockRef<'_>> = blocks
                .iter()
                .filter(|b| roster.lessons[b.lesson].teacher == teacher)
                .collect();
            own.sort_by_key(|b| (b.window.day, b.window.periods[0], b.block_id));

            for block in own {
                let from = block.window.day;
                if state.teacher_day_load(teacher, from) <= block.window.len() {
                    continue;
                }
                for &to in &empty_days {
                    if !day_open_for(&blocks, block, to) {
                        continue;
                    }
                    if let Some(step) = self.try_relocate(roster, state, block, to, current) {
                        return Some(step);
                    }
                    if let Some(step) = self.try_swap(roster, state, &blocks, block, to, current) {
                        return Some(step);
                    }
                }
            }
        }
        None
    }

    fn try_relocate(
        &self,
        roster: &Roster,
        state: &SearchState,
        block: &BlockRef<'_>,
        to: usize,
        current: usize,
    ) -> Option<RebalanceStep> {
        let info = &roster.lessons[block.lesson];
        let len = block.window.len();
        let from = block.window.day;
        let grid = roster.grid;

        let target = (0..=grid.periods_per_day.checked_sub(len)?)
            .map(|start| Window::run(to, start, len))
            .find(|w| {
                w.periods.iter().all(|&p| {
                    let idx = grid.index(TimeSlot::new(to, p));
                    state.teacher_free(info.teacher, idx)
                        && state.class_free(info.class, idx)
                        && !roster.unavailable[info.teacher][idx]
                })
            })?;

        let checker = ConstraintChecker::new(roster, state);
        let old = checker.strict_excess(info.teacher, &self.policy);
        let new = self.excess_with(roster, state, info.teacher, &[(from, -(len as isize)), (to, len as isize)]);
        let after = current - old + new;
        if after >= current {
            return None;
        }
        Some(RebalanceStep {
            moves: vec![BlockMove {
                lesson: block.lesson,
                block_id: block.block_id,
                to: target,
            }],
            adjustment: WorkloadAdjustment {
                teacher_id: info.teacher_id.clone(),
                lesson_id: info.id.clone(),
                block_id: block.block_id,
                from_day: from,
                to_day: to,
                kind: AdjustmentKind::Relocate,
            },
            excess_after: after,
        })
    }

    fn try_swap(
        &self,
        roster: &Roster,
        state: &SearchState,
        blocks: &[BlockRef<'_>],
        block: &BlockRef<'_>,
        to: usize,
        current: usize,
    ) -> Option<RebalanceStep> {
        let grid = roster.grid;
        let info = &roster.lessons[block.lesson];
        let from = block.window.day;
        let len = block.window.len();
        let checker = ConstraintChecker::new(roster, state);

        for other in blocks.iter().filter(|o| {
            o.window.day == to && o.window.len() == len && o.block_id != block.block_id
        }) {
            let partner = &roster.lessons[other.lesson];
            if partner.class != info.class || partner.teacher == info.teacher {
                continue;
            }
            if !block.level.allows_split_blocks() && !other.window.is_contiguous() {
                continue;
            }
            if !other.level.allows_split_blocks() && !block.window.is_contiguous() {
                continue;
            }
            if !day_open_for(blocks, other, from) {
                continue;
            }
            let mover_fits = other.window.periods.iter().all(|&p| {
                let idx = grid.index(TimeSlot::new(to, p));
                state.teacher_free(info.teacher, idx) && !roster.unavailable[info.teacher][idx]
            });
            let partner_fits = block.window.periods.iter().all(|&p| {
                let idx = grid.index(TimeSlot::new(from, p));
                state.teacher_free(partner.teacher, idx)
                    && !roster.unavailable[partner.teacher][idx]
            });
            if !mover_fits || !partner_fits {
                continue;
            }

            let delta = len as isize;
            let old = checker.strict_excess(info.teacher, &self.policy)
                + checker.strict_excess(partner.teacher, &self.policy);
            let new = self.excess_with(roster, state, info.teacher, &[(from, -delta), (to, delta)])
                + self.excess_with(roster, state, partner.teacher, &[(to, -delta), (from, delta)]);
            let after = current - old + new;
            if after >= current {
                continue;
            }
            return Some(RebalanceStep {
                moves: vec![
                    BlockMove {
                        lesson: block.lesson,
                        block_id: block.block_id,
                        to: Window::new(to, other.window.periods.clone()),
                    },
                    BlockMove {
                        lesson: other.lesson,
                        block_id: other.block_id,
                        to: Window::new(from, block.window.periods.clone()),
                    },
                ],
                adjustment: WorkloadAdjustment {
                    teacher_id: info.teacher_id.clone(),
                    lesson_id: info.id.clone(),
                    block_id: block.block_id,
                    from_day: from,
                    to_day: to,
                    kind: AdjustmentKind::Swap {
                        other_lesson_id: partner.id.clone(),
                        other_block_id: other.block_id,
                    },
                },
                excess_after: after,
            });
        }
        None
    }

    /// Strict excess of a teacher after adding `deltas` to its day loads.
    fn excess_with(
        &self,
        roster: &Roster,
        state: &SearchState,
        teacher: usize,
        deltas: &[(usize, isize)],
    ) -> usize {
        if !roster.teaches(teacher) {
            return 0;
        }
        let mut loads: Vec<isize> = state
            .teacher_loads(teacher)
            .iter()
            .map(|&l| l as isize)
            .collect();
        for &(day, delta) in deltas {
            loads[day] += delta;
        }
        let empty = loads.iter().filter(|&&l| l <= 0).count();
        let allowed = ConstraintChecker::new(roster, state)
            .allowed_empty_days(teacher, self.policy.strict_max_empty_days);
        empty.saturating_sub(allowed)
    }
}

/// Whether `block` may move to `day` without sharing it with another
/// piece of its lesson (allowed when the block was placed block-flexibly).
fn day_open_for(blocks: &[BlockRef<'_>], block: &BlockRef<'_>, day: usize) -> bool {
    block.level.allows_split_blocks()
        || !blocks
            .iter()
            .any(|b| b.lesson == block.lesson && b.block_id != block.block_id && b.window.day == day)
}
