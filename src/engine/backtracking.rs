//! Backtracking Manager.
//!
//! Owns the solution stack and the occupancy grids. Every placement goes
//! through here, so this is the only place (besides the orchestrator that
//! drives it) where search state changes.
//!
//! # Candidate ordering
//!
//! A window for one pattern piece is scored by
//!
//! | Term | Effect |
//! |------|--------|
//! | day reuse / adjacency | bonus for days and runs the class or teacher already uses, the lesson's own pieces excluded |
//! | same-day piece | penalty for a second piece of the lesson on one day (split levels only) |
//! | empty-day fill | bonus for an empty teacher day while the teacher is over the strict limit |
//! | workload excess | penalty per projected empty day above the strict limit |
//! | collateral | penalty per cell taken from a still-unplaced neighbouring lesson |
//! | soft availability / split | penalties for relaxed placements |
//!
//! The highest score wins and ties go to the earliest `(day, period)`.
//! After a lesson has suffered a setback, every candidate below the top
//! score is shuffled with the run's seeded generator; top-scoring
//! candidates keep their place.
//!
//! # Undo
//!
//! When a lesson cannot be placed at the most permissive level, one
//! committed decision that shares its teacher or class is undone: the one
//! made under the strictest level, nearest the top of the stack on ties.
//! A lesson may trigger at most `max_backtrack_depth` undos per pass, and
//! no more than that many undone decisions may be awaiting re-placement
//! at once.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

use super::checker::ConstraintChecker;
use super::diagnostics::BacktrackStats;
use super::roster::Roster;
use super::state::SearchState;
use crate::config::{SchedulerConfig, ScoreWeights, WorkloadPolicy};
use crate::error::ConstraintViolation;
use crate::models::{BlockPattern, RelaxationLevel, ScheduleEntry, TimeSlot, ViolationCategory};

/// Cells of one pattern piece on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Window {
    pub day: usize,
    /// Ascending periods.
    pub periods: Vec<usize>,
}

impl Window {
    pub fn new(day: usize, periods: Vec<usize>) -> Self {
        Self { day, periods }
    }

    /// Contiguous run starting at `start`.
    pub fn run(day: usize, start: usize, len: usize) -> Self {
        Self::new(day, (start..start + len).collect())
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_contiguous(&self) -> bool {
        self.periods.windows(2).all(|w| w[1] == w[0] + 1)
    }

    pub fn slots(&self) -> Vec<TimeSlot> {
        self.periods
            .iter()
            .map(|&p| TimeSlot::new(self.day, p))
            .collect()
    }

    fn order_key(&self) -> (usize, &[usize]) {
        (self.day, &self.periods)
    }
}

/// A candidate window with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoredWindow {
    pub window: Window,
    pub score: i64,
}

/// Rules in force for one placement attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlacementContext {
    pub level: RelaxationLevel,
    /// Empty-day threshold; `None` skips the workload check.
    pub workload_limit: Option<usize>,
    /// Shuffle the lower candidate tiers.
    pub randomize: bool,
}

/// A found (not yet committed) layout for a lesson.
#[derive(Debug, Clone)]
pub(crate) struct Placement {
    pub pattern: BlockPattern,
    pub windows: Vec<Window>,
}

/// A committed piece.
#[derive(Debug, Clone)]
pub(crate) struct PlacedBlock {
    pub block_id: usize,
    pub window: Window,
}

/// One stack frame: everything needed to undo a placement.
#[derive(Debug, Clone)]
pub(crate) struct Decision {
    pub lesson: usize,
    pub pattern: BlockPattern,
    pub blocks: Vec<PlacedBlock>,
    pub level: RelaxationLevel,
    /// Level the lesson's attempt sequence started from; an undone lesson
    /// resumes there.
    pub level_before: RelaxationLevel,
    pub depth: usize,
    /// Fewer hours than required (rescue pass only); never undone.
    pub partial: bool,
}

/// One block relocation inside a rebalancing step.
#[derive(Debug, Clone)]
pub(crate) struct BlockMove {
    pub lesson: usize,
    pub block_id: usize,
    pub to: Window,
}

/// Result of [`BacktrackingManager::backtrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BacktrackOutcome {
    /// The decision of this lesson was undone and must be re-placed,
    /// starting again from `level_before`.
    Undone {
        lesson: usize,
        level_before: RelaxationLevel,
    },
    /// The lesson used up its undo budget for this pass.
    DepthExhausted,
    /// No committed decision competes for the lesson's resources.
    NothingToUndo,
}

/// Solution stack, occupancy and candidate ordering.
#[derive(Debug)]
pub(crate) struct BacktrackingManager {
    state: SearchState,
    stack: Vec<Decision>,
    rng: SmallRng,
    weights: ScoreWeights,
    policy: WorkloadPolicy,
    max_depth: usize,
    max_nodes: usize,
    undo_counts: Vec<usize>,
    in_flight: BTreeSet<usize>,
    next_block: usize,
    stats: BacktrackStats,
    rejections: BTreeMap<ViolationCategory, usize>,
}

impl BacktrackingManager {
    pub fn new(roster: &Roster, config: &SchedulerConfig) -> Self {
        Self {
            state: SearchState::new(roster),
            stack: Vec::new(),
            rng: SmallRng::seed_from_u64(config.seed),
            weights: config.weights.clone(),
            policy: config.workload.clone(),
            max_depth: config.max_backtrack_depth,
            max_nodes: config.max_nodes_per_pattern.max(1),
            undo_counts: vec![0; roster.lessons.len()],
            in_flight: BTreeSet::new(),
            next_block: 0,
            stats: BacktrackStats::default(),
            rejections: BTreeMap::new(),
        }
    }

    /// Reseeds the generator used for lower-tier reordering.
    pub fn apply_randomization(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Resets the per-pass undo budgets.
    pub fn begin_pass(&mut self) {
        self.undo_counts.iter_mut().for_each(|c| *c = 0);
        self.in_flight.clear();
        self.stats.passes += 1;
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.stack
    }

    pub fn stats(&self) -> &BacktrackStats {
        &self.stats
    }

    pub fn rejections(&self) -> &BTreeMap<ViolationCategory, usize> {
        &self.rejections
    }

    pub fn note_randomized_attempt(&mut self) {
        self.stats.randomized_attempts += 1;
    }

    /// Drops a lesson from the in-flight set without placing it.
    pub fn settle(&mut self, lesson: usize) {
        self.in_flight.remove(&lesson);
    }

    /// Ordered candidate windows for one piece of `lesson`.
    ///
    /// `chosen` holds the lesson's pieces already (tentatively) placed in
    /// this attempt.
    pub fn candidate_slots(
        &mut self,
        roster: &Roster,
        ctx: &PlacementContext,
        lesson: usize,
        piece: usize,
        chosen: &[Window],
    ) -> Vec<ScoredWindow> {
        let grid = roster.grid;
        let mut out = Vec::new();
        if piece == 0 || piece > grid.periods_per_day {
            return out;
        }

        for day in 0..grid.days {
            if !ctx.level.allows_split_blocks() && chosen.iter().any(|w| w.day == day) {
                self.reject(&ConstraintViolation::SameDayPiece { day });
                continue;
            }
            for start in 0..=(grid.periods_per_day - piece) {
                let window = Window::run(day, start, piece);
                if let Some(score) = self.evaluate(roster, ctx, lesson, &window, chosen) {
                    out.push(ScoredWindow { window, score });
                }
            }
            if ctx.level.allows_split_blocks() && piece > 1 {
                if let Some(window) = self.split_window(roster, ctx, lesson, day, piece) {
                    if let Some(score) = self.evaluate(roster, ctx, lesson, &window, chosen) {
                        out.push(ScoredWindow { window, score });
                    }
                }
            }
        }

        out.sort_by(|a, b| {
            Reverse(a.score)
                .cmp(&Reverse(b.score))
                .then_with(|| a.window.order_key().cmp(&b.window.order_key()))
        });

        if ctx.randomize {
            if let Some(top) = out.first().map(|c| c.score) {
                let tier = out.iter().take_while(|c| c.score == top).count();
                out[tier..].shuffle(&mut self.rng);
            }
        }
        trace!(lesson, piece, candidates = out.len(), "candidate windows");
        out
    }

    /// Searches a full layout of `pattern` for `lesson`.
    ///
    /// Leaves the state untouched; the returned windows still have to be
    /// committed.
    pub fn try_placement(
        &mut self,
        roster: &Roster,
        lesson: usize,
        pattern: &BlockPattern,
        ctx: &PlacementContext,
    ) -> Option<Vec<Window>> {
        let mut chosen = Vec::with_capacity(pattern.piece_count());
        let mut nodes = 0;
        let found = self.place_pieces(roster, ctx, lesson, pattern.pieces(), &mut chosen, &mut nodes);
        for window in chosen.iter().rev() {
            self.state.release(roster, lesson, &window.slots());
        }
        found.then_some(chosen)
    }

    fn place_pieces(
        &mut self,
        roster: &Roster,
        ctx: &PlacementContext,
        lesson: usize,
        pieces: &[usize],
        chosen: &mut Vec<Window>,
        nodes: &mut usize,
    ) -> bool {
        let index = chosen.len();
        if index == pieces.len() {
            return true;
        }
        let candidates = self.candidate_slots(roster, ctx, lesson, pieces[index], chosen);

        // Equal consecutive pieces are interchangeable: keep them in window order.
        let floor = match (index.checked_sub(1), chosen.last()) {
            (Some(prev), Some(last)) if pieces[prev] == pieces[index] => Some(last.clone()),
            _ => None,
        };

        for candidate in candidates {
            if let Some(floor) = &floor {
                if candidate.window.order_key() <= floor.order_key() {
                    continue;
                }
            }
            *nodes += 1;
            if *nodes > self.max_nodes {
                return false;
            }
            let slots = candidate.window.slots();
            if self.state.occupy(roster, lesson, &slots).is_err() {
                continue;
            }
            chosen.push(candidate.window);
            if self.place_pieces(roster, ctx, lesson, pieces, chosen, nodes) {
                return true;
            }
            chosen.pop();
            self.state.release(roster, lesson, &slots);
        }
        false
    }

    /// Best single-hour cells for up to `hours` hours, one at a time.
    ///
    /// Used for partial placement when no pattern fits.
    pub fn fill_singles(
        &mut self,
        roster: &Roster,
        lesson: usize,
        hours: usize,
        ctx: &PlacementContext,
    ) -> Vec<Window> {
        let mut chosen: Vec<Window> = Vec::new();
        while chosen.len() < hours {
            let Some(best) = self
                .candidate_slots(roster, ctx, lesson, 1, &chosen)
                .into_iter()
                .next()
            else {
                break;
            };
            if self.state.occupy(roster, lesson, &best.window.slots()).is_err() {
                break;
            }
            chosen.push(best.window);
        }
        for window in chosen.iter().rev() {
            self.state.release(roster, lesson, &window.slots());
        }
        chosen
    }

    /// Commits a found layout as a new decision.
    ///
    /// Refuses a layout that would double-book a cell; nothing is marked
    /// in that case.
    pub fn commit(
        &mut self,
        roster: &Roster,
        lesson: usize,
        placement: Placement,
        level: RelaxationLevel,
        level_before: RelaxationLevel,
        partial: bool,
    ) -> Result<(), ConstraintViolation> {
        for (i, window) in placement.windows.iter().enumerate() {
            if let Err(violation) = self.state.occupy(roster, lesson, &window.slots()) {
                for placed in placement.windows[..i].iter().rev() {
                    self.state.release(roster, lesson, &placed.slots());
                }
                return Err(violation);
            }
        }

        self.in_flight.remove(&lesson);
        let depth = self.in_flight.len();
        let blocks = placement
            .windows
            .into_iter()
            .map(|window| {
                let block_id = self.next_block;
                self.next_block += 1;
                PlacedBlock { block_id, window }
            })
            .collect();
        self.stack.push(Decision {
            lesson,
            pattern: placement.pattern,
            blocks,
            level,
            level_before,
            depth,
            partial,
        });
        Ok(())
    }

    /// Undoes one committed decision competing with `lesson`.
    pub fn backtrack(&mut self, roster: &Roster, lesson: usize) -> BacktrackOutcome {
        if self.undo_counts[lesson] >= self.max_depth || self.in_flight.len() >= self.max_depth {
            self.stats.depth_limit_hits += 1;
            return BacktrackOutcome::DepthExhausted;
        }

        let info = &roster.lessons[lesson];
        let top = self.stack.len();
        let pick = self
            .stack
            .iter()
            .enumerate()
            .filter(|(_, d)| {
                !d.partial && d.lesson != lesson && roster.lessons[d.lesson].shares_resource(info)
            })
            .min_by_key(|(i, d)| (d.level, top - i))
            .map(|(i, _)| i);
        let Some(index) = pick else {
            return BacktrackOutcome::NothingToUndo;
        };

        let decision = self.stack.remove(index);
        for block in &decision.blocks {
            self.state
                .release(roster, decision.lesson, &block.window.slots());
        }
        self.in_flight.insert(decision.lesson);
        self.undo_counts[lesson] += 1;
        self.stats.backtracks += 1;
        self.stats.max_in_flight = self.stats.max_in_flight.max(self.in_flight.len());
        self.stats.max_undos_for_one_lesson = self
            .stats
            .max_undos_for_one_lesson
            .max(self.undo_counts[lesson]);
        BacktrackOutcome::Undone {
            lesson: decision.lesson,
            level_before: decision.level_before,
        }
    }

    /// Applies a rebalancing step: every moved block is released before
    /// any is re-occupied, so blocks may trade cells.
    ///
    /// If a destination is taken the step is rolled back and the conflict
    /// returned.
    pub fn apply_moves(
        &mut self,
        roster: &Roster,
        moves: &[BlockMove],
    ) -> Result<(), ConstraintViolation> {
        let origins: Vec<Option<Vec<TimeSlot>>> = moves
            .iter()
            .map(|mv| self.block(mv.block_id).map(|b| b.window.slots()))
            .collect();
        for (mv, origin) in moves.iter().zip(&origins) {
            if let Some(slots) = origin {
                self.state.release(roster, mv.lesson, slots);
            }
        }

        for (i, mv) in moves.iter().enumerate() {
            if let Err(violation) = self.state.occupy(roster, mv.lesson, &mv.to.slots()) {
                for done in moves[..i].iter().rev() {
                    self.state.release(roster, done.lesson, &done.to.slots());
                }
                for (mv, origin) in moves.iter().zip(&origins) {
                    if let Some(slots) = origin {
                        self.state.occupy(roster, mv.lesson, slots)?;
                    }
                }
                return Err(violation);
            }
        }

        for mv in moves {
            if let Some(block) = self.block_mut(mv.block_id) {
                block.window = mv.to.clone();
            }
        }
        Ok(())
    }

    pub fn block(&self, block_id: usize) -> Option<&PlacedBlock> {
        self.stack
            .iter()
            .flat_map(|d| d.blocks.iter())
            .find(|b| b.block_id == block_id)
    }

    fn block_mut(&mut self, block_id: usize) -> Option<&mut PlacedBlock> {
        self.stack
            .iter_mut()
            .flat_map(|d| d.blocks.iter_mut())
            .find(|b| b.block_id == block_id)
    }

    /// All committed entries in report order.
    pub fn entries(&self, roster: &Roster) -> Vec<ScheduleEntry> {
        let mut entries = Vec::new();
        for decision in &self.stack {
            let info = &roster.lessons[decision.lesson];
            for block in &decision.blocks {
                for (position, slot) in block.window.slots().into_iter().enumerate() {
                    entries.push(ScheduleEntry {
                        lesson_id: info.id.clone(),
                        class_id: info.class_id.clone(),
                        teacher_id: info.teacher_id.clone(),
                        subject_id: info.subject_id.clone(),
                        slot,
                        block_id: block.block_id,
                        position,
                        level: decision.level,
                        depth: decision.depth,
                        pattern: decision.pattern.clone(),
                    });
                }
            }
        }
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        entries
    }

    fn reject(&mut self, violation: &ConstraintViolation) {
        *self.rejections.entry(violation.category()).or_insert(0) += 1;
    }

    fn evaluate(
        &mut self,
        roster: &Roster,
        ctx: &PlacementContext,
        lesson: usize,
        window: &Window,
        chosen: &[Window],
    ) -> Option<i64> {
        let slots = window.slots();
        let checker = ConstraintChecker::new(roster, &self.state);
        let outcome = checker.check_cells(lesson, &slots, ctx.level).and_then(|soft| {
            checker
                .check_workload(lesson, window.day, ctx.level, ctx.workload_limit)
                .map(|()| soft)
        });
        match outcome {
            Ok(soft) => Some(self.score(roster, ctx, lesson, window, chosen, soft)),
            Err(violation) => {
                self.reject(&violation);
                None
            }
        }
    }

    /// First `piece` usable cells of a day when they are not one run.
    fn split_window(
        &self,
        roster: &Roster,
        ctx: &PlacementContext,
        lesson: usize,
        day: usize,
        piece: usize,
    ) -> Option<Window> {
        let checker = ConstraintChecker::new(roster, &self.state);
        let periods: Vec<usize> = (0..roster.grid.periods_per_day)
            .filter(|&p| {
                checker
                    .check_cells(lesson, &[TimeSlot::new(day, p)], ctx.level)
                    .is_ok()
            })
            .take(piece)
            .collect();
        let window = Window::new(day, periods);
        (window.len() == piece && !window.is_contiguous()).then_some(window)
    }

    fn score(
        &self,
        roster: &Roster,
        ctx: &PlacementContext,
        lesson: usize,
        window: &Window,
        chosen: &[Window],
        soft_cells: usize,
    ) -> i64 {
        let w = &self.weights;
        let grid = roster.grid;
        let info = &roster.lessons[lesson];
        let (teacher, class, day) = (info.teacher, info.class, window.day);
        let mut score = 0;

        // The lesson's own tentative pieces earn no reuse or adjacency bonus.
        let own_cells: Vec<usize> = chosen
            .iter()
            .filter(|c| c.day == day)
            .flat_map(|c| c.periods.iter().copied())
            .collect();
        if !own_cells.is_empty() {
            score -= w.same_day_piece;
        }

        let teacher_load = self.state.teacher_day_load(teacher, day);
        if teacher_load > own_cells.len() {
            score += w.day_reuse;
        }
        if self.state.class_day_load(class, day) > own_cells.len() {
            score += w.day_reuse;
        }

        let first = window.periods[0];
        let last = window.periods[window.len() - 1];
        let before = first.checked_sub(1);
        let after = Some(last + 1).filter(|p| *p < grid.periods_per_day);
        for period in [before, after].into_iter().flatten() {
            if own_cells.contains(&period) {
                continue;
            }
            let idx = grid.index(TimeSlot::new(day, period));
            if !self.state.teacher_free(teacher, idx) {
                score += w.adjacency;
            }
            if !self.state.class_free(class, idx) {
                score += w.adjacency;
            }
        }

        let checker = ConstraintChecker::new(roster, &self.state);
        let strict_allowed = checker.allowed_empty_days(teacher, self.policy.strict_max_empty_days);
        if teacher_load == 0 && self.state.teacher_empty_days(teacher).len() > strict_allowed {
            score += w.fill_empty_day;
        }
        let projected = checker.projected_empty_days(teacher, Some(day), ctx.level);
        score -= w.workload_excess * projected.saturating_sub(strict_allowed) as i64;

        let mut collateral = 0;
        for &other in &roster.neighbours[lesson] {
            if !self.state.is_unplaced(other) {
                continue;
            }
            let neighbour = &roster.lessons[other];
            collateral += window
                .periods
                .iter()
                .map(|&p| grid.index(TimeSlot::new(day, p)))
                .filter(|&idx| {
                    !roster.unavailable[neighbour.teacher][idx]
                        && self.state.teacher_free(neighbour.teacher, idx)
                        && self.state.class_free(neighbour.class, idx)
                })
                .count();
        }
        score -= w.collateral * collateral as i64;

        score -= w.soft_availability * soft_cells as i64;
        if !window.is_contiguous() {
            score -= w.split_piece;
        }
        score
    }
}
