//! Timetable search engine.
//!
//! Places every lesson's weekly hours into the week grid as blocks of
//! consecutive periods, escalating through relaxation levels and undoing
//! competing decisions when a lesson cannot be placed.
//!
//! # Components
//!
//! - `FlexibleBlockManager`: ordered block-pattern alternatives per lesson
//! - `ConstraintChecker`: hard and soft checks for one candidate window
//! - `BacktrackingManager`: candidate search, decision stack, bounded undo
//! - `ConstraintRelaxationEngine`: level ladder and workload rebalancing
//! - `PerformanceMonitor`: wall-clock budget and phase timings
//! - `Diagnostics`: attempt log, failure records, suggestions
//! - `ScheduleOrchestrator`: runs the phases in order
//!
//! # Algorithm
//!
//! Lessons are taken largest first. For each lesson the pattern
//! alternatives are tried in table order; for each pattern a bounded
//! depth-first search assigns the pieces to scored windows on distinct
//! days. Candidate windows are ordered by score, then by (day, period),
//! so a fixed seed always produces the same timetable.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod backtracking;
mod blocks;
mod checker;
mod diagnostics;
mod monitor;
mod orchestrator;
mod relaxation;
mod roster;
mod state;

pub use blocks::FlexibleBlockManager;
pub use diagnostics::{
    BacktrackStats, Diagnostics, DiagnosticsReport, EscalationRecord, FailureRecord,
    PatternAttempt,
};
pub use monitor::{PerformanceMonitor, PerformanceSummary, PhaseTiming};
pub use orchestrator::{generate_complete_schedule, ScheduleOrchestrator};
pub use relaxation::ConstraintRelaxationEngine;

pub(crate) use roster::Roster;
