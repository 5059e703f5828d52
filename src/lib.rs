//! School timetable search engine.
//!
//! Builds a weekly timetable from a snapshot of lessons, teacher
//! availability and fixed placements. Lessons are split into blocks of
//! consecutive periods following an ordered table of patterns, placed by
//! a bounded backtracking search, and relaxed level by level when the
//! strict rules leave no room.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Lesson`, `BlockPattern`, `ScheduleInput`,
//!   `ScheduleEntry`, `ScheduleResult`, `RelaxationLevel`
//! - **`engine`**: Search components and the `ScheduleOrchestrator`
//! - **`validation`**: Input integrity checks and the independent solution validator
//! - **`config`**: Tunables: time budget, backtrack depth, seed, workload policy
//! - **`error`**: Error and constraint-violation types
//! - **`logging`**: `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use timetable_engine::config::SchedulerConfig;
//! use timetable_engine::models::{Lesson, ScheduleInput, WeekGrid};
//!
//! let input = ScheduleInput::new(WeekGrid::new(5, 6))
//!     .with_lesson(Lesson::new("9A-math", "9A", "T1", "math", 5));
//! let result = timetable_engine::generate_complete_schedule(&input, &SchedulerConfig::default())?;
//! assert!(result.is_complete());
//! # Ok::<(), timetable_engine::error::ScheduleError>(())
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - de Werra (1985), "An introduction to timetabling"

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod validation;

pub use config::SchedulerConfig;
pub use engine::{generate_complete_schedule, ScheduleOrchestrator};
pub use error::{Result, ScheduleError};
pub use models::{ScheduleInput, ScheduleResult};
