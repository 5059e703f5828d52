//! Timetable domain models.
//!
//! Provides the data types exchanged with the engine's collaborators:
//! the input snapshot the data-access layer supplies, and the result
//! the reporting and presentation layers consume.
//!
//! # Domain Mappings
//!
//! | Engine type | School term |
//! |-------------|-------------|
//! | Lesson | Curriculum requirement (class × subject × teacher) |
//! | BlockPattern | Double/triple period layout |
//! | ScheduleEntry | One taught hour |
//! | FixedPlacement | Assembly, duty, pinned lesson |

mod entry;
mod input;
mod lesson;
mod pattern;
mod relaxation;
mod schedule;
mod timeslot;

pub use entry::ScheduleEntry;
pub use input::{FixedPlacement, ScheduleInput};
pub use lesson::Lesson;
pub use pattern::{BlockPattern, BlockPatternTable};
pub use relaxation::{LevelRules, RelaxationLevel};
pub use schedule::{
    AdjustmentKind, FailedLesson, FailureKind, ScheduleResult, ViolationCategory,
    WorkloadAdjustment, WorkloadViolation,
};
pub use timeslot::{TimeSlot, WeekGrid};
