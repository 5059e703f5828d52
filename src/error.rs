//! Error types.
//!
//! The engine only fails for malformed input. Placement failures,
//! timeouts and soft violations are reported inside the
//! [`ScheduleResult`](crate::models::ScheduleResult), never as errors.

use thiserror::Error;

use crate::models::{TimeSlot, ViolationCategory};
use crate::validation::ValidationError;

/// Error returned by the scheduling entry points.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The input snapshot failed validation.
    #[error("invalid schedule input: {} problem(s), first: {}", .0.len(), first_message(.0))]
    InvalidInput(Vec<ValidationError>),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("none")
}

/// Why the Constraint Checker rejected a candidate window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    /// The teacher already teaches (or is fixed) at the slot.
    #[error("teacher {teacher} is busy at {slot}")]
    TeacherConflict { teacher: String, slot: TimeSlot },

    /// The class is already occupied at the slot.
    #[error("class {class} is busy at {slot}")]
    ClassConflict { class: String, slot: TimeSlot },

    /// The teacher is unavailable at the slot and availability is hard.
    #[error("teacher {teacher} is unavailable at {slot}")]
    TeacherUnavailable { teacher: String, slot: TimeSlot },

    /// The placement would leave the teacher with too many empty days.
    #[error("teacher {teacher} would end with {projected} empty day(s), {allowed} allowed")]
    WorkloadExceeded {
        teacher: String,
        projected: usize,
        allowed: usize,
    },

    /// Another piece of the lesson already uses the day.
    #[error("lesson already has a piece on day {day}")]
    SameDayPiece { day: usize },
}

impl ConstraintViolation {
    /// Reporting category of the rejection.
    pub fn category(&self) -> ViolationCategory {
        match self {
            Self::TeacherConflict { .. } => ViolationCategory::TeacherConflict,
            Self::ClassConflict { .. } => ViolationCategory::ClassConflict,
            Self::TeacherUnavailable { .. } => ViolationCategory::Availability,
            Self::WorkloadExceeded { .. } => ViolationCategory::Workload,
            Self::SameDayPiece { .. } => ViolationCategory::BlockContiguity,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ScheduleError>;
