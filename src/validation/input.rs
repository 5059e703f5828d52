//! Input validation for timetable snapshots.
//!
//! Checks structural integrity of the snapshot before any search work.
//! Detects:
//! - Empty grids
//! - Duplicate lesson IDs
//! - Lessons with non-positive hour counts or missing class/teacher
//! - Pattern overrides that do not add up to the lesson's hours
//! - Fixed placements and availability windows outside the grid
//! - Fixed placements double-booking a class or teacher

use std::collections::HashSet;

use crate::models::{ScheduleInput, TimeSlot};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The grid has no days or no periods.
    EmptyGrid,
    /// Two lessons share the same ID.
    DuplicateId,
    /// A lesson requires zero hours.
    NonPositiveHours,
    /// A lesson or fixed placement lacks a class/teacher reference.
    MissingReference,
    /// A pattern override is empty, malformed, or sums to the wrong total.
    InvalidPattern,
    /// A slot lies outside the grid.
    SlotOutOfGrid,
    /// Two fixed placements occupy the same class or teacher slot.
    FixedConflict,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduling snapshot.
///
/// Checks:
/// 1. The grid has at least one day and one period
/// 2. No duplicate lesson IDs
/// 3. Every lesson requires at least one hour
/// 4. Every lesson names a class and a teacher
/// 5. Pattern overrides are non-empty, well-formed, and sum to the lesson's hours
/// 6. Fixed placements and unavailable slots lie inside the grid
/// 7. Fixed placements do not double-book a class or a teacher
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: &ScheduleInput) -> ValidationResult {
    let mut errors = Vec::new();
    let grid = input.grid;

    if grid.days == 0 || grid.periods_per_day == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyGrid,
            format!(
                "Grid must have days and periods (got {}x{})",
                grid.days, grid.periods_per_day
            ),
        ));
    }

    let mut lesson_ids = HashSet::new();
    for lesson in &input.lessons {
        if !lesson_ids.insert(lesson.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate lesson ID: {}", lesson.id),
            ));
        }

        if lesson.weekly_hours == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveHours,
                format!("Lesson '{}' requires 0 hours", lesson.id),
            ));
        }

        if lesson.class_id.is_empty() || lesson.teacher_id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingReference,
                format!("Lesson '{}' must name a class and a teacher", lesson.id),
            ));
        }

        if let Some(patterns) = &lesson.patterns {
            if patterns.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPattern,
                    format!("Lesson '{}' has an empty pattern override", lesson.id),
                ));
            }
            for pattern in patterns {
                if !pattern.is_well_formed(grid.periods_per_day)
                    || pattern.total_hours() != lesson.weekly_hours
                {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidPattern,
                        format!(
                            "Lesson '{}' pattern {} does not fit {} hours in {}-period days",
                            lesson.id, pattern, lesson.weekly_hours, grid.periods_per_day
                        ),
                    ));
                }
            }
        }
    }

    let mut fixed_class = HashSet::new();
    let mut fixed_teacher = HashSet::new();
    for fixed in &input.fixed {
        if !grid.contains(fixed.slot) {
            errors.push(out_of_grid("Fixed placement", fixed.slot));
        }
        if fixed.class_id.is_none() && fixed.teacher_id.is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingReference,
                format!("Fixed placement at {} blocks nobody", fixed.slot),
            ));
        }
        if let Some(class) = &fixed.class_id {
            if !fixed_class.insert((class.as_str(), fixed.slot)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::FixedConflict,
                    format!("Class '{}' has two fixed placements at {}", class, fixed.slot),
                ));
            }
        }
        if let Some(teacher) = &fixed.teacher_id {
            if !fixed_teacher.insert((teacher.as_str(), fixed.slot)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::FixedConflict,
                    format!(
                        "Teacher '{}' has two fixed placements at {}",
                        teacher, fixed.slot
                    ),
                ));
            }
        }
    }

    for (teacher, slots) in &input.unavailable {
        for slot in slots {
            if !grid.contains(*slot) {
                errors.push(out_of_grid(&format!("Unavailable slot of '{teacher}'"), *slot));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn out_of_grid(what: &str, slot: TimeSlot) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::SlotOutOfGrid,
        format!("{what} at {slot} lies outside the grid"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockPattern, FixedPlacement, Lesson, WeekGrid};

    fn sample_input() -> ScheduleInput {
        ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 5))
            .with_lesson(Lesson::new("L2", "9A", "T2", "art", 2))
            .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(4, 5)))
            .with_unavailable("T1", TimeSlot::new(0, 0))
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_input()).is_ok());
    }

    #[test]
    fn test_empty_grid() {
        let input = ScheduleInput::new(WeekGrid::new(0, 6));
        let errors = validate_input(&input).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyGrid));
    }

    #[test]
    fn test_duplicate_lesson_id() {
        let input = sample_input().with_lesson(Lesson::new("L1", "9B", "T3", "bio", 1));
        let errors = validate_input(&input).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_zero_hours() {
        let input = sample_input().with_lesson(Lesson::new("L3", "9B", "T3", "bio", 0));
        let errors = validate_input(&input).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NonPositiveHours));
    }

    #[test]
    fn test_missing_teacher() {
        let input = sample_input().with_lesson(Lesson::new("L3", "9B", "", "bio", 1));
        let errors = validate_input(&input).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MissingReference));
    }

    #[test]
    fn test_pattern_override_sum_mismatch() {
        let lesson = Lesson::new("L3", "9B", "T3", "bio", 4)
            .with_patterns(vec![BlockPattern::new(vec![2, 1])]);
        let errors = validate_input(&sample_input().with_lesson(lesson)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidPattern));
    }

    #[test]
    fn test_pattern_piece_longer_than_day() {
        let lesson = Lesson::new("L3", "9B", "T3", "bio", 7)
            .with_patterns(vec![BlockPattern::new(vec![7])]);
        let errors = validate_input(&sample_input().with_lesson(lesson)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidPattern));
    }

    #[test]
    fn test_slot_out_of_grid() {
        let input = sample_input()
            .with_fixed(FixedPlacement::teacher_only("T1", TimeSlot::new(5, 0)))
            .with_unavailable("T2", TimeSlot::new(0, 9));
        let errors = validate_input(&input).unwrap_err();
        let count = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::SlotOutOfGrid)
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_fixed_conflict() {
        let input = sample_input().with_fixed(FixedPlacement::lesson("9A", "T9", TimeSlot::new(4, 5)));
        let errors = validate_input(&input).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::FixedConflict));
    }

    #[test]
    fn test_multiple_errors() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 0))
            .with_lesson(Lesson::new("L1", "", "T1", "math", 1));
        let errors = validate_input(&input).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
