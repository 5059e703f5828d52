//! Input snapshot model.
//!
//! The data-access layer hands the engine one immutable [`ScheduleInput`]
//! per run: the grid, the lesson roster, teacher availability, and any
//! placements that are already fixed (assemblies, duties, lessons pinned
//! by hand). The engine never mutates it.
//!
//! # Availability
//! Teachers are available everywhere except the slots listed in
//! `unavailable`. Unavailability is a hard constraint below the
//! `availability_flex` relaxation level and a soft one at it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Lesson, TimeSlot, WeekGrid};

/// A pre-existing placement the search must respect.
///
/// Either side may be absent: a staff meeting blocks a teacher only,
/// a school assembly blocks a class only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedPlacement {
    /// Blocked class, if any.
    pub class_id: Option<String>,
    /// Blocked teacher, if any.
    pub teacher_id: Option<String>,
    /// Occupied cell.
    pub slot: TimeSlot,
    /// Free-form label for reports.
    pub label: String,
}

impl FixedPlacement {
    /// Blocks a class and a teacher together.
    pub fn lesson(
        class_id: impl Into<String>,
        teacher_id: impl Into<String>,
        slot: TimeSlot,
    ) -> Self {
        Self {
            class_id: Some(class_id.into()),
            teacher_id: Some(teacher_id.into()),
            slot,
            label: String::new(),
        }
    }

    /// Blocks a class only.
    pub fn class_only(class_id: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            class_id: Some(class_id.into()),
            teacher_id: None,
            slot,
            label: String::new(),
        }
    }

    /// Blocks a teacher only.
    pub fn teacher_only(teacher_id: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            class_id: None,
            teacher_id: Some(teacher_id.into()),
            slot,
            label: String::new(),
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Immutable snapshot consumed by one scheduling run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleInput {
    /// Weekly grid dimensions.
    pub grid: WeekGrid,
    /// Lesson roster.
    pub lessons: Vec<Lesson>,
    /// Teacher id → slots the teacher cannot teach.
    pub unavailable: BTreeMap<String, BTreeSet<TimeSlot>>,
    /// Placements already fixed before the search.
    pub fixed: Vec<FixedPlacement>,
}

impl ScheduleInput {
    /// Creates an empty snapshot over `grid`.
    pub fn new(grid: WeekGrid) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    /// Adds a lesson.
    pub fn with_lesson(mut self, lesson: Lesson) -> Self {
        self.lessons.push(lesson);
        self
    }

    /// Adds several lessons.
    pub fn with_lessons(mut self, lessons: impl IntoIterator<Item = Lesson>) -> Self {
        self.lessons.extend(lessons);
        self
    }

    /// Marks one slot as unavailable for a teacher.
    pub fn with_unavailable(mut self, teacher_id: impl Into<String>, slot: TimeSlot) -> Self {
        self.unavailable
            .entry(teacher_id.into())
            .or_default()
            .insert(slot);
        self
    }

    /// Marks a whole day as unavailable for a teacher.
    pub fn with_unavailable_day(mut self, teacher_id: impl Into<String>, day: usize) -> Self {
        let slots = self.unavailable.entry(teacher_id.into()).or_default();
        slots.extend(self.grid.day_slots(day));
        self
    }

    /// Adds a fixed placement.
    pub fn with_fixed(mut self, placement: FixedPlacement) -> Self {
        self.fixed.push(placement);
        self
    }

    /// Total required hours across the roster.
    pub fn total_hours(&self) -> usize {
        self.lessons.iter().map(|l| l.weekly_hours).sum()
    }

    /// Looks up a lesson by id.
    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Whether the teacher is marked unavailable at `slot`.
    pub fn is_unavailable(&self, teacher_id: &str, slot: TimeSlot) -> bool {
        self.unavailable
            .get(teacher_id)
            .is_some_and(|slots| slots.contains(&slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_builder() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 5))
            .with_lesson(Lesson::new("L2", "9A", "T2", "art", 2))
            .with_unavailable("T1", TimeSlot::new(0, 0))
            .with_fixed(FixedPlacement::class_only("9A", TimeSlot::new(4, 5)).with_label("assembly"));

        assert_eq!(input.lessons.len(), 2);
        assert_eq!(input.total_hours(), 7);
        assert!(input.is_unavailable("T1", TimeSlot::new(0, 0)));
        assert!(!input.is_unavailable("T1", TimeSlot::new(0, 1)));
        assert!(!input.is_unavailable("T2", TimeSlot::new(0, 0)));
        assert_eq!(input.fixed[0].label, "assembly");
        assert_eq!(input.lesson("L2").map(|l| l.weekly_hours), Some(2));
        assert!(input.lesson("L9").is_none());
    }

    #[test]
    fn test_unavailable_day() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6)).with_unavailable_day("T1", 3);
        assert_eq!(input.unavailable["T1"].len(), 6);
        assert!(input.is_unavailable("T1", TimeSlot::new(3, 5)));
        assert!(!input.is_unavailable("T1", TimeSlot::new(2, 5)));
    }

    #[test]
    fn test_fixed_placement_factories() {
        let slot = TimeSlot::new(1, 1);
        let both = FixedPlacement::lesson("9A", "T1", slot);
        assert!(both.class_id.is_some() && both.teacher_id.is_some());

        let teacher = FixedPlacement::teacher_only("T1", slot);
        assert!(teacher.class_id.is_none());

        let class = FixedPlacement::class_only("9A", slot);
        assert!(class.teacher_id.is_none());
    }
}
