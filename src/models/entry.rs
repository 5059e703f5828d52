//! Schedule entry model.
//!
//! One entry is one scheduled lesson-hour. Entries placed together for
//! one pattern piece share a `block_id`; `position` is the entry's index
//! inside that piece.

use serde::{Deserialize, Serialize};

use super::{BlockPattern, RelaxationLevel, TimeSlot};

/// One scheduled lesson-hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Lesson this hour belongs to.
    pub lesson_id: String,
    /// Class taught.
    pub class_id: String,
    /// Teacher teaching.
    pub teacher_id: String,
    /// Subject taught.
    pub subject_id: String,
    /// Occupied cell.
    pub slot: TimeSlot,
    /// Block (pattern piece) identifier, unique within a run.
    pub block_id: usize,
    /// Index of this hour within its block.
    pub position: usize,
    /// Relaxation level active when the entry was placed.
    pub level: RelaxationLevel,
    /// Decisions in flight (undone, not yet re-placed) at placement time.
    pub depth: usize,
    /// Pattern the lesson was placed with.
    pub pattern: BlockPattern,
}

impl ScheduleEntry {
    /// Day of the entry.
    #[inline]
    pub fn day(&self) -> usize {
        self.slot.day
    }

    /// Period of the entry.
    #[inline]
    pub fn period(&self) -> usize {
        self.slot.period
    }

    /// Whether the entry was placed under a level that allows split blocks.
    #[inline]
    pub fn is_block_flexible(&self) -> bool {
        self.level.allows_split_blocks()
    }

    /// Deterministic report ordering: slot, then class, then teacher.
    pub fn sort_key(&self) -> (TimeSlot, &str, &str, usize) {
        (self.slot, &self.class_id, &self.teacher_id, self.block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(day: usize, period: usize, class: &str) -> ScheduleEntry {
        ScheduleEntry {
            lesson_id: "L1".into(),
            class_id: class.into(),
            teacher_id: "T1".into(),
            subject_id: "math".into(),
            slot: TimeSlot::new(day, period),
            block_id: 0,
            position: 0,
            level: RelaxationLevel::Strict,
            depth: 0,
            pattern: BlockPattern::new(vec![1]),
        }
    }

    #[test]
    fn test_entry_accessors() {
        let e = entry(2, 4, "9A");
        assert_eq!(e.day(), 2);
        assert_eq!(e.period(), 4);
        assert!(!e.is_block_flexible());

        let flex = ScheduleEntry {
            level: RelaxationLevel::BlockFlex,
            ..e
        };
        assert!(flex.is_block_flexible());
    }

    #[test]
    fn test_sort_key_order() {
        let mut entries = vec![entry(1, 0, "9B"), entry(0, 3, "9A"), entry(1, 0, "9A")];
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        assert_eq!(entries[0].slot, TimeSlot::new(0, 3));
        assert_eq!(entries[1].class_id, "9A");
        assert_eq!(entries[2].class_id, "9B");
    }
}
