//! Lesson (curriculum requirement) model.
//!
//! A lesson is one class's weekly requirement for one subject taught by
//! one teacher: "class 9A gets 5 hours of mathematics with teacher T1".
//! Lessons are read-only during the search.

use serde::{Deserialize, Serialize};

use super::BlockPattern;

/// A weekly curriculum requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique lesson identifier.
    pub id: String,
    /// Class (student group) identifier.
    pub class_id: String,
    /// Teacher identifier.
    pub teacher_id: String,
    /// Subject identifier.
    pub subject_id: String,
    /// Required hours per week (must be positive).
    pub weekly_hours: usize,
    /// Explicit allowed patterns, replacing the table entry when set.
    pub patterns: Option<Vec<BlockPattern>>,
}

impl Lesson {
    /// Creates a lesson without a pattern override.
    pub fn new(
        id: impl Into<String>,
        class_id: impl Into<String>,
        teacher_id: impl Into<String>,
        subject_id: impl Into<String>,
        weekly_hours: usize,
    ) -> Self {
        Self {
            id: id.into(),
            class_id: class_id.into(),
            teacher_id: teacher_id.into(),
            subject_id: subject_id.into(),
            weekly_hours,
            patterns: None,
        }
    }

    /// Restricts the lesson to the given patterns, in the given order.
    pub fn with_patterns(mut self, patterns: Vec<BlockPattern>) -> Self {
        self.patterns = Some(patterns);
        self
    }

    /// Whether this lesson shares its teacher or its class with `other`.
    pub fn shares_resource(&self, other: &Lesson) -> bool {
        self.teacher_id == other.teacher_id || self.class_id == other.class_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_builder() {
        let lesson = Lesson::new("L1", "9A", "T1", "math", 5)
            .with_patterns(vec![BlockPattern::new(vec![3, 2])]);

        assert_eq!(lesson.id, "L1");
        assert_eq!(lesson.class_id, "9A");
        assert_eq!(lesson.teacher_id, "T1");
        assert_eq!(lesson.subject_id, "math");
        assert_eq!(lesson.weekly_hours, 5);
        assert_eq!(lesson.patterns.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_shares_resource() {
        let a = Lesson::new("L1", "9A", "T1", "math", 2);
        let b = Lesson::new("L2", "9A", "T2", "art", 2);
        let c = Lesson::new("L3", "9B", "T1", "math", 2);
        let d = Lesson::new("L4", "9B", "T2", "art", 2);

        assert!(a.shares_resource(&b)); // same class
        assert!(a.shares_resource(&c)); // same teacher
        assert!(!a.shares_resource(&d));
    }
}
