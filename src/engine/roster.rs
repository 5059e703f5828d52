//! Compiled, index-addressed view of an input snapshot.
//!
//! The search works on dense indices instead of string ids: teachers,
//! classes and lessons are numbered once (in sorted id order, so the
//! numbering is reproducible) and every per-slot table is a flat vector
//! indexed by [`WeekGrid::index`].

use std::collections::{BTreeSet, HashMap};

use super::FlexibleBlockManager;
use crate::models::{BlockPattern, Lesson, ScheduleInput, TimeSlot, WeekGrid};

/// A lesson with resolved indices and pattern alternatives.
#[derive(Debug, Clone)]
pub(crate) struct LessonInfo {
    pub id: String,
    pub class_id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub class: usize,
    pub teacher: usize,
    pub hours: usize,
    /// Usable alternatives in preference order (never empty).
    pub patterns: Vec<BlockPattern>,
}

impl LessonInfo {
    pub fn shares_resource(&self, other: &LessonInfo) -> bool {
        self.teacher == other.teacher || self.class == other.class
    }
}

/// Static search data derived from a [`ScheduleInput`].
#[derive(Debug, Clone)]
pub(crate) struct Roster {
    pub grid: WeekGrid,
    pub teachers: Vec<String>,
    pub classes: Vec<String>,
    pub lessons: Vec<LessonInfo>,
    teacher_index: HashMap<String, usize>,
    /// teacher → slot → unavailable
    pub unavailable: Vec<Vec<bool>>,
    /// teacher → slot → fixed placement
    pub fixed_teacher: Vec<Vec<bool>>,
    /// class → slot → fixed placement
    pub fixed_class: Vec<Vec<bool>>,
    /// teacher → pieces in the preferred pattern of each of its lessons
    pub coverage_target: Vec<usize>,
    /// teacher → empty days no layout of its preferred patterns can avoid
    pub unavoidable_empty: Vec<usize>,
    /// lesson → other lessons sharing its teacher or class
    pub neighbours: Vec<Vec<usize>>,
    /// teacher → its lessons
    pub teacher_lessons: Vec<Vec<usize>>,
}

impl Roster {
    /// Compiles a validated snapshot.
    pub fn build(input: &ScheduleInput, blocks: &FlexibleBlockManager) -> Self {
        let grid = input.grid;
        let slot_count = grid.slot_count();

        let mut teacher_ids: BTreeSet<&str> = BTreeSet::new();
        let mut class_ids: BTreeSet<&str> = BTreeSet::new();
        for lesson in &input.lessons {
            teacher_ids.insert(&lesson.teacher_id);
            class_ids.insert(&lesson.class_id);
        }
        for fixed in &input.fixed {
            if let Some(t) = &fixed.teacher_id {
                teacher_ids.insert(t);
            }
            if let Some(c) = &fixed.class_id {
                class_ids.insert(c);
            }
        }
        teacher_ids.extend(input.unavailable.keys().map(String::as_str));

        let teachers: Vec<String> = teacher_ids.into_iter().map(str::to_string).collect();
        let classes: Vec<String> = class_ids.into_iter().map(str::to_string).collect();
        let teacher_index: HashMap<String, usize> = teachers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        let class_index: HashMap<String, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        let mut unavailable = vec![vec![false; slot_count]; teachers.len()];
        for (teacher, slots) in &input.unavailable {
            let t = teacher_index[teacher.as_str()];
            for slot in slots.iter().filter(|s| grid.contains(**s)) {
                unavailable[t][grid.index(*slot)] = true;
            }
        }

        let mut fixed_teacher = vec![vec![false; slot_count]; teachers.len()];
        let mut fixed_class = vec![vec![false; slot_count]; classes.len()];
        for fixed in input.fixed.iter().filter(|f| grid.contains(f.slot)) {
            let idx = grid.index(fixed.slot);
            if let Some(t) = &fixed.teacher_id {
                fixed_teacher[teacher_index[t.as_str()]][idx] = true;
            }
            if let Some(c) = &fixed.class_id {
                fixed_class[class_index[c.as_str()]][idx] = true;
            }
        }

        let lessons: Vec<LessonInfo> = input
            .lessons
            .iter()
            .map(|lesson| resolve_lesson(lesson, grid, blocks, &teacher_index, &class_index))
            .collect();

        let mut teacher_lessons = vec![Vec::new(); teachers.len()];
        let mut preferred_pieces = vec![0; teachers.len()];
        for (i, info) in lessons.iter().enumerate() {
            teacher_lessons[info.teacher].push(i);
            preferred_pieces[info.teacher] += info.patterns[0].piece_count();
        }

        let mut coverage_target = Vec::with_capacity(teachers.len());
        let mut unavoidable_empty = Vec::with_capacity(teachers.len());
        for t in 0..teachers.len() {
            let fixed_days = (0..grid.days)
                .filter(|&d| grid.day_slots(d).any(|s| fixed_teacher[t][grid.index(s)]))
                .count();
            let coverage = preferred_pieces[t] + fixed_days;
            coverage_target.push(preferred_pieces[t]);
            unavoidable_empty.push(grid.days.saturating_sub(coverage));
        }

        let neighbours = (0..lessons.len())
            .map(|i| {
                (0..lessons.len())
                    .filter(|&j| j != i && lessons[i].shares_resource(&lessons[j]))
                    .collect()
            })
            .collect();

        Self {
            grid,
            teachers,
            classes,
            lessons,
            teacher_index,
            unavailable,
            fixed_teacher,
            fixed_class,
            coverage_target,
            unavoidable_empty,
            neighbours,
            teacher_lessons,
        }
    }

    pub fn teacher_of(&self, id: &str) -> Option<usize> {
        self.teacher_index.get(id).copied()
    }

    #[inline]
    pub fn is_unavailable(&self, teacher: usize, slot: TimeSlot) -> bool {
        self.unavailable[teacher][self.grid.index(slot)]
    }

    /// Whether a teacher has at least one lesson to teach.
    pub fn teaches(&self, teacher: usize) -> bool {
        !self.teacher_lessons[teacher].is_empty()
    }

    /// Slots a teacher can be scheduled in at all (not unavailable).
    pub fn available_slot_count(&self, teacher: usize) -> usize {
        self.unavailable[teacher].iter().filter(|u| !**u).count()
    }
}

fn resolve_lesson(
    lesson: &Lesson,
    grid: WeekGrid,
    blocks: &FlexibleBlockManager,
    teacher_index: &HashMap<String, usize>,
    class_index: &HashMap<String, usize>,
) -> LessonInfo {
    LessonInfo {
        id: lesson.id.clone(),
        class_id: lesson.class_id.clone(),
        teacher_id: lesson.teacher_id.clone(),
        subject_id: lesson.subject_id.clone(),
        class: class_index[lesson.class_id.as_str()],
        teacher: teacher_index[lesson.teacher_id.as_str()],
        hours: lesson.weekly_hours,
        patterns: blocks.patterns_for(lesson, grid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockPatternTable, FixedPlacement};

    fn roster(input: &ScheduleInput) -> Roster {
        Roster::build(input, &FlexibleBlockManager::new(BlockPatternTable::standard()))
    }

    #[test]
    fn test_indices_are_sorted() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9B", "T2", "math", 2))
            .with_lesson(Lesson::new("L2", "9A", "T1", "art", 2));
        let r = roster(&input);
        assert_eq!(r.teachers, vec!["T1".to_string(), "T2".to_string()]);
        assert_eq!(r.classes, vec!["9A".to_string(), "9B".to_string()]);
        assert_eq!(r.lessons[0].teacher, 1);
        assert_eq!(r.lessons[1].class, 0);
        assert_eq!(r.teacher_of("T2"), Some(1));
        assert_eq!(r.teacher_of("T9"), None);
    }

    #[test]
    fn test_unavoidable_empty_days() {
        // 5h lesson prefers [2,2,1] → covers 3 of 5 days → 2 unavoidable.
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 5));
        let r = roster(&input);
        assert_eq!(r.coverage_target[0], 3);
        assert_eq!(r.unavoidable_empty[0], 2);
    }

    #[test]
    fn test_fixed_days_count_as_covered() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 5))
            .with_fixed(FixedPlacement::teacher_only("T1", TimeSlot::new(4, 0)));
        let r = roster(&input);
        assert_eq!(r.unavoidable_empty[0], 1);
        assert!(r.fixed_teacher[0][r.grid.index(TimeSlot::new(4, 0))]);
    }

    #[test]
    fn test_neighbours() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 2))
            .with_lesson(Lesson::new("L2", "9A", "T2", "art", 2))
            .with_lesson(Lesson::new("L3", "9B", "T3", "bio", 2));
        let r = roster(&input);
        assert_eq!(r.neighbours[0], vec![1]);
        assert_eq!(r.neighbours[2], Vec::<usize>::new());
    }

    #[test]
    fn test_available_slot_count() {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 2))
            .with_unavailable_day("T1", 0);
        let r = roster(&input);
        assert_eq!(r.available_slot_count(0), 24);
        assert!(r.is_unavailable(0, TimeSlot::new(0, 3)));
        assert!(r.teaches(0));
    }
}
