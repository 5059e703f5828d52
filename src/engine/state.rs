//! Occupancy grids for teachers and classes.
//!
//! [`SearchState::occupy`] refuses a piece that would double-book a
//! teacher or class cell and leaves the state untouched when it does, so
//! the grids never hold a conflict, even between two search steps.

use super::roster::Roster;
use crate::error::ConstraintViolation;
use crate::models::TimeSlot;

/// Mutable occupancy of the week during search.
#[derive(Debug, Clone)]
pub(crate) struct SearchState {
    /// teacher → slot → taken (fixed placements included)
    teacher_cells: Vec<Vec<bool>>,
    /// class → slot → taken (fixed placements included)
    class_cells: Vec<Vec<bool>>,
    /// teacher → day → occupied cells (fixed included)
    teacher_day_load: Vec<Vec<usize>>,
    /// class → day → occupied cells (fixed included)
    class_day_load: Vec<Vec<usize>>,
    /// teacher → placed pieces
    teacher_pieces: Vec<usize>,
    /// lesson → placed hours
    lesson_hours: Vec<usize>,
}

impl SearchState {
    /// Empty week with the roster's fixed placements marked.
    pub fn new(roster: &Roster) -> Self {
        let grid = roster.grid;
        let slots = grid.slot_count();
        let mut state = Self {
            teacher_cells: roster.fixed_teacher.clone(),
            class_cells: roster.fixed_class.clone(),
            teacher_day_load: vec![vec![0; grid.days]; roster.teachers.len()],
            class_day_load: vec![vec![0; grid.days]; roster.classes.len()],
            teacher_pieces: vec![0; roster.teachers.len()],
            lesson_hours: vec![0; roster.lessons.len()],
        };
        for idx in 0..slots {
            let day = grid.slot_at(idx).day;
            for t in 0..roster.teachers.len() {
                if state.teacher_cells[t][idx] {
                    state.teacher_day_load[t][day] += 1;
                }
            }
            for c in 0..roster.classes.len() {
                if state.class_cells[c][idx] {
                    state.class_day_load[c][day] += 1;
                }
            }
        }
        state
    }

    #[inline]
    pub fn teacher_free(&self, teacher: usize, idx: usize) -> bool {
        !self.teacher_cells[teacher][idx]
    }

    #[inline]
    pub fn class_free(&self, class: usize, idx: usize) -> bool {
        !self.class_cells[class][idx]
    }

    pub fn teacher_day_load(&self, teacher: usize, day: usize) -> usize {
        self.teacher_day_load[teacher][day]
    }

    pub fn class_day_load(&self, class: usize, day: usize) -> usize {
        self.class_day_load[class][day]
    }

    /// Day loads of a teacher, one count per day.
    pub fn teacher_loads(&self, teacher: usize) -> &[usize] {
        &self.teacher_day_load[teacher]
    }

    pub fn teacher_pieces(&self, teacher: usize) -> usize {
        self.teacher_pieces[teacher]
    }

    pub fn lesson_hours(&self, lesson: usize) -> usize {
        self.lesson_hours[lesson]
    }

    pub fn is_unplaced(&self, lesson: usize) -> bool {
        self.lesson_hours[lesson] == 0
    }

    /// Days without any occupied cell for the teacher.
    pub fn teacher_empty_days(&self, teacher: usize) -> Vec<usize> {
        self.teacher_day_load[teacher]
            .iter()
            .enumerate()
            .filter(|(_, load)| **load == 0)
            .map(|(day, _)| day)
            .collect()
    }

    /// Checks that every cell of a piece is free for the lesson's teacher
    /// and class, and that the piece does not repeat a cell.
    pub fn check_free(
        &self,
        roster: &Roster,
        lesson: usize,
        slots: &[TimeSlot],
    ) -> Result<(), ConstraintViolation> {
        let info = &roster.lessons[lesson];
        for (i, slot) in slots.iter().enumerate() {
            let idx = roster.grid.index(*slot);
            let repeated = slots[..i].contains(slot);
            if repeated || !self.teacher_free(info.teacher, idx) {
                return Err(ConstraintViolation::TeacherConflict {
                    teacher: info.teacher_id.clone(),
                    slot: *slot,
                });
            }
            if !self.class_free(info.class, idx) {
                return Err(ConstraintViolation::ClassConflict {
                    class: info.class_id.clone(),
                    slot: *slot,
                });
            }
        }
        Ok(())
    }

    /// Marks the cells of one piece. Fails without side effects if any
    /// cell is already taken.
    pub fn occupy(
        &mut self,
        roster: &Roster,
        lesson: usize,
        slots: &[TimeSlot],
    ) -> Result<(), ConstraintViolation> {
        self.check_free(roster, lesson, slots)?;
        let info = &roster.lessons[lesson];
        for slot in slots {
            let idx = roster.grid.index(*slot);
            self.teacher_cells[info.teacher][idx] = true;
            self.class_cells[info.class][idx] = true;
            self.teacher_day_load[info.teacher][slot.day] += 1;
            self.class_day_load[info.class][slot.day] += 1;
        }
        self.teacher_pieces[info.teacher] += 1;
        self.lesson_hours[lesson] += slots.len();
        Ok(())
    }

    /// Clears the cells of one piece previously passed to [`occupy`](Self::occupy).
    pub fn release(&mut self, roster: &Roster, lesson: usize, slots: &[TimeSlot]) {
        let info = &roster.lessons[lesson];
        for slot in slots {
            let idx = roster.grid.index(*slot);
            self.teacher_cells[info.teacher][idx] = false;
            self.class_cells[info.class][idx] = false;
            self.teacher_day_load[info.teacher][slot.day] -= 1;
            self.class_day_load[info.class][slot.day] -= 1;
        }
        self.teacher_pieces[info.teacher] -= 1;
        self.lesson_hours[lesson] -= slots.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FlexibleBlockManager;
    use crate::models::{BlockPatternTable, FixedPlacement, Lesson, ScheduleInput, WeekGrid};

    fn roster() -> Roster {
        let input = ScheduleInput::new(WeekGrid::new(5, 6))
            .with_lesson(Lesson::new("L1", "9A", "T1", "math", 4))
            .with_fixed(FixedPlacement::lesson("9A", "T1", TimeSlot::new(0, 0)));
        Roster::build(&input, &FlexibleBlockManager::new(BlockPatternTable::standard()))
    }

    #[test]
    fn test_fixed_cells_marked() {
        let r = roster();
        let s = SearchState::new(&r);
        let idx = r.grid.index(TimeSlot::new(0, 0));
        assert!(!s.teacher_free(0, idx));
        assert!(!s.class_free(0, idx));
        assert_eq!(s.teacher_day_load(0, 0), 1);
        assert_eq!(s.teacher_empty_days(0), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_occupy_release() {
        let r = roster();
        let mut s = SearchState::new(&r);
        let slots = [TimeSlot::new(2, 1), TimeSlot::new(2, 2)];
        s.occupy(&r, 0, &slots).unwrap();
        assert_eq!(s.lesson_hours(0), 2);
        assert_eq!(s.teacher_pieces(0), 1);
        assert_eq!(s.class_day_load(0, 2), 2);
        assert!(!s.class_free(0, r.grid.index(TimeSlot::new(2, 2))));
        assert!(!s.is_unplaced(0));

        s.release(&r, 0, &slots);
        assert!(s.is_unplaced(0));
        assert_eq!(s.teacher_pieces(0), 0);
        assert!(s.teacher_free(0, r.grid.index(TimeSlot::new(2, 1))));
        assert_eq!(s.teacher_empty_days(0), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_occupy_refuses_taken_cell() {
        let r = roster();
        let mut s = SearchState::new(&r);
        s.occupy(&r, 0, &[TimeSlot::new(1, 0)]).unwrap();

        // Second cell clashes; the first one must not be marked.
        let err = s
            .occupy(&r, 0, &[TimeSlot::new(1, 2), TimeSlot::new(1, 0)])
            .unwrap_err();
        assert!(matches!(err, ConstraintViolation::TeacherConflict { .. }));
        assert!(s.teacher_free(0, r.grid.index(TimeSlot::new(1, 2))));
        assert_eq!(s.lesson_hours(0), 1);
        assert_eq!(s.teacher_pieces(0), 1);

        // Fixed cell.
        assert!(s.occupy(&r, 0, &[TimeSlot::new(0, 0)]).is_err());
        // Repeated cell inside one piece.
        assert!(s
            .occupy(&r, 0, &[TimeSlot::new(3, 1), TimeSlot::new(3, 1)])
            .is_err());
        assert_eq!(s.teacher_day_load(0, 3), 0);
    }
}
