//! Weekly grid and time slot models.
//!
//! A timetable week is a fixed grid of `days × periods_per_day` cells.
//! Each cell is addressed by a [`TimeSlot`]. Slots are value types with a
//! total order (day first, then period) so that every iteration over the
//! grid is deterministic.
//!
//! # Indexing
//! Search-time occupancy tables are flat vectors indexed by
//! [`WeekGrid::index`]: `day * periods_per_day + period`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One (day, period) cell of the weekly grid.
///
/// Ordering is lexicographic: all periods of day 0 precede day 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Day index (0-based).
    pub day: usize,
    /// Period index within the day (0-based).
    pub period: usize,
}

impl TimeSlot {
    /// Creates a new time slot.
    pub fn new(day: usize, period: usize) -> Self {
        Self { day, period }
    }

    /// Whether `other` is the next period on the same day.
    #[inline]
    pub fn precedes(&self, other: &Self) -> bool {
        self.day == other.day && self.period + 1 == other.period
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} period {}", self.day + 1, self.period + 1)
    }
}

/// Dimensions of the weekly timetable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGrid {
    /// Number of teaching days per week.
    pub days: usize,
    /// Number of periods per day.
    pub periods_per_day: usize,
}

impl WeekGrid {
    /// Creates a grid with the given dimensions.
    pub fn new(days: usize, periods_per_day: usize) -> Self {
        Self {
            days,
            periods_per_day,
        }
    }

    /// Total number of cells.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.days * self.periods_per_day
    }

    /// Whether the slot lies inside the grid.
    #[inline]
    pub fn contains(&self, slot: TimeSlot) -> bool {
        slot.day < self.days && slot.period < self.periods_per_day
    }

    /// Flat index of a slot. The slot must be inside the grid.
    #[inline]
    pub fn index(&self, slot: TimeSlot) -> usize {
        slot.day * self.periods_per_day + slot.period
    }

    /// Slot at a flat index.
    #[inline]
    pub fn slot_at(&self, index: usize) -> TimeSlot {
        TimeSlot::new(index / self.periods_per_day, index % self.periods_per_day)
    }

    /// All slots in (day, period) order.
    pub fn slots(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        (0..self.days)
            .flat_map(move |day| (0..self.periods_per_day).map(move |p| TimeSlot::new(day, p)))
    }

    /// All slots of one day in period order.
    pub fn day_slots(&self, day: usize) -> impl Iterator<Item = TimeSlot> {
        (0..self.periods_per_day).map(move |p| TimeSlot::new(day, p))
    }
}

impl Default for WeekGrid {
    /// Five days, six periods.
    fn default() -> Self {
        Self::new(5, 6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ordering() {
        let a = TimeSlot::new(0, 5);
        let b = TimeSlot::new(1, 0);
        let c = TimeSlot::new(1, 1);
        assert!(a < b);
        assert!(b < c);
        assert!(b.precedes(&c));
        assert!(!a.precedes(&b)); // different day
    }

    #[test]
    fn test_grid_indexing() {
        let grid = WeekGrid::new(5, 6);
        assert_eq!(grid.slot_count(), 30);

        let slot = TimeSlot::new(2, 3);
        let idx = grid.index(slot);
        assert_eq!(idx, 15);
        assert_eq!(grid.slot_at(idx), slot);
    }

    #[test]
    fn test_grid_contains() {
        let grid = WeekGrid::new(5, 6);
        assert!(grid.contains(TimeSlot::new(4, 5)));
        assert!(!grid.contains(TimeSlot::new(5, 0)));
        assert!(!grid.contains(TimeSlot::new(0, 6)));
    }

    #[test]
    fn test_grid_iteration_order() {
        let grid = WeekGrid::new(2, 2);
        let slots: Vec<TimeSlot> = grid.slots().collect();
        assert_eq!(
            slots,
            vec![
                TimeSlot::new(0, 0),
                TimeSlot::new(0, 1),
                TimeSlot::new(1, 0),
                TimeSlot::new(1, 1),
            ]
        );
        assert_eq!(grid.day_slots(1).count(), 2);
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(TimeSlot::new(0, 2).to_string(), "day 1 period 3");
    }
}
