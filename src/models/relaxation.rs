//! Relaxation levels.
//!
//! The search starts under the strict policy and may widen it one
//! constraint category at a time:
//!
//! | Level | Workload | Blocks | Availability |
//! |-------|----------|--------|--------------|
//! | `strict` | strict empty-day limit | contiguous, one piece per day | hard |
//! | `workload_flex` | relaxed empty-day limit | contiguous, one piece per day | hard |
//! | `block_flex` | relaxed | split runs, shared days allowed | hard |
//! | `availability_flex` | relaxed | split runs, shared days allowed | soft |
//!
//! Each level keeps everything the previous one unlocked.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered policy tier: `Strict < WorkloadFlex < BlockFlex < AvailabilityFlex`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationLevel {
    /// Full policy.
    #[default]
    Strict,
    /// Teacher empty-day limit raised.
    WorkloadFlex,
    /// Block pieces may be split and share a day.
    BlockFlex,
    /// Teacher unavailability becomes a soft constraint.
    AvailabilityFlex,
}

/// Constraint switches unlocked at a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRules {
    /// The level these rules belong to.
    pub level: RelaxationLevel,
    /// Use the relaxed empty-day limit.
    pub relaxed_workload: bool,
    /// Allow non-contiguous pieces and several pieces of a lesson per day.
    pub split_blocks: bool,
    /// Allow placements inside teacher-unavailable windows.
    pub soft_availability: bool,
}

const LADDER: [LevelRules; 4] = [
    LevelRules {
        level: RelaxationLevel::Strict,
        relaxed_workload: false,
        split_blocks: false,
        soft_availability: false,
    },
    LevelRules {
        level: RelaxationLevel::WorkloadFlex,
        relaxed_workload: true,
        split_blocks: false,
        soft_availability: false,
    },
    LevelRules {
        level: RelaxationLevel::BlockFlex,
        relaxed_workload: true,
        split_blocks: true,
        soft_availability: false,
    },
    LevelRules {
        level: RelaxationLevel::AvailabilityFlex,
        relaxed_workload: true,
        split_blocks: true,
        soft_availability: true,
    },
];

impl RelaxationLevel {
    /// All levels, strictest first.
    pub const ALL: [RelaxationLevel; 4] = [
        RelaxationLevel::Strict,
        RelaxationLevel::WorkloadFlex,
        RelaxationLevel::BlockFlex,
        RelaxationLevel::AvailabilityFlex,
    ];

    /// The most permissive level.
    pub const MOST_PERMISSIVE: RelaxationLevel = RelaxationLevel::AvailabilityFlex;

    /// Position on the ladder (0 = strict).
    #[inline]
    pub fn rank(self) -> usize {
        self as usize
    }

    /// The next more permissive level, if any.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.rank() + 1).copied()
    }

    /// Static rules for this level.
    #[inline]
    pub fn rules(self) -> &'static LevelRules {
        &LADDER[self.rank()]
    }

    /// Whether pieces may be split or share a day.
    #[inline]
    pub fn allows_split_blocks(self) -> bool {
        self.rules().split_blocks
    }

    /// Whether teacher unavailability is soft.
    #[inline]
    pub fn availability_is_soft(self) -> bool {
        self.rules().soft_availability
    }

    /// Whether the relaxed empty-day limit applies.
    #[inline]
    pub fn relaxes_workload(self) -> bool {
        self.rules().relaxed_workload
    }

    /// Snake-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            RelaxationLevel::Strict => "strict",
            RelaxationLevel::WorkloadFlex => "workload_flex",
            RelaxationLevel::BlockFlex => "block_flex",
            RelaxationLevel::AvailabilityFlex => "availability_flex",
        }
    }
}

impl fmt::Display for RelaxationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
