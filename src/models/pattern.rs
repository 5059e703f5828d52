//! Block patterns and the block pattern table.
//!
//! A lesson with `h` weekly hours is not placed hour by hour: it is
//! decomposed into contiguous runs ("pieces"). A [`BlockPattern`] is one
//! such decomposition, e.g. `[2, 2, 1]` for five hours. The
//! [`BlockPatternTable`] maps an hour count to its acceptable patterns in
//! preference order: fewer pieces first, then more balanced pieces, with
//! the all-single-hours split as the last resort.
//!
//! | Hours | Patterns (in order) |
//! |-------|---------------------|
//! | 1 | `[1]` |
//! | 2 | `[2]`, `[1,1]` |
//! | 3 | `[3]`, `[2,1]`, `[1,1,1]` |
//! | 4 | `[2,2]`, `[3,1]`, `[2,1,1]`, `[1,1,1,1]` |
//! | 5 | `[2,2,1]`, `[3,1,1]`, `[2,1,1,1]` |
//! | 6 | `[3,3]`, `[2,2,2]`, `[3,2,1]`, `[2,2,1,1]` |
//! | 7 | `[3,2,2]`, `[2,2,2,1]`, `[3,2,1,1]` |
//! | 8 | `[3,3,2]`, `[2,2,2,2]`, `[3,2,2,1]`, `[2,2,2,1,1]` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An ordered list of contiguous run lengths.
///
/// Pieces are kept in the order given; the standard table lists them
/// largest first so that the scarcest windows are claimed first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockPattern(Vec<usize>);

impl BlockPattern {
    /// Creates a pattern from run lengths.
    pub fn new(pieces: impl Into<Vec<usize>>) -> Self {
        Self(pieces.into())
    }

    /// Pattern of `hours` single-hour pieces.
    pub fn singles(hours: usize) -> Self {
        Self(vec![1; hours])
    }

    /// Run lengths in placement order.
    #[inline]
    pub fn pieces(&self) -> &[usize] {
        &self.0
    }

    /// Number of pieces (days the pattern covers at strict level).
    #[inline]
    pub fn piece_count(&self) -> usize {
        self.0.len()
    }

    /// Sum of all pieces.
    pub fn total_hours(&self) -> usize {
        self.0.iter().sum()
    }

    /// Longest piece (0 for an empty pattern).
    pub fn largest_piece(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Whether every piece is a positive run no longer than `max_run`.
    pub fn is_well_formed(&self, max_run: usize) -> bool {
        !self.0.is_empty() && self.0.iter().all(|&p| p > 0 && p <= max_run)
    }
}

impl From<Vec<usize>> for BlockPattern {
    fn from(pieces: Vec<usize>) -> Self {
        Self(pieces)
    }
}

impl fmt::Display for BlockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, piece) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{piece}")?;
        }
        write!(f, "]")
    }
}

/// Static mapping from weekly hour count to ordered pattern alternatives.
///
/// Built once per configuration and never mutated during a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockPatternTable {
    entries: BTreeMap<usize, Vec<BlockPattern>>,
}

impl BlockPatternTable {
    /// Creates an empty table. Every hour count falls back to
    /// [`BlockPatternTable::fallback`].
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The standard table for 1..=8 weekly hours.
    pub fn standard() -> Self {
        let rows: [(usize, &[&[usize]]); 8] = [
            (1, &[&[1]]),
            (2, &[&[2], &[1, 1]]),
            (3, &[&[3], &[2, 1], &[1, 1, 1]]),
            (4, &[&[2, 2], &[3, 1], &[2, 1, 1], &[1, 1, 1, 1]]),
            (5, &[&[2, 2, 1], &[3, 1, 1], &[2, 1, 1, 1]]),
            (6, &[&[3, 3], &[2, 2, 2], &[3, 2, 1], &[2, 2, 1, 1]]),
            (7, &[&[3, 2, 2], &[2, 2, 2, 1], &[3, 2, 1, 1]]),
            (8, &[&[3, 3, 2], &[2, 2, 2, 2], &[3, 2, 2, 1], &[2, 2, 2, 1, 1]]),
        ];

        let entries = rows
            .iter()
            .map(|(hours, patterns)| {
                let list = patterns.iter().map(|p| BlockPattern::new(p.to_vec())).collect();
                (*hours, list)
            })
            .collect();
        Self { entries }
    }

    /// Replaces the alternatives for one hour count.
    pub fn with_entry(mut self, hours: usize, patterns: Vec<BlockPattern>) -> Self {
        self.entries.insert(hours, patterns);
        self
    }

    /// Ordered alternatives for `hours`.
    ///
    /// Hour counts without an entry get [`BlockPatternTable::fallback`].
    pub fn alternatives_for(&self, hours: usize) -> Vec<BlockPattern> {
        match self.entries.get(&hours) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => Self::fallback(hours),
        }
    }

    /// Whether the table has an explicit entry for `hours`.
    pub fn has_entry(&self, hours: usize) -> bool {
        self.entries.contains_key(&hours)
    }

    /// Generated alternatives: double periods plus a remainder, then
    /// all single hours.
    pub fn fallback(hours: usize) -> Vec<BlockPattern> {
        if hours == 0 {
            return Vec::new();
        }
        let mut pieces = vec![2; hours / 2];
        if hours % 2 == 1 {
            pieces.push(1);
        }
        let paired = BlockPattern::new(pieces);
        let singles = BlockPattern::singles(hours);
        if paired == singles {
            vec![paired]
        } else {
            vec![paired, singles]
        }
    }
}

impl Default for BlockPatternTable {
    fn default() -> Self {
        Self::standard()
    }
}
