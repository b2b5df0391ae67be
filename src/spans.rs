//! Span - efficient integer range sets.
//!
//! Spans track sparse sets of token positions (qspan/ispan/hispan) without
//! paying for a position-per-position representation.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A span represents an efficient integer range set.
///
/// Spans are used to track ranges of text that have been matched,
/// allowing for merge, overlap detection, and other operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// The ranges in this span
    ranges: Vec<Range<usize>>,
}

impl Span {
    /// Create a new empty span.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Create a span from a single range.
    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    /// Create a span from an iterator of positions.
    ///
    /// This converts individual positions into contiguous ranges.
    ///
    /// # Arguments
    /// * `positions` - Iterator over positions to include in the span
    pub fn from_iterator(positions: impl IntoIterator<Item = usize>) -> Self {
        let mut sorted: Vec<usize> = positions.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut ranges = Vec::new();
        let mut iter = sorted.into_iter().peekable();

        while let Some(start) = iter.next() {
            let mut end = start + 1;

            while let Some(&next) = iter.peek() {
                if next == end {
                    end += 1;
                    iter.next();
                } else {
                    break;
                }
            }

            ranges.push(start..end);
        }

        Self { ranges }
    }

    /// Check if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Get the number of ranges in this span.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Get the total length covered by all ranges.
    pub fn total_length(&self) -> usize {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    /// Number of positions covered (as opposed to `len`, the number of ranges).
    pub fn cardinality(&self) -> usize {
        self.total_length()
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&pos))
    }

    pub fn start(&self) -> Option<usize> {
        self.ranges.first().map(|r| r.start)
    }

    /// Exclusive end of the last range.
    pub fn end(&self) -> Option<usize> {
        self.ranges.last().map(|r| r.end)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    /// True iff any position is shared between the two spans.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.ranges
            .iter()
            .any(|a| other.ranges.iter().any(|b| a.start < b.end && b.start < a.end))
    }

    /// Merge two spans into one covering every position in either.
    pub fn union(&self, other: &Span) -> Span {
        Span::from_iterator(self.iter().chain(other.iter()))
    }

    /// Token distance from the end of `self` to the start of `other`,
    /// assuming `self` comes first. `None` if either span is empty or
    /// `other` does not start at or after `self` ends.
    pub fn gap_to(&self, other: &Span) -> Option<usize> {
        let a_end = self.end()?;
        let b_start = other.start()?;
        if a_end <= b_start {
            Some(b_start - a_end)
        } else {
            None
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new()
    }
}
