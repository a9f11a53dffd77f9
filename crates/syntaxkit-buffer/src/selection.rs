//! Text selection handling.
//!
//! A selection is a half-open range of character indices. An empty
//! selection (start == end) is a caret. Exclusive ends keep the arithmetic
//! simple: length = end - start, and a caret needs no special casing.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A selection of text in the buffer.
///
/// The start is always before or equal to the end (normalized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Start index (inclusive)
    pub start: usize,
    /// End index (exclusive)
    pub end: usize,
}

impl Selection {
    /// Creates a new selection.
    ///
    /// Automatically normalizes so start <= end.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Creates a zero-width selection.
    pub fn caret(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns true if this is a zero-width selection (just a caret).
    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Number of selected characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }

    /// Returns the selection as a character range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns true if `other` lies strictly inside this selection,
    /// not touching either end.
    pub fn strictly_contains(&self, other: &Selection) -> bool {
        self.start < other.start && self.end > other.end
    }

    /// Returns true if this selection overlaps with a range.
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
            || (self.is_caret() && range.start <= self.start && self.start <= range.end)
    }

    /// Clamps both ends to a buffer length.
    pub fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

impl From<Range<usize>> for Selection {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}
