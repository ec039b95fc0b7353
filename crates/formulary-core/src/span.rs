//! Source locations for tokens and diagnostics.
//!
//! A [`Span`] is a half-open byte range into the expression source. Tokens
//! carry their start offset; spans are derived from the offset and the token
//! text when a diagnostic needs to point at a region of the source.

use std::{fmt, ops::Range};

/// A half-open byte range `start..end` into the expression source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    ///
    /// A reversed range is normalized so that `start <= end` always holds.
    pub fn new(range: Range<usize>) -> Self {
        if range.start <= range.end {
            Self {
                start: range.start,
                end: range.end,
            }
        } else {
            Self {
                start: range.end,
                end: range.start,
            }
        }
    }

    /// Create a span of `len` bytes starting at `start`.
    pub fn at(start: usize, len: usize) -> Self {
        Self::new(start..start + len)
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns `true` if the two spans share at least one byte.
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The byte range covered by this span.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
