//! # Source Position Tracking
//!
//! Token offsets alone make for poor diagnostics; users think in lines and
//! columns. This module provides the value types that translate between the
//! two: [`SourcePos`] is an absolute (line, column) coordinate, and
//! [`SourcePosDelta`] is the additive offset contributed by a run of tokens.
//!
//! ## The delta monoid
//!
//! Deltas compose associatively with `(0, 0)` as identity:
//!
//! * if the right delta spans no line break, columns add up on the left's
//!   line;
//! * otherwise the right delta's line breaks win and its column count is
//!   absolute on the new line.
//!
//! This lets the parse state fold per-token deltas incrementally and cache
//! intermediate results, so that computing the current line/column is
//! amortised O(1) for the usual forward-moving queries.

use std::fmt;
use std::ops::{Add, AddAssign};

/// An additive (line, column) offset produced by consuming tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosDelta {
    /// Number of line breaks spanned.
    pub lines: usize,
    /// Columns advanced past the last line break (or from the start when
    /// `lines` is zero).
    pub cols: usize,
}

impl SourcePosDelta {
    /// The monoid identity: no movement at all.
    pub const ZERO: SourcePosDelta = SourcePosDelta { lines: 0, cols: 0 };

    pub fn new(lines: usize, cols: usize) -> Self {
        Self { lines, cols }
    }

    /// A delta spanning `n` line breaks and resetting the column.
    pub fn lines(n: usize) -> Self {
        Self { lines: n, cols: 0 }
    }

    /// A delta advancing `n` columns on the current line.
    pub fn cols(n: usize) -> Self {
        Self { lines: 0, cols: n }
    }
}

impl Add for SourcePosDelta {
    type Output = SourcePosDelta;

    fn add(self, rhs: SourcePosDelta) -> SourcePosDelta {
        if rhs.lines == 0 {
            SourcePosDelta::new(self.lines, self.cols + rhs.cols)
        } else {
            SourcePosDelta::new(self.lines + rhs.lines, rhs.cols)
        }
    }
}

impl AddAssign for SourcePosDelta {
    fn add_assign(&mut self, rhs: SourcePosDelta) {
        *self = *self + rhs;
    }
}

/// An absolute source coordinate. Both line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub col: usize,
}

impl SourcePos {
    /// The position of the very first token of an input.
    pub const START: SourcePos = SourcePos { line: 1, col: 1 };

    /// The position reached after applying `delta` from the input start.
    pub fn offset_by(self, delta: SourcePosDelta) -> SourcePos {
        if delta.lines == 0 {
            SourcePos {
                line: self.line,
                col: self.col + delta.cols,
            }
        } else {
            SourcePos {
                line: self.line + delta.lines,
                col: delta.cols + 1,
            }
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} col {}", self.line, self.col)
    }
}

/// Per-character delta: `\n` starts a new line, everything else (including
/// `\r` and tabs) advances one column.
pub fn char_delta(c: &char) -> SourcePosDelta {
    if *c == '\n' {
        SourcePosDelta::lines(1)
    } else {
        SourcePosDelta::cols(1)
    }
}

/// Per-byte delta for byte streams carrying text.
pub fn byte_delta(b: &u8) -> SourcePosDelta {
    if *b == b'\n' {
        SourcePosDelta::lines(1)
    } else {
        SourcePosDelta::cols(1)
    }
}

/// The delta for token types with no notion of line structure: one column
/// per token.
pub fn unit_delta<I>(_token: &I) -> SourcePosDelta {
    SourcePosDelta::cols(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let d = SourcePosDelta::new(3, 7);
        assert_eq!(d + SourcePosDelta::ZERO, d);
        assert_eq!(SourcePosDelta::ZERO + d, d);
    }

    #[test]
    fn test_same_line_addition() {
        let left = SourcePosDelta::new(2, 5);
        let right = SourcePosDelta::cols(3);
        assert_eq!(left + right, SourcePosDelta::new(2, 8));
    }

    #[test]
    fn test_line_break_resets_columns() {
        let left = SourcePosDelta::new(0, 40);
        let right = SourcePosDelta::new(1, 2);
        assert_eq!(left + right, SourcePosDelta::new(1, 2));
    }

    #[test]
    fn test_associativity() {
        let deltas = [
            SourcePosDelta::ZERO,
            SourcePosDelta::cols(4),
            SourcePosDelta::lines(1),
            SourcePosDelta::new(2, 3),
        ];
        for a in deltas {
            for b in deltas {
                for c in deltas {
                    assert_eq!((a + b) + c, a + (b + c));
                }
            }
        }
    }

    #[test]
    fn test_char_delta_folding() {
        let mut delta = SourcePosDelta::ZERO;
        for c in "ab\ncd".chars() {
            delta += char_delta(&c);
        }
        assert_eq!(delta, SourcePosDelta::new(1, 2));
        assert_eq!(
            SourcePos::START.offset_by(delta),
            SourcePos { line: 2, col: 3 }
        );
    }

    #[test]
    fn test_tab_advances_one_column() {
        let mut delta = SourcePosDelta::ZERO;
        for c in "a\tb".chars() {
            delta += char_delta(&c);
        }
        assert_eq!(delta, SourcePosDelta::cols(3));
    }

    #[test]
    fn test_crlf_tracks_like_lf() {
        let mut delta = SourcePosDelta::ZERO;
        for c in "a\r\nb".chars() {
            delta += char_delta(&c);
        }
        // The \r advances a column that the \n then discards.
        assert_eq!(delta, SourcePosDelta::new(1, 1));
    }

    #[test]
    fn test_start_position() {
        assert_eq!(
            SourcePos::START.offset_by(SourcePosDelta::ZERO),
            SourcePos::START
        );
        assert_eq!(
            SourcePos::START.offset_by(SourcePosDelta::cols(2)),
            SourcePos { line: 1, col: 3 }
        );
    }
}
