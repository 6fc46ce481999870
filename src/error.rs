//! # Parse Errors and Expected Sets
//!
//! This module defines the error values that flow through the parsing system:
//!
//! * [`Expected`] — a structured description of what a parser was looking
//!   for: a human-readable label, a literal token run, or end of input.
//! * [`ExpectedSet`] — a pooled, duplicate-collapsing accumulator of
//!   expectations. Alternation merges branch accumulators under the
//!   committed/uncommitted rules implemented in
//!   [`crate::parser::combinators::Choice`].
//! * [`InternalError`] — the error-slot value written by failing primitives
//!   while a parse is in flight. The position dominates: when alternatives
//!   fail at different offsets, the furthest-right error represents the
//!   deepest progress and wins.
//! * [`ParseError`] — the user-facing error built by the driver, rendering
//!   to the canonical `parse error at line L col C: unexpected X; expected
//!   A, B, or C` form.
//! * [`StreamError`] — failures of the underlying token source, surfaced as
//!   the `cause` of a [`ParseError`] rather than being swallowed.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::pool::Pool;
use crate::position::SourcePos;

/// What a parser was looking for at a failure position.
///
/// Expected values form a set: duplicates are collapsed by [`ExpectedSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected<I> {
    /// A human-readable description, usually attached via
    /// [`labelled`](crate::parser::ParserExt::labelled).
    Label(String),
    /// A literal run of tokens the parser tried to consume.
    Literal(Vec<I>),
    /// The end-of-input sentinel.
    EndOfInput,
}

impl<I: fmt::Display> fmt::Display for Expected<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Label(label) => write!(f, "{}", label),
            Expected::Literal(tokens) => {
                write!(f, "\"")?;
                for token in tokens {
                    write!(f, "{}", token)?;
                }
                write!(f, "\"")
            }
            Expected::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// A duplicate-collapsing accumulator of [`Expected`] values.
///
/// The backing vector is rented from the configured pool and handed back when
/// the set is dropped, on success and failure paths alike (including
/// unwinding), so alternation can churn through branch-local accumulators
/// without allocator traffic.
#[derive(Debug)]
pub struct ExpectedSet<I> {
    items: Vec<Expected<I>>,
    pool: Arc<Pool<Expected<I>>>,
}

impl<I> ExpectedSet<I> {
    pub(crate) fn rented_from(pool: Arc<Pool<Expected<I>>>) -> Self {
        let items = pool.rent();
        Self { items, pool }
    }

    pub fn as_slice(&self) -> &[Expected<I>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<I: PartialEq> ExpectedSet<I> {
    /// Insert one expectation, collapsing duplicates.
    pub fn add(&mut self, expected: Expected<I>) {
        if !self.items.contains(&expected) {
            self.items.push(expected);
        }
    }

    /// Move every expectation out of `other` into this set.
    pub fn absorb(&mut self, other: &mut ExpectedSet<I>) {
        for expected in other.items.drain(..) {
            if !self.items.contains(&expected) {
                self.items.push(expected);
            }
        }
    }
}

impl<I> Drop for ExpectedSet<I> {
    fn drop(&mut self) {
        self.pool.recycle(std::mem::take(&mut self.items));
    }
}

/// The error-slot value maintained by [`crate::state::ParseState`] while a
/// parse is running.
///
/// The slot is written by every failing primitive and inspected by
/// alternation to pick the deepest failure. The source position is captured
/// eagerly at write time, while the failure point is still inside the live
/// buffer window.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalError<I> {
    /// Absolute token offset of the failure.
    pub offset: usize,
    /// The token found at the failure point, absent at end of input.
    pub unexpected: Option<I>,
    /// Whether the failure was caused by running out of input.
    pub eof: bool,
    /// Free-form message, set by `fail` and friends.
    pub message: Option<String>,
    /// Line/column of the failure.
    pub pos: SourcePos,
}

/// Failure of the underlying token source.
///
/// Stream errors are never swallowed: the state reports end of input from
/// the failure point onward and the driver attaches the error as the
/// [`ParseError::cause`].
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("read from token source failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("input is not valid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
}

/// The user-facing parse error.
///
/// Renders to the canonical form
/// `parse error at line {L} col {C}: unexpected {X}; expected {A}, {B}, or
/// {C}; {message}`, with the expected set sorted for determinism, literal
/// token runs in double quotes, and `end of input` for the EOF sentinel.
#[derive(Debug)]
pub struct ParseError<I> {
    /// Absolute token offset of the failure.
    pub offset: usize,
    /// Line/column of the failure.
    pub pos: SourcePos,
    /// The token found at the failure point, absent at end of input.
    pub unexpected: Option<I>,
    /// Whether the failure was caused by running out of input.
    pub eof: bool,
    /// The merged set of expectations across the alternatives that reached
    /// the failure offset.
    pub expected: Vec<Expected<I>>,
    /// Free-form message, set by `fail` and friends.
    pub message: Option<String>,
    /// The stream failure that cut the input short, if any.
    pub cause: Option<Arc<StreamError>>,
}

impl<I: PartialEq> PartialEq for ParseError<I> {
    /// Structural equality on the parse-level fields; stream causes carry
    /// no equality of their own and compare by identity.
    fn eq(&self, other: &Self) -> bool {
        let causes_match = match (&self.cause, &other.cause) {
            (None, None) => true,
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        };
        self.offset == other.offset
            && self.pos == other.pos
            && self.unexpected == other.unexpected
            && self.eof == other.eof
            && self.expected == other.expected
            && self.message == other.message
            && causes_match
    }
}

impl<I: fmt::Display> fmt::Display for ParseError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}", self.pos)?;
        if self.eof {
            write!(f, ": unexpected end of input")?;
        } else if let Some(token) = &self.unexpected {
            write!(f, ": unexpected '{}'", token)?;
        } else {
            write!(f, ": failed")?;
        }
        if !self.expected.is_empty() {
            let mut rendered: Vec<String> =
                self.expected.iter().map(|e| e.to_string()).collect();
            rendered.sort();
            rendered.dedup();
            write!(f, "; expected ")?;
            match rendered.as_slice() {
                [only] => write!(f, "{}", only)?,
                [first, second] => write!(f, "{} or {}", first, second)?,
                [init @ .., last] => {
                    write!(f, "{}, or {}", init.join(", "), last)?;
                }
                [] => unreachable!(),
            }
        }
        if let Some(message) = &self.message {
            write!(f, "; {}", message)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "; {}", cause)?;
        }
        Ok(())
    }
}

impl<I: fmt::Display + fmt::Debug> std::error::Error for ParseError<I> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| &**cause as &(dyn std::error::Error + 'static))
    }
}
