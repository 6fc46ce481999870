//! # Parse State
//!
//! [`ParseState`] is the mutable heart of the library. A single state is
//! created per parse and threaded by exclusive reference down the whole tree
//! of parser invocations. It owns:
//!
//! * a growable **buffer** holding every token between the earliest live
//!   bookmark and the lookahead frontier — tokens before the earliest pin
//!   are discarded as the parse moves on;
//! * the **current offset** into the input (absolute, never reset globally,
//!   but rewindable within a bookmarked region);
//! * a **bookmark stack** supporting nested backtracking: a bookmark pins
//!   the buffer so a later [`rewind`](ParseState::rewind) can restore the
//!   cursor, and must be either rewound to or explicitly discarded before
//!   the creating frame unwinds;
//! * the **error slot** written by failing primitives and inspected by
//!   alternation to find the deepest failure;
//! * a **position cache** so that line/column queries fold token deltas
//!   incrementally instead of rescanning the buffer.
//!
//! ## Backtracking
//!
//! ```text
//! let mark = state.bookmark();       // pin the current offset
//! match parser.parse(state, exp) {
//!     Ok(v) => { state.discard_bookmark(mark); ... }
//!     Err(f) => { state.rewind(mark); ... }   // cursor back, pin released
//! }
//! ```
//!
//! The token buffer is rented from the configured pool and handed back when
//! the state is dropped, on every exit path.

use std::sync::Arc;

use crate::config::ParseConfig;
use crate::error::{ExpectedSet, InternalError, ParseError, StreamError};
use crate::position::{SourcePos, SourcePosDelta};
use crate::stream::TokenStream;

/// Tokens requested from the stream per refill.
pub(crate) const CHUNK: usize = 256;

/// A pinned offset that keeps the buffer from discarding earlier tokens,
/// enabling [`ParseState::rewind`].
///
/// Every bookmark must be consumed by exactly one of `rewind` or
/// `discard_bookmark`; a leaked bookmark keeps its pin until the parse ends.
#[derive(Debug)]
#[must_use = "a bookmark pins the buffer until rewound or discarded"]
pub struct Bookmark {
    offset: usize,
}

/// The mutable context threaded through every parser invocation.
pub struct ParseState<'s, I> {
    stream: &'s mut (dyn TokenStream<I> + 's),
    config: ParseConfig<I>,
    buffer: Vec<I>,
    /// Absolute offset of `buffer[0]`.
    buffer_start: usize,
    /// Absolute offset of the next token to consume.
    current: usize,
    stream_done: bool,
    stream_error: Option<Arc<StreamError>>,
    /// Stack of pinned offsets, oldest first.
    bookmarks: Vec<usize>,
    error: Option<InternalError<I>>,
    /// Delta from the input start to `buffer_start`.
    anchor: SourcePosDelta,
    /// Monotone fold cache: delta from the input start to `cache_offset`.
    cache_offset: usize,
    cache_delta: SourcePosDelta,
}

impl<'s, I: Clone> ParseState<'s, I> {
    pub fn new(stream: &'s mut (dyn TokenStream<I> + 's), config: ParseConfig<I>) -> Self {
        let buffer = config.token_pool().rent();
        Self {
            stream,
            config,
            buffer,
            buffer_start: 0,
            current: 0,
            stream_done: false,
            stream_error: None,
            bookmarks: Vec::new(),
            error: None,
            anchor: SourcePosDelta::ZERO,
            cache_offset: 0,
            cache_delta: SourcePosDelta::ZERO,
        }
    }

    /// Absolute offset of the next token to consume.
    pub fn offset(&self) -> usize {
        self.current
    }

    /// Whether a token is available at the current offset.
    pub fn has_current(&mut self) -> bool {
        self.ensure_lookahead(1);
        self.current < self.frontier()
    }

    /// The token at the current offset, or `None` at end of input.
    pub fn current(&mut self) -> Option<&I> {
        self.ensure_lookahead(1);
        self.buffer.get(self.current - self.buffer_start)
    }

    /// Move forward one token.
    pub fn advance(&mut self) {
        self.advance_by(1);
    }

    /// Move forward up to `n` tokens, stopping at end of input.
    pub fn advance_by(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.ensure_lookahead(n);
        self.current = (self.current + n).min(self.frontier());
    }

    /// A slice of up to `n` tokens starting at the current offset, without
    /// advancing. Shorter than `n` only at end of input.
    pub fn look_ahead(&mut self, n: usize) -> &[I] {
        self.ensure_lookahead(n);
        let from = self.current - self.buffer_start;
        let to = (from + n).min(self.buffer.len());
        &self.buffer[from..to]
    }

    /// Pin the current offset for a later rewind.
    pub fn bookmark(&mut self) -> Bookmark {
        self.bookmarks.push(self.current);
        Bookmark {
            offset: self.current,
        }
    }

    /// Restore the cursor to the bookmarked offset and release the pin.
    pub fn rewind(&mut self, bookmark: Bookmark) {
        self.current = bookmark.offset;
        self.release(bookmark);
    }

    /// Release the pin without moving the cursor.
    pub fn discard_bookmark(&mut self, bookmark: Bookmark) {
        self.release(bookmark);
    }

    fn release(&mut self, bookmark: Bookmark) {
        debug_assert_eq!(
            self.bookmarks.last().copied(),
            Some(bookmark.offset),
            "bookmarks must be released in stack order"
        );
        if let Some(found) = self
            .bookmarks
            .iter()
            .rposition(|&offset| offset == bookmark.offset)
        {
            self.bookmarks.remove(found);
        }
    }

    /// Delta from the input start to the current offset.
    pub fn compute_source_pos_delta(&mut self) -> SourcePosDelta {
        self.delta_to(self.current)
    }

    /// Line/column of the current offset.
    pub fn current_pos(&mut self) -> SourcePos {
        SourcePos::START.offset_by(self.compute_source_pos_delta())
    }

    /// Write the error slot. The offset must lie inside the live buffer
    /// window; the line/column is captured immediately.
    pub fn set_error(
        &mut self,
        unexpected: Option<I>,
        eof: bool,
        offset: usize,
        message: Option<String>,
    ) {
        let pos = SourcePos::START.offset_by(self.delta_to(offset));
        self.error = Some(InternalError {
            offset,
            unexpected,
            eof,
            message,
            pos,
        });
    }

    /// The last error written, if any.
    pub fn error(&self) -> Option<&InternalError<I>> {
        self.error.as_ref()
    }

    /// Overwrite the error slot with a previously captured error. Used by
    /// alternation to reinstate the deepest branch failure.
    pub fn replace_error(&mut self, error: InternalError<I>) {
        self.error = Some(error);
    }

    /// Finalise the error slot and an expected accumulator into the
    /// user-facing error.
    pub fn build_error(&mut self, expected: &ExpectedSet<I>) -> ParseError<I> {
        let internal = match self.error.clone() {
            Some(error) => error,
            None => {
                let unexpected = self.current().cloned();
                let eof = unexpected.is_none();
                let offset = self.current;
                let pos = SourcePos::START.offset_by(self.delta_to(offset));
                InternalError {
                    offset,
                    unexpected,
                    eof,
                    message: None,
                    pos,
                }
            }
        };
        ParseError {
            offset: internal.offset,
            pos: internal.pos,
            unexpected: internal.unexpected,
            eof: internal.eof,
            expected: expected.as_slice().to_vec(),
            message: internal.message,
            cause: self.stream_error.clone(),
        }
    }

    /// Rent a fresh expected accumulator from the configured pool.
    pub fn new_expected_set(&self) -> ExpectedSet<I> {
        ExpectedSet::rented_from(self.config.expected_pool())
    }

    /// The stream failure that ended the input early, if any.
    pub fn stream_error(&self) -> Option<&Arc<StreamError>> {
        self.stream_error.as_ref()
    }

    fn frontier(&self) -> usize {
        self.buffer_start + self.buffer.len()
    }

    /// Extend the buffer until it covers `current + n` tokens or the input
    /// ends. Opportunistically drops tokens below the earliest pin.
    fn ensure_lookahead(&mut self, n: usize) {
        let target = self.current + n;
        while !self.stream_done && self.frontier() < target {
            self.trim();
            let want = (target - self.frontier()).max(CHUNK);
            match self.stream.pull(&mut self.buffer, want) {
                Ok(0) => self.stream_done = true,
                Ok(_) => {}
                Err(error) => {
                    // First failure wins; the input ends here as far as the
                    // parse is concerned.
                    if self.stream_error.is_none() {
                        self.stream_error = Some(Arc::new(error));
                    }
                    self.stream_done = true;
                }
            }
        }
    }

    /// Drop buffered tokens no bookmark or the cursor can reach anymore,
    /// folding their deltas into the position anchor.
    fn trim(&mut self) {
        let pin = self
            .bookmarks
            .first()
            .copied()
            .unwrap_or(self.current)
            .min(self.current);
        if pin <= self.buffer_start {
            return;
        }
        let dropped = pin - self.buffer_start;
        self.anchor = self.delta_to(pin);
        self.cache_offset = pin;
        self.cache_delta = self.anchor;
        self.buffer.drain(..dropped);
        self.buffer_start = pin;
    }

    /// Delta from the input start to `offset`, folding forward from the
    /// cache when possible.
    fn delta_to(&mut self, offset: usize) -> SourcePosDelta {
        let offset = offset.clamp(self.buffer_start, self.frontier());
        if offset < self.cache_offset || self.cache_offset < self.buffer_start {
            self.cache_offset = self.buffer_start;
            self.cache_delta = self.anchor;
        }
        let from = self.cache_offset - self.buffer_start;
        let to = offset - self.buffer_start;
        let mut delta = self.cache_delta;
        for token in &self.buffer[from..to] {
            delta += self.config.delta(token);
        }
        self.cache_offset = offset;
        self.cache_delta = delta;
        delta
    }
}

impl<I> Drop for ParseState<'_, I> {
    fn drop(&mut self) {
        self.config
            .token_pool()
            .recycle(std::mem::take(&mut self.buffer));
    }
}
