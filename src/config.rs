//! # Parse Configuration
//!
//! A [`ParseConfig`] is the immutable bundle handed to the driver for one or
//! more parses: the token-to-position-delta function and the buffer pools.
//! Cloning a config is cheap and shares the pools, so long-running callers
//! can reuse one config across parses to keep buffer reuse effective.

use std::fmt;
use std::sync::Arc;

use crate::error::Expected;
use crate::pool::Pool;
use crate::position::{SourcePosDelta, char_delta, unit_delta};

/// Immutable per-parse configuration: position tracking and pooled
/// allocation.
///
/// The default configuration treats every token as one column wide. Text
/// entry points (`&str`, `String`, char readers) substitute
/// [`ParseConfig::text`], which understands `\n`.
pub struct ParseConfig<I> {
    pos_delta: Arc<dyn Fn(&I) -> SourcePosDelta + Send + Sync>,
    token_pool: Arc<Pool<I>>,
    expected_pool: Arc<Pool<Expected<I>>>,
}

impl<I> ParseConfig<I> {
    /// A configuration with a custom token-to-delta function and fresh
    /// pools.
    pub fn with_pos_delta(
        pos_delta: impl Fn(&I) -> SourcePosDelta + Send + Sync + 'static,
    ) -> Self {
        Self {
            pos_delta: Arc::new(pos_delta),
            token_pool: Arc::new(Pool::new()),
            expected_pool: Arc::new(Pool::new()),
        }
    }

    /// Substitute caller-owned pools, e.g. to share buffer reuse across
    /// configs with different delta functions.
    pub fn with_pools(mut self, token_pool: Arc<Pool<I>>, expected_pool: Arc<Pool<Expected<I>>>) -> Self {
        self.token_pool = token_pool;
        self.expected_pool = expected_pool;
        self
    }

    /// The position delta contributed by one token.
    pub fn delta(&self, token: &I) -> SourcePosDelta {
        (self.pos_delta)(token)
    }

    pub(crate) fn token_pool(&self) -> Arc<Pool<I>> {
        Arc::clone(&self.token_pool)
    }

    pub(crate) fn expected_pool(&self) -> Arc<Pool<Expected<I>>> {
        Arc::clone(&self.expected_pool)
    }
}

impl ParseConfig<char> {
    /// Character configuration: `\n` starts a new line, any other character
    /// advances one column.
    pub fn text() -> Self {
        Self::with_pos_delta(char_delta)
    }
}

impl<I: 'static> Default for ParseConfig<I> {
    fn default() -> Self {
        Self::with_pos_delta(unit_delta)
    }
}

impl<I> Clone for ParseConfig<I> {
    fn clone(&self) -> Self {
        Self {
            pos_delta: Arc::clone(&self.pos_delta),
            token_pool: Arc::clone(&self.token_pool),
            expected_pool: Arc::clone(&self.expected_pool),
        }
    }
}

impl<I> fmt::Debug for ParseConfig<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig").finish_non_exhaustive()
    }
}
