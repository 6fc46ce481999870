//! # Tsumugi: Parser Combinators over Buffered Token Streams
//!
//! Tsumugi is a parser combinator library: small parser values compose into
//! grammars that consume a stream of tokens (characters, bytes, or any
//! `Clone + PartialEq` type) and produce either a typed result or a
//! structured "expected X, got Y at line:col" error.
//!
//! ## Technical Foundations
//!
//! ### 1. Buffered Streaming Input
//! Input arrives through a minimal pull interface ([`stream::TokenStream`])
//! with adapters for slices, iterators, strings, byte readers, and
//! incremental UTF-8 character readers. The parse state keeps only the
//! window of tokens that live bookmarks can still reach; the rest is
//! discarded as the parse moves forward.
//!
//! ### 2. Committed/Uncommitted Alternation
//! A failing parser that consumed input is *committed*: alternation stops
//! and reports it. A failure at the entry offset is *uncommitted* and falls
//! through to the next branch. [`parser::combinators::Attempt`] converts
//! the former into the latter by rewinding; this single discipline is what
//! makes error messages precise without grammar annotations.
//!
//! ### 3. Structured Error Merging
//! Failing primitives record what they expected ([`error::Expected`]) and
//! where. Alternation merges the expectations of every branch that reached
//! the deepest failure offset, yielding diagnostics like
//! `parse error at line 2 col 5: unexpected 'd'; expected "ab" or "ac"`.
//!
//! ### 4. Pooled Resources
//! Token buffers and expected-set accumulators are rented from a
//! thread-safe pool ([`pool::Pool`]) and returned on every exit path, so
//! repeated parses and alternation-heavy grammars stay off the allocator.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Input source → TokenStream → ParseState ⇄ Parser evaluation → Result / ParseError
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use tsumugi::parser::ParserExt;
//! use tsumugi::text::{ch, decimal};
//!
//! let pair = decimal().before(ch(',')).then(decimal());
//! assert_eq!(pair.run("17,29"), Ok(29));
//!
//! let error = pair.run("17;29").unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "parse error at line 1 col 3: unexpected ';'; expected \",\"",
//! );
//! ```
//!
//! ## Module Map
//!
//! * [`parser`] — the [`parser::Parser`] trait, combinators, repetition,
//!   recursion, and the [`parser::prelude`] constructors.
//! * [`state`] — the mutable parse state: buffer, bookmarks, error slot.
//! * [`stream`] — token-stream adapters over common input sources.
//! * [`error`] — expected sets, internal errors, and [`error::ParseError`].
//! * [`position`] — line/column tracking as a delta monoid.
//! * [`config`] — per-parse configuration: position deltas and pools.
//! * [`driver`] — [`driver::run`] and friends.
//! * [`text`] — character-level helpers: classes, strings, numbers.
//! * [`expr`] — operator-precedence expression builder.
//! * [`permutation`] — components in any order.

pub mod config;
pub mod driver;
pub mod error;
pub mod expr;
pub mod parser;
pub mod permutation;
pub mod pool;
pub mod position;
pub mod state;
pub mod stream;
pub mod text;

// Re-exports
pub use config::ParseConfig;
pub use driver::{run, run_or_panic, run_with};
pub use error::{Expected, ExpectedSet, InternalError, ParseError, StreamError};
pub use parser::{BoxedParser, Failure, ParseResult, Parser, ParserExt};
pub use position::{SourcePos, SourcePosDelta};
pub use state::{Bookmark, ParseState};
pub use stream::{
    CharReaderStream, IntoTokenStream, IterStream, ReaderStream, SliceStream, TokenStream,
};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
