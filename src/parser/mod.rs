//! # Parser Core
//!
//! This module defines the parsing contract every combinator in the library
//! implements, and the method-chaining surface built on top of it.
//!
//! ## The evaluation contract
//!
//! A parser is an immutable value with a single operation: given the mutable
//! [`ParseState`] and a mutable [`ExpectedSet`] accumulator, it either
//! succeeds with a value, or fails having written the state's error slot and
//! contributed its expectations to the accumulator. The [`Failure`] marker
//! carries no data on purpose — everything a caller needs to know about a
//! failure lives in the state, and `?` keeps composition terse.
//!
//! Two facts about a failed parser drive all composition rules:
//!
//! * **uncommitted** — the cursor is back at the entry offset; alternation
//!   may try the next branch;
//! * **committed** — the cursor moved past the entry offset; alternation
//!   stops, and the failure propagates.
//!
//! ## Module layout
//!
//! * [`primitives`] — token-level parsers: [`primitives::Equal`],
//!   [`primitives::Satisfy`], [`primitives::Literal`], [`primitives::End`]…
//! * [`combinators`] — sequencing, alternation, lookahead, recovery.
//! * [`repetition`] — `many`-style loops, separated lists, chaining.
//! * [`recursive`] — lazy and forward-declared parsers for recursive
//!   grammars.
//! * [`prelude`] — free constructor functions for all of the above.

pub mod combinators;
pub mod prelude;
pub mod primitives;
pub mod recursive;
pub mod repetition;

use std::rc::Rc;

use crate::config::ParseConfig;
use crate::error::{Expected, ExpectedSet, ParseError};
use crate::state::ParseState;
use crate::stream::IntoTokenStream;

use combinators::{
    AsUnit, Attempt, Bind, Choice, Labelled, LookAhead, Map, Not, Optional, Preceded, Recover,
    Terminated,
};
use repetition::{
    Chain1, Chainer, Many, Many1, Repeat, SeparatedList, SeparatedList1, SeparatedOptTerminated,
    SeparatedTerminated,
};

/// Marker for a failed parse. All detail lives in the state's error slot
/// and the expected accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure;

/// Result type for one parser invocation.
pub type ParseResult<O> = Result<O, Failure>;

/// The core parsing interface.
///
/// # Type Parameters
///
/// * `I` - The input token type
/// * `O` - The output value type
pub trait Parser<I, O> {
    /// Attempt to parse at the state's current offset.
    ///
    /// On success the cursor has advanced over the consumed tokens (zero or
    /// more). On failure the error slot is set, this parser's expectations
    /// have been added to `expected`, and the cursor position tells the
    /// caller whether the failure is committed.
    fn parse(&self, state: &mut ParseState<'_, I>, expected: &mut ExpectedSet<I>)
    -> ParseResult<O>;
}

/// Any function with the right shape is a parser.
impl<I, O, F> Parser<I, O> for F
where
    F: Fn(&mut ParseState<'_, I>, &mut ExpectedSet<I>) -> ParseResult<O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        self(state, expected)
    }
}

/// A reference-counted, type-erased parser.
///
/// Cloning is cheap, which is what alternation vectors and recursive
/// grammars need. The trade is dynamic dispatch on the hot path; prefer the
/// concrete combinator types where the static shape is expressible.
pub struct BoxedParser<I, O> {
    inner: Rc<dyn Parser<I, O>>,
}

impl<I, O> BoxedParser<I, O> {
    pub fn new(parser: impl Parser<I, O> + 'static) -> Self {
        Self {
            inner: Rc::new(parser),
        }
    }
}

impl<I, O> Clone for BoxedParser<I, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<I, O> Parser<I, O> for BoxedParser<I, O> {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        self.inner.parse(state, expected)
    }
}

/// Combinator methods, available on every parser.
///
/// These construct the combinator values defined in the submodules; see
/// each type for the exact semantics.
pub trait ParserExt<I, O>: Parser<I, O> + Sized {
    /// Transform this parser's result.
    fn map<B, F: Fn(O) -> B>(self, f: F) -> Map<Self, F, O> {
        Map::new(self, f)
    }

    /// Discard this parser's result.
    fn to_unit(self) -> AsUnit<Self, O> {
        AsUnit::new(self)
    }

    /// Feed this parser's result to `f` and run the parser it returns.
    /// Failure of either side propagates verbatim.
    fn bind<F>(self, f: F) -> Bind<Self, F, O> {
        Bind::new(self, f)
    }

    /// Run this parser, then `next`; keep `next`'s result.
    fn then<Q>(self, next: Q) -> Preceded<Self, Q, O> {
        Preceded::new(self, next)
    }

    /// Run this parser, then `next`; keep this parser's result.
    fn before<B, Q: Parser<I, B>>(self, next: Q) -> Terminated<Self, Q, B> {
        Terminated::new(self, next)
    }

    /// Try this parser; on an uncommitted failure, try `other`.
    ///
    /// Builds the n-ary [`Choice`]; chained `or` calls extend the same
    /// alternation instead of nesting.
    fn or<Q>(self, other: Q) -> Choice<I, O>
    where
        Self: 'static,
        Q: Parser<I, O> + 'static,
    {
        Choice::new(vec![BoxedParser::new(self), BoxedParser::new(other)])
    }

    /// Make every failure of this parser uncommitted by rewinding the
    /// input.
    fn attempt(self) -> Attempt<Self> {
        Attempt::new(self)
    }

    /// Run this parser and rewind on success, keeping its result.
    fn look_ahead(self) -> LookAhead<Self> {
        LookAhead::new(self)
    }

    /// Succeed (with `()`) exactly when this parser fails. Never consumes.
    fn not(self) -> Not<Self, O> {
        Not::new(self)
    }

    /// Replace this parser's reported expectations with a label.
    fn labelled(self, label: impl Into<String>) -> Labelled<Self, I> {
        Labelled::new(self, vec![Expected::Label(label.into())])
    }

    /// Replace this parser's reported expectations with a fixed set.
    fn with_expected(self, expected: Vec<Expected<I>>) -> Labelled<Self, I> {
        Labelled::new(self, expected)
    }

    /// Turn an uncommitted failure into `None`.
    fn optional(self) -> Optional<Self> {
        Optional::new(self)
    }

    /// On failure, hand the built error to `handler` and continue with the
    /// parser it returns, from the already-advanced state.
    fn recover_with<F>(self, handler: F) -> Recover<Self, F> {
        Recover::new(self, handler)
    }

    /// Zero or more repetitions.
    fn many(self) -> Many<Self> {
        Many::new(self)
    }

    /// One or more repetitions.
    fn many1(self) -> Many1<Self> {
        Many1::new(self)
    }

    /// Exactly `count` repetitions.
    fn repeat(self, count: usize) -> Repeat<Self> {
        Repeat::new(self, count)
    }

    /// `item (separator item)*`, empty allowed.
    fn separated_by<OS, S: Parser<I, OS>>(self, separator: S) -> SeparatedList<Self, S, OS> {
        SeparatedList::new(self, separator)
    }

    /// `item (separator item)*`, at least one item.
    fn separated_by1<OS, S: Parser<I, OS>>(self, separator: S) -> SeparatedList1<Self, S, OS> {
        SeparatedList1::new(self, separator)
    }

    /// `(item separator)*`.
    fn separated_terminated<OS, S: Parser<I, OS>>(
        self,
        separator: S,
    ) -> SeparatedTerminated<Self, S, OS> {
        SeparatedTerminated::new(self, separator)
    }

    /// `item (separator item)* separator?`.
    ///
    /// A trailing separator followed by a committed item failure
    /// propagates; a trailing separator followed by an uncommitted item
    /// failure ends the list *with the separator consumed*. Wrap the
    /// separator in [`attempt`](ParserExt::attempt) to keep it.
    fn separated_opt_terminated<OS, S: Parser<I, OS>>(
        self,
        separator: S,
    ) -> SeparatedOptTerminated<Self, S, OS> {
        SeparatedOptTerminated::new(self, separator)
    }

    /// One or more repetitions folded through a stateful [`Chainer`],
    /// without building an intermediate collection.
    fn chain1<F, C>(self, make_chainer: F) -> Chain1<Self, F, O>
    where
        F: Fn() -> C,
        C: Chainer<O>,
    {
        Chain1::new(self, make_chainer)
    }

    /// Erase the concrete type behind a cheap-to-clone handle.
    fn boxed(self) -> BoxedParser<I, O>
    where
        Self: 'static,
    {
        BoxedParser::new(self)
    }

    /// Run this parser against an input, with the input's default
    /// configuration.
    fn run<S: IntoTokenStream<I>>(&self, input: S) -> Result<O, ParseError<I>>
    where
        I: Clone + 'static,
    {
        crate::driver::run(self, input)
    }

    /// Run this parser against an input with an explicit configuration.
    fn run_with<S: IntoTokenStream<I>>(
        &self,
        input: S,
        config: ParseConfig<I>,
    ) -> Result<O, ParseError<I>>
    where
        I: Clone + 'static,
    {
        crate::driver::run_with(self, input, config)
    }
}

impl<I, O, P: Parser<I, O>> ParserExt<I, O> for P {}
