//! # Combinators
//!
//! Composition of parsers: sequencing, transformation, alternation,
//! lookahead, labelling, and recovery. Every combinator here preserves the
//! committed/uncommitted discipline documented in [`crate::parser`]:
//! alternation only falls through on failures that consumed no input, and
//! [`Attempt`] is the explicit escape hatch that rewinds a committed
//! failure back to uncommitted.
//!
//! ## Alternation and error merging
//!
//! [`Choice`] runs each branch with a fresh branch-local accumulator:
//!
//! 1. a branch that succeeds wins outright;
//! 2. a branch that fails after consuming input is committed — its
//!    expectations propagate and no further branch runs;
//! 3. branches that fail without consuming input are compared by the
//!    offset of the error they recorded: the deepest offset wins, and the
//!    expectations of *all* branches that reached that offset are merged.

use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::{Expected, ExpectedSet, InternalError, ParseError};
use crate::parser::{BoxedParser, Failure, ParseResult, Parser};
use crate::state::ParseState;

/// Map: transforms the output of a parser; failure propagates verbatim.
#[derive(Clone)]
pub struct Map<P, F, A> {
    parser: P,
    f: F,
    _phantom: PhantomData<A>,
}

impl<P, F, A> Map<P, F, A> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<B> {
        self.parser.parse(state, expected).map(&self.f)
    }
}

/// AsUnit: discards the output of a parser.
#[derive(Clone)]
pub struct AsUnit<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> AsUnit<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, ()> for AsUnit<P, O>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<()> {
        self.parser.parse(state, expected).map(|_| ())
    }
}

/// Bind: runs a parser, feeds its result to a function, and runs the
/// parser that function returns.
///
/// Failure of either side propagates verbatim; in particular the second
/// parser's failure is *not* rewound.
#[derive(Clone)]
pub struct Bind<P, F, A> {
    parser: P,
    f: F,
    _phantom: PhantomData<A>,
}

impl<P, F, A> Bind<P, F, A> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F, Q> Parser<I, B> for Bind<P, F, A>
where
    P: Parser<I, A>,
    F: Fn(A) -> Q,
    Q: Parser<I, B>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<B> {
        let value = self.parser.parse(state, expected)?;
        (self.f)(value).parse(state, expected)
    }
}

/// Preceded: runs two parsers in sequence and keeps the second result.
#[derive(Clone)]
pub struct Preceded<P1, P2, O1> {
    first: P1,
    second: P2,
    _phantom: PhantomData<O1>,
}

impl<P1, P2, O1> Preceded<P1, P2, O1> {
    pub fn new(first: P1, second: P2) -> Self {
        Self {
            first,
            second,
            _phantom: PhantomData,
        }
    }
}

impl<I, O1, O2, P1, P2> Parser<I, O2> for Preceded<P1, P2, O1>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O2> {
        let _ = self.first.parse(state, expected)?;
        self.second.parse(state, expected)
    }
}

/// Terminated: runs two parsers in sequence and keeps the first result.
#[derive(Clone)]
pub struct Terminated<P1, P2, O2> {
    first: P1,
    second: P2,
    _phantom: PhantomData<O2>,
}

impl<P1, P2, O2> Terminated<P1, P2, O2> {
    pub fn new(first: P1, second: P2) -> Self {
        Self {
            first,
            second,
            _phantom: PhantomData,
        }
    }
}

impl<I, O1, O2, P1, P2> Parser<I, O1> for Terminated<P1, P2, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O1> {
        let value = self.first.parse(state, expected)?;
        let _ = self.second.parse(state, expected)?;
        Ok(value)
    }
}

/// Delimited: content between two delimiters, keeping only the content.
#[derive(Clone)]
pub struct Delimited<L, P, R, OL, OR> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(OL, OR)>,
}

impl<L, P, R, OL, OR> Delimited<L, P, R, OL, OR> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, OL, OR, L, P, R> Parser<I, O> for Delimited<L, P, R, OL, OR>
where
    L: Parser<I, OL>,
    P: Parser<I, O>,
    R: Parser<I, OR>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let _ = self.left.parse(state, expected)?;
        let value = self.parser.parse(state, expected)?;
        let _ = self.right.parse(state, expected)?;
        Ok(value)
    }
}

/// Tuple2: two parsers in sequence, both results kept.
#[derive(Clone)]
pub struct Tuple2<P1, P2> {
    first: P1,
    second: P2,
}

impl<P1, P2> Tuple2<P1, P2> {
    pub fn new(first: P1, second: P2) -> Self {
        Self { first, second }
    }
}

impl<I, O1, O2, P1, P2> Parser<I, (O1, O2)> for Tuple2<P1, P2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<(O1, O2)> {
        let first = self.first.parse(state, expected)?;
        let second = self.second.parse(state, expected)?;
        Ok((first, second))
    }
}

/// Tuple3: three parsers in sequence, all results kept.
#[derive(Clone)]
pub struct Tuple3<P1, P2, P3> {
    first: P1,
    second: P2,
    third: P3,
}

impl<P1, P2, P3> Tuple3<P1, P2, P3> {
    pub fn new(first: P1, second: P2, third: P3) -> Self {
        Self {
            first,
            second,
            third,
        }
    }
}

impl<I, O1, O2, O3, P1, P2, P3> Parser<I, (O1, O2, O3)> for Tuple3<P1, P2, P3>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<(O1, O2, O3)> {
        let first = self.first.parse(state, expected)?;
        let second = self.second.parse(state, expected)?;
        let third = self.third.parse(state, expected)?;
        Ok((first, second, third))
    }
}

/// Tuple4: four parsers in sequence, all results kept.
#[derive(Clone)]
pub struct Tuple4<P1, P2, P3, P4> {
    first: P1,
    second: P2,
    third: P3,
    fourth: P4,
}

impl<P1, P2, P3, P4> Tuple4<P1, P2, P3, P4> {
    pub fn new(first: P1, second: P2, third: P3, fourth: P4) -> Self {
        Self {
            first,
            second,
            third,
            fourth,
        }
    }
}

impl<I, O1, O2, O3, O4, P1, P2, P3, P4> Parser<I, (O1, O2, O3, O4)> for Tuple4<P1, P2, P3, P4>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
    P4: Parser<I, O4>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<(O1, O2, O3, O4)> {
        let first = self.first.parse(state, expected)?;
        let second = self.second.parse(state, expected)?;
        let third = self.third.parse(state, expected)?;
        let fourth = self.fourth.parse(state, expected)?;
        Ok((first, second, third, fourth))
    }
}

/// Choice: tries alternatives in order under the committed/uncommitted
/// rules.
///
/// Constructed by [`or`](crate::parser::ParserExt::or) or the
/// [`choice`](crate::parser::prelude::choice) function. `or` on an existing
/// `Choice` appends to it, so chains stay flat instead of nesting
/// accumulators.
pub struct Choice<I, O> {
    parsers: Vec<BoxedParser<I, O>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<BoxedParser<I, O>>) -> Self {
        Self { parsers }
    }

    /// Append one more alternative. Shadows
    /// [`ParserExt::or`](crate::parser::ParserExt::or) so that chained
    /// alternation extends this value in place.
    pub fn or(mut self, parser: impl Parser<I, O> + 'static) -> Self {
        self.parsers.push(BoxedParser::new(parser));
        self
    }
}

impl<I, O> Clone for Choice<I, O> {
    fn clone(&self) -> Self {
        Self {
            parsers: self.parsers.clone(),
        }
    }
}

impl<I: Clone + PartialEq, O> Parser<I, O> for Choice<I, O> {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let start = state.offset();
        let mut branch = state.new_expected_set();
        let mut deepest = state.new_expected_set();
        let mut deepest_error: Option<InternalError<I>> = None;

        for (index, parser) in self.parsers.iter().enumerate() {
            branch.clear();
            match parser.parse(state, &mut branch) {
                Ok(value) => return Ok(value),
                Err(_) if state.offset() > start => {
                    // Committed failure: no fall-through, this branch's
                    // expectations are the ones that matter.
                    expected.absorb(&mut branch);
                    return Err(Failure);
                }
                Err(_) => {
                    let error_offset = state.error().map(|e| e.offset).unwrap_or(start);
                    trace!(
                        target: "parser::choice",
                        branch = index,
                        offset = error_offset,
                        "alternative failed without consuming input"
                    );
                    match &deepest_error {
                        Some(error) if error.offset > error_offset => {}
                        Some(error) if error.offset == error_offset => {
                            deepest.absorb(&mut branch);
                        }
                        _ => {
                            deepest.clear();
                            deepest.absorb(&mut branch);
                            deepest_error = state.error().cloned();
                        }
                    }
                }
            }
        }

        match deepest_error {
            Some(error) => state.replace_error(error),
            None => {
                // Only possible for an empty alternation.
                let unexpected = state.current().cloned();
                let eof = unexpected.is_none();
                state.set_error(unexpected, eof, start, Some("no alternative matched".into()));
            }
        }
        expected.absorb(&mut deepest);
        Err(Failure)
    }
}

/// Attempt: runs a parser and rewinds the input if it fails, making the
/// failure uncommitted regardless of how much was consumed.
///
/// The error slot still records the deep failure, so alternation's
/// deepest-offset reporting keeps the precise position.
#[derive(Clone)]
pub struct Attempt<P> {
    parser: P,
}

impl<P> Attempt<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I: Clone, O, P> Parser<I, O> for Attempt<P>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let mark = state.bookmark();
        match self.parser.parse(state, expected) {
            Ok(value) => {
                state.discard_bookmark(mark);
                Ok(value)
            }
            Err(failure) => {
                state.rewind(mark);
                Err(failure)
            }
        }
    }
}

/// LookAhead: runs a parser and rewinds on success, yielding its result
/// without consuming input. Failure propagates verbatim.
#[derive(Clone)]
pub struct LookAhead<P> {
    parser: P,
}

impl<P> LookAhead<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I: Clone, O, P> Parser<I, O> for LookAhead<P>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let mark = state.bookmark();
        match self.parser.parse(state, expected) {
            Ok(value) => {
                state.rewind(mark);
                Ok(value)
            }
            Err(failure) => {
                state.discard_bookmark(mark);
                Err(failure)
            }
        }
    }
}

/// Not: negative lookahead. Succeeds with `()` exactly when the inner
/// parser fails, consuming nothing either way.
pub struct Not<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> Not<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<P: Clone, O> Clone for Not<P, O> {
    fn clone(&self) -> Self {
        Self {
            parser: self.parser.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<I: Clone, O, P> Parser<I, ()> for Not<P, O>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<()> {
        let entry = state.offset();
        let mark = state.bookmark();
        let mut scratch = state.new_expected_set();
        let result = self.parser.parse(state, &mut scratch);
        drop(scratch);
        state.rewind(mark);
        match result {
            Ok(_) => {
                let unexpected = state.current().cloned();
                let eof = unexpected.is_none();
                state.set_error(unexpected, eof, entry, None);
                Err(Failure)
            }
            Err(_) => Ok(()),
        }
    }
}

/// Labelled: replaces whatever expectations the inner parser reports on
/// failure with a fixed set.
#[derive(Clone)]
pub struct Labelled<P, I> {
    parser: P,
    expected: Vec<Expected<I>>,
}

impl<P, I> Labelled<P, I> {
    pub fn new(parser: P, expected: Vec<Expected<I>>) -> Self {
        Self { parser, expected }
    }
}

impl<I: Clone + PartialEq, O, P> Parser<I, O> for Labelled<P, I>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let mut inner = state.new_expected_set();
        match self.parser.parse(state, &mut inner) {
            Ok(value) => {
                expected.absorb(&mut inner);
                Ok(value)
            }
            Err(failure) => {
                for e in &self.expected {
                    expected.add(e.clone());
                }
                Err(failure)
            }
        }
    }
}

/// Optional: turns an uncommitted failure into `None`. A committed failure
/// still propagates; wrap in [`Attempt`] to suppress those too.
#[derive(Clone)]
pub struct Optional<P> {
    parser: P,
}

impl<P> Optional<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I: Clone + PartialEq, O, P> Parser<I, Option<O>> for Optional<P>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Option<O>> {
        let start = state.offset();
        let mut inner = state.new_expected_set();
        match self.parser.parse(state, &mut inner) {
            Ok(value) => Ok(Some(value)),
            Err(failure) => {
                if state.offset() > start {
                    expected.absorb(&mut inner);
                    Err(failure)
                } else {
                    // optional(p) ≡ p | pure(None): the empty branch wins,
                    // the failed branch's expectations are discarded.
                    trace!(
                        target: "parser::optional",
                        offset = start,
                        "inner parser failed without input, yielding None"
                    );
                    Ok(None)
                }
            }
        }
    }
}

/// Recover: on failure of the inner parser, builds the user-facing error,
/// hands it to the handler, and continues with the parser the handler
/// returns — from the state as the failure left it.
#[derive(Clone)]
pub struct Recover<P, F> {
    parser: P,
    handler: F,
}

impl<P, F> Recover<P, F> {
    pub fn new(parser: P, handler: F) -> Self {
        Self { parser, handler }
    }
}

impl<I: Clone, O, P, F, Q> Parser<I, O> for Recover<P, F>
where
    P: Parser<I, O>,
    F: Fn(ParseError<I>) -> Q,
    Q: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let mut inner = state.new_expected_set();
        match self.parser.parse(state, &mut inner) {
            Ok(value) => Ok(value),
            Err(_) => {
                let error = state.build_error(&inner);
                debug!(
                    target: "parser::recover",
                    offset = error.offset,
                    "running recovery continuation"
                );
                (self.handler)(error).parse(state, expected)
            }
        }
    }
}
