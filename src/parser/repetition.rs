//! # Repetition and Chaining
//!
//! Loops over an element parser, all sharing one rule: after each attempt,
//!
//! * success that consumed input continues the loop;
//! * success that consumed **nothing** is a bug in the caller's grammar —
//!   the loop would never terminate — and panics;
//! * failure that consumed nothing ends the loop successfully;
//! * failure that consumed input is committed and propagates.
//!
//! [`Chain1`] is the constant-space variant: instead of collecting a
//! vector it folds every element through a caller-supplied [`Chainer`],
//! which is how the numeric parsers in [`crate::text`] avoid intermediate
//! allocations.

use std::marker::PhantomData;

use tracing::trace;

use crate::error::ExpectedSet;
use crate::parser::{Failure, ParseResult, Parser};
use crate::state::ParseState;

/// The shared repetition loop: run `parser` until it fails without
/// consuming input, appending results.
fn repeat_until_uncommitted<I, O, P>(
    parser: &P,
    state: &mut ParseState<'_, I>,
    expected: &mut ExpectedSet<I>,
    results: &mut Vec<O>,
    combinator: &'static str,
) -> ParseResult<()>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
{
    let mut child = state.new_expected_set();
    loop {
        let before = state.offset();
        child.clear();
        match parser.parse(state, &mut child) {
            Ok(value) => {
                if state.offset() == before {
                    panic!(
                        "element parser of `{combinator}` succeeded without consuming input; \
                         this repetition would never terminate"
                    );
                }
                results.push(value);
            }
            Err(failure) => {
                if state.offset() > before {
                    expected.absorb(&mut child);
                    return Err(failure);
                }
                trace!(
                    target: "parser::many",
                    items = results.len(),
                    offset = before,
                    "element failed without consuming input, ending repetition"
                );
                return Ok(());
            }
        }
    }
}

/// Many: zero or more repetitions, collected in order.
#[derive(Clone)]
pub struct Many<P> {
    parser: P,
}

impl<P> Many<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        repeat_until_uncommitted(&self.parser, state, expected, &mut results, "many")?;
        Ok(results)
    }
}

/// Many1: one or more repetitions; the first failure propagates as usual.
#[derive(Clone)]
pub struct Many1<P> {
    parser: P,
}

impl<P> Many1<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many1<P>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let start = state.offset();
        let first = self.parser.parse(state, expected)?;
        if state.offset() == start {
            panic!(
                "element parser of `many1` succeeded without consuming input; \
                 this repetition would never terminate"
            );
        }
        let mut results = vec![first];
        repeat_until_uncommitted(&self.parser, state, expected, &mut results, "many1")?;
        Ok(results)
    }
}

/// Repeat: exactly `count` repetitions; any failure propagates verbatim.
#[derive(Clone)]
pub struct Repeat<P> {
    parser: P,
    count: usize,
}

impl<P> Repeat<P> {
    pub fn new(parser: P, count: usize) -> Self {
        Self { parser, count }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Repeat<P>
where
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let mut results = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            results.push(self.parser.parse(state, expected)?);
        }
        Ok(results)
    }
}

/// The `(separator item)*` tail shared by the separated-list parsers.
fn separated_tail<I, O, OS, P, S>(
    item: &P,
    separator: &S,
    state: &mut ParseState<'_, I>,
    expected: &mut ExpectedSet<I>,
    results: &mut Vec<O>,
) -> ParseResult<()>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    let mut child = state.new_expected_set();
    loop {
        let before = state.offset();
        child.clear();
        if separator.parse(state, &mut child).is_err() {
            if state.offset() > before {
                expected.absorb(&mut child);
                return Err(Failure);
            }
            return Ok(());
        }
        child.clear();
        match item.parse(state, &mut child) {
            Ok(value) => {
                if state.offset() == before {
                    panic!(
                        "element parser of `separated_by` succeeded without consuming input; \
                         this repetition would never terminate"
                    );
                }
                results.push(value);
            }
            Err(failure) => {
                if state.offset() > before {
                    expected.absorb(&mut child);
                    return Err(failure);
                }
                return Ok(());
            }
        }
    }
}

/// SeparatedList: `item (separator item)*`, empty allowed.
///
/// A separator followed by a failing item is a committed failure: strict
/// lists do not allow a trailing separator.
#[derive(Clone)]
pub struct SeparatedList<P, S, OS> {
    item: P,
    separator: S,
    _phantom: PhantomData<OS>,
}

impl<P, S, OS> SeparatedList<P, S, OS> {
    pub fn new(item: P, separator: S) -> Self {
        Self {
            item,
            separator,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, OS, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, OS>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let start = state.offset();
        let mut child = state.new_expected_set();
        match self.item.parse(state, &mut child) {
            Ok(value) => {
                if state.offset() == start {
                    panic!(
                        "element parser of `separated_by` succeeded without consuming input; \
                         this repetition would never terminate"
                    );
                }
                results.push(value);
            }
            Err(failure) => {
                if state.offset() > start {
                    expected.absorb(&mut child);
                    return Err(failure);
                }
                return Ok(results);
            }
        }
        drop(child);
        separated_tail(&self.item, &self.separator, state, expected, &mut results)?;
        Ok(results)
    }
}

/// SeparatedList1: `item (separator item)*`, at least one item.
#[derive(Clone)]
pub struct SeparatedList1<P, S, OS> {
    item: P,
    separator: S,
    _phantom: PhantomData<OS>,
}

impl<P, S, OS> SeparatedList1<P, S, OS> {
    pub fn new(item: P, separator: S) -> Self {
        Self {
            item,
            separator,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, OS, P, S> Parser<I, Vec<O>> for SeparatedList1<P, S, OS>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let start = state.offset();
        let first = self.item.parse(state, expected)?;
        if state.offset() == start {
            panic!(
                "element parser of `separated_by1` succeeded without consuming input; \
                 this repetition would never terminate"
            );
        }
        let mut results = vec![first];
        separated_tail(&self.item, &self.separator, state, expected, &mut results)?;
        Ok(results)
    }
}

/// SeparatedTerminated: `(item separator)*`.
///
/// Every item must be followed by a separator; an item without one is a
/// committed failure.
#[derive(Clone)]
pub struct SeparatedTerminated<P, S, OS> {
    item: P,
    separator: S,
    _phantom: PhantomData<OS>,
}

impl<P, S, OS> SeparatedTerminated<P, S, OS> {
    pub fn new(item: P, separator: S) -> Self {
        Self {
            item,
            separator,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, OS, P, S> Parser<I, Vec<O>> for SeparatedTerminated<P, S, OS>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut child = state.new_expected_set();
        loop {
            let before = state.offset();
            child.clear();
            let value = match self.item.parse(state, &mut child) {
                Ok(value) => value,
                Err(failure) => {
                    if state.offset() > before {
                        expected.absorb(&mut child);
                        return Err(failure);
                    }
                    return Ok(results);
                }
            };
            child.clear();
            if self.separator.parse(state, &mut child).is_err() {
                if state.offset() > before {
                    expected.absorb(&mut child);
                    return Err(Failure);
                }
                return Ok(results);
            }
            if state.offset() == before {
                panic!(
                    "element parser of `separated_terminated` succeeded without consuming input; \
                     this repetition would never terminate"
                );
            }
            results.push(value);
        }
    }
}

/// SeparatedOptTerminated: `item (separator item)* separator?`.
///
/// After a trailing separator, a committed item failure propagates, but an
/// uncommitted one ends the list **with the separator consumed**. Callers
/// that need to parse material immediately after the list should wrap the
/// separator in [`attempt`](crate::parser::ParserExt::attempt).
#[derive(Clone)]
pub struct SeparatedOptTerminated<P, S, OS> {
    item: P,
    separator: S,
    _phantom: PhantomData<OS>,
}

impl<P, S, OS> SeparatedOptTerminated<P, S, OS> {
    pub fn new(item: P, separator: S) -> Self {
        Self {
            item,
            separator,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, OS, P, S> Parser<I, Vec<O>> for SeparatedOptTerminated<P, S, OS>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let start = state.offset();
        let mut child = state.new_expected_set();
        match self.item.parse(state, &mut child) {
            Ok(value) => {
                if state.offset() == start {
                    panic!(
                        "element parser of `separated_opt_terminated` succeeded without \
                         consuming input; this repetition would never terminate"
                    );
                }
                results.push(value);
            }
            Err(failure) => {
                if state.offset() > start {
                    expected.absorb(&mut child);
                    return Err(failure);
                }
                return Ok(results);
            }
        }
        loop {
            let before = state.offset();
            child.clear();
            if self.separator.parse(state, &mut child).is_err() {
                if state.offset() > before {
                    expected.absorb(&mut child);
                    return Err(Failure);
                }
                return Ok(results);
            }
            let after_separator = state.offset();
            child.clear();
            match self.item.parse(state, &mut child) {
                Ok(value) => {
                    if state.offset() == before {
                        panic!(
                            "element parser of `separated_opt_terminated` succeeded without \
                             consuming input; this repetition would never terminate"
                        );
                    }
                    results.push(value);
                }
                Err(failure) => {
                    if state.offset() > after_separator {
                        expected.absorb(&mut child);
                        return Err(failure);
                    }
                    trace!(
                        target: "parser::separated",
                        items = results.len(),
                        "trailing separator consumed, list complete"
                    );
                    return Ok(results);
                }
            }
        }
    }
}

/// A stateful incremental reducer for [`Chain1`].
///
/// `apply` receives each parsed element in order; `finish` produces the
/// final value; `on_error` is called before a failure propagates, so
/// implementations holding external resources can clean up.
pub trait Chainer<A> {
    type Output;

    fn apply(&mut self, value: A);

    fn finish(self) -> Self::Output;

    fn on_error(&mut self) {}
}

/// Chain1: one or more repetitions folded through a [`Chainer`] instead of
/// collected into a vector.
///
/// The chainer factory runs once per parse, so the parser value itself
/// stays immutable and reusable.
#[derive(Clone)]
pub struct Chain1<P, F, O> {
    parser: P,
    make_chainer: F,
    _phantom: PhantomData<O>,
}

impl<P, F, O> Chain1<P, F, O> {
    pub fn new(parser: P, make_chainer: F) -> Self {
        Self {
            parser,
            make_chainer,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, C, P, F> Parser<I, C::Output> for Chain1<P, F, O>
where
    I: Clone + PartialEq,
    P: Parser<I, O>,
    F: Fn() -> C,
    C: Chainer<O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<C::Output> {
        let mut chainer = (self.make_chainer)();
        let start = state.offset();
        let mut child = state.new_expected_set();
        match self.parser.parse(state, &mut child) {
            Ok(value) => {
                if state.offset() == start {
                    panic!(
                        "element parser of `chain1` succeeded without consuming input; \
                         this repetition would never terminate"
                    );
                }
                chainer.apply(value);
            }
            Err(failure) => {
                chainer.on_error();
                expected.absorb(&mut child);
                return Err(failure);
            }
        }
        loop {
            let before = state.offset();
            child.clear();
            match self.parser.parse(state, &mut child) {
                Ok(value) => {
                    if state.offset() == before {
                        panic!(
                            "element parser of `chain1` succeeded without consuming input; \
                             this repetition would never terminate"
                        );
                    }
                    chainer.apply(value);
                }
                Err(failure) => {
                    if state.offset() > before {
                        expected.absorb(&mut child);
                        chainer.on_error();
                        return Err(failure);
                    }
                    return Ok(chainer.finish());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;
    use crate::error::Expected;
    use crate::parser::ParserExt;
    use crate::parser::primitives::{Equal, Literal, Pure, Satisfy};
    use crate::stream::SliceStream;

    fn with_state<R>(input: &str, f: impl FnOnce(&mut ParseState<'_, char>) -> R) -> R {
        let tokens: Vec<char> = input.chars().collect();
        let mut stream = SliceStream::new(&tokens);
        let mut state = ParseState::new(&mut stream, ParseConfig::text());
        f(&mut state)
    }

    fn digit() -> impl Parser<char, char> {
        Satisfy::new(|c: &char| if c.is_ascii_digit() { Some(*c) } else { None })
    }

    fn string(s: &str) -> Literal<char> {
        Literal::new(s.chars().collect())
    }

    #[test]
    fn test_many_collects_until_uncommitted_failure() {
        with_state("123a", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().many();
            assert_eq!(parser.parse(state, &mut expected), Ok(vec!['1', '2', '3']));
            assert_eq!(state.offset(), 3);
        });
    }

    #[test]
    fn test_many_empty_on_immediate_uncommitted_failure() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().many();
            assert_eq!(parser.parse(state, &mut expected), Ok(vec![]));
            assert_eq!(state.offset(), 0);
        });
    }

    #[test]
    fn test_many_propagates_committed_element_failure() {
        with_state("abax", |state| {
            let mut expected = state.new_expected_set();
            let parser = string("ab").many();
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            // Second element consumed 'a' before the mismatch.
            assert_eq!(state.offset(), 3);
        });
    }

    #[test]
    #[should_panic(expected = "succeeded without consuming input")]
    fn test_many_panics_on_zero_width_element() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            let parser = ParserExt::<char, char>::many(Pure::new('x'));
            let _ = parser.parse(state, &mut expected);
        });
    }

    #[test]
    fn test_many1_requires_one() {
        with_state("a", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().labelled("digit").many1();
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 0);
            assert_eq!(expected.as_slice(), &[Expected::Label("digit".into())]);
            let error = state.error().expect("error slot");
            assert_eq!(error.offset, 0);
            assert_eq!(error.unexpected, Some('a'));
        });
    }

    #[test]
    fn test_many1_collects_run() {
        with_state("42x", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().many1();
            assert_eq!(parser.parse(state, &mut expected), Ok(vec!['4', '2']));
        });
    }

    #[test]
    fn test_repeat_exact_count() {
        with_state("aaaa", |state| {
            let mut expected = state.new_expected_set();
            let parser = Equal::new('a').repeat(3);
            assert_eq!(
                parser.parse(state, &mut expected),
                Ok(vec!['a', 'a', 'a'])
            );
            assert_eq!(state.offset(), 3);
        });
    }

    #[test]
    fn test_repeat_failure_propagates() {
        with_state("aab", |state| {
            let mut expected = state.new_expected_set();
            let parser = Equal::new('a').repeat(3);
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 2);
        });
    }

    #[test]
    fn test_repeat_zero_is_empty_success() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            let parser = Equal::new('x').repeat(0);
            assert_eq!(parser.parse(state, &mut expected), Ok(vec![]));
            assert_eq!(state.offset(), 0);
        });
    }

    #[test]
    fn test_separated_by_basic() {
        with_state("1,2,3", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().separated_by(Equal::new(','));
            assert_eq!(parser.parse(state, &mut expected), Ok(vec!['1', '2', '3']));
            assert_eq!(state.offset(), 5);
        });
    }

    #[test]
    fn test_separated_by_empty() {
        with_state("x", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().separated_by(Equal::new(','));
            assert_eq!(parser.parse(state, &mut expected), Ok(vec![]));
            assert_eq!(state.offset(), 0);
        });
    }

    #[test]
    fn test_separated_by_rejects_trailing_separator() {
        with_state("1,2,", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().separated_by(Equal::new(','));
            // The trailing comma commits the list to another item.
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 4);
        });
    }

    #[test]
    fn test_separated_by1_requires_first() {
        with_state(",1", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().separated_by1(Equal::new(','));
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 0);
        });
    }

    #[test]
    fn test_separated_terminated() {
        with_state("1;2;x", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().separated_terminated(Equal::new(';'));
            assert_eq!(parser.parse(state, &mut expected), Ok(vec!['1', '2']));
            assert_eq!(state.offset(), 4);
        });
    }

    #[test]
    fn test_separated_terminated_item_without_separator_commits() {
        with_state("1;2", |state| {
            let mut expected = state.new_expected_set();
            let parser = digit().separated_terminated(Equal::new(';'));
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 3);
        });
    }

    #[test]
    fn test_separated_opt_terminated_accepts_trailing_separator() {
        with_state("foo,foo,", |state| {
            let mut expected = state.new_expected_set();
            let parser = string("foo")
                .map(|cs| cs.into_iter().collect::<String>())
                .separated_opt_terminated(Equal::new(','));
            assert_eq!(
                parser.parse(state, &mut expected),
                Ok(vec!["foo".to_string(), "foo".to_string()])
            );
            // Cursor is at end of input, past the trailing separator.
            assert_eq!(state.offset(), 8);
            assert!(!state.has_current());
        });
    }

    #[test]
    fn test_separated_opt_terminated_without_trailing_separator() {
        with_state("foo,foo", |state| {
            let mut expected = state.new_expected_set();
            let parser = string("foo")
                .map(|cs| cs.into_iter().collect::<String>())
                .separated_opt_terminated(Equal::new(','));
            assert_eq!(
                parser.parse(state, &mut expected),
                Ok(vec!["foo".to_string(), "foo".to_string()])
            );
            assert_eq!(state.offset(), 7);
        });
    }

    #[test]
    fn test_separated_opt_terminated_committed_item_failure_propagates() {
        with_state("foo,fox", |state| {
            let mut expected = state.new_expected_set();
            let parser = string("foo")
                .map(|cs| cs.into_iter().collect::<String>())
                .separated_opt_terminated(Equal::new(','));
            // After the separator, the item consumed "fo" before failing.
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 6);
        });
    }

    #[derive(Default)]
    struct Sum {
        total: i64,
        errored: bool,
    }

    impl Chainer<i64> for Sum {
        type Output = i64;

        fn apply(&mut self, value: i64) {
            self.total += value;
        }

        fn finish(self) -> i64 {
            self.total
        }

        fn on_error(&mut self) {
            self.errored = true;
        }
    }

    #[test]
    fn test_chain1_folds_elements() {
        with_state("123x", |state| {
            let mut expected = state.new_expected_set();
            let element = Satisfy::new(|c: &char| c.to_digit(10).map(|d| d as i64));
            let parser = element.chain1(Sum::default);
            assert_eq!(parser.parse(state, &mut expected), Ok(6));
            assert_eq!(state.offset(), 3);
        });
    }

    #[test]
    fn test_chain1_requires_first_element() {
        with_state("x", |state| {
            let mut expected = state.new_expected_set();
            let element = Satisfy::new(|c: &char| c.to_digit(10).map(|d| d as i64));
            let parser = element.chain1(Sum::default);
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 0);
        });
    }
}
