//! # Primitive Parsers
//!
//! The token-level building blocks every grammar bottoms out in. Each
//! primitive documents two things precisely: what it consumes, and what it
//! writes to the error slot and expected accumulator when it fails, because
//! alternation's committed/uncommitted discipline is built on those
//! guarantees.

use crate::error::{Expected, ExpectedSet};
use crate::parser::{Failure, ParseResult, Parser};
use crate::position::{SourcePos, SourcePosDelta};
use crate::state::ParseState;

/// Pure: always succeeds with a clone of its value, consuming nothing and
/// contributing no expectations.
#[derive(Debug, Clone)]
pub struct Pure<O> {
    value: O,
}

impl<O> Pure<O> {
    pub fn new(value: O) -> Self {
        Self { value }
    }
}

impl<I: Clone, O: Clone> Parser<I, O> for Pure<O> {
    fn parse(
        &self,
        _state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        Ok(self.value.clone())
    }
}

/// Fail: always fails at the current position with an optional message,
/// consuming nothing and contributing no expectations.
#[derive(Debug, Clone)]
pub struct Fail {
    message: Option<String>,
}

impl Fail {
    pub fn new(message: Option<String>) -> Self {
        Self { message }
    }
}

impl<I: Clone, O> Parser<I, O> for Fail {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let unexpected = state.current().cloned();
        let eof = unexpected.is_none();
        let offset = state.offset();
        state.set_error(unexpected, eof, offset, self.message.clone());
        Err(Failure)
    }
}

/// Equal: matches one token equal to the configured value.
///
/// On success advances one token and yields it. On mismatch or end of
/// input, fails at the current offset contributing the value as a
/// single-token literal expectation.
#[derive(Debug, Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq> Parser<I, I> for Equal<I> {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<I> {
        match state.current().cloned() {
            Some(found) if found == self.value => {
                state.advance();
                Ok(found)
            }
            found => {
                let eof = found.is_none();
                let offset = state.offset();
                expected.add(Expected::Literal(vec![self.value.clone()]));
                state.set_error(found, eof, offset, None);
                Err(Failure)
            }
        }
    }
}

/// Satisfy: matches one token accepted by a predicate that doubles as a
/// projection, following the shape `Fn(&I) -> Option<O>`.
///
/// Contributes no expectation of its own; attach one with
/// [`labelled`](crate::parser::ParserExt::labelled).
#[derive(Debug, Clone)]
pub struct Satisfy<F> {
    f: F,
}

impl<F> Satisfy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I: Clone, O, F> Parser<I, O> for Satisfy<F>
where
    F: Fn(&I) -> Option<O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        let projected = state.current().and_then(|token| (self.f)(token));
        match projected {
            Some(value) => {
                state.advance();
                Ok(value)
            }
            None => {
                let unexpected = state.current().cloned();
                let eof = unexpected.is_none();
                let offset = state.offset();
                state.set_error(unexpected, eof, offset, None);
                Err(Failure)
            }
        }
    }
}

/// Identity: consumes and yields the current token, whatever it is; fails
/// only at end of input.
#[derive(Debug, Clone, Default)]
pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Self
    }
}

impl<I: Clone> Parser<I, I> for Identity {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<I> {
        match state.current().cloned() {
            Some(token) => {
                state.advance();
                Ok(token)
            }
            None => {
                let offset = state.offset();
                state.set_error(None, true, offset, None);
                Err(Failure)
            }
        }
    }
}

/// End: succeeds with `()` at end of input, consuming nothing; otherwise
/// fails at the current offset contributing the end-of-input expectation.
#[derive(Debug, Clone, Default)]
pub struct End;

impl End {
    pub fn new() -> Self {
        Self
    }
}

impl<I: Clone + PartialEq> Parser<I, ()> for End {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<()> {
        match state.current().cloned() {
            None => Ok(()),
            found => {
                let offset = state.offset();
                expected.add(Expected::EndOfInput);
                state.set_error(found, false, offset, None);
                Err(Failure)
            }
        }
    }
}

/// Literal: matches a fixed run of tokens in order.
///
/// On success advances over the whole run and yields it. On a mismatch at
/// position `i` of the run, the cursor is left `i` tokens past the start
/// (a committed failure when `i > 0`), the error points at the offending
/// token, and the whole run is contributed as the expectation. Input
/// ending mid-run fails the same way with the EOF flag set.
#[derive(Debug, Clone)]
pub struct Literal<I> {
    tokens: Vec<I>,
}

impl<I> Literal<I> {
    pub fn new(tokens: Vec<I>) -> Self {
        Self { tokens }
    }
}

impl<I: Clone + PartialEq> Parser<I, Vec<I>> for Literal<I> {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<Vec<I>> {
        let length = self.tokens.len();
        let (matched, failure) = {
            let window = state.look_ahead(length);
            match window
                .iter()
                .zip(&self.tokens)
                .position(|(found, wanted)| found != wanted)
            {
                Some(i) => (i, Some((Some(window[i].clone()), false))),
                None if window.len() < length => (window.len(), Some((None, true))),
                None => (length, None),
            }
        };
        match failure {
            None => {
                state.advance_by(length);
                Ok(self.tokens.clone())
            }
            Some((unexpected, eof)) => {
                state.advance_by(matched);
                let offset = state.offset();
                expected.add(Expected::Literal(self.tokens.clone()));
                state.set_error(unexpected, eof, offset, None);
                Err(Failure)
            }
        }
    }
}

/// CurrentOffset: yields the absolute token offset, consuming nothing.
#[derive(Debug, Clone, Default)]
pub struct CurrentOffset;

impl<I: Clone> Parser<I, usize> for CurrentOffset {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<usize> {
        Ok(state.offset())
    }
}

/// CurrentPos: yields the line/column of the cursor, consuming nothing.
#[derive(Debug, Clone, Default)]
pub struct CurrentPos;

impl<I: Clone> Parser<I, SourcePos> for CurrentPos {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<SourcePos> {
        Ok(state.current_pos())
    }
}

/// CurrentPosDelta: yields the position delta from the input start,
/// consuming nothing.
#[derive(Debug, Clone, Default)]
pub struct CurrentPosDelta;

impl<I: Clone> Parser<I, SourcePosDelta> for CurrentPosDelta {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        _expected: &mut ExpectedSet<I>,
    ) -> ParseResult<SourcePosDelta> {
        Ok(state.compute_source_pos_delta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;
    use crate::stream::SliceStream;

    fn with_state<R>(input: &str, f: impl FnOnce(&mut ParseState<'_, char>) -> R) -> R {
        let tokens: Vec<char> = input.chars().collect();
        let mut stream = SliceStream::new(&tokens);
        let mut state = ParseState::new(&mut stream, ParseConfig::text());
        f(&mut state)
    }

    #[test]
    fn test_pure_consumes_nothing() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            let parser = Pure::new(42);
            assert_eq!(parser.parse(state, &mut expected), Ok(42));
            assert_eq!(state.offset(), 0);
            assert!(expected.is_empty());
        });
    }

    #[test]
    fn test_fail_sets_message() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            let parser = Fail::new(Some("boom".into()));
            let result: ParseResult<char> = parser.parse(state, &mut expected);
            assert_eq!(result, Err(Failure));
            assert_eq!(state.offset(), 0);
            let error = state.error().expect("error slot");
            assert_eq!(error.message.as_deref(), Some("boom"));
            assert_eq!(error.unexpected, Some('a'));
        });
    }

    #[test]
    fn test_equal_matches_and_advances() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            assert_eq!(Equal::new('a').parse(state, &mut expected), Ok('a'));
            assert_eq!(state.offset(), 1);
        });
    }

    #[test]
    fn test_equal_mismatch_is_uncommitted() {
        with_state("abc", |state| {
            let mut expected = state.new_expected_set();
            let result = Equal::new('x').parse(state, &mut expected);
            assert_eq!(result, Err(Failure));
            assert_eq!(state.offset(), 0);
            assert_eq!(expected.as_slice(), &[Expected::Literal(vec!['x'])]);
            let error = state.error().expect("error slot");
            assert_eq!(error.offset, 0);
            assert_eq!(error.unexpected, Some('a'));
            assert!(!error.eof);
        });
    }

    #[test]
    fn test_equal_at_eof() {
        with_state("", |state| {
            let mut expected = state.new_expected_set();
            let result = Equal::new('x').parse(state, &mut expected);
            assert_eq!(result, Err(Failure));
            let error = state.error().expect("error slot");
            assert!(error.eof);
            assert_eq!(error.unexpected, None);
        });
    }

    #[test]
    fn test_satisfy_projects() {
        with_state("7a", |state| {
            let mut expected = state.new_expected_set();
            let digit = Satisfy::new(|c: &char| c.to_digit(10));
            assert_eq!(digit.parse(state, &mut expected), Ok(7));
            assert_eq!(digit.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 1);
            // Satisfy leaves labelling to the caller.
            assert!(expected.is_empty());
        });
    }

    #[test]
    fn test_satisfy_at_eof() {
        with_state("", |state| {
            let mut expected = state.new_expected_set();
            let any_digit = Satisfy::new(|c: &char| c.to_digit(10));
            assert_eq!(any_digit.parse(state, &mut expected), Err(Failure));
            assert!(state.error().expect("error slot").eof);
        });
    }

    #[test]
    fn test_identity_consumes_any_token() {
        with_state("xy", |state| {
            let mut expected = state.new_expected_set();
            assert_eq!(Identity::new().parse(state, &mut expected), Ok('x'));
            assert_eq!(Identity::new().parse(state, &mut expected), Ok('y'));
            let at_eof: ParseResult<char> = Identity::new().parse(state, &mut expected);
            assert_eq!(at_eof, Err(Failure));
            assert!(state.error().expect("error slot").eof);
        });
    }

    #[test]
    fn test_end_succeeds_only_at_eof() {
        with_state("", |state| {
            let mut expected = state.new_expected_set();
            assert_eq!(End::new().parse(state, &mut expected), Ok(()));
        });
        with_state("x", |state| {
            let mut expected = state.new_expected_set();
            assert_eq!(End::new().parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 0);
            assert_eq!(expected.as_slice(), &[Expected::EndOfInput]);
            let error = state.error().expect("error slot");
            assert_eq!(error.unexpected, Some('x'));
        });
    }

    #[test]
    fn test_literal_full_match() {
        with_state("abcd", |state| {
            let mut expected = state.new_expected_set();
            let parser = Literal::new(vec!['a', 'b', 'c']);
            assert_eq!(parser.parse(state, &mut expected), Ok(vec!['a', 'b', 'c']));
            assert_eq!(state.offset(), 3);
        });
    }

    #[test]
    fn test_literal_mismatch_commits_consumed_prefix() {
        with_state("abx", |state| {
            let mut expected = state.new_expected_set();
            let parser = Literal::new(vec!['a', 'b', 'c']);
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            // Two tokens matched before the mismatch; the failure is
            // committed.
            assert_eq!(state.offset(), 2);
            let error = state.error().expect("error slot");
            assert_eq!(error.offset, 2);
            assert_eq!(error.unexpected, Some('x'));
            assert_eq!(
                expected.as_slice(),
                &[Expected::Literal(vec!['a', 'b', 'c'])]
            );
        });
    }

    #[test]
    fn test_literal_truncated_input_sets_eof() {
        with_state("ab", |state| {
            let mut expected = state.new_expected_set();
            let parser = Literal::new(vec!['a', 'b', 'c']);
            assert_eq!(parser.parse(state, &mut expected), Err(Failure));
            assert_eq!(state.offset(), 2);
            let error = state.error().expect("error slot");
            assert!(error.eof);
            assert_eq!(error.unexpected, None);
        });
    }

    #[test]
    fn test_current_offset_and_pos() {
        with_state("a\nbc", |state| {
            let mut expected = state.new_expected_set();
            state.advance_by(2);
            assert_eq!(CurrentOffset.parse(state, &mut expected), Ok(2));
            assert_eq!(
                CurrentPos.parse(state, &mut expected),
                Ok(SourcePos { line: 2, col: 1 })
            );
            assert_eq!(
                CurrentPosDelta.parse(state, &mut expected),
                Ok(SourcePosDelta::new(1, 0))
            );
            assert_eq!(state.offset(), 2);
        });
    }
}
