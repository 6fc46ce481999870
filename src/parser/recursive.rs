//! # Recursive Grammars
//!
//! Grammars reference themselves; parser values cannot, without help. Two
//! helpers close the loop:
//!
//! * [`Lazy`] defers construction to a thunk invoked on every evaluation.
//!   Cheap to write, right for breaking a definition-order cycle between
//!   functions that build parsers.
//! * [`Recursive`] is a forward-declared handle: declare it, use clones of
//!   it inside a grammar, then [`define`](Recursive::define) it once. The
//!   definition is stored in a once-cell behind a shared handle, so the
//!   self-referential cycle lives as long as the grammar itself. The
//!   [`recursive`] fixed-point function wraps the declare/define dance for
//!   the common single-parser case.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::error::ExpectedSet;
use crate::parser::{BoxedParser, ParseResult, Parser};
use crate::state::ParseState;

/// Lazy: builds the inner parser from a thunk on every evaluation.
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        (self.f)().parse(state, expected)
    }
}

/// Recursive: a forward-declared parser handle for (mutually) recursive
/// grammars.
///
/// Evaluating a handle that was never defined is a usage bug and panics.
pub struct Recursive<I, O> {
    cell: Rc<OnceCell<BoxedParser<I, O>>>,
}

impl<I, O> Recursive<I, O> {
    /// Declare a handle to be defined later.
    pub fn declare() -> Self {
        Self {
            cell: Rc::new(OnceCell::new()),
        }
    }

    /// Supply the definition. Panics when called twice.
    pub fn define(&self, parser: impl Parser<I, O> + 'static) {
        if self.cell.set(BoxedParser::new(parser)).is_err() {
            panic!("recursive parser defined twice");
        }
    }
}

impl<I, O> Clone for Recursive<I, O> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<I, O> Parser<I, O> for Recursive<I, O> {
    fn parse(
        &self,
        state: &mut ParseState<'_, I>,
        expected: &mut ExpectedSet<I>,
    ) -> ParseResult<O> {
        self.cell
            .get()
            .expect("recursive parser evaluated before being defined")
            .parse(state, expected)
    }
}

/// Fixed-point construction: `recursive(|this| body)` builds a parser
/// whose body may reference itself through the `this` handle.
pub fn recursive<I, O, P, F>(f: F) -> Recursive<I, O>
where
    P: Parser<I, O> + 'static,
    F: FnOnce(Recursive<I, O>) -> P,
{
    let handle = Recursive::declare();
    let body = f(handle.clone());
    handle.define(body);
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;
    use crate::parser::ParserExt;
    use crate::parser::primitives::Equal;
    use crate::stream::SliceStream;

    fn with_state<R>(input: &str, f: impl FnOnce(&mut ParseState<'_, char>) -> R) -> R {
        let tokens: Vec<char> = input.chars().collect();
        let mut stream = SliceStream::new(&tokens);
        let mut state = ParseState::new(&mut stream, ParseConfig::text());
        f(&mut state)
    }

    #[test]
    fn test_lazy_defers_construction() {
        with_state("a", |state| {
            let mut expected = state.new_expected_set();
            let parser = Lazy::new(|| Equal::new('a'));
            assert_eq!(parser.parse(state, &mut expected), Ok('a'));
        });
    }

    #[test]
    fn test_recursive_nested_parens() {
        // nested ::= '(' nested ')' | 'x'
        let nested = recursive(|nested| {
            Equal::new('(')
                .then(nested)
                .before(Equal::new(')'))
                .or(Equal::new('x').to_unit())
        });
        with_state("((x))", |state| {
            let mut expected = state.new_expected_set();
            assert_eq!(nested.parse(state, &mut expected), Ok(()));
            assert_eq!(state.offset(), 5);
        });
    }

    #[test]
    fn test_declare_define_mutual_recursion() {
        // as ::= 'a' bs | 'a'  (via optional)
        // bs ::= 'b' as
        let as_parser: Recursive<char, usize> = Recursive::declare();
        let bs_parser: Recursive<char, usize> = Recursive::declare();
        bs_parser.define(Equal::new('b').then(as_parser.clone()).map(|n| n + 1));
        as_parser.define(
            Equal::new('a')
                .then(bs_parser.clone().attempt().optional())
                .map(|tail| tail.map_or(1, |n| n + 1)),
        );

        with_state("ababa", |state| {
            let mut expected = state.new_expected_set();
            assert_eq!(as_parser.parse(state, &mut expected), Ok(5));
            assert_eq!(state.offset(), 5);
        });
    }

    #[test]
    #[should_panic(expected = "evaluated before being defined")]
    fn test_undefined_recursive_panics() {
        let undefined: Recursive<char, ()> = Recursive::declare();
        with_state("x", |state| {
            let mut expected = state.new_expected_set();
            let _ = undefined.parse(state, &mut expected);
        });
    }
}
