//! # Driver
//!
//! The entry points that connect a parser value to an input source: build a
//! [`ParseState`] over the input's token stream, rent the top-level expected
//! accumulator, evaluate, and turn the outcome into a `Result`. Pooled
//! buffers are returned when the state and accumulator drop, on every exit
//! path including panics.

use tracing::debug;

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::state::ParseState;
use crate::stream::IntoTokenStream;

/// Run `parser` against `input` using the input's default configuration
/// (newline-aware for text inputs).
pub fn run<I, O, P, S>(parser: &P, input: S) -> Result<O, ParseError<I>>
where
    I: Clone + 'static,
    P: Parser<I, O> + ?Sized,
    S: IntoTokenStream<I>,
{
    run_with(parser, input, S::config_hint())
}

/// Run `parser` against `input` with an explicit configuration.
pub fn run_with<I, O, P, S>(parser: &P, input: S, config: ParseConfig<I>) -> Result<O, ParseError<I>>
where
    I: Clone + 'static,
    P: Parser<I, O> + ?Sized,
    S: IntoTokenStream<I>,
{
    let mut stream = input.into_token_stream();
    let mut state = ParseState::new(&mut stream, config);
    let mut expected = state.new_expected_set();
    match parser.parse(&mut state, &mut expected) {
        Ok(value) => Ok(value),
        Err(_) => {
            let error = state.build_error(&expected);
            debug!(
                target: "parser::driver",
                offset = error.offset,
                "parse failed"
            );
            Err(error)
        }
    }
}

/// Run `parser` against `input` and panic with the rendered error on
/// failure. The panicking counterpart of [`run`], for inputs that are
/// known-good by construction.
pub fn run_or_panic<I, O, P, S>(parser: &P, input: S) -> O
where
    I: Clone + std::fmt::Display + 'static,
    P: Parser<I, O> + ?Sized,
    S: IntoTokenStream<I>,
{
    match run(parser, input) {
        Ok(value) => value,
        Err(error) => panic!("{error}"),
    }
}
