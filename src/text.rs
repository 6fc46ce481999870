//! # Text Helpers
//!
//! Character-level conveniences composed entirely from the primitives and
//! combinators: single characters and classes, strings, whitespace and
//! end-of-line handling, signed numbers (folded in constant space through
//! [`Chainer`]), line comments, and a [`strum`]-driven matcher that turns
//! an enum's variants into an alternation.

use std::cmp::Reverse;

use crate::error::ExpectedSet;
use crate::parser::combinators::Choice;
use crate::parser::prelude::*;
use crate::parser::repetition::Chainer;
use crate::parser::{ParseResult, Parser, ParserExt};
use crate::state::ParseState;

/// Any single character.
pub fn any_char() -> impl Parser<char, char> {
    any()
}

/// One specific character.
pub fn ch(c: char) -> impl Parser<char, char> {
    equal(c)
}

/// An ASCII digit, yielded as the character itself.
pub fn digit() -> impl Parser<char, char> {
    satisfy(|c: &char| if c.is_ascii_digit() { Some(*c) } else { None }).labelled("digit")
}

/// An alphabetic character.
pub fn letter() -> impl Parser<char, char> {
    satisfy(|c: &char| if c.is_alphabetic() { Some(*c) } else { None }).labelled("letter")
}

/// A letter or digit.
pub fn alphanumeric() -> impl Parser<char, char> {
    satisfy(|c: &char| if c.is_alphanumeric() { Some(*c) } else { None })
        .labelled("letter or digit")
}

/// A single whitespace character.
pub fn whitespace() -> impl Parser<char, char> {
    satisfy(|c: &char| if c.is_whitespace() { Some(*c) } else { None }).labelled("whitespace")
}

fn consume_whitespace_run(
    state: &mut ParseState<'_, char>,
    _expected: &mut ExpectedSet<char>,
) -> ParseResult<()> {
    while state.current().is_some_and(|c| c.is_whitespace()) {
        state.advance();
    }
    Ok(())
}

/// Consume a maximal (possibly empty) run of whitespace. Never fails.
pub fn skip_whitespaces() -> impl Parser<char, ()> {
    consume_whitespace_run
}

/// An exact string, yielded as an owned `String`.
pub fn string(s: &str) -> impl Parser<char, String> + use<> {
    literal(s.chars().collect::<Vec<char>>()).map(|tokens| tokens.into_iter().collect())
}

/// A bare `\n`.
pub fn newline() -> impl Parser<char, ()> {
    ch('\n').to_unit()
}

/// `\r\n` or `\n`.
pub fn end_of_line() -> impl Parser<char, ()> {
    string("\r\n")
        .to_unit()
        .attempt()
        .or(newline())
        .labelled("end of line")
}

fn consume_rest_of_line(
    state: &mut ParseState<'_, char>,
    _expected: &mut ExpectedSet<char>,
) -> ParseResult<()> {
    while state.current().is_some_and(|c| *c != '\n') {
        state.advance();
    }
    if state.current().is_some() {
        state.advance();
    }
    Ok(())
}

/// A line comment: the prefix, then everything up to and including the end
/// of the line (or the end of input).
pub fn line_comment(prefix: &str) -> impl Parser<char, ()> + use<> {
    string(prefix).then(consume_rest_of_line)
}

#[derive(Default)]
struct DecimalAccumulator {
    value: i64,
}

impl Chainer<i64> for DecimalAccumulator {
    type Output = i64;

    fn apply(&mut self, digit: i64) {
        self.value = self.value.saturating_mul(10).saturating_add(digit);
    }

    fn finish(self) -> i64 {
        self.value
    }
}

#[derive(Default)]
struct MantissaAccumulator {
    value: f64,
}

impl Chainer<f64> for MantissaAccumulator {
    type Output = f64;

    fn apply(&mut self, digit: f64) {
        self.value = self.value * 10.0 + digit;
    }

    fn finish(self) -> f64 {
        self.value
    }
}

struct FractionAccumulator {
    value: f64,
    scale: f64,
}

impl Default for FractionAccumulator {
    fn default() -> Self {
        Self {
            value: 0.0,
            scale: 0.1,
        }
    }
}

impl Chainer<f64> for FractionAccumulator {
    type Output = f64;

    fn apply(&mut self, digit: f64) {
        self.value += digit * self.scale;
        self.scale /= 10.0;
    }

    fn finish(self) -> f64 {
        self.value
    }
}

fn sign() -> impl Parser<char, char> {
    ch('-').or(ch('+'))
}

fn digit_values() -> impl Parser<char, i64> {
    chain1(
        satisfy(|c: &char| c.to_digit(10).map(i64::from)),
        DecimalAccumulator::default,
    )
    .labelled("digit")
}

/// A signed decimal integer, folded digit by digit without an intermediate
/// collection. Saturates at the `i64` range.
pub fn decimal() -> impl Parser<char, i64> {
    tuple2(optional(sign()), digit_values()).map(|(sign, magnitude)| match sign {
        Some('-') => -magnitude,
        _ => magnitude,
    })
}

/// A signed real number: digits, an optional `.` fraction, an optional
/// `e`/`E` exponent.
///
/// A `.` or exponent marker not followed by digits is left unconsumed, so
/// `"3.x"` parses as `3` with the cursor on the `.`.
pub fn real() -> impl Parser<char, f64> {
    let fraction_digits = || {
        chain1(
            satisfy(|c: &char| c.to_digit(10).map(f64::from)),
            FractionAccumulator::default,
        )
        .labelled("digit")
    };
    let mantissa_digits = || {
        chain1(
            satisfy(|c: &char| c.to_digit(10).map(f64::from)),
            MantissaAccumulator::default,
        )
        .labelled("digit")
    };
    let fraction = preceded(ch('.'), fraction_digits()).attempt();
    let exponent = preceded(ch('e').or(ch('E')), decimal()).attempt();
    tuple4(
        optional(sign()),
        mantissa_digits(),
        optional(fraction),
        optional(exponent),
    )
    .map(|(sign, integer, fraction, exponent)| {
        let mut value = integer + fraction.unwrap_or(0.0);
        if let Some(exp) = exponent {
            value *= 10f64.powi(exp.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        }
        if sign == Some('-') { -value } else { value }
    })
}

/// An alternation over every variant of a [`strum`]-enumerable enum,
/// matching each variant's display form. Longer spellings are tried first
/// so that one variant being a prefix of another cannot shadow it.
pub fn from_enum<E>() -> Choice<char, E>
where
    E: strum::IntoEnumIterator + std::fmt::Display + Clone + 'static,
{
    let mut variants: Vec<E> = E::iter().collect();
    variants.sort_by_key(|variant| Reverse(variant.to_string().len()));
    let branches = variants
        .into_iter()
        .map(|variant| {
            let tokens: Vec<char> = variant.to_string().chars().collect();
            literal(tokens)
                .attempt()
                .map(move |_| variant.clone())
                .boxed()
        })
        .collect();
    Choice::new(branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::run;
    use crate::error::Expected;

    #[test]
    fn test_digit_and_letter() {
        assert_eq!(run(&digit(), "7"), Ok('7'));
        assert_eq!(run(&letter(), "k"), Ok('k'));
        let error = run(&digit(), "x").unwrap_err();
        assert_eq!(error.expected, vec![Expected::Label("digit".into())]);
    }

    #[test]
    fn test_string_yields_owned() {
        let parser = string("let");
        assert_eq!(run(&parser, "let x"), Ok("let".to_string()));
    }

    #[test]
    fn test_skip_whitespaces_maximal_run() {
        // The skipper consumes the same run wherever it starts relative to
        // any internal scanning granularity.
        for pad in 0..17 {
            let input = format!("{}x", " \t\n".repeat(pad));
            let parser = skip_whitespaces().then(ch('x'));
            assert_eq!(run(&parser, input.as_str()), Ok('x'), "pad = {pad}");
        }
    }

    #[test]
    fn test_skip_whitespaces_never_fails() {
        let parser = skip_whitespaces().then(end());
        assert_eq!(run(&parser, ""), Ok(()));
        assert_eq!(run(&parser, "   "), Ok(()));
    }

    #[test]
    fn test_end_of_line_accepts_both_conventions() {
        assert_eq!(run(&end_of_line(), "\n"), Ok(()));
        assert_eq!(run(&end_of_line(), "\r\n"), Ok(()));
        // A bare \r is not a line ending; the \r\n branch backs out
        // cleanly.
        assert!(run(&end_of_line(), "\rx").is_err());
    }

    #[test]
    fn test_decimal_signed() {
        assert_eq!(run(&decimal().before(end()), "-42"), Ok(-42));
        assert_eq!(run(&decimal(), "+7"), Ok(7));
        assert_eq!(run(&decimal(), "1234"), Ok(1234));
    }

    #[test]
    fn test_decimal_requires_digits() {
        let error = run(&decimal(), "-x").unwrap_err();
        assert_eq!(error.offset, 1);
        assert_eq!(error.expected, vec![Expected::Label("digit".into())]);
    }

    #[test]
    fn test_real_forms() {
        let close = |result: Result<f64, _>, want: f64| {
            let got = result.expect("parse succeeds");
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        };
        close(run(&real(), "3.25"), 3.25);
        close(run(&real(), "-1.5e3"), -1500.0);
        close(run(&real(), "2E-2"), 0.02);
        close(run(&real(), "42"), 42.0);
    }

    #[test]
    fn test_real_leaves_bare_dot_unconsumed() {
        let parser = real().before(ch('.'));
        let got = run(&parser, "3.").expect("parse succeeds");
        assert!((got - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_comment_consumes_through_eol() {
        let parser = line_comment("//").then(ch('x'));
        assert_eq!(run(&parser, "// hello\nx"), Ok('x'));
        // At end of input the comment just ends.
        assert_eq!(run(&line_comment("//"), "// tail"), Ok(()));
    }

    #[derive(Debug, Clone, PartialEq, strum::Display, strum::EnumIter)]
    #[strum(serialize_all = "lowercase")]
    enum Direction {
        North,
        NorthEast,
        South,
    }

    #[test]
    fn test_from_enum_matches_variants() {
        let parser = from_enum::<Direction>();
        assert_eq!(run(&parser, "south"), Ok(Direction::South));
    }

    #[test]
    fn test_from_enum_prefers_longest_spelling() {
        let parser = from_enum::<Direction>();
        assert_eq!(run(&parser, "northeast"), Ok(Direction::NorthEast));
        assert_eq!(
            run(&parser.before(end()), "north"),
            Ok(Direction::North)
        );
    }
}
