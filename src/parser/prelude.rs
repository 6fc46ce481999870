//! Free constructor functions for the primitives and combinators, for
//! grammars written in an applicative style.

use crate::error::Expected;
use crate::parser::combinators::*;
use crate::parser::primitives::*;
use crate::parser::repetition::*;
use crate::parser::{BoxedParser, Parser};

pub use crate::parser::recursive::{Lazy, Recursive, recursive};

pub fn pure<O: Clone>(value: O) -> Pure<O> {
    Pure::new(value)
}

pub fn fail(message: impl Into<String>) -> Fail {
    Fail::new(Some(message.into()))
}

pub fn equal<I: Clone + PartialEq>(value: I) -> Equal<I> {
    Equal::new(value)
}

pub fn satisfy<I: Clone, O, F>(f: F) -> Satisfy<F>
where
    F: Fn(&I) -> Option<O>,
{
    Satisfy::new(f)
}

pub fn any() -> Identity {
    Identity::new()
}

pub fn end() -> End {
    End::new()
}

pub fn literal<I: Clone + PartialEq>(tokens: Vec<I>) -> Literal<I> {
    Literal::new(tokens)
}

pub fn current_offset() -> CurrentOffset {
    CurrentOffset
}

pub fn current_pos() -> CurrentPos {
    CurrentPos
}

pub fn current_pos_delta() -> CurrentPosDelta {
    CurrentPosDelta
}

pub fn map<I, A, B, P, F>(parser: P, f: F) -> Map<P, F, A>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    Map::new(parser, f)
}

pub fn as_unit<I, O, P>(parser: P) -> AsUnit<P, O>
where
    P: Parser<I, O>,
{
    AsUnit::new(parser)
}

pub fn bind<I, A, P, F>(parser: P, f: F) -> Bind<P, F, A>
where
    P: Parser<I, A>,
{
    Bind::new(parser, f)
}

pub fn preceded<I, O1, O2, P1, P2>(first: P1, second: P2) -> Preceded<P1, P2, O1>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    Preceded::new(first, second)
}

pub fn terminated<I, O1, O2, P1, P2>(first: P1, second: P2) -> Terminated<P1, P2, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    Terminated::new(first, second)
}

pub fn delimited<I, O, OL, OR, L, P, R>(left: L, parser: P, right: R) -> Delimited<L, P, R, OL, OR>
where
    L: Parser<I, OL>,
    P: Parser<I, O>,
    R: Parser<I, OR>,
{
    Delimited::new(left, parser, right)
}

pub fn tuple2<P1, P2>(first: P1, second: P2) -> Tuple2<P1, P2> {
    Tuple2::new(first, second)
}

pub fn tuple3<P1, P2, P3>(first: P1, second: P2, third: P3) -> Tuple3<P1, P2, P3> {
    Tuple3::new(first, second, third)
}

pub fn tuple4<P1, P2, P3, P4>(
    first: P1,
    second: P2,
    third: P3,
    fourth: P4,
) -> Tuple4<P1, P2, P3, P4> {
    Tuple4::new(first, second, third, fourth)
}

pub fn choice<I, O>(parsers: Vec<BoxedParser<I, O>>) -> Choice<I, O> {
    Choice::new(parsers)
}

pub fn attempt<P>(parser: P) -> Attempt<P> {
    Attempt::new(parser)
}

pub fn look_ahead<P>(parser: P) -> LookAhead<P> {
    LookAhead::new(parser)
}

pub fn not<I, O, P>(parser: P) -> Not<P, O>
where
    P: Parser<I, O>,
{
    Not::new(parser)
}

pub fn labelled<I, O, P>(parser: P, label: impl Into<String>) -> Labelled<P, I>
where
    P: Parser<I, O>,
{
    Labelled::new(parser, vec![Expected::Label(label.into())])
}

pub fn with_expected<I, O, P>(parser: P, expected: Vec<Expected<I>>) -> Labelled<P, I>
where
    P: Parser<I, O>,
{
    Labelled::new(parser, expected)
}

pub fn optional<P>(parser: P) -> Optional<P> {
    Optional::new(parser)
}

pub fn recover_with<P, F>(parser: P, handler: F) -> Recover<P, F> {
    Recover::new(parser, handler)
}

pub fn many<P>(parser: P) -> Many<P> {
    Many::new(parser)
}

pub fn many1<P>(parser: P) -> Many1<P> {
    Many1::new(parser)
}

pub fn repeat<P>(parser: P, count: usize) -> Repeat<P> {
    Repeat::new(parser, count)
}

pub fn separated_list<I, O, OS, P, S>(item: P, separator: S) -> SeparatedList<P, S, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    SeparatedList::new(item, separator)
}

pub fn separated_list1<I, O, OS, P, S>(item: P, separator: S) -> SeparatedList1<P, S, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    SeparatedList1::new(item, separator)
}

pub fn separated_terminated<I, O, OS, P, S>(item: P, separator: S) -> SeparatedTerminated<P, S, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    SeparatedTerminated::new(item, separator)
}

pub fn separated_opt_terminated<I, O, OS, P, S>(
    item: P,
    separator: S,
) -> SeparatedOptTerminated<P, S, OS>
where
    P: Parser<I, O>,
    S: Parser<I, OS>,
{
    SeparatedOptTerminated::new(item, separator)
}

pub fn chain1<I, O, C, P, F>(parser: P, make_chainer: F) -> Chain1<P, F, O>
where
    P: Parser<I, O>,
    F: Fn() -> C,
    C: Chainer<O>,
{
    Chain1::new(parser, make_chainer)
}

pub fn lazy<F>(f: F) -> Lazy<F> {
    Lazy::new(f)
}
