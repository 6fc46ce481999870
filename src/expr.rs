//! # Expression Builder
//!
//! A thin layer over alternation and repetition that assembles an
//! expression parser from a term parser and a table of operator levels.
//! Levels are listed tightest-binding first; each level may hold prefix
//! and postfix operators plus infix operators of a single associativity.
//! Left-associative chains are folded through [`many`] without recursion,
//! so deep chains cost constant stack.

use std::rc::Rc;

use crate::parser::prelude::*;
use crate::parser::{BoxedParser, Parser, ParserExt};

/// A binary operator's semantic action.
pub type BinaryFn<O> = Rc<dyn Fn(O, O) -> O>;

/// A unary operator's semantic action.
pub type UnaryFn<O> = Rc<dyn Fn(O) -> O>;

/// One operator in a precedence level: the parser recognises the operator
/// token(s) and yields the action to apply.
pub enum Operator<I, O> {
    InfixLeft(BoxedParser<I, BinaryFn<O>>),
    InfixRight(BoxedParser<I, BinaryFn<O>>),
    Prefix(BoxedParser<I, UnaryFn<O>>),
    Postfix(BoxedParser<I, UnaryFn<O>>),
}

impl<I: 'static, O: 'static> Operator<I, O> {
    /// Left-associative infix operator recognised by `token`.
    pub fn infix_left<X: 'static, P>(token: P, apply: impl Fn(O, O) -> O + 'static) -> Self
    where
        P: Parser<I, X> + 'static,
    {
        let apply: BinaryFn<O> = Rc::new(apply);
        Operator::InfixLeft(token.map(move |_| Rc::clone(&apply)).boxed())
    }

    /// Right-associative infix operator recognised by `token`.
    pub fn infix_right<X: 'static, P>(token: P, apply: impl Fn(O, O) -> O + 'static) -> Self
    where
        P: Parser<I, X> + 'static,
    {
        let apply: BinaryFn<O> = Rc::new(apply);
        Operator::InfixRight(token.map(move |_| Rc::clone(&apply)).boxed())
    }

    /// Prefix operator recognised by `token`.
    pub fn prefix<X: 'static, P>(token: P, apply: impl Fn(O) -> O + 'static) -> Self
    where
        P: Parser<I, X> + 'static,
    {
        let apply: UnaryFn<O> = Rc::new(apply);
        Operator::Prefix(token.map(move |_| Rc::clone(&apply)).boxed())
    }

    /// Postfix operator recognised by `token`.
    pub fn postfix<X: 'static, P>(token: P, apply: impl Fn(O) -> O + 'static) -> Self
    where
        P: Parser<I, X> + 'static,
    {
        let apply: UnaryFn<O> = Rc::new(apply);
        Operator::Postfix(token.map(move |_| Rc::clone(&apply)).boxed())
    }
}

/// Build an expression parser from a term parser and operator levels,
/// tightest-binding level first.
///
/// Panics when one level mixes left- and right-associative infix
/// operators; that grammar has no single reading.
pub fn precedence<I, O>(
    term: BoxedParser<I, O>,
    levels: Vec<Vec<Operator<I, O>>>,
) -> BoxedParser<I, O>
where
    I: Clone + PartialEq + 'static,
    O: 'static,
{
    let mut current = term;
    for level in levels {
        current = build_level(current, level);
    }
    current
}

fn build_level<I, O>(operand: BoxedParser<I, O>, level: Vec<Operator<I, O>>) -> BoxedParser<I, O>
where
    I: Clone + PartialEq + 'static,
    O: 'static,
{
    let mut prefix = Vec::new();
    let mut postfix = Vec::new();
    let mut infix_left = Vec::new();
    let mut infix_right = Vec::new();
    for operator in level {
        match operator {
            Operator::Prefix(p) => prefix.push(p),
            Operator::Postfix(p) => postfix.push(p),
            Operator::InfixLeft(p) => infix_left.push(p),
            Operator::InfixRight(p) => infix_right.push(p),
        }
    }
    if !infix_left.is_empty() && !infix_right.is_empty() {
        panic!("a precedence level cannot mix left- and right-associative operators");
    }

    let operand = if prefix.is_empty() && postfix.is_empty() {
        operand
    } else {
        tuple3(many(choice(prefix)), operand, many(choice(postfix)))
            .map(|(prefixes, value, postfixes)| {
                let mut value = value;
                for apply in postfixes {
                    value = apply(value);
                }
                for apply in prefixes.into_iter().rev() {
                    value = apply(value);
                }
                value
            })
            .boxed()
    };

    if !infix_left.is_empty() {
        let tail = many(tuple2(choice(infix_left), operand.clone()));
        tuple2(operand, tail)
            .map(|(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (apply, right)| apply(left, right))
            })
            .boxed()
    } else if !infix_right.is_empty() {
        let tail = many(tuple2(choice(infix_right), operand.clone()));
        tuple2(operand, tail)
            .map(|(first, rest)| {
                let mut operands = vec![first];
                let mut applies = Vec::with_capacity(rest.len());
                for (apply, operand) in rest {
                    applies.push(apply);
                    operands.push(operand);
                }
                let mut value = operands.pop().expect("at least the first operand");
                while let Some(apply) = applies.pop() {
                    let left = operands.pop().expect("one operand per operator");
                    value = apply(left, value);
                }
                value
            })
            .boxed()
    } else {
        operand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::run;
    use crate::parser::recursive::recursive;
    use crate::text::{ch, decimal};

    fn arithmetic() -> BoxedParser<char, i64> {
        recursive(|expr| {
            let term = decimal()
                .boxed()
                .or(delimited(ch('('), expr, ch(')')))
                .boxed();
            precedence(
                term,
                vec![
                    vec![Operator::prefix(ch('-'), |v: i64| -v)],
                    vec![Operator::infix_right(ch('^'), |a: i64, b| {
                        a.pow(b as u32)
                    })],
                    vec![
                        Operator::infix_left(ch('*'), |a: i64, b| a * b),
                        Operator::infix_left(ch('/'), |a: i64, b| a / b),
                    ],
                    vec![
                        Operator::infix_left(ch('+'), |a: i64, b| a + b),
                        Operator::infix_left(ch('-'), |a: i64, b| a - b),
                    ],
                ],
            )
        })
        .boxed()
    }

    #[test]
    fn test_precedence_binds_tighter_levels_first() {
        assert_eq!(run(&arithmetic(), "1+2*3"), Ok(7));
        assert_eq!(run(&arithmetic(), "2*3+1"), Ok(7));
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(run(&arithmetic(), "2-3-4"), Ok(-5));
        assert_eq!(run(&arithmetic(), "100/5/2"), Ok(10));
    }

    #[test]
    fn test_right_associativity() {
        assert_eq!(run(&arithmetic(), "2^3^2"), Ok(512));
    }

    #[test]
    fn test_prefix_operator() {
        assert_eq!(run(&arithmetic(), "-3*2"), Ok(-6));
        assert_eq!(run(&arithmetic(), "4--3"), Ok(7));
    }

    #[test]
    fn test_parenthesised_terms() {
        assert_eq!(run(&arithmetic(), "(1+2)*3"), Ok(9));
    }

    #[test]
    fn test_postfix_operator() {
        let term = decimal().boxed();
        let parser = precedence(
            term,
            vec![vec![Operator::postfix(ch('!'), |v: i64| {
                (1..=v).product()
            })]],
        );
        assert_eq!(run(&parser, "4!"), Ok(24));
    }

    #[test]
    #[should_panic(expected = "cannot mix")]
    fn test_mixed_associativity_level_panics() {
        let term = decimal().boxed();
        let _ = precedence(
            term,
            vec![vec![
                Operator::infix_left(ch('+'), |a: i64, b| a + b),
                Operator::infix_right(ch('^'), |a: i64, b| a.pow(b as u32)),
            ]],
        );
    }
}
