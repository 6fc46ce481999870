//! # Permutation Phrases
//!
//! Parsers for a fixed set of components appearing exactly once each, in
//! any order — attribute lists, option bags, and similar phrases. Built
//! entirely from [`attempt`], alternation, and mapping: each alternative
//! commits to whichever component matches first, then permutes the rest.
//!
//! The `*_opt` variants allow components to be missing, substituting a
//! default.

use crate::parser::prelude::*;
use crate::parser::{BoxedParser, ParserExt};

/// Two components in either order.
pub fn permutation2<I, A, B>(a: BoxedParser<I, A>, b: BoxedParser<I, B>) -> BoxedParser<I, (A, B)>
where
    I: Clone + PartialEq + 'static,
    A: 'static,
    B: 'static,
{
    choice(vec![
        tuple2(a.clone().attempt(), b.clone()).boxed(),
        tuple2(b.attempt(), a).map(|(b, a)| (a, b)).boxed(),
    ])
    .boxed()
}

/// Three components in any order.
pub fn permutation3<I, A, B, C>(
    a: BoxedParser<I, A>,
    b: BoxedParser<I, B>,
    c: BoxedParser<I, C>,
) -> BoxedParser<I, (A, B, C)>
where
    I: Clone + PartialEq + 'static,
    A: 'static,
    B: 'static,
    C: 'static,
{
    let rest_bc = permutation2(b.clone(), c.clone());
    let rest_ac = permutation2(a.clone(), c.clone());
    let rest_ab = permutation2(a.clone(), b.clone());
    choice(vec![
        tuple2(a.attempt(), rest_bc)
            .map(|(a, (b, c))| (a, b, c))
            .boxed(),
        tuple2(b.attempt(), rest_ac)
            .map(|(b, (a, c))| (a, b, c))
            .boxed(),
        tuple2(c.attempt(), rest_ab)
            .map(|(c, (a, b))| (a, b, c))
            .boxed(),
    ])
    .boxed()
}

/// Two optional components in either order; missing components take their
/// default.
pub fn permutation2_opt<I, A, B>(
    a: BoxedParser<I, A>,
    a_default: A,
    b: BoxedParser<I, B>,
    b_default: B,
) -> BoxedParser<I, (A, B)>
where
    I: Clone + PartialEq + 'static,
    A: Clone + 'static,
    B: Clone + 'static,
{
    let (a_first_default, b_first_default) = (a_default.clone(), b_default.clone());
    choice(vec![
        tuple2(a.clone().attempt(), b.clone().attempt().optional())
            .map(move |(a, b)| (a, b.unwrap_or_else(|| b_first_default.clone())))
            .boxed(),
        tuple2(b.attempt(), a.attempt().optional())
            .map(move |(b, a)| (a.unwrap_or_else(|| a_first_default.clone()), b))
            .boxed(),
        {
            let base: BoxedParser<I, ()> = pure(()).boxed();
            base.map(move |_| (a_default.clone(), b_default.clone()))
                .boxed()
        },
    ])
    .boxed()
}

/// Three optional components in any order; missing components take their
/// default.
pub fn permutation3_opt<I, A, B, C>(
    a: BoxedParser<I, A>,
    a_default: A,
    b: BoxedParser<I, B>,
    b_default: B,
    c: BoxedParser<I, C>,
    c_default: C,
) -> BoxedParser<I, (A, B, C)>
where
    I: Clone + PartialEq + 'static,
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    let rest_bc = permutation2_opt(b.clone(), b_default.clone(), c.clone(), c_default.clone());
    let rest_ac = permutation2_opt(a.clone(), a_default.clone(), c.clone(), c_default.clone());
    let rest_ab = permutation2_opt(a.clone(), a_default.clone(), b.clone(), b_default.clone());
    choice(vec![
        tuple2(a.attempt(), rest_bc)
            .map(|(a, (b, c))| (a, b, c))
            .boxed(),
        tuple2(b.attempt(), rest_ac)
            .map(|(b, (a, c))| (a, b, c))
            .boxed(),
        tuple2(c.attempt(), rest_ab)
            .map(|(c, (a, b))| (a, b, c))
            .boxed(),
        {
            let base: BoxedParser<I, ()> = pure(()).boxed();
            base.map(move |_| (a_default.clone(), b_default.clone(), c_default.clone()))
                .boxed()
        },
    ])
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::run;
    use crate::text::ch;

    fn letter(c: char) -> BoxedParser<char, char> {
        ch(c).boxed()
    }

    #[test]
    fn test_permutation2_both_orders() {
        let parser = permutation2(letter('a'), letter('b'));
        assert_eq!(run(&parser, "ab"), Ok(('a', 'b')));
        assert_eq!(run(&parser, "ba"), Ok(('a', 'b')));
    }

    #[test]
    fn test_permutation2_missing_component_fails() {
        let parser = permutation2(letter('a'), letter('b'));
        assert!(run(&parser, "a").is_err());
        assert!(run(&parser, "bb").is_err());
    }

    #[test]
    fn test_permutation3_all_orders() {
        let parser = permutation3(letter('a'), letter('b'), letter('c'));
        for input in ["abc", "acb", "bac", "bca", "cab", "cba"] {
            assert_eq!(run(&parser, input), Ok(('a', 'b', 'c')), "input = {input}");
        }
    }

    #[test]
    fn test_permutation2_opt_defaults() {
        let parser = permutation2_opt(letter('a'), '_', letter('b'), '_');
        assert_eq!(run(&parser, "ab"), Ok(('a', 'b')));
        assert_eq!(run(&parser, "b"), Ok(('_', 'b')));
        assert_eq!(run(&parser, "a"), Ok(('a', '_')));
        assert_eq!(run(&parser, ""), Ok(('_', '_')));
    }

    #[test]
    fn test_permutation3_opt_partial() {
        let parser = permutation3_opt(letter('x'), '_', letter('y'), '_', letter('z'), '_');
        assert_eq!(run(&parser, "zy"), Ok(('_', 'y', 'z')));
        assert_eq!(run(&parser, "xyz"), Ok(('x', 'y', 'z')));
        assert_eq!(run(&parser, ""), Ok(('_', '_', '_')));
    }
}
