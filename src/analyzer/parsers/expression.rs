//! Expression grammar: precedence climbing from `or` down to primaries.
//!
//! Levels, low to high: `or`; `and`; equality; relational; additive;
//! multiplicative; unary `-`/`not`; postfix indexing; primary.

use super::super::{core::Parser, prelude::*};
use super::*;
use crate::ast;
use crate::tokenizer::{keyword::Keyword, literal::Literal, symbol::Operator, token::TokenSpan};

pub fn parse_expression() -> impl Parser<TokenSpan, ast::Expression> {
    with_context(lazy(parse_logical_or), "expression")
}

fn binary_fold(
    first: ast::Expression,
    rest: Vec<((ast::BinaryOperator, usize), ast::Expression)>,
) -> ast::Expression {
    rest.into_iter()
        .fold(first, |left, ((op, line), right)| ast::Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            line,
        })
}

fn parse_logical_or() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_logical_and(),
            many(tuple2(parse_operator_or(), parse_logical_and())),
        ),
        |(first, rest)| binary_fold(first, rest),
    )
}

fn parse_logical_and() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_equality(),
            many(tuple2(parse_operator_and(), parse_equality())),
        ),
        |(first, rest)| binary_fold(first, rest),
    )
}

fn parse_equality() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_relational(),
            many(tuple2(parse_operator_equality(), parse_relational())),
        ),
        |(first, rest)| binary_fold(first, rest),
    )
}

fn parse_relational() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_additive(),
            many(tuple2(parse_operator_relational(), parse_additive())),
        ),
        |(first, rest)| binary_fold(first, rest),
    )
}

fn parse_additive() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_multiplicative(),
            many(tuple2(parse_operator_additive(), parse_multiplicative())),
        ),
        |(first, rest)| binary_fold(first, rest),
    )
}

fn parse_multiplicative() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_unary(),
            many(tuple2(parse_operator_multiplicative(), parse_unary())),
        ),
        |(first, rest)| binary_fold(first, rest),
    )
}

fn binary_op(
    operator: Operator,
    op: ast::BinaryOperator,
) -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    map(parse_operator(operator), move |line| (op, line))
}

fn parse_operator_or() -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    map(parse_keyword(Keyword::Or), |line| {
        (ast::BinaryOperator::Or, line)
    })
}

fn parse_operator_and() -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    map(parse_keyword(Keyword::And), |line| {
        (ast::BinaryOperator::And, line)
    })
}

fn parse_operator_equality() -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    choice(vec![
        Box::new(binary_op(Operator::EqualEqual, ast::BinaryOperator::Equal)),
        Box::new(binary_op(Operator::NotEqual, ast::BinaryOperator::NotEqual)),
    ])
}

fn parse_operator_relational() -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    choice(vec![
        Box::new(binary_op(Operator::LessEqual, ast::BinaryOperator::LessThanEqual)),
        Box::new(binary_op(
            Operator::GreaterEqual,
            ast::BinaryOperator::GreaterThanEqual,
        )),
        Box::new(binary_op(Operator::Less, ast::BinaryOperator::LessThan)),
        Box::new(binary_op(Operator::Greater, ast::BinaryOperator::GreaterThan)),
    ])
}

fn parse_operator_additive() -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    choice(vec![
        Box::new(binary_op(Operator::Plus, ast::BinaryOperator::Add)),
        Box::new(binary_op(Operator::Minus, ast::BinaryOperator::Subtract)),
    ])
}

fn parse_operator_multiplicative() -> impl Parser<TokenSpan, (ast::BinaryOperator, usize)> {
    choice(vec![
        Box::new(binary_op(Operator::Multiply, ast::BinaryOperator::Multiply)),
        Box::new(binary_op(Operator::Divide, ast::BinaryOperator::Divide)),
        Box::new(binary_op(Operator::Percent, ast::BinaryOperator::Modulo)),
    ])
}

/// `-` and `not` bind tighter than any binary operator and nest (`not not x`).
fn parse_unary() -> impl Parser<TokenSpan, ast::Expression> {
    choice(vec![
        Box::new(map(
            tuple2(parse_operator(Operator::Minus), lazy(parse_unary)),
            |(line, operand)| ast::Expression::Unary {
                op: ast::UnaryOperator::Minus,
                operand: Box::new(operand),
                line,
            },
        )),
        Box::new(map(
            tuple2(parse_keyword(Keyword::Not), lazy(parse_unary)),
            |(line, operand)| ast::Expression::Unary {
                op: ast::UnaryOperator::Not,
                operand: Box::new(operand),
                line,
            },
        )),
        Box::new(parse_postfix()),
    ])
}

/// A primary followed by any number of `[index]` suffixes.
fn parse_postfix() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(parse_primary(), many(parse_index_suffix())),
        |(target, suffixes)| {
            suffixes
                .into_iter()
                .fold(target, |target, (index, line)| ast::Expression::Index {
                    target: Box::new(target),
                    index: Box::new(index),
                    line,
                })
        },
    )
}

fn parse_index_suffix() -> impl Parser<TokenSpan, (ast::Expression, usize)> {
    map(
        tuple2(
            parse_open_bracket(),
            tuple2(lazy(parse_expression), as_unit(parse_close_bracket())),
        ),
        |(line, (index, _))| (index, line),
    )
}

fn parse_primary() -> impl Parser<TokenSpan, ast::Expression> {
    with_context(
        choice(vec![
            Box::new(parse_literal_expression()),
            Box::new(parse_list_literal()),
            Box::new(parse_call_expression()),
            Box::new(parse_special_var()),
            Box::new(parse_variable()),
            Box::new(parse_parenthesized()),
        ]),
        "primary expression",
    )
}

fn parse_literal_expression() -> impl Parser<TokenSpan, ast::Expression> {
    satisfy(
        |span: &TokenSpan| match &span.token {
            crate::tokenizer::token::Token::Literal(lit) => Some(ast::Expression::Literal(
                match lit {
                    Literal::String(s) => ast::Literal::String(s.clone()),
                    Literal::Integer(i) => ast::Literal::Integer(*i),
                    Literal::Float(x) => ast::Literal::Float(*x),
                    Literal::Boolean(b) => ast::Literal::Boolean(*b),
                    Literal::Null => ast::Literal::Null,
                },
            )),
            _ => None,
        },
        "literal",
    )
}

fn parse_list_literal() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_open_bracket(),
            tuple2(
                separated_list(lazy(parse_expression), as_unit(parse_comma())),
                as_unit(parse_close_bracket()),
            ),
        ),
        |(line, (items, _))| ast::Expression::List { items, line },
    )
}

/// `name(arg, ...)` — user function or built-in, resolved at evaluation time.
pub fn parse_call_expression() -> impl Parser<TokenSpan, ast::Expression> {
    map(
        tuple2(
            parse_identifier_spanned(),
            delimited(
                as_unit(parse_open_paren()),
                separated_list(lazy(parse_expression), as_unit(parse_comma())),
                as_unit(parse_close_paren()),
            ),
        ),
        |((name, line), args)| ast::Expression::Call { name, args, line },
    )
}

/// Engine-maintained names start with `_` and always read the global frame.
fn parse_special_var() -> impl Parser<TokenSpan, ast::Expression> {
    satisfy(
        |span: &TokenSpan| match &span.token {
            crate::tokenizer::token::Token::Identifier(name) if name.starts_with('_') => {
                Some(ast::Expression::SpecialVar {
                    name: name.clone(),
                    line: span.line,
                })
            }
            _ => None,
        },
        "special variable",
    )
}

fn parse_variable() -> impl Parser<TokenSpan, ast::Expression> {
    map(parse_identifier_spanned(), |(name, line)| {
        ast::Expression::Variable { name, line }
    })
}

fn parse_parenthesized() -> impl Parser<TokenSpan, ast::Expression> {
    delimited(
        as_unit(parse_open_paren()),
        lazy(parse_expression),
        as_unit(parse_close_paren()),
    )
}
