//! Statement and block grammar.

use super::super::{core::Parser, prelude::*};
use super::expression::{parse_call_expression, parse_expression};
use super::*;
use crate::ast;
use crate::tokenizer::{keyword::Keyword, token::TokenSpan};

/// `{ stmt* }`.
pub fn parse_block() -> impl Parser<TokenSpan, ast::Block> {
    with_context(
        map(
            delimited(
                as_unit(parse_open_brace()),
                many(parse_statement()),
                as_unit(parse_close_brace()),
            ),
            |statements| ast::Block { statements },
        ),
        "block",
    )
}

pub fn parse_statement() -> impl Parser<TokenSpan, ast::Statement> {
    with_context(
        lazy(|| {
            choice(vec![
                Box::new(parse_say()),
                Box::new(parse_ask()),
                Box::new(parse_set()),
                Box::new(parse_goto()),
                Box::new(parse_call()),
                Box::new(parse_return()),
                Box::new(parse_if()),
                Box::new(parse_while()),
                Box::new(parse_for()),
                Box::new(parse_expression_statement()),
            ])
        }),
        "statement",
    )
}

fn parse_say() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple2(parse_keyword(Keyword::Say), parse_expression()),
        |(line, message)| ast::Statement::Say { message, line },
    )
}

fn parse_ask() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple4(
            parse_keyword(Keyword::Ask),
            parse_expression(),
            as_unit(parse_arrow()),
            parse_identifier(),
        ),
        |(line, prompt, _, target)| ast::Statement::Ask {
            prompt,
            target,
            line,
        },
    )
}

fn parse_set() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple4(
            parse_keyword(Keyword::Set),
            parse_identifier(),
            as_unit(parse_assign()),
            parse_expression(),
        ),
        |(line, name, _, value)| ast::Statement::Set { name, value, line },
    )
}

fn parse_goto() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple2(parse_keyword(Keyword::Goto), parse_identifier()),
        |(line, state)| ast::Statement::Goto { state, line },
    )
}

fn parse_call() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple2(parse_keyword(Keyword::Call), parse_call_expression()),
        |(line, call)| ast::Statement::Call { call, line },
    )
}

fn parse_return() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple2(parse_keyword(Keyword::Return), optional(parse_expression())),
        |(line, value)| ast::Statement::Return { value, line },
    )
}

fn parse_if() -> impl Parser<TokenSpan, ast::Statement> {
    with_context(
        map(
            tuple5(
                parse_keyword(Keyword::If),
                parse_expression(),
                parse_block(),
                many(parse_elif_branch()),
                optional(preceded(as_unit(parse_keyword(Keyword::Else)), parse_block())),
            ),
            |(line, condition, body, elif_branches, else_block)| {
                let mut branches = vec![ast::IfBranch { condition, body }];
                branches.extend(elif_branches);
                ast::Statement::If {
                    branches,
                    else_block,
                    line,
                }
            },
        ),
        "if statement",
    )
}

fn parse_elif_branch() -> impl Parser<TokenSpan, ast::IfBranch> {
    map(
        tuple3(
            as_unit(parse_keyword(Keyword::Elif)),
            parse_expression(),
            parse_block(),
        ),
        |(_, condition, body)| ast::IfBranch { condition, body },
    )
}

fn parse_while() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple3(
            parse_keyword(Keyword::While),
            parse_expression(),
            parse_block(),
        ),
        |(line, condition, body)| ast::Statement::While {
            condition,
            body,
            line,
        },
    )
}

fn parse_for() -> impl Parser<TokenSpan, ast::Statement> {
    map(
        tuple5(
            parse_keyword(Keyword::For),
            parse_identifier(),
            as_unit(parse_keyword(Keyword::In)),
            parse_expression(),
            parse_block(),
        ),
        |(line, variable, _, iterable, body)| ast::Statement::For {
            variable,
            iterable,
            body,
            line,
        },
    )
}

fn parse_expression_statement() -> impl Parser<TokenSpan, ast::Statement> {
    map(parse_expression(), |expr| {
        let line = expr.line();
        ast::Statement::Expression { expr, line }
    })
}
