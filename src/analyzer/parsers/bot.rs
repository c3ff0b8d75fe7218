//! Top-level grammar: bot definitions and their members (intents, states,
//! variables, functions).

use super::super::{core::Parser, prelude::*};
use super::expression::parse_expression;
use super::statement::parse_block;
use super::*;
use crate::ast;
use crate::tokenizer::{keyword::Keyword, token::TokenSpan};

/// `program := bot+`
pub fn parse_program() -> impl Parser<TokenSpan, ast::Program> {
    with_context(
        map(many1(parse_bot_def()), |bots| ast::Program { bots }),
        "program",
    )
}

#[derive(Debug, Clone)]
enum BotItem {
    Intent(ast::IntentDef),
    State(ast::StateDef),
    Variable(ast::VariableDef),
    Function(ast::FunctionDef),
}

/// `bot := 'bot' STRING '{' bot_item* '}'`
pub fn parse_bot_def() -> impl Parser<TokenSpan, ast::BotDef> {
    with_context(
        map(
            tuple5(
                parse_keyword(Keyword::Bot),
                parse_string(),
                as_unit(parse_open_brace()),
                many(parse_bot_item()),
                as_unit(parse_close_brace()),
            ),
            |(line, name, _, items, _)| {
                let mut bot = ast::BotDef {
                    name,
                    line,
                    ..Default::default()
                };
                for item in items {
                    match item {
                        BotItem::Intent(intent) => bot.intents.push(intent),
                        BotItem::State(state) => bot.states.push(state),
                        BotItem::Variable(var) => bot.variables.push(var),
                        BotItem::Function(func) => bot.functions.push(func),
                    }
                }
                bot
            },
        ),
        "bot definition",
    )
}

fn parse_bot_item() -> impl Parser<TokenSpan, BotItem> {
    choice(vec![
        Box::new(map(parse_intent_def(), BotItem::Intent)),
        Box::new(map(parse_state_def(), BotItem::State)),
        Box::new(map(parse_var_def(), BotItem::Variable)),
        Box::new(map(parse_func_def(), BotItem::Function)),
    ])
}

#[derive(Debug, Clone)]
enum IntentAttr {
    Patterns(Vec<String>),
    Description(String),
    Examples(Vec<String>),
}

/// `intent_def := 'intent' IDENT '{' intent_attr+ '}'`
///
/// An unknown attribute key fails the attribute choice, which surfaces as a
/// parse error at the offending token.
pub fn parse_intent_def() -> impl Parser<TokenSpan, ast::IntentDef> {
    with_context(
        map(
            tuple5(
                parse_keyword(Keyword::Intent),
                parse_identifier(),
                as_unit(parse_open_brace()),
                many1(parse_intent_attr()),
                as_unit(parse_close_brace()),
            ),
            |(line, name, _, attrs, _)| {
                let mut intent = ast::IntentDef {
                    name,
                    line,
                    ..Default::default()
                };
                for attr in attrs {
                    match attr {
                        IntentAttr::Patterns(patterns) => intent.patterns = patterns,
                        IntentAttr::Description(description) => {
                            intent.description = Some(description)
                        }
                        IntentAttr::Examples(examples) => intent.examples = examples,
                    }
                }
                intent
            },
        ),
        "intent definition",
    )
}

fn parse_intent_attr() -> impl Parser<TokenSpan, IntentAttr> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(
                    as_unit(tuple2(parse_keyword(Keyword::Patterns), parse_colon())),
                    parse_string_list(),
                ),
                IntentAttr::Patterns,
            )),
            Box::new(map(
                preceded(
                    as_unit(tuple2(parse_keyword(Keyword::Description), parse_colon())),
                    parse_string(),
                ),
                IntentAttr::Description,
            )),
            Box::new(map(
                preceded(
                    as_unit(tuple2(parse_keyword(Keyword::Examples), parse_colon())),
                    parse_string_list(),
                ),
                IntentAttr::Examples,
            )),
        ]),
        "intent attribute",
    )
}

#[derive(Debug, Clone)]
enum StateItem {
    OnEnter(ast::Block),
    OnExit(ast::Block),
    OnMessage(ast::Block),
    When(ast::Transition),
    Fallback(ast::Block),
}

/// `state_def := 'state' IDENT modifier* '{' state_item* '}'`
///
/// Repeated modifiers and repeated `on_enter`/`on_exit`/`on_message`/
/// `fallback` blocks are committed parse failures, not backtrack points.
pub fn parse_state_def() -> impl Parser<TokenSpan, ast::StateDef> {
    with_context(
        try_map(
            tuple5(
                tuple2(parse_keyword(Keyword::State), parse_identifier()),
                many(parse_state_modifier()),
                as_unit(parse_open_brace()),
                many(parse_state_item()),
                as_unit(parse_close_brace()),
            ),
            |((line, name), modifiers, _, items, _)| {
                let mut state = ast::StateDef {
                    name,
                    line,
                    ..Default::default()
                };
                for modifier in modifiers {
                    match modifier {
                        Keyword::Initial => {
                            if state.is_initial {
                                return Err(format!(
                                    "duplicate 'initial' modifier on state '{}'",
                                    state.name
                                ));
                            }
                            state.is_initial = true;
                        }
                        Keyword::Final => {
                            if state.is_final {
                                return Err(format!(
                                    "duplicate 'final' modifier on state '{}'",
                                    state.name
                                ));
                            }
                            state.is_final = true;
                        }
                        _ => unreachable!(),
                    }
                }
                for item in items {
                    match item {
                        StateItem::OnEnter(block) => {
                            if state.on_enter.is_some() {
                                return Err(duplicate_block("on_enter", &state.name));
                            }
                            state.on_enter = Some(block);
                        }
                        StateItem::OnExit(block) => {
                            if state.on_exit.is_some() {
                                return Err(duplicate_block("on_exit", &state.name));
                            }
                            state.on_exit = Some(block);
                        }
                        StateItem::OnMessage(block) => {
                            if state.on_message.is_some() {
                                return Err(duplicate_block("on_message", &state.name));
                            }
                            state.on_message = Some(block);
                        }
                        StateItem::When(transition) => state.transitions.push(transition),
                        StateItem::Fallback(block) => {
                            if state.fallback.is_some() {
                                return Err(duplicate_block("fallback", &state.name));
                            }
                            state.fallback = Some(block);
                        }
                    }
                }
                Ok(state)
            },
        ),
        "state definition",
    )
}

fn duplicate_block(kind: &str, state: &str) -> String {
    format!("duplicate '{}' block in state '{}'", kind, state)
}

fn parse_state_modifier() -> impl Parser<TokenSpan, Keyword> {
    choice(vec![
        Box::new(map(parse_keyword(Keyword::Initial), |_| Keyword::Initial)),
        Box::new(map(parse_keyword(Keyword::Final), |_| Keyword::Final)),
    ])
}

fn parse_state_item() -> impl Parser<TokenSpan, StateItem> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(as_unit(parse_keyword(Keyword::OnEnter)), parse_block()),
                StateItem::OnEnter,
            )),
            Box::new(map(
                preceded(as_unit(parse_keyword(Keyword::OnExit)), parse_block()),
                StateItem::OnExit,
            )),
            Box::new(map(
                preceded(as_unit(parse_keyword(Keyword::OnMessage)), parse_block()),
                StateItem::OnMessage,
            )),
            Box::new(map(parse_transition(), StateItem::When)),
            Box::new(map(
                preceded(as_unit(parse_keyword(Keyword::Fallback)), parse_block()),
                StateItem::Fallback,
            )),
        ]),
        "state item",
    )
}

/// `'when' IDENT '->' IDENT ('if' expr)?`
fn parse_transition() -> impl Parser<TokenSpan, ast::Transition> {
    map(
        tuple5(
            parse_keyword(Keyword::When),
            parse_identifier(),
            as_unit(parse_arrow()),
            parse_identifier(),
            optional(preceded(
                as_unit(parse_keyword(Keyword::If)),
                parse_expression(),
            )),
        ),
        |(line, intent_name, _, target_state, guard)| ast::Transition {
            intent_name,
            target_state,
            guard,
            line,
        },
    )
}

/// `var_def := 'var' IDENT ('=' expr)?`
pub fn parse_var_def() -> impl Parser<TokenSpan, ast::VariableDef> {
    with_context(
        map(
            tuple3(
                parse_keyword(Keyword::Var),
                parse_identifier(),
                optional(preceded(as_unit(parse_assign()), parse_expression())),
            ),
            |(line, name, init)| ast::VariableDef { name, init, line },
        ),
        "variable definition",
    )
}

/// `func_def := 'func' IDENT '(' params? ')' block`
pub fn parse_func_def() -> impl Parser<TokenSpan, ast::FunctionDef> {
    with_context(
        map(
            tuple3(
                tuple2(parse_keyword(Keyword::Func), parse_identifier()),
                delimited(
                    as_unit(parse_open_paren()),
                    separated_list(parse_param(), as_unit(parse_comma())),
                    as_unit(parse_close_paren()),
                ),
                parse_block(),
            ),
            |((line, name), params, body)| ast::FunctionDef {
                name,
                params,
                body,
                line,
            },
        ),
        "function definition",
    )
}

fn parse_param() -> impl Parser<TokenSpan, ast::Parameter> {
    map(
        tuple2(
            parse_identifier(),
            optional(preceded(as_unit(parse_assign()), parse_expression())),
        ),
        |(name, default)| ast::Parameter { name, default },
    )
}
