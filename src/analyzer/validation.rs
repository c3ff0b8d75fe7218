//! Structural validation of a parsed program, run once before any dialogue
//! starts. Everything rejected here is fatal; `goto` targets are deliberately
//! left to dispatch-time checking.

use thiserror::Error;

use crate::ast::{BotDef, Program};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("duplicate {kind} '{name}' in bot '{bot}' at line {line}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        bot: String,
        line: usize,
    },

    #[error("bot '{bot}' has no state marked 'initial'")]
    MissingInitialState { bot: String },

    #[error("bot '{bot}' has more than one initial state ('{state}' at line {line})")]
    MultipleInitialStates {
        bot: String,
        state: String,
        line: usize,
    },

    #[error("transition in state '{state}' references unknown intent '{intent}' at line {line}")]
    UnknownTransitionIntent {
        state: String,
        intent: String,
        line: usize,
    },

    #[error("transition in state '{state}' references unknown state '{target}' at line {line}")]
    UnknownTransitionTarget {
        state: String,
        target: String,
        line: usize,
    },

    #[error("program defines no bots")]
    EmptyProgram,
}

pub fn validate(program: &Program) -> Result<(), ValidationError> {
    if program.bots.is_empty() {
        return Err(ValidationError::EmptyProgram);
    }
    for bot in &program.bots {
        validate_bot(bot)?;
    }
    Ok(())
}

fn validate_bot(bot: &BotDef) -> Result<(), ValidationError> {
    check_unique(bot, "intent", bot.intents.iter().map(|i| (&i.name, i.line)))?;
    check_unique(bot, "state", bot.states.iter().map(|s| (&s.name, s.line)))?;
    check_unique(
        bot,
        "variable",
        bot.variables.iter().map(|v| (&v.name, v.line)),
    )?;
    check_unique(
        bot,
        "function",
        bot.functions.iter().map(|f| (&f.name, f.line)),
    )?;

    let mut initial = None;
    for state in &bot.states {
        if state.is_initial {
            if initial.is_some() {
                return Err(ValidationError::MultipleInitialStates {
                    bot: bot.name.clone(),
                    state: state.name.clone(),
                    line: state.line,
                });
            }
            initial = Some(&state.name);
        }
    }
    if initial.is_none() {
        return Err(ValidationError::MissingInitialState {
            bot: bot.name.clone(),
        });
    }

    for state in &bot.states {
        for transition in &state.transitions {
            if bot.intent(&transition.intent_name).is_none() {
                return Err(ValidationError::UnknownTransitionIntent {
                    state: state.name.clone(),
                    intent: transition.intent_name.clone(),
                    line: transition.line,
                });
            }
            if bot.state(&transition.target_state).is_none() {
                return Err(ValidationError::UnknownTransitionTarget {
                    state: state.name.clone(),
                    target: transition.target_state.clone(),
                    line: transition.line,
                });
            }
        }
    }

    Ok(())
}

fn check_unique<'a>(
    bot: &BotDef,
    kind: &'static str,
    items: impl Iterator<Item = (&'a String, usize)>,
) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for (name, line) in items {
        if !seen.insert(name.clone()) {
            return Err(ValidationError::DuplicateName {
                kind,
                name: name.clone(),
                bot: bot.name.clone(),
                line,
            });
        }
    }
    Ok(())
}
