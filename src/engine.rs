//! # Dialogue engine
//!
//! Drives one bot's state machine for one conversation: initializes the
//! global frame, enters the initial state, and processes user turns by
//! classifying them into intents and firing the script's reactions.
//!
//! A turn is strictly ordered: specials are rewritten, `on_message` runs,
//! transitions are tried in declaration order, `on_exit`/`on_enter` fire
//! around the state change, and any `goto` raised in a handler takes effect
//! immediately, superseding the pending transition. Chained `goto`s are
//! followed iteratively; a per-turn cap bounds re-entry without progress.
//!
//! Runtime errors abort the turn but preserve the session; the next turn
//! continues from the current state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::ast::{BotDef, StateDef};
use crate::eval::context::ExecutionContext;
use crate::eval::expression::Value;
use crate::eval::statement::{ControlFlow, StatementResult};
use crate::eval::{Evaluator, RuntimeError, RuntimeResult};
use crate::io::IoHandler;
use crate::recognizer::{IntentRecognizer, IntentResult, RecognizerContext};

/// Hard bound on state entries in a single turn; exceeding it is a runtime
/// error rather than an unbounded `goto` loop.
pub const MAX_STATE_ENTRIES_PER_TURN: usize = 64;

/// One conversation with one bot. Sessions own all mutable state; the bot
/// definition is shared immutably, so independent sessions can run over the
/// same parsed program.
pub struct DialogueSession {
    session_id: Uuid,
    bot: Arc<BotDef>,
    ctx: ExecutionContext,
    recognizer: Arc<dyn IntentRecognizer>,
    evaluator: Evaluator,
    finished: bool,
    entries_this_turn: usize,
}

impl DialogueSession {
    pub fn new(
        bot: Arc<BotDef>,
        recognizer: Arc<dyn IntentRecognizer>,
        io: Arc<dyn IoHandler>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            bot: Arc::clone(&bot),
            ctx: ExecutionContext::new(bot, io),
            recognizer,
            evaluator: Evaluator::new(),
            finished: false,
            entries_this_turn: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_state(&self) -> &str {
        self.ctx.current_state()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// User-visible globals, for the CLI `vars` command.
    pub fn variables(&self) -> HashMap<String, Value> {
        self.ctx.env.globals_snapshot()
    }

    /// Initializes the global frame (declared variables in declaration
    /// order, then the engine-maintained specials) and enters the initial
    /// state. Counts against the same entry cap as a turn, so a start-up
    /// `goto` cycle is caught too.
    #[tracing::instrument(skip(self), fields(session = %self.session_id, bot = %self.bot.name))]
    pub async fn start(&mut self) -> RuntimeResult<()> {
        let bot = Arc::clone(&self.bot);
        for var in &bot.variables {
            let value = match &var.init {
                Some(init) => self.evaluator.eval_expression(init, &mut self.ctx).await?,
                None => Value::Null,
            };
            self.ctx.env.define(&var.name, value);
        }

        self.ctx.env.set_global("_user_input", Value::Null);
        self.ctx.env.set_global("_intent", Value::Null);
        self.ctx.env.set_global("_confidence", Value::Float(0.0));
        self.ctx.env.set_global("_entities", Value::Map(HashMap::new()));

        let initial = bot
            .initial_state()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.entries_this_turn = 0;
        self.enter(initial, 0).await
    }

    /// Processes one user turn. Returns `true` while the session can accept
    /// further turns, `false` once a final state has been entered.
    #[tracing::instrument(skip(self, input), fields(session = %self.session_id, state = %self.ctx.current_state()))]
    pub async fn turn(&mut self, input: &str) -> RuntimeResult<bool> {
        if self.finished {
            return Ok(false);
        }
        self.entries_this_turn = 0;

        self.ctx
            .env
            .set_global("_user_input", Value::String(input.to_string()));

        let result = self.classify(input).await;
        self.ctx
            .env
            .set_global("_intent", Value::String(result.intent.clone()));
        self.ctx
            .env
            .set_global("_confidence", Value::Float(result.confidence));
        self.ctx.env.set_global(
            "_entities",
            Value::Map(
                result
                    .entities
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        self.ctx
            .io()
            .debug(&format!(
                "intent: {} (confidence {:.2})",
                result.intent, result.confidence
            ))
            .await;

        let bot = Arc::clone(&self.bot);
        let state = self.require_state(&bot, self.ctx.current_state().to_string(), 0)?;

        // on_message runs before transition matching; its goto wins
        if let Some(block) = &state.on_message {
            match self.evaluator.eval_block(block, &mut self.ctx).await? {
                StatementResult::Control(ControlFlow::Goto { state, line }) => {
                    self.enter(state, line).await?;
                    return Ok(!self.finished);
                }
                StatementResult::Control(ControlFlow::Return(_))
                | StatementResult::Value(_) => {}
            }
        }

        // first transition whose intent matches and whose guard holds wins
        let mut target = None;
        for transition in &state.transitions {
            if transition.intent_name != result.intent {
                continue;
            }
            let taken = match &transition.guard {
                None => true,
                Some(guard) => {
                    match self.evaluator.eval_expression(guard, &mut self.ctx).await {
                        Ok(value) => value.is_truthy(),
                        Err(RuntimeError::GotoUnwind { state, line }) => {
                            self.enter(state, line).await?;
                            return Ok(!self.finished);
                        }
                        Err(e) => return Err(e),
                    }
                }
            };
            if taken {
                target = Some(transition.target_state.clone());
                break;
            }
        }

        if let Some(target) = target {
            // leaving: a goto in on_exit supersedes the pending transition
            if let Some(block) = &state.on_exit {
                match self.evaluator.eval_block(block, &mut self.ctx).await? {
                    StatementResult::Control(ControlFlow::Goto { state, line }) => {
                        self.enter(state, line).await?;
                        return Ok(!self.finished);
                    }
                    StatementResult::Control(ControlFlow::Return(_))
                    | StatementResult::Value(_) => {}
                }
            }
            self.enter(target, 0).await?;
        } else if let Some(block) = &state.fallback {
            match self.evaluator.eval_block(block, &mut self.ctx).await? {
                StatementResult::Control(ControlFlow::Goto { state, line }) => {
                    self.enter(state, line).await?;
                }
                StatementResult::Control(ControlFlow::Return(_))
                | StatementResult::Value(_) => {}
            }
        }
        // no match and no fallback: stay silently in the current state

        Ok(!self.finished)
    }

    /// Recognizer failures surface to the script as the `unknown` intent.
    async fn classify(&self, input: &str) -> IntentResult {
        let context = RecognizerContext {
            current_state: self.ctx.current_state().to_string(),
            variables: self
                .ctx
                .env
                .globals_snapshot()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        };
        match self
            .recognizer
            .recognize(input, &self.bot.intents, &context)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.ctx
                    .io()
                    .debug(&format!("recognizer failed: {}", e))
                    .await;
                IntentResult::unknown()
            }
        }
    }

    /// Enters a state, running `on_enter` and following chained `goto`s
    /// iteratively so long chains cannot grow the stack. Entering a final
    /// state finishes the session after its block has run.
    async fn enter(&mut self, state_name: String, goto_line: usize) -> RuntimeResult<()> {
        let bot = Arc::clone(&self.bot);
        let mut pending = state_name;
        let mut pending_line = goto_line;
        loop {
            self.entries_this_turn += 1;
            if self.entries_this_turn > MAX_STATE_ENTRIES_PER_TURN {
                return Err(RuntimeError::StateEntryLimit {
                    limit: MAX_STATE_ENTRIES_PER_TURN,
                });
            }
            let state = self.require_state(&bot, pending, pending_line)?;
            self.ctx.set_current_state(state.name.clone());
            debug!(state = %state.name, "entered state");

            if let Some(block) = &state.on_enter {
                match self.evaluator.eval_block(block, &mut self.ctx).await? {
                    StatementResult::Control(ControlFlow::Goto { state, line }) => {
                        pending = state;
                        pending_line = line;
                        continue;
                    }
                    StatementResult::Control(ControlFlow::Return(_))
                    | StatementResult::Value(_) => {}
                }
            }
            if state.is_final {
                self.finished = true;
            }
            return Ok(());
        }
    }

    fn require_state<'a>(
        &self,
        bot: &'a BotDef,
        name: String,
        line: usize,
    ) -> RuntimeResult<&'a StateDef> {
        bot.state(&name)
            .ok_or(RuntimeError::UnknownState { name, line })
    }
}
