//! Statement execution and the control-flow signals that thread through
//! nested blocks.

use async_recursion::async_recursion;

use crate::ast::{Block, Statement};

use super::context::ExecutionContext;
use super::expression::Value;
use super::{Evaluator, RuntimeError, RuntimeResult};

/// Result of executing a statement or block.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// Normal completion; the value is the last expression's (unused by the
    /// engine, useful in tests).
    Value(Value),
    /// A non-local signal propagating outward.
    Control(ControlFlow),
}

/// Control-flow escapes. `Return` is caught at the function call boundary;
/// `Goto` unwinds all the way to the dialogue engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Return(Value),
    Goto { state: String, line: usize },
}

impl Evaluator {
    /// Executes statements in source order. Control signals and errors stop
    /// the block; a `goto` that unwound through a call boundary (surfacing
    /// as [`RuntimeError::GotoUnwind`]) is reinstated as a control signal
    /// here.
    #[async_recursion]
    pub async fn eval_block(
        &self,
        block: &Block,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<StatementResult> {
        let mut last = Value::Null;
        for stmt in &block.statements {
            match self.eval_statement(stmt, ctx).await {
                Ok(StatementResult::Value(value)) => last = value,
                Ok(StatementResult::Control(flow)) => {
                    return Ok(StatementResult::Control(flow))
                }
                Err(RuntimeError::GotoUnwind { state, line }) => {
                    return Ok(StatementResult::Control(ControlFlow::Goto { state, line }))
                }
                Err(e) => return Err(e),
            }
        }
        Ok(StatementResult::Value(last))
    }

    #[async_recursion]
    pub async fn eval_statement(
        &self,
        stmt: &Statement,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<StatementResult> {
        match stmt {
            Statement::Say { message, .. } => {
                let value = self.eval_expression(message, ctx).await?;
                ctx.io()
                    .output(&value.to_text())
                    .await
                    .map_err(RuntimeError::io)?;
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::Ask { prompt, target, .. } => {
                let prompt = self.eval_expression(prompt, ctx).await?;
                let reply = ctx
                    .io()
                    .input(&prompt.to_text())
                    .await
                    .map_err(RuntimeError::io)?;
                ctx.env.assign(target, Value::String(reply));
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::Set { name, value, .. } => {
                let value = self.eval_expression(value, ctx).await?;
                ctx.env.assign(name, value);
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::Goto { state, line } => Ok(StatementResult::Control(ControlFlow::Goto {
                state: state.clone(),
                line: *line,
            })),
            Statement::Call { call, .. } => {
                self.eval_expression(call, ctx).await?;
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expression(expr, ctx).await?,
                    None => Value::Null,
                };
                Ok(StatementResult::Control(ControlFlow::Return(value)))
            }
            Statement::If {
                branches,
                else_block,
                ..
            } => {
                for branch in branches {
                    let guard = self.eval_expression(&branch.condition, ctx).await?;
                    if guard.is_truthy() {
                        return self.eval_block(&branch.body, ctx).await;
                    }
                }
                if let Some(block) = else_block {
                    return self.eval_block(block, ctx).await;
                }
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::While {
                condition, body, ..
            } => {
                loop {
                    let guard = self.eval_expression(condition, ctx).await?;
                    if !guard.is_truthy() {
                        break;
                    }
                    match self.eval_block(body, ctx).await? {
                        StatementResult::Value(_) => {}
                        StatementResult::Control(flow) => {
                            return Ok(StatementResult::Control(flow))
                        }
                    }
                }
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::For {
                variable,
                iterable,
                body,
                line,
            } => {
                let iterable = self.eval_expression(iterable, ctx).await?;
                let items: Vec<Value> = match iterable {
                    Value::List(items) => items,
                    // strings iterate one code point at a time
                    Value::String(s) => {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    }
                    other => {
                        return Err(RuntimeError::TypeError {
                            message: format!("cannot iterate over {}", other.type_name()),
                            line: *line,
                        })
                    }
                };
                for item in items {
                    // the loop variable lives in the enclosing frame
                    ctx.env.define(variable, item);
                    match self.eval_block(body, ctx).await? {
                        StatementResult::Value(_) => {}
                        StatementResult::Control(flow) => {
                            return Ok(StatementResult::Control(flow))
                        }
                    }
                }
                Ok(StatementResult::Value(Value::Null))
            }
            Statement::Expression { expr, .. } => {
                let value = self.eval_expression(expr, ctx).await?;
                Ok(StatementResult::Value(value))
            }
        }
    }
}
