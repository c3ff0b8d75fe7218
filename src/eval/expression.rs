//! Runtime values and expression evaluation.

use std::collections::HashMap;

use async_recursion::async_recursion;

use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};

use super::context::ExecutionContext;
use super::statement::{ControlFlow, StatementResult};
use super::{builtins, Evaluator, RuntimeError, RuntimeResult};

/// The runtime value variant. Equality is structural within a tag; numeric
/// comparisons coerce integer↔floating (see [`values_equal`]).
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    #[default]
    Null,
}

impl Value {
    /// `false`, `null`, `0`, `0.0`, `""` and the empty list are falsy;
    /// everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            Value::Integer(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Null => "null",
        }
    }

    /// The `str(x)` coercion: null → `null`, booleans → `true`/`false`,
    /// numbers in canonical decimal form, lists as `[a, b, ...]`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    format!("{:.1}", x)
                } else {
                    format!("{}", x)
                }
            }
            Value::String(s) => s.clone(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_text).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let parts: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("{}: {}", k, entries[k].to_text()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// JSON view of a value, used for the recognizer context.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(x) => {
                serde_json::Number::from_f64(*x).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Structural equality with integer↔floating coercion; other cross-tag
/// pairs compare unequal rather than erroring.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
            (*a as f64) == *b
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => left == right,
    }
}

impl Evaluator {
    #[async_recursion]
    pub async fn eval_expression(
        &self,
        expr: &Expression,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(eval_literal(lit)),
            Expression::Variable { name, line } => ctx
                .env
                .lookup(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    name: name.clone(),
                    line: *line,
                }),
            Expression::SpecialVar { name, line } => ctx
                .env
                .global(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable {
                    name: name.clone(),
                    line: *line,
                }),
            Expression::List { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expression(item, ctx).await?);
                }
                Ok(Value::List(values))
            }
            Expression::Unary { op, operand, line } => {
                let value = self.eval_expression(operand, ctx).await?;
                eval_unary(*op, value, *line)
            }
            Expression::Binary {
                op, left, right, line,
            } => self.eval_binary(*op, left, right, *line, ctx).await,
            Expression::Call { name, args, line } => {
                self.eval_call(name, args, *line, ctx).await
            }
            Expression::Index {
                target,
                index,
                line,
            } => {
                let target = self.eval_expression(target, ctx).await?;
                let index = self.eval_expression(index, ctx).await?;
                eval_index(target, index, *line)
            }
        }
    }

    /// `and`/`or` short-circuit and yield the last *evaluated* operand, not a
    /// coerced boolean; all other operators evaluate strictly left-to-right.
    async fn eval_binary(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        line: usize,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<Value> {
        match op {
            BinaryOperator::And => {
                let left = self.eval_expression(left, ctx).await?;
                if !left.is_truthy() {
                    return Ok(left);
                }
                return self.eval_expression(right, ctx).await;
            }
            BinaryOperator::Or => {
                let left = self.eval_expression(left, ctx).await?;
                if left.is_truthy() {
                    return Ok(left);
                }
                return self.eval_expression(right, ctx).await;
            }
            _ => {}
        }

        let left = self.eval_expression(left, ctx).await?;
        let right = self.eval_expression(right, ctx).await?;

        match op {
            BinaryOperator::Add => eval_add(left, right, line),
            BinaryOperator::Subtract => eval_numeric(op, left, right, line),
            BinaryOperator::Multiply => eval_numeric(op, left, right, line),
            BinaryOperator::Divide => eval_divide(left, right, line),
            BinaryOperator::Modulo => eval_modulo(left, right, line),
            BinaryOperator::Equal => Ok(Value::Boolean(values_equal(&left, &right))),
            BinaryOperator::NotEqual => Ok(Value::Boolean(!values_equal(&left, &right))),
            BinaryOperator::LessThan => eval_ordering(left, right, line, |o| o.is_lt()),
            BinaryOperator::GreaterThan => eval_ordering(left, right, line, |o| o.is_gt()),
            BinaryOperator::LessThanEqual => eval_ordering(left, right, line, |o| o.is_le()),
            BinaryOperator::GreaterThanEqual => eval_ordering(left, right, line, |o| o.is_ge()),
            BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
        }
    }

    /// Resolution order: the user-function table first, then the built-in
    /// table; arguments evaluate left-to-right either way.
    async fn eval_call(
        &self,
        name: &str,
        args: &[Expression],
        line: usize,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<Value> {
        let bot = ctx.bot();
        if let Some(func) = bot.function(name) {
            if args.len() > func.params.len() {
                return Err(RuntimeError::ArityMismatch {
                    name: name.to_string(),
                    expected: func.params.len(),
                    got: args.len(),
                    line,
                });
            }
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(self.eval_expression(arg, ctx).await?);
            }
            return self.call_function(func, values, ctx).await;
        }

        if builtins::is_builtin(name) {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(self.eval_expression(arg, ctx).await?);
            }
            return self.call_builtin(name, values, line, ctx).await;
        }

        Err(RuntimeError::UndefinedFunction {
            name: name.to_string(),
            line,
        })
    }

    /// Pushes a local frame, binds parameters (defaults evaluate in that
    /// frame, left to right), runs the body and pops the frame. A `Return`
    /// signal yields the value; falling off the end yields null; a `Goto`
    /// keeps unwinding through the call boundary.
    pub(crate) async fn call_function(
        &self,
        func: &crate::ast::FunctionDef,
        args: Vec<Value>,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<Value> {
        ctx.env.push_frame();
        let result = self.bind_and_run(func, args, ctx).await;
        ctx.env.pop_frame();

        match result? {
            StatementResult::Control(ControlFlow::Return(value)) => Ok(value),
            StatementResult::Control(ControlFlow::Goto { state, line }) => {
                Err(RuntimeError::GotoUnwind { state, line })
            }
            StatementResult::Value(_) => Ok(Value::Null),
        }
    }

    async fn bind_and_run(
        &self,
        func: &crate::ast::FunctionDef,
        args: Vec<Value>,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<StatementResult> {
        for (i, param) in func.params.iter().enumerate() {
            let value = match args.get(i) {
                Some(value) => value.clone(),
                None => match &param.default {
                    Some(default) => self.eval_expression(default, ctx).await?,
                    None => Value::Null,
                },
            };
            ctx.env.define(&param.name, value);
        }
        self.eval_block(&func.body, ctx).await
    }
}

fn eval_literal(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(i) => Value::Integer(*i),
        Literal::Float(x) => Value::Float(*x),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Null => Value::Null,
    }
}

fn eval_unary(op: UnaryOperator, value: Value, line: usize) -> RuntimeResult<Value> {
    match op {
        UnaryOperator::Minus => match value {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(RuntimeError::TypeError {
                message: format!("cannot negate {}", other.type_name()),
                line,
            }),
        },
        UnaryOperator::Not => Ok(Value::Boolean(!value.is_truthy())),
    }
}

/// `+` is overloaded: numeric addition, or string concatenation when either
/// side is a string (the other side coerced as `str(x)`). Lists do not
/// concatenate.
fn eval_add(left: Value, right: Value, line: usize) -> RuntimeResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::String(_), _) | (_, Value::String(_)) => {
            Ok(Value::String(left.to_text() + &right.to_text()))
        }
        (Value::List(_), Value::List(_)) => Err(RuntimeError::TypeError {
            message: "list concatenation is not supported".to_string(),
            line,
        }),
        _ => Err(RuntimeError::TypeError {
            message: format!("cannot add {} and {}", left.type_name(), right.type_name()),
            line,
        }),
    }
}

/// `-` and `*`: integers stay integers, any floating operand makes the
/// result floating.
fn eval_numeric(
    op: BinaryOperator,
    left: Value,
    right: Value,
    line: usize,
) -> RuntimeResult<Value> {
    let apply_int = |a: i64, b: i64| match op {
        BinaryOperator::Subtract => a - b,
        _ => a * b,
    };
    let apply_float = |a: f64, b: f64| match op {
        BinaryOperator::Subtract => a - b,
        _ => a * b,
    };
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(apply_int(*a, *b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(apply_float(*a, *b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(apply_float(*a as f64, *b))),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(apply_float(*a, *b as f64))),
        _ => Err(RuntimeError::TypeError {
            message: format!(
                "cannot apply '{}' to {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ),
            line,
        }),
    }
}

/// Integer division stays integer only when exact; division by zero is a
/// runtime error for both integer and floating operands.
fn eval_divide(left: Value, right: Value, line: usize) -> RuntimeResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                Err(RuntimeError::DivisionByZero { line })
            } else if a % b == 0 {
                Ok(Value::Integer(a / b))
            } else {
                Ok(Value::Float(*a as f64 / *b as f64))
            }
        }
        (Value::Float(a), Value::Float(b)) => div_float(*a, *b, line),
        (Value::Integer(a), Value::Float(b)) => div_float(*a as f64, *b, line),
        (Value::Float(a), Value::Integer(b)) => div_float(*a, *b as f64, line),
        _ => Err(RuntimeError::TypeError {
            message: format!(
                "cannot divide {} by {}",
                left.type_name(),
                right.type_name()
            ),
            line,
        }),
    }
}

fn div_float(a: f64, b: f64, line: usize) -> RuntimeResult<Value> {
    if b == 0.0 {
        Err(RuntimeError::DivisionByZero { line })
    } else {
        Ok(Value::Float(a / b))
    }
}

fn eval_modulo(left: Value, right: Value, line: usize) -> RuntimeResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                Err(RuntimeError::DivisionByZero { line })
            } else {
                Ok(Value::Integer(a % b))
            }
        }
        (Value::Float(a), Value::Float(b)) => rem_float(*a, *b, line),
        (Value::Integer(a), Value::Float(b)) => rem_float(*a as f64, *b, line),
        (Value::Float(a), Value::Integer(b)) => rem_float(*a, *b as f64, line),
        _ => Err(RuntimeError::TypeError {
            message: format!(
                "cannot apply '%' to {} and {}",
                left.type_name(),
                right.type_name()
            ),
            line,
        }),
    }
}

fn rem_float(a: f64, b: f64, line: usize) -> RuntimeResult<Value> {
    if b == 0.0 {
        Err(RuntimeError::DivisionByZero { line })
    } else {
        Ok(Value::Float(a % b))
    }
}

/// Ordering is defined for number↔number and string↔string only.
fn eval_ordering<F>(left: Value, right: Value, line: usize, check: F) -> RuntimeResult<Value>
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    let ordering = match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return Err(RuntimeError::TypeError {
                message: format!(
                    "cannot order {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
                line,
            })
        }
    };
    match ordering {
        Some(o) => Ok(Value::Boolean(check(o))),
        None => Err(RuntimeError::TypeError {
            message: "cannot order NaN".to_string(),
            line,
        }),
    }
}

/// `list[i]` bounds-checked, negative indices unsupported; `map[key]` yields
/// the value or null (how scripts read `_entities`).
fn eval_index(target: Value, index: Value, line: usize) -> RuntimeResult<Value> {
    match (target, index) {
        (Value::List(items), Value::Integer(i)) => {
            if i < 0 || i as usize >= items.len() {
                Err(RuntimeError::IndexOutOfRange {
                    index: i,
                    len: items.len(),
                    line,
                })
            } else {
                Ok(items[i as usize].clone())
            }
        }
        (Value::List(_), other) => Err(RuntimeError::TypeError {
            message: format!("list index must be an integer, got {}", other.type_name()),
            line,
        }),
        (Value::Map(entries), Value::String(key)) => {
            Ok(entries.get(&key).cloned().unwrap_or(Value::Null))
        }
        (Value::Map(_), other) => Err(RuntimeError::TypeError {
            message: format!("map key must be a string, got {}", other.type_name()),
            line,
        }),
        (other, _) => Err(RuntimeError::TypeError {
            message: format!("cannot index into {}", other.type_name()),
            line,
        }),
    }
}
