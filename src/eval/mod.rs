//! # Evaluator
//!
//! Tree-walking execution of parsed blocks. The pieces:
//!
//! * [`context`]: the [`Environment`](context::Environment) frame stack and
//!   per-session [`ExecutionContext`](context::ExecutionContext)
//! * [`expression`]: the runtime [`Value`](expression::Value) and expression
//!   evaluation
//! * [`statement`]: statement execution and control-flow signals
//! * [`builtins`]: the fixed built-in function table
//!
//! Evaluation is async because `say`/`ask`/`print` await the I/O handler;
//! the [`Evaluator`] itself is stateless, all mutable state lives in the
//! context.

pub mod builtins;
pub mod context;
pub mod expression;
pub mod statement;

use thiserror::Error;

/// Walks the AST. Methods are split across the sibling modules: expression
/// evaluation in [`expression`], statement execution in [`statement`],
/// built-in dispatch in [`builtins`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while executing script code. A runtime error aborts the
/// current turn with a diagnostic; the session survives and the next turn
/// continues from the preserved state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("undefined variable '{name}' at line {line}")]
    UndefinedVariable { name: String, line: usize },

    #[error("undefined function '{name}' at line {line}")]
    UndefinedFunction { name: String, line: usize },

    #[error("type error at line {line}: {message}")]
    TypeError { message: String, line: usize },

    #[error("division by zero at line {line}")]
    DivisionByZero { line: usize },

    #[error("index {index} out of range for list of length {len} at line {line}")]
    IndexOutOfRange {
        index: i64,
        len: usize,
        line: usize,
    },

    #[error("function '{name}' takes {expected} arguments but {got} were given at line {line}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("unknown state '{name}' in goto at line {line}")]
    UnknownState { name: String, line: usize },

    #[error("state entry limit of {limit} exceeded in a single turn")]
    StateEntryLimit { limit: usize },

    #[error("I/O failure: {message}")]
    Io { message: String },

    /// A `goto` escaping a function call boundary. Not a user-visible error:
    /// the nearest enclosing block converts it back into a control signal.
    #[error("goto '{state}' unwinding through a call at line {line}")]
    GotoUnwind { state: String, line: usize },
}

impl RuntimeError {
    pub(crate) fn io(error: std::io::Error) -> Self {
        RuntimeError::Io {
            message: error.to_string(),
        }
    }
}
