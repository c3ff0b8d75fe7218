//! Execution context: the environment of variable frames plus everything a
//! running block needs to reach — the bot definition, the I/O handler and the
//! engine's current state name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::BotDef;
use crate::io::IoHandler;

use super::expression::Value;

/// Lexically nested variable bindings: one persistent global frame per bot
/// plus a stack of function-call frames. `if`/`while`/`for` bodies share the
/// enclosing frame; only function calls push.
#[derive(Debug, Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    frames: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost frame outward, then the global frame.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Some(value);
            }
        }
        self.globals.get(name)
    }

    /// Writes into the current (innermost) frame, creating the binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => frame.insert(name.into(), value),
            None => self.globals.insert(name.into(), value),
        };
    }

    /// Updates the innermost frame that already holds `name`; an unknown name
    /// is created in the *global* frame — script-level `set` targets globals.
    pub fn assign(&mut self, name: &str, value: Value) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.globals.insert(name.to_string(), value);
    }

    /// Reads the global frame directly (special variables).
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Writes the global frame directly, bypassing any call frames.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Read-only copy of the user-visible globals (engine-maintained
    /// `_`-prefixed names excluded), handed to the intent recognizer.
    pub fn globals_snapshot(&self) -> HashMap<String, Value> {
        self.globals
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Everything a block evaluation can reach. One per dialogue session; the
/// bot definition is shared immutably, all mutable state lives here.
pub struct ExecutionContext {
    pub env: Environment,
    bot: Arc<BotDef>,
    io: Arc<dyn IoHandler>,
    current_state: String,
}

impl ExecutionContext {
    pub fn new(bot: Arc<BotDef>, io: Arc<dyn IoHandler>) -> Self {
        Self {
            env: Environment::new(),
            bot,
            io,
            current_state: String::new(),
        }
    }

    /// Cloned handle so callers can hold the bot while mutating the context.
    pub fn bot(&self) -> Arc<BotDef> {
        Arc::clone(&self.bot)
    }

    pub fn io(&self) -> Arc<dyn IoHandler> {
        Arc::clone(&self.io)
    }

    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    pub fn set_current_state(&mut self, name: impl Into<String>) {
        self.current_state = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_frames() {
        let mut env = Environment::new();
        env.define("x", Value::Integer(1));
        env.push_frame();
        env.define("y", Value::Integer(2));

        assert_eq!(env.lookup("x"), Some(&Value::Integer(1)));
        assert_eq!(env.lookup("y"), Some(&Value::Integer(2)));

        env.pop_frame();
        assert_eq!(env.lookup("y"), None);
    }

    #[test]
    fn test_assign_updates_holding_frame() {
        let mut env = Environment::new();
        env.define("x", Value::Integer(1));
        env.push_frame();
        env.assign("x", Value::Integer(5));
        env.pop_frame();
        assert_eq!(env.lookup("x"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_assign_unknown_name_targets_globals() {
        let mut env = Environment::new();
        env.push_frame();
        env.assign("fresh", Value::Boolean(true));
        env.pop_frame();
        // the binding survived the frame pop because it landed in globals
        assert_eq!(env.lookup("fresh"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_define_shadows_global() {
        let mut env = Environment::new();
        env.define("x", Value::Integer(1));
        env.push_frame();
        env.define("x", Value::Integer(99));
        assert_eq!(env.lookup("x"), Some(&Value::Integer(99)));
        env.pop_frame();
        assert_eq!(env.lookup("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_snapshot_hides_special_variables() {
        let mut env = Environment::new();
        env.define("order_id", Value::String("A1".into()));
        env.set_global("_intent", Value::String("greet".into()));

        let snapshot = env.globals_snapshot();
        assert!(snapshot.contains_key("order_id"));
        assert!(!snapshot.contains_key("_intent"));
    }
}
