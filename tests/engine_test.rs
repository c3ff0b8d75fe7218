//! End-to-end dialogue scenarios: compiled scripts driven through the engine
//! with a deterministic recognizer and an in-memory I/O handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use botscript::ast::{BotDef, IntentDef};
use botscript::engine::DialogueSession;
use botscript::eval::RuntimeError;
use botscript::io::{ChannelIo, IoHandler};
use botscript::recognizer::{
    IntentRecognizer, IntentResult, RecognizerContext, RecognizerError,
};

/// Returns the intent whose first pattern is a substring of the utterance,
/// else `unknown`, always with the configured confidence.
struct MockRecognizer {
    confidence: f64,
}

impl MockRecognizer {
    fn new() -> Self {
        Self { confidence: 1.0 }
    }

    fn with_confidence(confidence: f64) -> Self {
        Self { confidence }
    }
}

#[async_trait]
impl IntentRecognizer for MockRecognizer {
    async fn recognize(
        &self,
        utterance: &str,
        intents: &[IntentDef],
        _context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError> {
        for intent in intents {
            if let Some(pattern) = intent.patterns.first() {
                if utterance.contains(pattern.as_str()) {
                    return Ok(IntentResult {
                        intent: intent.name.clone(),
                        confidence: self.confidence,
                        entities: HashMap::new(),
                    });
                }
            }
        }
        Ok(IntentResult::unknown())
    }
}

/// Always yields `unknown` but with extracted entities, as a network
/// recognizer might.
struct EntityRecognizer;

#[async_trait]
impl IntentRecognizer for EntityRecognizer {
    async fn recognize(
        &self,
        _utterance: &str,
        _intents: &[IntentDef],
        _context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError> {
        let mut entities = HashMap::new();
        entities.insert("order_id".to_string(), "123".to_string());
        Ok(IntentResult {
            intent: "unknown".to_string(),
            confidence: 0.4,
            entities,
        })
    }
}

/// A recognizer whose transport is down.
struct BrokenRecognizer;

#[async_trait]
impl IntentRecognizer for BrokenRecognizer {
    async fn recognize(
        &self,
        _utterance: &str,
        _intents: &[IntentDef],
        _context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError> {
        Err(RecognizerError::Http("connection refused".to_string()))
    }
}

fn load(source: &str) -> Arc<BotDef> {
    let mut program = botscript::compile(source).expect("script should compile");
    Arc::new(program.bots.remove(0))
}

fn session_with(
    source: &str,
    recognizer: Arc<dyn IntentRecognizer>,
    io: Arc<ChannelIo>,
) -> DialogueSession {
    DialogueSession::new(load(source), recognizer, io)
}

/// Runs start + the given turns, returning all outputs in order.
async fn run_dialogue(source: &str, recognizer: Arc<dyn IntentRecognizer>, turns: &[&str]) -> Vec<String> {
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, recognizer, io.clone());
    session.start().await.expect("start");
    for input in turns {
        if !session.turn(input).await.expect("turn") {
            break;
        }
    }
    io.outputs().await
}

const HELLO_BOT: &str = r#"
bot "hello" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_enter { say "hello" }
        when Hi -> E
    }
    state E final {
        on_enter { say "bye" }
    }
}
"#;

#[tokio::test]
async fn test_hello_bot_reaches_final_state() {
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(HELLO_BOT, Arc::new(MockRecognizer::new()), io.clone());

    session.start().await.unwrap();
    assert_eq!(session.current_state(), "S");

    let keep_going = session.turn("hi").await.unwrap();
    assert!(!keep_going);
    assert!(session.is_finished());
    assert_eq!(io.outputs().await, vec!["hello", "bye"]);

    // further turns are a no-op on a finished session
    assert!(!session.turn("hi").await.unwrap());
}

#[tokio::test]
async fn test_unmatched_input_without_fallback_is_silent() {
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(HELLO_BOT, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();

    assert!(session.turn("abc").await.unwrap());
    assert_eq!(session.current_state(), "S");
    // only the on_enter greeting; the unmatched turn produced nothing
    assert_eq!(io.outputs().await, vec!["hello"]);
}

#[tokio::test]
async fn test_fallback_runs_when_no_transition_matches() {
    let source = r#"
bot "hello" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_enter { say "hello" }
        when Hi -> E
        fallback { say "?" }
    }
    state E final { }
}
"#;
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();

    assert!(session.turn("abc").await.unwrap());
    assert_eq!(session.current_state(), "S");
    assert_eq!(io.outputs().await, vec!["hello", "?"]);
}

#[tokio::test]
async fn test_counter_increments_on_reentry() {
    let source = r#"
bot "counter" {
    intent Hi { patterns: ["hi"] }
    var n = 0
    state S initial {
        on_enter {
            set n = n + 1
            say "n=" + str(n)
        }
        when Hi -> S
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &["hi", "hi", "hi"]).await;
    assert_eq!(outputs, vec!["n=1", "n=2", "n=3", "n=4"]);
}

#[tokio::test]
async fn test_guard_blocks_low_confidence_transition() {
    let source = r#"
bot "guarded" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> T if _confidence > 0.5
        fallback { say "low" }
    }
    state T final {
        on_enter { say "taken" }
    }
}
"#;
    // intent matches but the guard fails: the transition is not taken
    let outputs =
        run_dialogue(source, Arc::new(MockRecognizer::with_confidence(0.3)), &["hi"]).await;
    assert_eq!(outputs, vec!["low"]);

    let outputs =
        run_dialogue(source, Arc::new(MockRecognizer::with_confidence(0.9)), &["hi"]).await;
    assert_eq!(outputs, vec!["taken"]);
}

#[tokio::test]
async fn test_for_over_list_literal() {
    let source = r#"
bot "loops" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_enter {
            for x in [1, 2, 3] {
                say str(x)
            }
        }
        when Hi -> S
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &[]).await;
    assert_eq!(outputs, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_function_defaults() {
    let source = r#"
bot "funcs" {
    intent Hi { patterns: ["hi"] }
    func g(a, b = 10) {
        return a + b
    }
    state S initial {
        on_enter {
            set r = g(5)
            say str(r)
            set r = g(5, 7)
            say str(r)
        }
        when Hi -> S
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &[]).await;
    assert_eq!(outputs, vec!["15", "12"]);
}

#[tokio::test]
async fn test_goto_chain_is_followed() {
    let source = r#"
bot "chain" {
    intent Hi { patterns: ["hi"] }
    state A initial {
        on_enter {
            say "a"
            goto B
        }
        when Hi -> A
    }
    state B {
        on_enter {
            say "b"
            goto C
        }
    }
    state C final {
        on_enter { say "c" }
    }
}
"#;
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();

    assert_eq!(io.outputs().await, vec!["a", "b", "c"]);
    assert!(session.is_finished());
    assert_eq!(session.current_state(), "C");
}

#[tokio::test]
async fn test_on_exit_runs_between_states() {
    let source = r#"
bot "exit" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_enter { say "enter S" }
        on_exit { say "exit S" }
        when Hi -> E
    }
    state E final {
        on_enter { say "enter E" }
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &["hi"]).await;
    assert_eq!(outputs, vec!["enter S", "exit S", "enter E"]);
}

#[tokio::test]
async fn test_goto_in_on_exit_supersedes_transition() {
    let source = r#"
bot "supersede" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_exit { goto C }
        when Hi -> B
    }
    state B final {
        on_enter { say "b" }
    }
    state C final {
        on_enter { say "c" }
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &["hi"]).await;
    assert_eq!(outputs, vec!["c"]);
}

#[tokio::test]
async fn test_on_message_goto_wins_over_transitions() {
    let source = r#"
bot "msg" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_message { goto C }
        when Hi -> B
    }
    state B final {
        on_enter { say "b" }
    }
    state C final {
        on_enter { say "c" }
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &["hi"]).await;
    assert_eq!(outputs, vec!["c"]);
}

#[tokio::test]
async fn test_transitions_try_in_declaration_order() {
    let source = r#"
bot "order" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> A if false
        when Hi -> B
        when Hi -> C
    }
    state A final { on_enter { say "a" } }
    state B final { on_enter { say "b" } }
    state C final { on_enter { say "c" } }
}
"#;
    // the first guard fails; the second transition wins even though a third
    // also matches
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &["hi"]).await;
    assert_eq!(outputs, vec!["b"]);
}

#[tokio::test]
async fn test_state_entry_cap_on_start_loop() {
    let source = r#"
bot "selfloop" {
    state S initial {
        on_enter { goto S }
    }
}
"#;
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io);
    assert!(matches!(
        session.start().await,
        Err(RuntimeError::StateEntryLimit { limit: 64 })
    ));
}

#[tokio::test]
async fn test_state_entry_cap_is_per_turn() {
    let source = r#"
bot "turnloop" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> L
    }
    state L {
        on_enter { goto L }
    }
}
"#;
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();

    // exactly one runtime error for the looping turn
    assert!(matches!(
        session.turn("hi").await,
        Err(RuntimeError::StateEntryLimit { .. })
    ));

    // the session survives in the last entered state and keeps taking turns
    assert_eq!(session.current_state(), "L");
    assert!(session.turn("abc").await.unwrap());
    assert!(io.outputs().await.is_empty());
}

#[tokio::test]
async fn test_runtime_error_aborts_turn_but_not_session() {
    let source = r#"
bot "oops" {
    intent Hi { patterns: ["hi"] }
    intent Boom { patterns: ["boom"] }
    state S initial {
        when Boom -> S if 1 / 0 > 0
        when Hi -> E
        fallback { say "?" }
    }
    state E final {
        on_enter { say "done" }
    }
}
"#;
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();

    assert!(matches!(
        session.turn("boom").await,
        Err(RuntimeError::DivisionByZero { .. })
    ));
    assert_eq!(session.current_state(), "S");

    assert!(!session.turn("hi").await.unwrap());
    assert_eq!(io.outputs().await, vec!["done"]);
}

#[tokio::test]
async fn test_goto_unknown_state_is_dispatch_time_error() {
    let source = r#"
bot "ghost" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> E
        fallback { goto Nowhere }
    }
    state E final { on_enter { say "end" } }
}
"#;
    let io = Arc::new(ChannelIo::new());
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();

    match session.turn("abc").await {
        Err(RuntimeError::UnknownState { name, line }) => {
            assert_eq!(name, "Nowhere");
            assert!(line > 0);
        }
        other => panic!("expected unknown-state error, got {:?}", other),
    }

    // the session continues from the preserved state
    assert!(!session.turn("hi").await.unwrap());
    assert_eq!(io.outputs().await, vec!["end"]);
}

#[tokio::test]
async fn test_ask_reads_through_io_handler() {
    let source = r#"
bot "askbot" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        on_enter {
            ask "name?" -> user_name
            say "hello " + user_name
        }
        when Hi -> S
    }
}
"#;
    let io = Arc::new(ChannelIo::with_inputs(["Ada"]));
    let mut session = session_with(source, Arc::new(MockRecognizer::new()), io.clone());
    session.start().await.unwrap();
    assert_eq!(io.outputs().await, vec!["name?", "hello Ada"]);
}

#[tokio::test]
async fn test_entities_readable_through_special_variable() {
    let source = r#"
bot "entities" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> S
        fallback {
            say "id " + str(_entities["order_id"])
            say "missing " + str(_entities["phone"])
            say "confidence " + str(_confidence)
        }
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(EntityRecognizer), &["where is order 123"]).await;
    assert_eq!(
        outputs,
        vec!["id 123", "missing null", "confidence 0.4"]
    );
}

#[tokio::test]
async fn test_recognizer_failure_surfaces_as_unknown() {
    let source = r#"
bot "resilient" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> E
        fallback { say "intent " + _intent }
    }
    state E final { }
}
"#;
    let outputs = run_dialogue(source, Arc::new(BrokenRecognizer), &["hi"]).await;
    assert_eq!(outputs, vec!["intent unknown"]);
}

#[tokio::test]
async fn test_chinese_script_end_to_end() {
    let source = r#"
bot "客服" {
    intent 问候 { patterns: ["你好"] }
    state 欢迎 initial {
        on_enter { say "您好" }
        when 问候 -> 结束
    }
    state 结束 final {
        on_enter { say "再见" }
    }
}
"#;
    let outputs = run_dialogue(source, Arc::new(MockRecognizer::new()), &["你好"]).await;
    assert_eq!(outputs, vec!["您好", "再见"]);
}

#[tokio::test]
async fn test_repeated_runs_are_deterministic() {
    let source = r#"
bot "det" {
    intent Hi { patterns: ["hi"] }
    var n = 0
    state S initial {
        on_enter {
            set n = n + 1
            say "n=" + str(n)
        }
        when Hi -> S
        fallback { say "fallback " + _user_input }
    }
}
"#;
    let turns = ["hi", "abc", "hi", "hi"];
    let first = run_dialogue(source, Arc::new(MockRecognizer::new()), &turns).await;
    let second = run_dialogue(source, Arc::new(MockRecognizer::new()), &turns).await;
    assert_eq!(first, second);
    assert_eq!(first[0], "n=1");
}

#[tokio::test]
async fn test_sessions_share_program_independently() {
    let bot = load(HELLO_BOT);

    let io_a = Arc::new(ChannelIo::new());
    let io_b = Arc::new(ChannelIo::new());
    let mut a = DialogueSession::new(
        Arc::clone(&bot),
        Arc::new(MockRecognizer::new()),
        io_a.clone() as Arc<dyn IoHandler>,
    );
    let mut b = DialogueSession::new(
        Arc::clone(&bot),
        Arc::new(MockRecognizer::new()),
        io_b.clone() as Arc<dyn IoHandler>,
    );

    a.start().await.unwrap();
    b.start().await.unwrap();
    assert!(!a.turn("hi").await.unwrap());
    // session b is unaffected by session a finishing
    assert!(!b.is_finished());
    assert!(b.turn("abc").await.unwrap());
    assert_eq!(io_b.outputs().await, vec!["hello"]);
}
