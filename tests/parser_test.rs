//! Front-half integration tests: tokenizer → preprocessor → parser →
//! validation, driven through [`botscript::compile`].

use botscript::analyzer::core::ParseError;
use botscript::analyzer::validation::ValidationError;
use botscript::ast::*;
use botscript::preprocessor::{Preprocessor, TokenPreprocessor};
use botscript::tokenizer::token::Tokenizer;
use botscript::{compile, Error};

fn compile_one(source: &str) -> BotDef {
    let mut program = compile(source).expect("script should compile");
    assert_eq!(program.bots.len(), 1);
    program.bots.remove(0)
}

/// Parses `expr` in variable-initializer position and returns the tree.
fn parse_expr(expr: &str) -> Expression {
    let source = format!(
        "bot \"t\" {{ state S initial {{ }} var x = {} }}",
        expr
    );
    let bot = compile_one(&source);
    bot.variables[0].init.clone().expect("initializer")
}

#[test]
fn test_hello_bot_structure() {
    let source = r#"
# a minimal bot
bot "hello" {
    intent Hi {
        patterns: ["hi", "hello"]
        description: "the user greets us"
        examples: ["hi there"]
    }

    state S initial {
        on_enter {
            say "hello"
        }
        when Hi -> E
    }

    state E final {
        on_enter {
            say "bye"
        }
    }
}
"#;
    let bot = compile_one(source);
    assert_eq!(bot.name, "hello");

    let intent = &bot.intents[0];
    assert_eq!(intent.name, "Hi");
    assert_eq!(intent.patterns, vec!["hi", "hello"]);
    assert_eq!(intent.description.as_deref(), Some("the user greets us"));
    assert_eq!(intent.examples, vec!["hi there"]);

    let s = bot.state("S").unwrap();
    assert!(s.is_initial);
    assert!(!s.is_final);
    assert!(s.on_enter.is_some());
    assert_eq!(s.transitions.len(), 1);
    assert_eq!(s.transitions[0].intent_name, "Hi");
    assert_eq!(s.transitions[0].target_state, "E");
    assert!(s.transitions[0].guard.is_none());

    let e = bot.state("E").unwrap();
    assert!(e.is_final);
    assert_eq!(bot.initial_state().map(|s| s.name.as_str()), Some("S"));
}

#[test]
fn test_chinese_identifiers_parse() {
    let source = r#"
bot "客服" {
    intent 问候 {
        patterns: ["你好"]
    }
    state 欢迎 initial {
        when 问候 -> 结束
    }
    state 结束 final { }
    var 计数 = 0
}
"#;
    let bot = compile_one(source);
    assert_eq!(bot.intents[0].name, "问候");
    assert!(bot.state("欢迎").is_some());
    assert_eq!(bot.variables[0].name, "计数");
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    // a + b * c parses as a + (b * c)
    let expr = parse_expr("1 + 2 * 3");
    match expr {
        Expression::Binary {
            op: BinaryOperator::Add,
            right,
            ..
        } => {
            assert!(matches!(
                *right,
                Expression::Binary {
                    op: BinaryOperator::Multiply,
                    ..
                }
            ));
        }
        other => panic!("expected top-level add, got {:?}", other),
    }
}

#[test]
fn test_not_binds_tighter_than_and() {
    // not a and b parses as (not a) and b
    let expr = parse_expr("not a and b");
    match expr {
        Expression::Binary {
            op: BinaryOperator::And,
            left,
            ..
        } => {
            assert!(matches!(
                *left,
                Expression::Unary {
                    op: UnaryOperator::Not,
                    ..
                }
            ));
        }
        other => panic!("expected top-level and, got {:?}", other),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    // a or b and c parses as a or (b and c)
    let expr = parse_expr("a or b and c");
    match expr {
        Expression::Binary {
            op: BinaryOperator::Or,
            right,
            ..
        } => {
            assert!(matches!(
                *right,
                Expression::Binary {
                    op: BinaryOperator::And,
                    ..
                }
            ));
        }
        other => panic!("expected top-level or, got {:?}", other),
    }
}

#[test]
fn test_comparison_and_parentheses() {
    let expr = parse_expr("(1 + 2) * 3 >= x");
    match expr {
        Expression::Binary {
            op: BinaryOperator::GreaterThanEqual,
            left,
            ..
        } => match *left {
            Expression::Binary {
                op: BinaryOperator::Multiply,
                left,
                ..
            } => {
                assert!(matches!(
                    *left,
                    Expression::Binary {
                        op: BinaryOperator::Add,
                        ..
                    }
                ));
            }
            other => panic!("expected multiply, got {:?}", other),
        },
        other => panic!("expected comparison, got {:?}", other),
    }
}

#[test]
fn test_index_and_special_var() {
    let expr = parse_expr(r#"_entities["order_id"]"#);
    match expr {
        Expression::Index { target, index, .. } => {
            assert!(matches!(*target, Expression::SpecialVar { ref name, .. } if name == "_entities"));
            assert_eq!(
                *index,
                Expression::Literal(Literal::String("order_id".to_string()))
            );
        }
        other => panic!("expected index expression, got {:?}", other),
    }
}

#[test]
fn test_statement_forms() {
    let source = r#"
bot "forms" {
    intent Any { patterns: ["x"] }
    state S initial {
        on_enter {
            ask "name?" -> user
            set n = 0
            while n < 3 {
                set n = n + 1
            }
            for item in [1, 2, 3] {
                say str(item)
            }
            if n == 3 {
                say "three"
            } elif n == 2 {
                say "two"
            } else {
                say "other"
            }
            call greet("you")
            print("side", "channel")
        }
        when Any -> S if _confidence > 0.5
        fallback {
            goto S
        }
    }
    func greet(who, polite = true) {
        if polite {
            return "dear " + who
        }
        return who
    }
}
"#;
    let bot = compile_one(source);
    let s = bot.state("S").unwrap();
    let block = s.on_enter.as_ref().unwrap();
    assert!(matches!(block.statements[0], Statement::Ask { ref target, .. } if target == "user"));
    assert!(matches!(block.statements[2], Statement::While { .. }));
    assert!(matches!(block.statements[3], Statement::For { .. }));
    match &block.statements[4] {
        Statement::If {
            branches,
            else_block,
            ..
        } => {
            assert_eq!(branches.len(), 2);
            assert!(else_block.is_some());
        }
        other => panic!("expected if, got {:?}", other),
    }
    assert!(matches!(block.statements[5], Statement::Call { .. }));
    assert!(s.transitions[0].guard.is_some());
    assert!(s.fallback.is_some());

    let func = bot.function("greet").unwrap();
    assert_eq!(func.params.len(), 2);
    assert!(func.params[0].default.is_none());
    assert_eq!(
        func.params[1].default,
        Some(Expression::Literal(Literal::Boolean(true)))
    );
}

#[test]
fn test_lex_round_trip_reconstructs_source() {
    let source = "bot \"t\" { # note\n  state S initial { say \"héllo 你好\" }\n}";
    let mut tokenizer = Tokenizer::new();
    let spans = tokenizer.tokenize(source).unwrap();

    let rebuilt: String = spans
        .iter()
        .map(|span| &source[span.start..span.end])
        .collect();
    assert_eq!(rebuilt, source);
}

#[test]
fn test_preprocessor_keeps_only_significant_tokens() {
    let source = "state S { } # trailing\n";
    let mut tokenizer = Tokenizer::new();
    let spans = tokenizer.tokenize(source).unwrap();
    let significant = TokenPreprocessor::default().process(spans);
    assert_eq!(significant.len(), 4);
}

#[test]
fn test_parse_error_reports_line() {
    let source = "bot \"broken\" {\n  state S initial {\n    say\n  }\n}";
    // `say` with no expression: parsing fails and names a source line
    match compile(source) {
        Err(Error::Parse { line, .. }) => assert!(line >= 2),
        other => panic!("expected parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unknown_intent_attribute_is_rejected() {
    let source = r#"
bot "b" {
    intent Hi {
        patterns: ["hi"]
        color: "red"
    }
    state S initial { }
}
"#;
    assert!(matches!(compile(source), Err(Error::Parse { .. })));
}

#[test]
fn test_duplicate_state_block_is_rejected() {
    let source = r#"
bot "b" {
    state S initial {
        on_enter { say "a" }
        on_enter { say "b" }
    }
}
"#;
    match compile(source) {
        Err(Error::Parse { source, .. }) => {
            assert!(matches!(source, ParseError::Failure { .. }));
            assert!(source.to_string().contains("on_enter"));
        }
        other => panic!("expected parse failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_initial_state_is_rejected() {
    let source = r#"bot "b" { state S { } }"#;
    assert!(matches!(
        compile(source),
        Err(Error::Validation(ValidationError::MissingInitialState { .. }))
    ));
}

#[test]
fn test_two_initial_states_are_rejected() {
    let source = r#"bot "b" { state S initial { } state T initial { } }"#;
    assert!(matches!(
        compile(source),
        Err(Error::Validation(ValidationError::MultipleInitialStates { .. }))
    ));
}

#[test]
fn test_transition_to_unknown_state_is_rejected() {
    let source = r#"
bot "b" {
    intent Hi { patterns: ["hi"] }
    state S initial {
        when Hi -> Missing
    }
}
"#;
    match compile(source) {
        Err(Error::Validation(ValidationError::UnknownTransitionTarget { target, .. })) => {
            assert_eq!(target, "Missing");
        }
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_transition_with_unknown_intent_is_rejected() {
    let source = r#"
bot "b" {
    state S initial {
        when Ghost -> S
    }
}
"#;
    assert!(matches!(
        compile(source),
        Err(Error::Validation(ValidationError::UnknownTransitionIntent { .. }))
    ));
}

#[test]
fn test_duplicate_names_are_rejected() {
    let source = r#"
bot "b" {
    state S initial { }
    state S { }
}
"#;
    assert!(matches!(
        compile(source),
        Err(Error::Validation(ValidationError::DuplicateName { kind: "state", .. }))
    ));
}

#[test]
fn test_lex_error_is_fatal() {
    assert!(matches!(
        compile("bot \"b\" { state S initial { say @ } }"),
        Err(Error::Tokenize(_))
    ));
}

#[test]
fn test_multiple_bots_parse() {
    let source = r#"
bot "a" { state S initial { } }
bot "b" { state T initial { } }
"#;
    let program = compile(source).unwrap();
    assert_eq!(program.bots.len(), 2);
    assert_eq!(program.bots[1].name, "b");
}
