//! The built-in function table: a fixed, name-indexed set of string, list,
//! conversion, math and utility functions. Arity or argument-kind violations
//! raise runtime errors carrying the call site's line.

use regex::Regex;

use super::context::ExecutionContext;
use super::expression::Value;
use super::{Evaluator, RuntimeError, RuntimeResult};

const BUILTIN_NAMES: &[&str] = &[
    // string
    "length",
    "upper",
    "lower",
    "trim",
    "contains",
    "startswith",
    "endswith",
    "replace",
    "split",
    "join",
    // conversion
    "str",
    "int",
    "float",
    "bool",
    // list
    "first",
    "last",
    "append",
    "pop",
    "slice",
    // math
    "abs",
    "min",
    "max",
    "round",
    // utility
    "print",
    "format",
    "match",
    "current_state",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

impl Evaluator {
    pub(crate) async fn call_builtin(
        &self,
        name: &str,
        args: Vec<Value>,
        line: usize,
        ctx: &mut ExecutionContext,
    ) -> RuntimeResult<Value> {
        match name {
            // side-channel output: arguments joined with spaces
            "print" => {
                let text = args
                    .iter()
                    .map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                ctx.io().output(&text).await.map_err(RuntimeError::io)?;
                Ok(Value::Null)
            }
            "current_state" => {
                expect_arity(name, &args, 0, line)?;
                Ok(Value::String(ctx.current_state().to_string()))
            }
            _ => call_pure(name, args, line),
        }
    }
}

fn call_pure(name: &str, args: Vec<Value>, line: usize) -> RuntimeResult<Value> {
    match name {
        "length" => {
            expect_arity(name, &args, 1, line)?;
            match &args[0] {
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Integer(items.len() as i64)),
                Value::Map(entries) => Ok(Value::Integer(entries.len() as i64)),
                other => Err(kind_error(name, "a string or list", other, line)),
            }
        }
        "upper" => {
            let s = one_string(name, &args, line)?;
            Ok(Value::String(s.to_uppercase()))
        }
        "lower" => {
            let s = one_string(name, &args, line)?;
            Ok(Value::String(s.to_lowercase()))
        }
        "trim" => {
            let s = one_string(name, &args, line)?;
            Ok(Value::String(s.trim().to_string()))
        }
        "contains" => {
            let (s, sub) = two_strings(name, &args, line)?;
            Ok(Value::Boolean(s.contains(&sub)))
        }
        "startswith" => {
            let (s, prefix) = two_strings(name, &args, line)?;
            Ok(Value::Boolean(s.starts_with(&prefix)))
        }
        "endswith" => {
            let (s, suffix) = two_strings(name, &args, line)?;
            Ok(Value::Boolean(s.ends_with(&suffix)))
        }
        "replace" => {
            expect_arity(name, &args, 3, line)?;
            let s = string_arg(name, &args[0], line)?;
            let from = string_arg(name, &args[1], line)?;
            let to = string_arg(name, &args[2], line)?;
            Ok(Value::String(s.replace(&from, &to)))
        }
        "split" => {
            let (s, sep) = two_strings(name, &args, line)?;
            if sep.is_empty() {
                return Err(RuntimeError::TypeError {
                    message: "split: separator must not be empty".to_string(),
                    line,
                });
            }
            Ok(Value::List(
                s.split(&sep).map(|part| Value::String(part.to_string())).collect(),
            ))
        }
        "join" => {
            expect_arity(name, &args, 2, line)?;
            let items = list_arg(name, &args[0], line)?;
            let sep = string_arg(name, &args[1], line)?;
            let parts: Vec<String> = items.iter().map(Value::to_text).collect();
            Ok(Value::String(parts.join(&sep)))
        }
        "str" => {
            expect_arity(name, &args, 1, line)?;
            Ok(Value::String(args[0].to_text()))
        }
        "int" => {
            expect_arity(name, &args, 1, line)?;
            convert_int(&args[0], line)
        }
        "float" => {
            expect_arity(name, &args, 1, line)?;
            convert_float(&args[0], line)
        }
        "bool" => {
            expect_arity(name, &args, 1, line)?;
            Ok(Value::Boolean(args[0].is_truthy()))
        }
        "first" => {
            expect_arity(name, &args, 1, line)?;
            let items = list_arg(name, &args[0], line)?;
            Ok(items.first().cloned().unwrap_or(Value::Null))
        }
        "last" => {
            expect_arity(name, &args, 1, line)?;
            let items = list_arg(name, &args[0], line)?;
            Ok(items.last().cloned().unwrap_or(Value::Null))
        }
        // values are immutable: append yields the extended list
        "append" => {
            expect_arity(name, &args, 2, line)?;
            let mut items = list_arg(name, &args[0], line)?.to_vec();
            items.push(args[1].clone());
            Ok(Value::List(items))
        }
        // and pop yields the list without its last element
        "pop" => {
            expect_arity(name, &args, 1, line)?;
            let items = list_arg(name, &args[0], line)?;
            if items.is_empty() {
                return Ok(Value::Null);
            }
            Ok(Value::List(items[..items.len() - 1].to_vec()))
        }
        "slice" => {
            expect_arity(name, &args, 3, line)?;
            let items = list_arg(name, &args[0], line)?;
            let start = int_arg(name, &args[1], line)?;
            let end = int_arg(name, &args[2], line)?;
            let len = items.len() as i64;
            let start = start.clamp(0, len) as usize;
            let end = end.clamp(0, len) as usize;
            if start >= end {
                return Ok(Value::List(Vec::new()));
            }
            Ok(Value::List(items[start..end].to_vec()))
        }
        "abs" => {
            expect_arity(name, &args, 1, line)?;
            match &args[0] {
                Value::Integer(i) => Ok(Value::Integer(i.abs())),
                Value::Float(x) => Ok(Value::Float(x.abs())),
                other => Err(kind_error(name, "a number", other, line)),
            }
        }
        "min" | "max" => {
            expect_arity(name, &args, 2, line)?;
            numeric_extremum(name, &args[0], &args[1], line)
        }
        "round" => {
            expect_arity(name, &args, 1, line)?;
            match &args[0] {
                Value::Integer(i) => Ok(Value::Integer(*i)),
                // f64::round is half-away-from-zero
                Value::Float(x) => Ok(Value::Integer(x.round() as i64)),
                other => Err(kind_error(name, "a number", other, line)),
            }
        }
        "format" => {
            if args.is_empty() {
                return Err(RuntimeError::ArityMismatch {
                    name: name.to_string(),
                    expected: 1,
                    got: 0,
                    line,
                });
            }
            let template = string_arg(name, &args[0], line)?;
            format_template(&template, &args[1..], line)
        }
        "match" => {
            let (pattern, subject) = two_strings(name, &args, line)?;
            let regex = Regex::new(&pattern).map_err(|e| RuntimeError::TypeError {
                message: format!("match: invalid pattern: {}", e),
                line,
            })?;
            Ok(Value::Boolean(regex.is_match(&subject)))
        }
        _ => Err(RuntimeError::UndefinedFunction {
            name: name.to_string(),
            line,
        }),
    }
}

/// Replaces each `{}` left-to-right with the next argument's `str(x)` form.
fn format_template(template: &str, args: &[Value], line: usize) -> RuntimeResult<Value> {
    let mut out = String::new();
    let mut rest = template;
    let mut values = args.iter();
    while let Some(idx) = rest.find("{}") {
        out.push_str(&rest[..idx]);
        match values.next() {
            Some(value) => out.push_str(&value.to_text()),
            None => {
                return Err(RuntimeError::TypeError {
                    message: "format: not enough arguments for template".to_string(),
                    line,
                })
            }
        }
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    Ok(Value::String(out))
}

fn convert_int(value: &Value, line: usize) -> RuntimeResult<Value> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        // truncation toward zero
        Value::Float(x) => Ok(Value::Integer(x.trunc() as i64)),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        Value::Null => Ok(Value::Integer(0)),
        Value::String(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
            RuntimeError::TypeError {
                message: format!("int: cannot parse '{}'", s),
                line,
            }
        }),
        other => Err(kind_error("int", "a number, string or boolean", other, line)),
    }
}

fn convert_float(value: &Value, line: usize) -> RuntimeResult<Value> {
    match value {
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Boolean(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
        Value::Null => Ok(Value::Float(0.0)),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::TypeError {
                message: format!("float: cannot parse '{}'", s),
                line,
            }
        }),
        other => Err(kind_error("float", "a number, string or boolean", other, line)),
    }
}

fn numeric_extremum(name: &str, a: &Value, b: &Value, line: usize) -> RuntimeResult<Value> {
    let pick_first = |lt: bool| if name == "min" { lt } else { !lt };
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => {
            Ok(Value::Integer(if pick_first(x < y) { *x } else { *y }))
        }
        (x, y) => {
            let xf = as_f64(name, x, line)?;
            let yf = as_f64(name, y, line)?;
            let result = if pick_first(xf < yf) { xf } else { yf };
            Ok(Value::Float(result))
        }
    }
}

fn as_f64(name: &str, value: &Value, line: usize) -> RuntimeResult<f64> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(x) => Ok(*x),
        other => Err(kind_error(name, "a number", other, line)),
    }
}

fn expect_arity(name: &str, args: &[Value], expected: usize, line: usize) -> RuntimeResult<()> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch {
            name: name.to_string(),
            expected,
            got: args.len(),
            line,
        });
    }
    Ok(())
}

fn one_string(name: &str, args: &[Value], line: usize) -> RuntimeResult<String> {
    expect_arity(name, args, 1, line)?;
    string_arg(name, &args[0], line)
}

fn two_strings(name: &str, args: &[Value], line: usize) -> RuntimeResult<(String, String)> {
    expect_arity(name, args, 2, line)?;
    Ok((
        string_arg(name, &args[0], line)?,
        string_arg(name, &args[1], line)?,
    ))
}

fn string_arg(name: &str, value: &Value, line: usize) -> RuntimeResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(kind_error(name, "a string", other, line)),
    }
}

fn list_arg<'a>(name: &str, value: &'a Value, line: usize) -> RuntimeResult<&'a [Value]> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(kind_error(name, "a list", other, line)),
    }
}

fn int_arg(name: &str, value: &Value, line: usize) -> RuntimeResult<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(kind_error(name, "an integer", other, line)),
    }
}

fn kind_error(name: &str, expected: &str, got: &Value, line: usize) -> RuntimeError {
    RuntimeError::TypeError {
        message: format!("{}: expected {}, got {}", name, expected, got.type_name()),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> RuntimeResult<Value> {
        call_pure(name, args, 1)
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(
            call("upper", vec![Value::String("héllo".into())]).unwrap(),
            Value::String("HÉLLO".into())
        );
        assert_eq!(
            call("length", vec![Value::String("你好".into())]).unwrap(),
            Value::Integer(2)
        );
        assert_eq!(
            call(
                "contains",
                vec![Value::String("order 42".into()), Value::String("42".into())]
            )
            .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            call(
                "split",
                vec![Value::String("a,b,c".into()), Value::String(",".into())]
            )
            .unwrap(),
            Value::List(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("c".into()),
            ])
        );
        assert_eq!(
            call(
                "join",
                vec![
                    Value::List(vec![Value::Integer(1), Value::Integer(2)]),
                    Value::String("-".into()),
                ]
            )
            .unwrap(),
            Value::String("1-2".into())
        );
    }

    #[test]
    fn test_conversion_idempotence() {
        // str(str(x)) == str(x)
        let once = call("str", vec![Value::Float(2.5)]).unwrap();
        let twice = call("str", vec![once.clone()]).unwrap();
        assert_eq!(once, twice);

        // int(int(x)) == int(x) for integer x
        let once = call("int", vec![Value::String("42".into())]).unwrap();
        let twice = call("int", vec![once.clone()]).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, Value::Integer(42));
    }

    #[test]
    fn test_int_conversions() {
        assert_eq!(call("int", vec![Value::Float(-2.9)]).unwrap(), Value::Integer(-2));
        assert_eq!(call("int", vec![Value::Boolean(true)]).unwrap(), Value::Integer(1));
        assert_eq!(call("int", vec![Value::Null]).unwrap(), Value::Integer(0));
        assert!(call("int", vec![Value::String("abc".into())]).is_err());
    }

    #[test]
    fn test_list_functions() {
        let list = Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);

        assert_eq!(call("first", vec![list.clone()]).unwrap(), Value::Integer(1));
        assert_eq!(call("last", vec![list.clone()]).unwrap(), Value::Integer(3));
        assert_eq!(
            call("append", vec![list.clone(), Value::Integer(4)]).unwrap(),
            Value::List(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4),
            ])
        );
        assert_eq!(
            call("pop", vec![list.clone()]).unwrap(),
            Value::List(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(call("first", vec![Value::List(vec![])]).unwrap(), Value::Null);
    }

    #[test]
    fn test_slice_half_open_and_clamped() {
        let list = Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);

        assert_eq!(
            call("slice", vec![list.clone(), Value::Integer(1), Value::Integer(2)]).unwrap(),
            Value::List(vec![Value::Integer(2)])
        );
        // end clamps to the length
        assert_eq!(
            call("slice", vec![list.clone(), Value::Integer(1), Value::Integer(99)]).unwrap(),
            Value::List(vec![Value::Integer(2), Value::Integer(3)])
        );
        // inverted ranges yield the empty list
        assert_eq!(
            call("slice", vec![list, Value::Integer(2), Value::Integer(1)]).unwrap(),
            Value::List(vec![])
        );
    }

    #[test]
    fn test_math() {
        assert_eq!(call("abs", vec![Value::Integer(-3)]).unwrap(), Value::Integer(3));
        assert_eq!(
            call("min", vec![Value::Integer(2), Value::Integer(5)]).unwrap(),
            Value::Integer(2)
        );
        assert_eq!(
            call("max", vec![Value::Integer(2), Value::Float(5.5)]).unwrap(),
            Value::Float(5.5)
        );
        // half away from zero
        assert_eq!(call("round", vec![Value::Float(2.5)]).unwrap(), Value::Integer(3));
        assert_eq!(call("round", vec![Value::Float(-2.5)]).unwrap(), Value::Integer(-3));
    }

    #[test]
    fn test_format() {
        assert_eq!(
            call(
                "format",
                vec![
                    Value::String("{} + {} = {}".into()),
                    Value::Integer(1),
                    Value::Integer(2),
                    Value::Integer(3),
                ]
            )
            .unwrap(),
            Value::String("1 + 2 = 3".into())
        );
        assert!(call("format", vec![Value::String("{} {}".into()), Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_match() {
        assert_eq!(
            call(
                "match",
                vec![Value::String(r"\d{10}".into()), Value::String("id 1234567890".into())]
            )
            .unwrap(),
            Value::Boolean(true)
        );
        assert!(call(
            "match",
            vec![Value::String("(".into()), Value::String("x".into())]
        )
        .is_err());
    }

    #[test]
    fn test_arity_errors() {
        assert!(matches!(
            call("length", vec![]),
            Err(RuntimeError::ArityMismatch { .. })
        ));
        assert!(matches!(
            call("upper", vec![Value::Integer(1)]),
            Err(RuntimeError::TypeError { .. })
        ));
    }
}
