use super::*;
use crate::token::{Token, Value};

fn tokens(values: &[i64]) -> TokenSet {
    values.iter().map(|&n| Token::new(Value::Int(n))).collect()
}

fn eval_guard(expr: &str) -> Result<bool, EvalError> {
    let transition = Symbol::from("t1");
    Interpreter::new().evaluate(expr, &EvalContext::new(7, &transition))
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(eval_guard("1 + 2 * 3 == 7"), Ok(true));
    assert_eq!(eval_guard("(1 + 2) * 3 == 9"), Ok(true));
    assert_eq!(eval_guard("-4 % 3 == -1"), Ok(true));
    assert_eq!(eval_guard("10 - 2 - 3 == 5"), Ok(true));
}

#[test]
fn boolean_operators() {
    assert_eq!(eval_guard("true && !false"), Ok(true));
    assert_eq!(eval_guard("false || 1 > 2"), Ok(false));
    assert_eq!(eval_guard("\"a\" + \"b\" == \"ab\""), Ok(true));
    assert_eq!(eval_guard("(1, \"x\") == (1, \"x\")"), Ok(true));
}

#[test]
fn short_circuit_skips_right_operand() {
    assert_eq!(eval_guard("false && 1 / 0 == 0"), Ok(false));
    assert_eq!(eval_guard("true || unknown()"), Ok(true));
}

#[test]
fn guard_must_be_boolean() {
    assert_eq!(
        eval_guard("1 + 1"),
        Err(EvalError::TypeMismatch {
            expected: "bool",
            found: "int"
        })
    );
}

#[test]
fn errors_are_reported() {
    assert_eq!(eval_guard("1 / 0 == 0"), Err(EvalError::DivisionByZero));
    assert_eq!(
        eval_guard("nope() == 1"),
        Err(EvalError::UnknownFunction("nope".to_string()))
    );
    assert_eq!(
        eval_guard("size() > 0"),
        Err(EvalError::NoPlace("size".to_string()))
    );
    assert!(matches!(eval_guard("1 +"), Err(EvalError::Parse { .. })));
    assert!(matches!(eval_guard("1 < 2 < 3"), Err(EvalError::Parse { .. })));
    assert_eq!(
        eval_guard("clock(1) == 1"),
        Err(EvalError::Arity {
            function: "clock".to_string(),
            expected: 0,
            found: 1
        })
    );
}

#[test]
fn context_builtins() {
    assert_eq!(eval_guard("clock() == 7"), Ok(true));
    assert_eq!(eval_guard("transition() == \"t1\""), Ok(true));
}

#[test]
fn place_builtins() {
    let interpreter = Interpreter::new();
    let transition = Symbol::from("t1");
    let marking = tokens(&[2, 3, 3]);
    let ctx = EvalContext::new(0, &transition).with_tokens(&marking);

    for expr in [
        "size() == 3",
        "available() == 3",
        "first() == 2",
        "contains(3) && !contains(4)",
        "count(3) == 2",
        "sum() == 8",
    ] {
        assert_eq!(interpreter.evaluate(expr, &ctx), Ok(true), "{}", expr);
    }
}

#[test]
fn pending_tokens_are_not_available() {
    let interpreter = Interpreter::new();
    let transition = Symbol::from("t1");
    let marking: TokenSet = vec![Token::timed(Value::Int(1), 10)].into();
    let ctx = EvalContext::new(5, &transition).with_tokens(&marking);

    assert_eq!(interpreter.evaluate("available() == 0", &ctx), Ok(true));
    assert_eq!(
        interpreter.evaluate("first() == 1", &ctx),
        Err(EvalError::EmptyPlace("first".to_string()))
    );
}

#[test]
fn execute_produces_one_token_per_list_element() {
    let interpreter = Interpreter::new();
    let transition = Symbol::from("t1");
    let ctx = EvalContext::new(0, &transition);

    let produced = interpreter.execute("[1, \"two\", (3, 4)]", &ctx).unwrap();
    let values: Vec<_> = produced.iter().map(|t| t.value().clone()).collect();
    assert_eq!(
        values,
        vec![
            Value::Int(1),
            Value::from("two"),
            Value::Tuple(vec![Value::Int(3), Value::Int(4)])
        ]
    );
    assert!(produced.iter().all(|t| !t.is_timed()));

    let single = interpreter.execute("(1, 2)", &ctx).unwrap();
    assert_eq!(single.len(), 1);

    let repeated = interpreter.execute("repeat(1, 3)", &ctx).unwrap();
    assert_eq!(repeated.len(), 3);
}

#[test]
fn repeat_rejects_oversized_lists() {
    let interpreter = Interpreter::new();
    let transition = Symbol::from("t1");
    let ctx = EvalContext::new(0, &transition);

    assert_eq!(
        interpreter.execute("repeat(1, 9223372036854775807)", &ctx),
        Err(EvalError::ListTooLong {
            requested: i64::MAX,
            limit: MAX_REPEAT,
        })
    );
    assert_eq!(
        interpreter.execute("repeat(1, -1)", &ctx),
        Err(EvalError::ListTooLong {
            requested: -1,
            limit: MAX_REPEAT,
        })
    );

    let longest = format!("repeat((), {})", MAX_REPEAT);
    assert_eq!(interpreter.execute(&longest, &ctx).unwrap().len(), MAX_REPEAT);
}

#[test]
fn execute_delay_stamps_tokens() {
    let interpreter = Interpreter::new();
    let transition = Symbol::from("t1");
    let ctx = EvalContext::new(0, &transition);

    let produced = interpreter.execute("\"job\"@2 * 5", &ctx).unwrap();
    assert_eq!(produced.len(), 1);
    assert_eq!(produced.get(0).unwrap().timestamp(), 10);

    assert_eq!(
        interpreter.execute("1@-3", &ctx),
        Err(EvalError::NegativeDelay(-3))
    );
    assert_eq!(
        interpreter.execute("1@true", &ctx),
        Err(EvalError::TypeMismatch {
            expected: "int",
            found: "bool"
        })
    );
}

#[test]
fn literal_overflow_is_a_parse_error() {
    assert!(matches!(
        eval_guard("99999999999999999999 > 0"),
        Err(EvalError::Parse { .. })
    ));
}

#[test]
fn cached_expressions_are_reused() {
    let interpreter = Interpreter::new();
    let transition = Symbol::from("t1");
    let ctx = EvalContext::new(0, &transition);
    for _ in 0..3 {
        assert_eq!(interpreter.evaluate("1 == 1", &ctx), Ok(true));
    }
    assert_eq!(interpreter.expressions.lock().unwrap().len(), 1);
}
