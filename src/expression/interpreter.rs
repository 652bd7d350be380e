use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::ast::{BinaryOp, Expr, Inscription, UnaryOp};
use super::grammar::{ExecuteParser, ExpressionParser};
use super::{EvalContext, EvalError, ExpressionEvaluator};
use crate::token::{Time, Token, TokenSet, Value};

/// Longest list `repeat` will build.
pub const MAX_REPEAT: usize = 1 << 16;

/// Default [`ExpressionEvaluator`].
///
/// Parsed expressions are cached by source text, so a net whose
/// inscriptions are evaluated thousands of times only parses each once.
#[derive(Debug, Default)]
pub struct Interpreter {
    pub(super) expressions: Mutex<HashMap<String, Arc<Expr>>>,
    pub(super) inscriptions: Mutex<HashMap<String, Arc<Inscription>>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn expression(&self, source: &str) -> Result<Arc<Expr>, EvalError> {
        let mut cache = self
            .expressions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(expr) = cache.get(source) {
            return Ok(expr.clone());
        }
        let expr = Arc::new(
            ExpressionParser::new()
                .parse(source)
                .map_err(|err| EvalError::parse(source, err))?,
        );
        cache.insert(source.to_string(), expr.clone());
        Ok(expr)
    }

    fn inscription(&self, source: &str) -> Result<Arc<Inscription>, EvalError> {
        let mut cache = self
            .inscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(inscription) = cache.get(source) {
            return Ok(inscription.clone());
        }
        let inscription = Arc::new(
            ExecuteParser::new()
                .parse(source)
                .map_err(|err| EvalError::parse(source, err))?,
        );
        cache.insert(source.to_string(), inscription.clone());
        Ok(inscription)
    }
}

impl ExpressionEvaluator for Interpreter {
    fn evaluate(&self, expression: &str, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        let expr = self.expression(expression)?;
        match eval(&expr, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeMismatch {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }

    fn execute(&self, expression: &str, ctx: &EvalContext<'_>) -> Result<TokenSet, EvalError> {
        let inscription = self.inscription(expression)?;

        let timestamp: Time = match &inscription.delay {
            None => 0,
            Some(delay) => match eval(delay, ctx)? {
                Value::Int(d) if d < 0 => return Err(EvalError::NegativeDelay(d)),
                Value::Int(d) => d as Time,
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "int",
                        found: other.type_name(),
                    });
                }
            },
        };

        let tokens = match eval(&inscription.value, ctx)? {
            Value::List(items) => items
                .into_iter()
                .map(|value| Token::timed(value, timestamp))
                .collect(),
            value => TokenSet::from(Token::timed(value, timestamp)),
        };
        Ok(tokens)
    }
}

fn eval(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Tuple(items) => Ok(Value::Tuple(eval_all(items, ctx)?)),
        Expr::List(items) => Ok(Value::List(eval_all(items, ctx)?)),
        Expr::Unary(op, operand) => unary(*op, eval(operand, ctx)?),
        Expr::Binary(lhs, BinaryOp::And, rhs) => {
            Ok(Value::Bool(boolean(eval(lhs, ctx)?)? && boolean(eval(rhs, ctx)?)?))
        }
        Expr::Binary(lhs, BinaryOp::Or, rhs) => {
            Ok(Value::Bool(boolean(eval(lhs, ctx)?)? || boolean(eval(rhs, ctx)?)?))
        }
        Expr::Binary(lhs, op, rhs) => binary(eval(lhs, ctx)?, *op, eval(rhs, ctx)?),
        Expr::Call { name, args } => call(name, eval_all(args, ctx)?, ctx),
    }
}

fn eval_all(items: &[Expr], ctx: &EvalContext<'_>) -> Result<Vec<Value>, EvalError> {
    items.iter().map(|item| eval(item, ctx)).collect()
}

fn boolean(value: Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::TypeMismatch {
            expected: "bool",
            found: other.type_name(),
        }),
    }
}

fn integer(value: Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(n) => Ok(n),
        other => Err(EvalError::TypeMismatch {
            expected: "int",
            found: other.type_name(),
        }),
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!boolean(value)?)),
        UnaryOp::Neg => integer(value)?
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow),
    }
}

fn binary(lhs: Value, op: BinaryOp, rhs: Value) -> Result<Value, EvalError> {
    use BinaryOp::*;

    match op {
        Eq => return Ok(Value::Bool(lhs == rhs)),
        Ne => return Ok(Value::Bool(lhs != rhs)),
        Lt | Le | Gt | Ge => {
            if std::mem::discriminant(&lhs) != std::mem::discriminant(&rhs) {
                return Err(EvalError::TypeMismatch {
                    expected: lhs.type_name(),
                    found: rhs.type_name(),
                });
            }
            let result = match op {
                Lt => lhs < rhs,
                Le => lhs <= rhs,
                Gt => lhs > rhs,
                _ => lhs >= rhs,
            };
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    if let (Add, Value::Str(l), Value::Str(r)) = (op, &lhs, &rhs) {
        return Ok(Value::Str(format!("{}{}", l, r)));
    }

    let (l, r) = (integer(lhs)?, integer(rhs)?);
    let result = match op {
        Add => l.checked_add(r),
        Sub => l.checked_sub(r),
        Mul => l.checked_mul(r),
        Div | Rem if r == 0 => return Err(EvalError::DivisionByZero),
        Div => l.checked_div(r),
        Rem => l.checked_rem(r),
        _ => unreachable!("logical and comparison operators are handled above"),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arity {
            function: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn place<'a>(name: &str, ctx: &EvalContext<'a>) -> Result<&'a TokenSet, EvalError> {
    ctx.tokens.ok_or_else(|| EvalError::NoPlace(name.to_string()))
}

fn call(name: &str, mut args: Vec<Value>, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
    match name {
        "clock" => {
            arity(name, &args, 0)?;
            i64::try_from(ctx.clock)
                .map(Value::Int)
                .map_err(|_| EvalError::Overflow)
        }
        "transition" => {
            arity(name, &args, 0)?;
            Ok(Value::Str(ctx.transition.to_string()))
        }
        "repeat" => {
            arity(name, &args, 2)?;
            let requested = integer(args.remove(1))?;
            let count = usize::try_from(requested)
                .ok()
                .filter(|&count| count <= MAX_REPEAT)
                .ok_or(EvalError::ListTooLong {
                    requested,
                    limit: MAX_REPEAT,
                })?;
            Ok(Value::List(vec![args.remove(0); count]))
        }
        "size" => {
            arity(name, &args, 0)?;
            Ok(Value::Int(place(name, ctx)?.len() as i64))
        }
        "available" => {
            arity(name, &args, 0)?;
            Ok(Value::Int(place(name, ctx)?.available(ctx.clock) as i64))
        }
        "first" => {
            arity(name, &args, 0)?;
            place(name, ctx)?
                .iter()
                .find(|token| token.is_available(ctx.clock))
                .map(|token| token.value().clone())
                .ok_or_else(|| EvalError::EmptyPlace(name.to_string()))
        }
        "contains" => {
            arity(name, &args, 1)?;
            let wanted = &args[0];
            Ok(Value::Bool(
                place(name, ctx)?.iter().any(|token| token.value() == wanted),
            ))
        }
        "count" => {
            arity(name, &args, 1)?;
            let wanted = &args[0];
            let count = place(name, ctx)?
                .iter()
                .filter(|token| token.value() == wanted)
                .count();
            Ok(Value::Int(count as i64))
        }
        "sum" => {
            arity(name, &args, 0)?;
            place(name, ctx)?
                .iter()
                .try_fold(0i64, |acc, token| {
                    let n = integer(token.value().clone())?;
                    acc.checked_add(n).ok_or(EvalError::Overflow)
                })
                .map(Value::Int)
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}
