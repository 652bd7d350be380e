//! Guard and inscription evaluation.
//!
//! The engine never interprets expression text itself. Every guard, input
//! arc predicate and execute inscription is handed to an
//! [`ExpressionEvaluator`] together with an [`EvalContext`] describing the
//! firing in progress. Any deterministic implementation can be plugged in;
//! [`Interpreter`] is the one the crate ships with.
//!
//! # The expression language
//!
//! [`Interpreter`] understands a small, side-effect free language:
//!
//! - literals: integers, `"strings"`, `true`, `false`, `()`
//! - compound values: tuples `(a, b)` and lists `[a, b]`
//! - arithmetic `+ - * / %` on integers (`+` also joins strings)
//! - comparisons `== != < <= > >=` and boolean `&& || !`
//! - built-ins over the place in scope: `size()`, `available()`,
//!   `first()`, `contains(v)`, `count(v)`, `sum()`
//! - context built-ins: `clock()`, `transition()`, `repeat(v, n)`
//!
//! An execute inscription is an expression optionally followed by
//! `@delay`. A list value yields one token per element, anything else
//! yields a single token. The delay becomes the timestamp of every
//! produced token and is offset by the firing clock when tokens are
//! deposited.
//!
//! ```
//! use petrisim::expression::{EvalContext, ExpressionEvaluator, Interpreter};
//! use petrisim::token::{Token, TokenSet, Value};
//!
//! let interpreter = Interpreter::new();
//! let tokens: TokenSet = vec![Token::new(Value::Int(3)), Token::new(Value::Int(4))].into();
//! let transition = "t1".into();
//! let ctx = EvalContext::new(0, &transition).with_tokens(&tokens);
//!
//! assert!(interpreter.evaluate("sum() == 7 && size() > 1", &ctx).unwrap());
//!
//! let produced = interpreter.execute("[1, 2]@5", &ctx).unwrap();
//! assert_eq!(produced.len(), 2);
//! assert_eq!(produced.get(0).unwrap().timestamp(), 5);
//! ```

pub mod ast;
mod interpreter;
#[cfg(test)]
mod tests;

lalrpop_util::lalrpop_mod! {grammar, "/expression/grammar.rs"}

pub use interpreter::{Interpreter, MAX_REPEAT};

use thiserror::Error;

use crate::element::Symbol;
use crate::token::{Time, TokenSet};

type LarlPopError<'a> = lalrpop_util::ParseError<usize, grammar::Token<'a>, &'static str>;

/// Context of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Clock of the firing being evaluated.
    pub clock: Time,
    /// Transition being evaluated or fired.
    pub transition: &'a Symbol,
    /// Tokens of the arc's place, absent for guards.
    pub tokens: Option<&'a TokenSet>,
}

impl<'a> EvalContext<'a> {
    pub fn new(clock: Time, transition: &'a Symbol) -> Self {
        Self {
            clock,
            transition,
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: &'a TokenSet) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// Capability consumed by the engine to run guards and inscriptions.
///
/// Implementations must be deterministic for a given context.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluates a boolean expression (guard or input-arc predicate).
    fn evaluate(&self, expression: &str, ctx: &EvalContext<'_>) -> Result<bool, EvalError>;

    /// Runs an execute inscription, producing the tokens it denotes.
    fn execute(&self, expression: &str, ctx: &EvalContext<'_>) -> Result<TokenSet, EvalError>;
}

/// Failure to parse or evaluate an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("cannot parse `{expression}`: {message}")]
    Parse { expression: String, message: String },
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("`{function}` takes {expected} argument(s), {found} given")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("`{0}()` needs a place in scope")]
    NoPlace(String),
    #[error("`{0}()` on a place without available tokens")]
    EmptyPlace(String),
    #[error("negative delay {0}")]
    NegativeDelay(i64),
    #[error("list of {requested} elements exceeds the limit of {limit}")]
    ListTooLong { requested: i64, limit: usize },
}

impl EvalError {
    fn parse(expression: &str, err: LarlPopError<'_>) -> Self {
        EvalError::Parse {
            expression: expression.to_string(),
            message: err.to_string(),
        }
    }
}
