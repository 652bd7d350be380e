//! Arcs and their inscriptions.
//!
//! An arc connects exactly one place to one transition. The two directions
//! carry different contracts, so they are modelled as a tagged variant:
//!
//! - [`InputArc`] (place to transition) has an *evaluate* predicate over the
//!   place's tokens and an *execute* inscription naming the tokens to
//!   withdraw.
//! - [`OutputArc`] (transition to place) only has an *execute* inscription
//!   producing new tokens, optionally suffixed with `@delay`.
//!
//! Inscriptions are plain expression text; the engine hands them to an
//! [`ExpressionEvaluator`](crate::expression::ExpressionEvaluator).

use crate::element::{Identity, NetElement, Symbol};
use crate::error::SimulationError;

/// Evaluate predicate of input arcs when none is given.
pub const DEFAULT_EVALUATE: &str = "size() > 0";
/// Execute inscription of both arc kinds when none is given.
pub const DEFAULT_EXECUTE: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArc {
    pub identity: Identity,
    pub place: Symbol,
    pub transition: Symbol,
    pub evaluate: String,
    pub execute: String,
}

impl InputArc {
    pub fn new(identity: Identity, place: impl Into<Symbol>, transition: impl Into<Symbol>) -> Self {
        Self {
            identity,
            place: place.into(),
            transition: transition.into(),
            evaluate: DEFAULT_EVALUATE.to_string(),
            execute: DEFAULT_EXECUTE.to_string(),
        }
    }

    pub fn with_evaluate(mut self, evaluate: impl Into<String>) -> Self {
        self.evaluate = evaluate.into();
        self
    }

    pub fn with_execute(mut self, execute: impl Into<String>) -> Self {
        self.execute = execute.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArc {
    pub identity: Identity,
    pub transition: Symbol,
    pub place: Symbol,
    pub execute: String,
}

impl OutputArc {
    pub fn new(identity: Identity, transition: impl Into<Symbol>, place: impl Into<Symbol>) -> Self {
        Self {
            identity,
            transition: transition.into(),
            place: place.into(),
            execute: DEFAULT_EXECUTE.to_string(),
        }
    }

    pub fn with_execute(mut self, execute: impl Into<String>) -> Self {
        self.execute = execute.into();
        self
    }
}

/// Either arc kind, as stored on the edges of the net graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetArc {
    Input(InputArc),
    Output(OutputArc),
}

impl NetArc {
    pub fn place(&self) -> &Symbol {
        match self {
            NetArc::Input(arc) => &arc.place,
            NetArc::Output(arc) => &arc.place,
        }
    }

    pub fn transition(&self) -> &Symbol {
        match self {
            NetArc::Input(arc) => &arc.transition,
            NetArc::Output(arc) => &arc.transition,
        }
    }

    pub fn execute_text(&self) -> &str {
        match self {
            NetArc::Input(arc) => &arc.execute,
            NetArc::Output(arc) => &arc.execute,
        }
    }

    /// The evaluate predicate. Output arcs have none.
    pub fn evaluate_text(&self) -> Result<&str, SimulationError> {
        match self {
            NetArc::Input(arc) => Ok(&arc.evaluate),
            NetArc::Output(arc) => Err(SimulationError::UnsupportedOperation {
                arc: arc.identity.id.clone(),
                operation: "evaluate",
            }),
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, NetArc::Input(_))
    }
}

impl NetElement for NetArc {
    fn identity(&self) -> &Identity {
        match self {
            NetArc::Input(arc) => &arc.identity,
            NetArc::Output(arc) => &arc.identity,
        }
    }
}

impl From<InputArc> for NetArc {
    fn from(arc: InputArc) -> Self {
        NetArc::Input(arc)
    }
}

impl From<OutputArc> for NetArc {
    fn from(arc: OutputArc) -> Self {
        NetArc::Output(arc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_arc_defaults() {
        let arc = InputArc::new(Identity::new("i1"), "p1", "t1");
        assert_eq!(arc.evaluate, DEFAULT_EVALUATE);
        assert_eq!(arc.execute, DEFAULT_EXECUTE);
    }

    #[test]
    fn output_arc_has_no_evaluate() {
        let arc: NetArc = OutputArc::new(Identity::new("o1"), "t1", "p2").into();
        assert_eq!(
            arc.evaluate_text(),
            Err(SimulationError::UnsupportedOperation {
                arc: "o1".into(),
                operation: "evaluate",
            })
        );
        let arc: NetArc = InputArc::new(Identity::new("i1"), "p1", "t1").into();
        assert_eq!(arc.evaluate_text(), Ok(DEFAULT_EVALUATE));
    }
}
