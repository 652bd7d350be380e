//! Engine error types.
//!
//! Construction problems surface as [`NetError`] while the net is being
//! built. Everything that can go wrong while a net runs is a
//! [`SimulationError`]; these are fatal to the current run and carry the
//! transition and arc involved.

use thiserror::Error;

use crate::element::{ElementKind, Symbol};
use crate::expression::EvalError;
use crate::token::Time;
use crate::transition::FiringPhase;

/// Malformed net wiring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("element `{0}` is defined more than once")]
    DuplicateId(Symbol),
    #[error("unknown element `{0}`")]
    UnknownElement(Symbol),
    #[error("`{id}` is not a {expected}")]
    WrongKind { id: Symbol, expected: ElementKind },
}

/// Run-time failure of a net.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("{phase} transition `{transition}`{}: {source}", arc_suffix(.arc))]
    Evaluation {
        transition: Symbol,
        arc: Option<Symbol>,
        phase: FiringPhase,
        source: EvalError,
    },
    #[error("{operation} is not supported by `{arc}`")]
    UnsupportedOperation {
        arc: Symbol,
        operation: &'static str,
    },
    #[error(
        "place `{place}` cannot supply {requested} token(s) to transition `{transition}` at clock {clock}"
    )]
    InsufficientTokens {
        transition: Symbol,
        place: Symbol,
        requested: usize,
        clock: Time,
    },
    #[error("firing `{transition}` would exceed the capacity {capacity} of place `{place}`")]
    CapacityExceeded {
        transition: Symbol,
        place: Symbol,
        capacity: usize,
    },
    #[error("token delay on `{arc}` overflows the clock when firing `{transition}`")]
    TimeOverflow { transition: Symbol, arc: Symbol },
    #[error("unknown transition `{0}`")]
    UnknownTransition(Symbol),
    #[error("simulation thread panicked")]
    DriverPanicked,
}

fn arc_suffix(arc: &Option<Symbol>) -> String {
    match arc {
        Some(arc) => format!(" (arc `{}`)", arc),
        None => String::new(),
    }
}

impl SimulationError {
    /// Transition the error is attributed to, if any.
    pub fn transition(&self) -> Option<&Symbol> {
        match self {
            SimulationError::Evaluation { transition, .. }
            | SimulationError::InsufficientTokens { transition, .. }
            | SimulationError::CapacityExceeded { transition, .. }
            | SimulationError::TimeOverflow { transition, .. }
            | SimulationError::UnknownTransition(transition) => Some(transition),
            SimulationError::UnsupportedOperation { .. } | SimulationError::DriverPanicked => None,
        }
    }
}
