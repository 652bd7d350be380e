use std::fmt;

use serde::Serialize;

use crate::element::{Identity, NetElement};
use crate::token::Time;

/// Guard evaluated when none is given.
pub const DEFAULT_GUARD: &str = "true";

/// Guarded node of the net.
///
/// The only state a transition keeps between firings is the clock value of
/// its last firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub identity: Identity,
    pub guard: String,
    pub last_fired_clock: Time,
}

impl Transition {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            guard: DEFAULT_GUARD.to_string(),
            last_fired_clock: 0,
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = guard.into();
        self
    }
}

impl NetElement for Transition {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Step of the firing protocol a transition is in.
///
/// A firing goes `Idle -> Evaluating -> Consuming -> Producing -> Idle`.
/// Errors raised mid-firing record the phase they were raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum FiringPhase {
    #[default]
    Idle,
    /// Checking the guard and the input-arc predicates.
    Evaluating,
    /// Running input-arc inscriptions and withdrawing tokens.
    Consuming,
    /// Running output-arc inscriptions and depositing tokens.
    Producing,
}

impl fmt::Display for FiringPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FiringPhase::Idle => "idle",
            FiringPhase::Evaluating => "evaluating",
            FiringPhase::Consuming => "consuming",
            FiringPhase::Producing => "producing",
        };
        write!(f, "{}", text)
    }
}
