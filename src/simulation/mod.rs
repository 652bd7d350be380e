//! Simulation drivers.
//!
//! A [`Simulation`] repeatedly picks one enabled transition uniformly at
//! random and fires it, until no transition is enabled or the run is
//! stopped. Enumeration of enabled transitions is deterministic
//! (registration order); randomness only enters through the selection,
//! which uses a seedable [`ChaCha8Rng`] so runs can be reproduced.
//!
//! # Time modes
//!
//! - [`TimeMode::Untimed`]: every firing happens at clock 0.
//! - [`TimeMode::Timed`]: a discrete-event simulation. When nothing is
//!   enabled at the current clock the driver jumps the clock once, to the
//!   next pending token timestamp, and checks again. If that jump enables
//!   nothing, the net is dead even when later timestamps remain.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use petrisim::expression::Interpreter;
//! use petrisim::net::parser::parse;
//! use petrisim::simulation::{Outcome, Simulation, SimulationConfig, SimulationControl, TimeMode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let evaluator = Arc::new(Interpreter::new());
//! let net = parse(
//!     r#"place a tokens ["1@20"]; place b; transition t; input a -> t; output t -> b;"#,
//!     evaluator.as_ref(),
//! )?;
//!
//! let config = SimulationConfig::default().with_mode(TimeMode::Timed).with_seed(7);
//! let mut simulation = Simulation::new(net, evaluator, config);
//! let report = simulation.run(&SimulationControl::new())?;
//!
//! assert_eq!(report.outcome, Outcome::Dead);
//! assert_eq!(report.firings, 1);
//! assert_eq!(report.clock, 20);
//! # Ok(())
//! # }
//! ```

mod config;
mod control;
mod event;
mod runner;
mod trace;

pub use config::{SimulationConfig, TimeMode};
pub use control::{RunState, SimulationControl};
pub use event::{ConsoleLog, FnObserver, NdjsonLog, Observer, SimulationEvent, Transfer};
pub use runner::SimulationHandle;
pub use trace::TraceRecorder;

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::element::Symbol;
use crate::error::SimulationError;
use crate::expression::ExpressionEvaluator;
use crate::net::{Firing, PetriNet};
use crate::token::Time;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// No transition is enabled, even after one clock advance.
    Dead,
    /// Stopped through [`SimulationControl::stop`].
    Stopped,
    /// The configured maximum number of firings was reached.
    FiringLimit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Dead => write!(f, "Deadlock."),
            Outcome::Stopped => write!(f, "Stopped."),
            Outcome::FiringLimit => write!(f, "Firing limit reached."),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: Outcome,
    pub firings: u64,
    pub clock: Time,
}

/// Driver of one net.
pub struct Simulation {
    net: PetriNet,
    evaluator: Arc<dyn ExpressionEvaluator>,
    config: SimulationConfig,
    clock: Time,
    rng: ChaCha8Rng,
    observers: Vec<Box<dyn Observer>>,
    firings: u64,
}

impl Simulation {
    pub fn new(
        net: PetriNet,
        evaluator: Arc<dyn ExpressionEvaluator>,
        config: SimulationConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            net,
            evaluator,
            config,
            clock: 0,
            rng,
            observers: Vec::new(),
            firings: 0,
        }
    }

    pub fn add_observer(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    pub fn into_net(self) -> PetriNet {
        self.net
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current logical clock. Always 0 for untimed runs.
    pub fn clock(&self) -> Time {
        self.clock
    }

    /// Number of firings so far.
    pub fn firings(&self) -> u64 {
        self.firings
    }

    fn emit(&mut self, event: SimulationEvent) {
        for observer in self.observers.iter_mut() {
            observer.notify(&event);
        }
    }

    fn firing_clock(&self) -> Time {
        match self.config.mode {
            TimeMode::Untimed => 0,
            TimeMode::Timed => self.clock,
        }
    }

    /// Transitions enabled at the driver's clock, in registration order.
    pub fn enabled_transitions(&self) -> Result<Vec<Symbol>, SimulationError> {
        self.net
            .enabled_transitions(self.firing_clock(), self.evaluator.as_ref())
    }

    /// Picks one enabled transition uniformly at random.
    pub fn random_transition(&mut self) -> Result<Option<Symbol>, SimulationError> {
        let enabled = self.enabled_transitions()?;
        Ok(enabled.choose(&mut self.rng).cloned())
    }

    /// Moves the clock to the smallest pending token timestamp beyond it.
    ///
    /// Returns the new clock, or `None` (leaving the clock unchanged) when
    /// no timed token lies in the future.
    pub fn increment_time(&mut self) -> Option<Time> {
        let next = self.net.earliest_pending_time(self.clock)?;
        let from = self.clock;
        self.clock = next;
        debug!("Clock advanced from {} to {}", from, next);
        self.emit(SimulationEvent::ClockAdvanced { from, to: next });
        Some(next)
    }

    /// Whether the run is over.
    ///
    /// In timed mode a net with nothing enabled gets a single clock advance
    /// before it is declared dead.
    pub fn is_finished(&mut self) -> Result<bool, SimulationError> {
        if !self.enabled_transitions()?.is_empty() {
            return Ok(false);
        }
        if self.config.mode == TimeMode::Untimed || self.increment_time().is_none() {
            return Ok(true);
        }
        Ok(self.enabled_transitions()?.is_empty())
    }

    /// Selects and fires one transition at the driver's clock.
    ///
    /// Returns `None` when nothing is enabled.
    pub fn fire_transition(&mut self) -> Result<Option<Firing>, SimulationError> {
        let transition = match self.random_transition()? {
            Some(transition) => transition,
            None => return Ok(None),
        };
        let clock = self.firing_clock();
        let firing = self
            .net
            .fire(&transition, clock, self.evaluator.as_ref())?;

        self.firings += 1;
        for event in SimulationEvent::from_firing(self.firings, &firing) {
            self.emit(event);
        }
        Ok(Some(firing))
    }

    /// Advances the run by one firing, moving the clock first if needed.
    pub fn step(&mut self) -> Result<Option<Firing>, SimulationError> {
        if self.is_finished()? {
            return Ok(None);
        }
        self.fire_transition()
    }

    /// Runs until the net is dead, the run is stopped or the firing limit is
    /// reached.
    pub fn run(&mut self, control: &SimulationControl) -> Result<RunReport, SimulationError> {
        if self.config.step {
            control.set_step(true);
        }
        info!(
            "Simulating {} ({} places, {} transitions)",
            self.net.identity.id,
            self.net.place_count(),
            self.net.transition_count()
        );

        let outcome = loop {
            if control.is_stopped() {
                break Outcome::Stopped;
            }
            if matches!(self.config.max_firings, Some(max) if self.firings >= max) {
                break Outcome::FiringLimit;
            }
            if self.is_finished()? {
                break Outcome::Dead;
            }
            self.fire_transition()?;
            if !control.checkpoint(self.config.delay) {
                break Outcome::Stopped;
            }
        };

        let report = RunReport {
            outcome,
            firings: self.firings,
            clock: self.clock,
        };
        info!(
            "{} {} firing(s), clock {}",
            outcome, report.firings, report.clock
        );
        self.emit(SimulationEvent::Finished {
            clock: report.clock,
            firings: report.firings,
            outcome,
        });
        Ok(report)
    }
}
