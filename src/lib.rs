//! Petri net execution engine.
//!
//! This library loads coloured, optionally timed Petri nets and runs them:
//! transitions are enabled by their guard and input-arc inscriptions, fire
//! atomically, and are selected at random by a simulation driver that can
//! be paused, stepped and stopped from another thread.
//!
//! # Overview
//!
//! A net is made of places holding [`token::Token`]s, transitions, and arcs
//! between them. Every arc carries inscriptions written in a small
//! expression language ([`expression`]): input arcs decide whether they can
//! supply tokens (`evaluate`) and how many they take (`execute`); output
//! arcs compute the tokens they produce, optionally delayed with `@`.
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use petrisim::expression::Interpreter;
//! use petrisim::read_file;
//! use petrisim::simulation::{Simulation, SimulationConfig, SimulationControl};
//! use std::{path::Path, sync::Arc};
//!
//! let evaluator = Arc::new(Interpreter::new());
//! let net = read_file(Path::new("producer.net"), evaluator.as_ref())?;
//!
//! let mut simulation = Simulation::new(net, evaluator, SimulationConfig::default().with_seed(1));
//! let report = simulation.run(&SimulationControl::new())?;
//! println!("{} after {} firing(s)", report.outcome, report.firings);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **[`token`]**, **[`element`]**, **[`place`]**, **[`arc`]**,
//!   **[`transition`]**: the building blocks of a net
//! - **[`net`]**: the [`PetriNet`] aggregate with enablement and firing,
//!   plus the net file parser and serialiser
//! - **[`expression`]**: the evaluator capability and its default interpreter
//! - **[`simulation`]**: untimed and timed drivers, run control and observers
//! - **[`simulate`]**, **[`inspect`]**: the command-line front ends

use anyhow::Result;
use clap::Parser;
use std::{error::Error, fmt, fs, path::Path};

pub mod arc;
pub mod element;
pub mod error;
pub mod expression;
pub mod inspect;
pub mod net;
pub mod place;
pub mod simulate;
pub mod simulation;
pub mod token;
pub mod transition;

pub use element::Symbol;
pub use error::{NetError, SimulationError};
pub use expression::{ExpressionEvaluator, Interpreter};
pub use inspect::{InspectArgs, inspect_main};
pub use net::PetriNet;
pub use simulate::{SimulateArgs, simulate_main};

/// Invalid combinations of command-line options.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// `--runs 0`.
    NoRuns,
    /// Batch runs only print a summary.
    BatchOutput,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoRuns => write!(f, "At least one run must be requested."),
            AppError::BatchOutput => write!(
                f,
                "--runs cannot be combined with --step, --log, --vcd or --output."
            ),
        }
    }
}

impl Error for AppError {}

/// Reads and parses a net file, evaluating its initial marking with
/// `evaluator`.
pub fn read_file(file_name: &Path, evaluator: &dyn ExpressionEvaluator) -> Result<PetriNet> {
    let file = fs::read_to_string(file_name)?;
    Ok(net::parser::parse(&file, evaluator)?)
}

/// Command-line interface of the simulator.
#[derive(Debug, Parser)]
#[clap(name = "petrisim", about = "Petri net simulator")]
pub enum CLIArguments {
    /// Run a net until no transition is enabled.
    Simulate(SimulateArgs),
    /// Print the elements of a net and its initially enabled transitions.
    Inspect(InspectArgs),
}
