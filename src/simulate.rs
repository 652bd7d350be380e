//! The `simulate` command.
//!
//! Runs a net file until it is dead, printing every firing. Runs can be
//! made reproducible with `--seed`, paced with `--delay`, stepped
//! interactively with `--step`, and recorded as an NDJSON event log
//! (`--log`) or a VCD marking trace (`--vcd`). With `--runs N` the net is
//! simulated N times in parallel and only a summary table is printed.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use petrisim::simulate::{SimulateArgs, simulate_main};
//!
//! let args = SimulateArgs {
//!     input: "producer.net".into(),
//!     timed: true,
//!     seed: Some(42),
//!     max_firings: Some(1000),
//!     step: false,
//!     delay: 0,
//!     log: Some("events.ndjson".into()),
//!     vcd: Some("marking.vcd".into()),
//!     output: None,
//!     runs: None,
//!     quiet: false,
//! };
//!
//! simulate_main(args)?;
//! # Ok(())
//! # }
//! ```

use std::{
    fs,
    io::{self, BufRead, BufWriter, Write},
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::*;
use clap::Parser;
use itertools::Itertools;
use prettytable::*;
use rayon::prelude::*;

use crate::{
    AppError,
    element::NetElement,
    expression::{ExpressionEvaluator, Interpreter},
    net::{PetriNet, serialisation::serialize_net},
    read_file,
    simulation::{
        ConsoleLog, NdjsonLog, RunReport, RunState, Simulation, SimulationConfig,
        SimulationControl, SimulationHandle, TimeMode, TraceRecorder,
    },
};

/// Command-line arguments for the simulate command.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Net description file
    pub input: PathBuf,

    /// Discrete-event simulation honouring token timestamps
    #[clap(long)]
    pub timed: bool,

    /// Seed of the random transition selection
    #[clap(long)]
    pub seed: Option<u64>,

    /// Stop after this many firings
    #[clap(long)]
    pub max_firings: Option<u64>,

    /// Pause after every firing and wait for the user
    #[clap(long)]
    pub step: bool,

    /// Delay between firings in milliseconds
    #[clap(long, default_value_t = 0)]
    pub delay: u64,

    /// NDJSON event log file
    #[clap(long)]
    pub log: Option<PathBuf>,

    /// VCD waveform file with the marking of every place
    #[clap(long)]
    pub vcd: Option<PathBuf>,

    /// Write the final net (with its marking) to this file
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Simulate the net this many times in parallel and print a summary
    #[clap(long)]
    pub runs: Option<usize>,

    /// Do not print the firing log
    #[clap(long, short)]
    pub quiet: bool,
}

impl SimulateArgs {
    fn config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default()
            .with_mode(if self.timed {
                TimeMode::Timed
            } else {
                TimeMode::Untimed
            })
            .with_step(self.step)
            .with_delay(Duration::from_millis(self.delay));
        config.seed = self.seed;
        config.max_firings = self.max_firings;
        config
    }
}

/// Simulate a net file.
pub fn simulate_main(args: SimulateArgs) -> Result<()> {
    let evaluator: Arc<dyn ExpressionEvaluator> = Arc::new(Interpreter::new());
    let net = read_file(&args.input, evaluator.as_ref())?;

    match args.runs {
        Some(0) => Err(AppError::NoRuns.into()),
        Some(_) if args.step || args.log.is_some() || args.vcd.is_some() || args.output.is_some() => {
            Err(AppError::BatchOutput.into())
        }
        Some(runs) => batch(net, evaluator, args.config(), runs),
        None => single(net, evaluator, args),
    }
}

fn single(net: PetriNet, evaluator: Arc<dyn ExpressionEvaluator>, args: SimulateArgs) -> Result<()> {
    let mut simulation = Simulation::new(net, evaluator, args.config());

    if !args.quiet {
        simulation.add_observer(ConsoleLog::new(io::stdout()));
    }
    if let Some(filename) = &args.log {
        let file = BufWriter::new(fs::File::create(filename)?);
        simulation.add_observer(NdjsonLog::new(file));
    }
    let recorder = args
        .vcd
        .as_ref()
        .map(|_| Arc::new(Mutex::new(TraceRecorder::new(simulation.net()))));
    if let Some(recorder) = &recorder {
        simulation.add_observer(recorder.clone());
    }

    let (report, simulation) = if args.step {
        let handle = SimulationHandle::spawn(simulation)?;
        interact(&handle)?;
        handle.join()?
    } else {
        let report = simulation.run(&SimulationControl::new())?;
        (report, simulation)
    };

    if let (Some(filename), Some(recorder)) = (&args.vcd, &recorder) {
        let mut file = BufWriter::new(fs::File::create(filename)?);
        recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_vcd(&mut file)?;
    }

    if let Some(filename) = &args.output {
        fs::write(filename, serialize_net(simulation.net()))?;
    }

    if !args.quiet {
        print_marking(simulation.net(), &report);
    }

    Ok(())
}

/// Drives a stepping run from standard input.
///
/// Enter fires the next transition, `c` continues without stepping and
/// `q` (or end of input) stops the run.
fn interact(handle: &SimulationHandle) -> Result<()> {
    let control = handle.control();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !handle.is_finished() {
        match control.wait_while_running(Duration::from_millis(100)) {
            RunState::Running => continue,
            RunState::Stopped => break,
            RunState::Paused => {}
        }

        eprint!("[enter] next, [c]ontinue, [q]uit > ");
        io::stderr().flush()?;

        match lines.next().transpose()? {
            None => control.stop(),
            Some(line) => match line.trim() {
                "q" => control.stop(),
                "c" => {
                    control.set_step(false);
                    control.resume();
                }
                _ => control.resume(),
            },
        }
    }

    Ok(())
}

fn batch(
    net: PetriNet,
    evaluator: Arc<dyn ExpressionEvaluator>,
    config: SimulationConfig,
    runs: usize,
) -> Result<()> {
    let reports = (0..runs)
        .into_par_iter()
        .map(|run| {
            let mut config = config.clone();
            config.seed = config.seed.map(|seed| seed.wrapping_add(run as u64));
            let seed = config.seed;
            let mut simulation = Simulation::new(net.clone(), evaluator.clone(), config);
            simulation
                .run(&SimulationControl::new())
                .map(|report| (run, seed, report))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_titles(row!["Run", "Seed", "Outcome", "Firings", "Clock"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for (run, seed, report) in reports.iter() {
        table.add_row(row![
            run,
            seed.map_or_else(|| "-".to_string(), |seed| seed.to_string()),
            report.outcome,
            r->report.firings,
            r->report.clock,
        ]);
    }
    table.printstd();

    let outcomes = reports
        .iter()
        .map(|(_, _, report)| report.outcome.to_string())
        .sorted()
        .group_by(|outcome| outcome.clone())
        .into_iter()
        .map(|(outcome, group)| format!("{} x{}", outcome, group.count()))
        .join(", ");
    let mean = reports
        .iter()
        .map(|(_, _, report)| report.firings as f64)
        .sum::<f64>()
        / runs as f64;
    println!("Mean firings: {:.2}; {}", mean, outcomes);

    Ok(())
}

fn print_marking(net: &PetriNet, report: &RunReport) {
    println!(
        "{} firing(s), final clock {}: {}",
        report.firings, report.clock, report.outcome
    );

    let mut table = Table::new();
    table.set_titles(row!["Place", "Label", "Count", "Tokens"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for place in net.places() {
        let count = if place.is_bounded() {
            format!("{}/{}", place.tokens.len(), place.capacity)
        } else {
            place.tokens.len().to_string()
        };
        table.add_row(row![place.id(), place.label(), r->count, place.tokens]);
    }
    table.printstd();
}
