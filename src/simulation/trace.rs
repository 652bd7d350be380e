//! VCD (Value Change Dump) traces of a simulation run.
//!
//! The trace can be opened in any waveform viewer (e.g. GTKWave). Its time
//! axis counts firings, which keeps untimed runs (where every firing
//! happens at clock 0) readable:
//!
//! - one wire per place, high while the place holds at least one token;
//! - one wire per transition, pulsing high for the firing step in which it
//!   fired.
//!
//! # Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use petrisim::simulation::TraceRecorder;
//! use std::{fs::File, io::BufWriter, sync::{Arc, Mutex}};
//! # let net = petrisim::net::PetriNet::new("example");
//!
//! let recorder = Arc::new(Mutex::new(TraceRecorder::new(&net)));
//! // simulation.add_observer(recorder.clone()); run the simulation ...
//! let mut output = BufWriter::new(File::create("run.vcd")?);
//! recorder.lock().unwrap().write_vcd(&mut output)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io;

use anyhow::Result;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use super::event::{Observer, SimulationEvent};
use crate::element::Symbol;
use crate::net::PetriNet;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_]").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Change {
    step: u64,
    signal: Symbol,
    high: bool,
}

/// Observer collecting value changes for a VCD trace.
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    places: Vec<(Symbol, bool)>,
    transitions: Vec<Symbol>,
    changes: Vec<Change>,
}

impl TraceRecorder {
    /// Starts a trace from the current marking of `net`.
    pub fn new(net: &PetriNet) -> Self {
        Self {
            places: net
                .places()
                .map(|place| (place.identity.id.clone(), !place.tokens.is_empty()))
                .collect(),
            transitions: net
                .transitions()
                .map(|transition| transition.identity.id.clone())
                .collect(),
            changes: Vec::new(),
        }
    }

    fn record(&mut self, step: u64, signal: &str, high: bool) {
        self.changes.push(Change {
            step,
            signal: Symbol::from(signal),
            high,
        });
    }

    /// Number of recorded value changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Writes the trace. Every firing step spans two time units so that
    /// transition pulses are visible.
    pub fn write_vcd(&self, w: &mut dyn io::Write) -> Result<()> {
        let mut writer = vcd::Writer::new(w);

        writer.timescale(1, vcd::TimescaleUnit::NS)?;
        writer.add_module("net")?;

        let mut variables = HashMap::new();
        for name in self
            .places
            .iter()
            .map(|(id, _)| id)
            .chain(self.transitions.iter())
        {
            let wire = writer.add_wire(1, &UNSAFE_CHARS.replace_all(name, "_"))?;
            variables.insert(name.clone(), wire);
        }
        writer.upscope()?;
        writer.enddefinitions()?;

        writer.timestamp(0)?;
        for (id, marked) in self.places.iter() {
            let value = if *marked {
                vcd::Value::V1
            } else {
                vcd::Value::V0
            };
            writer.change_scalar(variables[id], value)?;
        }
        for id in self.transitions.iter() {
            writer.change_scalar(variables[id], vcd::Value::V0)?;
        }

        for (step, changes) in self.changes.iter().group_by(|c| c.step).into_iter() {
            let changes: Vec<_> = changes.collect();
            writer.timestamp(step * 2)?;
            for change in changes.iter() {
                let value = if change.high {
                    vcd::Value::V1
                } else {
                    vcd::Value::V0
                };
                writer.change_scalar(variables[&change.signal], value)?;
            }

            writer.timestamp(step * 2 + 1)?;
            for change in changes.iter().filter(|c| self.transitions.contains(&c.signal)) {
                writer.change_scalar(variables[&change.signal], vcd::Value::V0)?;
            }
        }

        Ok(())
    }
}

impl Observer for TraceRecorder {
    fn notify(&mut self, event: &SimulationEvent) {
        match event {
            SimulationEvent::Consumed {
                firing, transfer, ..
            }
            | SimulationEvent::Produced {
                firing, transfer, ..
            } => {
                let (step, high) = (*firing, transfer.marking > 0);
                let place = transfer.place.clone();
                self.record(step, &place, high);
            }
            SimulationEvent::Fired {
                firing, transition, ..
            } => {
                self.record(*firing, transition, true);
            }
            SimulationEvent::ClockAdvanced { .. } | SimulationEvent::Finished { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Firing;
    use crate::token::{Token, TokenSet, Value};

    #[test]
    fn records_firings_as_pulses() {
        let net = PetriNet::new("empty");
        let mut recorder = TraceRecorder::new(&net);
        recorder.places.push(("p.1".into(), true));
        recorder.transitions.push("t1".into());

        let firing = Firing {
            transition: "t1".into(),
            label: "t1".into(),
            clock: 0,
            consumed: vec![crate::net::ArcTransfer {
                arc: "i1".into(),
                place: "p.1".into(),
                inscription: "1".into(),
                tokens: TokenSet::from(Token::new(Value::Int(1))),
                marking: 0,
            }],
            produced: vec![],
        };
        for event in SimulationEvent::from_firing(1, &firing) {
            recorder.notify(&event);
        }
        assert_eq!(recorder.len(), 2);

        let mut out = Vec::new();
        recorder.write_vcd(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("p_1"));
        assert!(text.contains("#2"));
        assert!(text.contains("#3"));
    }
}
