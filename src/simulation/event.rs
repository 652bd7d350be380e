//! Observation of a running simulation.
//!
//! The driver reports what it does as a stream of [`SimulationEvent`]s.
//! A firing is reported as one `Consumed` event per input arc, one `Fired`
//! event, then one `Produced` event per output arc, all sharing the same
//! firing sequence number.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError, mpsc};

use itertools::Itertools;
use log::warn;
use serde::Serialize;

use super::Outcome;
use crate::net::{ArcTransfer, Firing};
use crate::token::Time;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum SimulationEvent {
    Consumed {
        firing: u64,
        clock: Time,
        transition: String,
        #[serde(flatten)]
        transfer: Transfer,
    },
    Fired {
        firing: u64,
        clock: Time,
        transition: String,
        label: String,
    },
    Produced {
        firing: u64,
        clock: Time,
        transition: String,
        #[serde(flatten)]
        transfer: Transfer,
    },
    ClockAdvanced {
        from: Time,
        to: Time,
    },
    Finished {
        clock: Time,
        firings: u64,
        outcome: Outcome,
    },
}

/// Serializable view of an [`ArcTransfer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub arc: String,
    pub place: String,
    pub inscription: String,
    pub tokens: Vec<String>,
    /// Token count of the place after the firing.
    pub marking: usize,
}

impl From<&ArcTransfer> for Transfer {
    fn from(transfer: &ArcTransfer) -> Self {
        Self {
            arc: transfer.arc.to_string(),
            place: transfer.place.to_string(),
            inscription: transfer.inscription.clone(),
            tokens: transfer.tokens.iter().map(|token| token.to_string()).collect(),
            marking: transfer.marking,
        }
    }
}

impl SimulationEvent {
    /// Events describing one committed firing, in reporting order.
    pub fn from_firing(sequence: u64, firing: &Firing) -> Vec<SimulationEvent> {
        let transition = firing.transition.to_string();
        let consumed = firing.consumed.iter().map(|t| SimulationEvent::Consumed {
            firing: sequence,
            clock: firing.clock,
            transition: transition.clone(),
            transfer: t.into(),
        });
        let fired = SimulationEvent::Fired {
            firing: sequence,
            clock: firing.clock,
            transition: transition.clone(),
            label: firing.label.clone(),
        };
        let produced = firing.produced.iter().map(|t| SimulationEvent::Produced {
            firing: sequence,
            clock: firing.clock,
            transition: transition.clone(),
            transfer: t.into(),
        });
        consumed
            .chain(std::iter::once(fired))
            .chain(produced)
            .collect()
    }
}

/// Receiver of simulation events.
pub trait Observer: Send {
    fn notify(&mut self, event: &SimulationEvent);
}

/// Adapts a closure into an [`Observer`].
pub struct FnObserver<F>(pub F);

impl<F: FnMut(&SimulationEvent) + Send> Observer for FnObserver<F> {
    fn notify(&mut self, event: &SimulationEvent) {
        (self.0)(event)
    }
}

impl Observer for mpsc::Sender<SimulationEvent> {
    fn notify(&mut self, event: &SimulationEvent) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.send(event.clone());
    }
}

/// Lets an observer be shared with the caller, who can inspect it once the
/// run is over.
impl<T: Observer> Observer for Arc<Mutex<T>> {
    fn notify(&mut self, event: &SimulationEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .notify(event)
    }
}

/// Writes each event as one JSON object per line.
pub struct NdjsonLog<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> NdjsonLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &SimulationEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        writeln!(self.writer)?;
        if let SimulationEvent::Finished { .. } = event {
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> Observer for NdjsonLog<W> {
    fn notify(&mut self, event: &SimulationEvent) {
        if let Err(err) = self.write_event(event) {
            warn!("Failed to write event log: {}", err);
        }
    }
}

/// Human readable firing log.
///
/// ```text
/// ----------
/// - 1 from p1
/// Producer (t1) fired!
/// + 1 into p2
/// ```
pub struct ConsoleLog<W: Write + Send> {
    writer: W,
    last_firing: Option<u64>,
}

impl<W: Write + Send> ConsoleLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last_firing: None,
        }
    }

    fn separate(&mut self, firing: u64) -> io::Result<()> {
        if self.last_firing != Some(firing) {
            self.last_firing = Some(firing);
            writeln!(self.writer, "----------")?;
        }
        Ok(())
    }

    fn write_event(&mut self, event: &SimulationEvent) -> io::Result<()> {
        match event {
            SimulationEvent::Consumed {
                firing, transfer, ..
            } => {
                self.separate(*firing)?;
                writeln!(
                    self.writer,
                    "- {} from {}",
                    transfer.tokens.iter().join(", "),
                    transfer.place
                )
            }
            SimulationEvent::Fired {
                firing,
                clock,
                transition,
                label,
            } => {
                self.separate(*firing)?;
                let prefix = match clock {
                    0 => String::new(),
                    clock => format!("[{}] ", clock),
                };
                if label != transition {
                    writeln!(self.writer, "{}{} ({}) fired!", prefix, label, transition)
                } else {
                    writeln!(self.writer, "{}{} fired.", prefix, transition)
                }
            }
            SimulationEvent::Produced {
                firing, transfer, ..
            } => {
                self.separate(*firing)?;
                writeln!(
                    self.writer,
                    "+ {} into {}",
                    transfer.tokens.iter().join(", "),
                    transfer.place
                )
            }
            SimulationEvent::ClockAdvanced { from, to } => {
                writeln!(self.writer, "Clock advanced from {} to {}", from, to)
            }
            SimulationEvent::Finished { outcome, .. } => {
                writeln!(self.writer, "----------")?;
                writeln!(self.writer, "{}", outcome)?;
                self.writer.flush()
            }
        }
    }
}

impl<W: Write + Send> Observer for ConsoleLog<W> {
    fn notify(&mut self, event: &SimulationEvent) {
        if let Err(err) = self.write_event(event) {
            warn!("Failed to write firing log: {}", err);
        }
    }
}
