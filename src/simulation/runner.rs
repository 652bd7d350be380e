use std::io;
use std::thread::{self, JoinHandle};

use log::error;

use super::{RunReport, Simulation, SimulationControl};
use crate::error::SimulationError;

/// A simulation running on its own thread.
///
/// The handle carries the [`SimulationControl`] of the run; dropping the
/// handle without joining detaches the thread.
pub struct SimulationHandle {
    control: SimulationControl,
    thread: JoinHandle<(Result<RunReport, SimulationError>, Simulation)>,
}

impl SimulationHandle {
    pub fn spawn(mut simulation: Simulation) -> io::Result<Self> {
        let control = SimulationControl::new();
        control.set_step(simulation.config().step);

        let name = format!("simulate-{}", simulation.net().identity.id);
        let thread = {
            let control = control.clone();
            thread::Builder::new().name(name).spawn(move || {
                let result = simulation.run(&control);
                if let Err(err) = &result {
                    error!("Simulation aborted: {}", err);
                }
                (result, simulation)
            })?
        };

        Ok(Self { control, thread })
    }

    pub fn control(&self) -> &SimulationControl {
        &self.control
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the run to end and hands the simulation back.
    pub fn join(self) -> Result<(RunReport, Simulation), SimulationError> {
        let (result, simulation) = self
            .thread
            .join()
            .map_err(|_| SimulationError::DriverPanicked)?;
        Ok((result?, simulation))
    }
}
