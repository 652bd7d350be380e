//! Run control shared between a driver and its callers.
//!
//! The driver only suspends at one point: right after a firing, before it
//! selects the next transition. [`SimulationControl`] is the handle used to
//! reach that point from another thread.
//!
//! - **step**: when set, the driver pauses itself after every firing.
//! - **pause/resume**: `resume` wakes a paused driver; it is not buffered,
//!   so resuming a running driver has no effect.
//! - **stop**: always wakes the driver, whether it is paused or sleeping
//!   out the inter-firing delay, so a stopped run never hangs.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug)]
struct Shared {
    state: RunState,
    step: bool,
}

/// Cloneable control handle.
#[derive(Debug, Clone)]
pub struct SimulationControl {
    inner: Arc<(Mutex<Shared>, Condvar)>,
}

impl Default for SimulationControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(Shared {
                    state: RunState::Running,
                    step: false,
                }),
                Condvar::new(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RunState {
        self.lock().state
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == RunState::Stopped
    }

    pub fn set_step(&self, step: bool) {
        self.lock().step = step;
    }

    /// Requests a pause at the next checkpoint.
    pub fn pause(&self) {
        let mut shared = self.lock();
        if shared.state == RunState::Running {
            shared.state = RunState::Paused;
            self.inner.1.notify_all();
        }
    }

    /// Wakes a paused driver. Does nothing otherwise.
    pub fn resume(&self) {
        let mut shared = self.lock();
        if shared.state == RunState::Paused {
            shared.state = RunState::Running;
            self.inner.1.notify_all();
        }
    }

    /// Stops the run and wakes the driver wherever it waits.
    pub fn stop(&self) {
        let mut shared = self.lock();
        shared.state = RunState::Stopped;
        self.inner.1.notify_all();
    }

    /// Blocks until the run is no longer [`RunState::Running`] or `timeout`
    /// elapses, returning the state observed last.
    pub fn wait_while_running(&self, timeout: Duration) -> RunState {
        let shared = self.lock();
        let (shared, _) = self
            .inner
            .1
            .wait_timeout_while(shared, timeout, |s| s.state == RunState::Running)
            .unwrap_or_else(PoisonError::into_inner);
        shared.state
    }

    /// Suspension point of the driver, called after every firing.
    ///
    /// Returns `false` once the run has been stopped.
    pub(crate) fn checkpoint(&self, delay: Duration) -> bool {
        let cvar = &self.inner.1;
        let mut shared = self.lock();

        if shared.step && shared.state == RunState::Running {
            shared.state = RunState::Paused;
            cvar.notify_all();
        }

        if !shared.step && !delay.is_zero() && shared.state == RunState::Running {
            shared = cvar
                .wait_timeout_while(shared, delay, |s| s.state == RunState::Running)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        shared = cvar
            .wait_while(shared, |s| s.state == RunState::Paused)
            .unwrap_or_else(PoisonError::into_inner);

        shared.state != RunState::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn resume_is_not_buffered() {
        let control = SimulationControl::new();
        control.resume();
        assert_eq!(control.state(), RunState::Running);
        control.pause();
        assert_eq!(control.state(), RunState::Paused);
        control.resume();
        assert_eq!(control.state(), RunState::Running);
    }

    #[test]
    fn stepping_checkpoint_waits_for_resume() {
        let control = SimulationControl::new();
        control.set_step(true);

        let driver = {
            let control = control.clone();
            thread::spawn(move || control.checkpoint(Duration::ZERO))
        };

        assert_eq!(
            control.wait_while_running(Duration::from_secs(5)),
            RunState::Paused
        );
        control.resume();
        assert!(driver.join().unwrap());
    }

    #[test]
    fn stop_wakes_a_paused_driver() {
        let control = SimulationControl::new();
        control.set_step(true);

        let driver = {
            let control = control.clone();
            thread::spawn(move || control.checkpoint(Duration::ZERO))
        };

        control.wait_while_running(Duration::from_secs(5));
        control.stop();
        assert!(!driver.join().unwrap());
    }

    #[test]
    fn stop_interrupts_the_delay() {
        let control = SimulationControl::new();
        let started = Instant::now();

        let driver = {
            let control = control.clone();
            thread::spawn(move || control.checkpoint(Duration::from_secs(60)))
        };

        thread::sleep(Duration::from_millis(20));
        control.stop();
        assert!(!driver.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
