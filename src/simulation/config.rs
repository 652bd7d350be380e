use std::time::Duration;

use serde::Serialize;

/// How the driver treats time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TimeMode {
    /// Every firing happens at clock 0; timed tokens are only available
    /// once their timestamp is 0, i.e. never.
    #[default]
    Untimed,
    /// Discrete-event simulation: the clock jumps to the next pending token
    /// timestamp whenever nothing is enabled.
    Timed,
}

/// Driver settings.
///
/// ```
/// use petrisim::simulation::{SimulationConfig, TimeMode};
/// use std::time::Duration;
///
/// let config = SimulationConfig::default()
///     .with_mode(TimeMode::Timed)
///     .with_seed(42)
///     .with_delay(Duration::from_millis(10));
/// assert_eq!(config.seed, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub mode: TimeMode,
    /// Suspend after every firing until resumed.
    pub step: bool,
    /// Pause between firings when not stepping.
    pub delay: Duration,
    /// Seed of the transition selection; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Stop after this many firings.
    pub max_firings: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: TimeMode::Untimed,
            step: false,
            delay: Duration::ZERO,
            seed: None,
            max_firings: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_mode(mut self, mode: TimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_step(mut self, step: bool) -> Self {
        self.step = step;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_firings(mut self, max_firings: u64) -> Self {
        self.max_firings = Some(max_firings);
        self
    }
}
