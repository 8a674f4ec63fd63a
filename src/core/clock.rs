//! Simulation clock.
//!
//! The game owns its clock instead of reading an ambient global: a start
//! instant plus an integer time factor. The factor exists so tests can
//! run simulated time faster than wall-clock time.

use std::time::Instant;

/// Game-owned clock: wall-clock elapsed time scaled by an integer factor.
#[derive(Clone, Debug)]
pub struct GameClock {
    start: Instant,
    time_factor: u64,
}

impl GameClock {
    /// Start a clock at the current instant with factor 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            time_factor: 1,
        }
    }

    /// Milliseconds of simulation time since the clock started.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64 * self.time_factor
    }

    /// Current time-dilation factor.
    #[must_use]
    pub fn time_factor(&self) -> u64 {
        self.time_factor
    }

    /// Set the time-dilation factor (1 = real time).
    pub fn set_time_factor(&mut self, factor: u64) {
        self.time_factor = factor;
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}
