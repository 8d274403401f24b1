//! Simulated environment with a manual clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use roomlink_core::Environment;

/// Wall clock at simulation start (2024-01-01T00:00:00Z).
const DEFAULT_START_MILLIS: u64 = 1_704_067_200_000;

/// Environment whose time only moves when the test advances it.
///
/// Clones share one clock, so every session in a simulation observes the
/// same time. Instants are the elapsed time since the simulation started.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed_millis: Arc<AtomicU64>,
    start_millis: u64,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Clock at zero, wall clock at 2024-01-01.
    pub fn new() -> Self {
        Self::starting_at(DEFAULT_START_MILLIS)
    }

    /// Clock at zero with the given wall-clock start.
    pub fn starting_at(start_millis: u64) -> Self {
        Self { elapsed_millis: Arc::new(AtomicU64::new(0)), start_millis }
    }

    /// Advance simulated time.
    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Time since the simulation started.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_millis.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.elapsed()
    }

    fn unix_millis(&self) -> u64 {
        self.start_millis.saturating_add(self.elapsed_millis.load(Ordering::SeqCst))
    }
}
