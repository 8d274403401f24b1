//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system clocks. Simulation supplies a manual
//! clock; production uses real time.

use std::{ops::Sub, time::Duration};

/// Time source for the session core.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context
/// - `unix_millis()` is only used for display timestamps and event ids, so it
///   may jump; the session enforces id monotonicity itself
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`; simulation uses a virtual
    /// instant that only advances when the test says so.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Wall-clock time in milliseconds since the Unix epoch.
    fn unix_millis(&self) -> u64;
}

/// Manual-clock environment for unit tests.
pub mod test_utils {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use super::Environment;

    /// Wall clock reported at zero elapsed time (2024-01-01T00:00:00Z).
    const EPOCH_MILLIS: u64 = 1_704_067_200_000;

    /// Environment whose clock only moves when told to.
    ///
    /// Clones share the clock. Instants are the elapsed time since creation.
    #[derive(Debug, Clone, Default)]
    pub struct MockEnv {
        elapsed_millis: Arc<AtomicU64>,
    }

    impl MockEnv {
        /// Clock at zero.
        pub fn new() -> Self {
            Self::default()
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
            self.elapsed_millis.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Environment for MockEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            Duration::from_millis(self.elapsed_millis.load(Ordering::SeqCst))
        }

        fn unix_millis(&self) -> u64 {
            EPOCH_MILLIS + self.elapsed_millis.load(Ordering::SeqCst)
        }
    }
}
