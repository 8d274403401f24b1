//! Session invariants checked after every simulated step.
//!
//! A [`SessionSnapshot`] captures what a session exposes publicly (current
//! room, directory, rosters, log). Each [`Invariant`] inspects one snapshot
//! and reports a [`Violation`] naming what broke, so a failing chaos run points
//! at the property rather than at a downstream assertion.
//!
//! ```ignore
//! let snapshot = SessionSnapshot::from_session(&session);
//! InvariantRegistry::standard().check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

pub use checks::{CurrentRoomKnown, RostersInDirectory, StreamRoomsKnown, UniqueRoomIds};
pub use snapshot::SessionSnapshot;
use thiserror::Error;

/// Outcome of checking one invariant.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant.
#[derive(Debug, Clone, Error)]
#[error("{invariant}: {message}")]
pub struct Violation {
    /// Which invariant.
    pub invariant: &'static str,
    /// What the snapshot held instead.
    pub message: String,
}

/// A property of a single session snapshot.
pub trait Invariant: Send + Sync {
    /// Short identifier used in reports.
    fn name(&self) -> &'static str;

    /// Inspect `state`.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Ordered set of invariants.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with nothing to check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invariant a session must satisfy at all times: the current room
    /// was once listed, rosters only exist for listed rooms, logged events name
    /// known rooms and directory ids are unique.
    pub fn standard() -> Self {
        Self::new()
            .with(CurrentRoomKnown)
            .with(RostersInDirectory)
            .with(StreamRoomsKnown)
            .with(UniqueRoomIds)
    }

    /// Append `invariant`.
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.invariants.push(Box::new(invariant));
        self
    }

    /// Names in check order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.invariants.iter().map(|invariant| invariant.name())
    }

    /// Check everything, collecting every violation rather than stopping at
    /// the first.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        for invariant in &self.invariants {
            if let Err(violation) = invariant.check(state) {
                violations.push(violation);
            }
        }
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Panic listing every violation. For tests.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        let Err(violations) = self.check_all(state) else { return };
        let report: Vec<String> = violations.iter().map(ToString::to_string).collect();
        panic!("invariants broken {context}:\n  {}", report.join("\n  "));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_checks_in_order() {
        let names: Vec<_> = InvariantRegistry::standard().names().collect();
        assert_eq!(
            names,
            ["current_room_known", "rosters_in_directory", "stream_rooms_known", "unique_room_ids"]
        );
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&SessionSnapshot::default()).is_ok());
    }

    #[test]
    fn every_violation_is_reported() {
        let state = SessionSnapshot {
            current_room: Some("gone".to_string()),
            roster_rooms: ["gone".to_string()].into(),
            ..SessionSnapshot::default()
        };
        let violations = InvariantRegistry::standard().check_all(&state).unwrap_err();
        let broken: Vec<_> = violations.iter().map(|violation| violation.invariant).collect();
        assert_eq!(broken, ["current_room_known", "rosters_in_directory"]);
    }
}
