//! Deterministic simulation harness for roomlink.
//!
//! In-memory implementations of the server, the I/O driver and the clock, so
//! sessions and the client runtime can be exercised end to end without
//! sockets or wall-clock time.
//!
//! # Components
//!
//! - [`SimEnv`]: manual clock shared by every participant
//! - [`SimServer`]: authoritative room server with seeded chaos delivery
//! - [`SimCluster`]: several sessions wired to one [`SimServer`]
//! - [`SimDriver`]: scripted [`roomlink_client::Driver`] for the runtime
//! - [`RecordingObserver`]: observer that records every notification
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties against a
//! [`SessionSnapshot`]. Use [`InvariantRegistry::standard()`] for the common
//! set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod invariants;
pub mod recording;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use cluster::{SimClient, SimCluster};
pub use invariants::{
    CurrentRoomKnown, Invariant, InvariantRegistry, InvariantResult, RostersInDirectory,
    SessionSnapshot, StreamRoomsKnown, UniqueRoomIds, Violation,
};
pub use recording::{Notification, RecordingObserver};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::SimEnv;
pub use sim_server::{ChaosConfig, ClientId, SimServer};
