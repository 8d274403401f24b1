//! Client runtime for roomlink.
//!
//! Drives a Sans-IO [`roomlink_core::Session`] against real or simulated I/O.
//!
//! # Architecture
//!
//! The [`Runtime`] owns the session and pulls [`DriverInput`]s from a
//! [`Driver`]: user commands, decoded server frames, ticks and transport
//! closure. Session actions are executed by framing outbound payloads onto the
//! driver and forwarding change notifications to a [`SessionObserver`]. The
//! same orchestration code runs in the terminal client and in simulation.
//!
//! # Components
//!
//! - [`Runtime`]: event loop tying driver, session and observer together
//! - [`Driver`]: platform I/O abstraction
//! - [`SessionObserver`]: typed change callbacks for the presentation layer
//! - [`PreferenceStore`]: key/value persistence for the last selected room
//! - [`SystemEnv`]: production [`roomlink_core::Environment`]
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: frame channels over a QUIC connection
//! - [`transport::connect`]: connect to a server
//! - [`transport::ServerTrust`]: pinned root or development certificate policy

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod command;
mod driver;
mod env;
mod observer;
mod preferences;
mod runtime;

#[cfg(feature = "transport")]
pub mod transport;

pub use command::UiCommand;
pub use driver::{Driver, DriverInput};
pub use env::SystemEnv;
pub use observer::SessionObserver;
pub use preferences::{LAST_ROOM_KEY, MemoryPreferences, PreferenceError, PreferenceStore};
pub use runtime::{Runtime, RuntimeError};
