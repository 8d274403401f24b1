//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from specific I/O
//! implementations. Each frontend implements it to provide platform-specific
//! I/O, while the generic [`crate::Runtime`] handles all orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use roomlink_proto::Frame;

use crate::UiCommand;

/// One unit of input for the runtime.
#[derive(Debug, Clone)]
pub enum DriverInput {
    /// User intent.
    Command(UiCommand),
    /// Frame from the server.
    Frame(Frame),
    /// Periodic housekeeping tick.
    Tick,
    /// The transport closed.
    Closed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **Terminal**: stdin lines for commands, QUIC for transport
/// - **Simulation**: injected inputs and captured frames
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Establish a connection to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, addr: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Wait for the next input.
    ///
    /// Implementations multiplex user commands, inbound frames and ticks, and
    /// report [`DriverInput::Closed`] once when the transport goes away.
    ///
    /// # Errors
    ///
    /// Returns an error if the input source fails.
    fn next_input(&mut self) -> impl Future<Output = Result<DriverInput, Self::Error>> + Send;

    /// Send a frame to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the send fails.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Check if connected to the server.
    fn is_connected(&self) -> bool;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
