//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`roomlink_client::Runtime`] orchestration code runs in both production
//! and simulation.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use roomlink_client::{Driver, DriverInput, UiCommand};
use roomlink_proto::{Frame, Payload};
use thiserror::Error;

use crate::SimEnv;

/// Scripted driver failure.
#[derive(Debug, Clone, Error)]
#[error("sim driver: {0}")]
pub struct SimDriverError(pub String);

/// Shared state for input injection.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    inputs: VecDeque<DriverInput>,
    outgoing_frames: Vec<Frame>,
    connected: bool,
    refuse_connect: Option<String>,
    input_failure: Option<String>,
    connect_attempts: usize,
}

/// Simulation driver for deterministic testing.
///
/// Inputs are consumed in injection order. Once the queue runs dry the driver
/// reports [`UiCommand::Quit`], so a scripted run always terminates. Clones
/// share one queue, so a test can keep a handle after moving the driver into
/// a runtime.
#[derive(Clone, Default)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    env: SimEnv,
}

impl SimDriver {
    /// Create a driver reading time from `env`.
    pub fn new(env: SimEnv) -> Self {
        Self { state: Arc::default(), env }
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject a user command.
    pub fn inject_command(&self, command: UiCommand) {
        self.state().inputs.push_back(DriverInput::Command(command));
    }

    /// Inject a frame from the server.
    pub fn inject_frame(&self, frame: Frame) {
        self.state().inputs.push_back(DriverInput::Frame(frame));
    }

    /// Encode and inject a payload from the server.
    ///
    /// # Errors
    ///
    /// Returns the encoding error if the payload cannot be framed.
    pub fn inject_payload(&self, payload: Payload) -> roomlink_proto::Result<()> {
        let frame = payload.into_frame()?;
        self.inject_frame(frame);
        Ok(())
    }

    /// Inject a tick event.
    pub fn inject_tick(&self) {
        self.state().inputs.push_back(DriverInput::Tick);
    }

    /// Inject a transport close.
    pub fn inject_close(&self, reason: impl Into<String>) {
        self.state().inputs.push_back(DriverInput::Closed { reason: reason.into() });
    }

    /// Fail the input source once the queued inputs run out.
    pub fn fail_input(&self, reason: impl Into<String>) {
        self.state().input_failure = Some(reason.into());
    }

    /// Make subsequent connection attempts fail.
    pub fn refuse_connect(&self, reason: impl Into<String>) {
        self.state().refuse_connect = Some(reason.into());
    }

    /// Let subsequent connection attempts succeed.
    pub fn accept_connect(&self) {
        self.state().refuse_connect = None;
    }

    /// Number of connection attempts so far.
    pub fn connect_attempts(&self) -> usize {
        self.state().connect_attempts
    }

    /// Take all captured outgoing frames.
    pub fn take_outgoing(&self) -> Vec<Frame> {
        std::mem::take(&mut self.state().outgoing_frames)
    }

    /// Take all captured outgoing frames, decoded.
    ///
    /// Frames that fail to decode are skipped.
    pub fn take_outgoing_payloads(&self) -> Vec<Payload> {
        self.take_outgoing().iter().filter_map(|frame| Payload::from_frame(frame).ok()).collect()
    }

    /// Check if there are queued inputs.
    pub fn has_pending(&self) -> bool {
        !self.state().inputs.is_empty()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = Duration;

    async fn connect(&mut self, addr: &str) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.connect_attempts += 1;
        if let Some(reason) = &state.refuse_connect {
            return Err(SimDriverError(format!("{addr}: {reason}")));
        }
        state.connected = true;
        Ok(())
    }

    async fn next_input(&mut self) -> Result<DriverInput, Self::Error> {
        let mut state = self.state();
        if let Some(input) = state.inputs.pop_front() {
            return Ok(input);
        }
        match state.input_failure.take() {
            Some(reason) => Err(SimDriverError(reason)),
            None => Ok(DriverInput::Command(UiCommand::Quit)),
        }
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let mut state = self.state();
        if !state.connected {
            return Err(SimDriverError("not connected".to_string()));
        }
        state.outgoing_frames.push(frame);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }

    fn now(&self) -> Self::Instant {
        self.env.elapsed()
    }

    fn stop(&mut self) {
        self.state().connected = false;
    }
}
