//! Generic runtime for session orchestration.
//!
//! The runtime drives the session event loop, coordinating between:
//! - [`Session`]: Sans-IO protocol state
//! - [`Driver`]: platform-specific I/O
//! - [`SessionObserver`]: presentation-layer callbacks
//! - [`PreferenceStore`]: remembered settings

use roomlink_core::{Environment, Session, SessionAction, SessionEvent};
use roomlink_proto::{Frame, Payload};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{Driver, DriverInput, LAST_ROOM_KEY, PreferenceStore, SessionObserver, UiCommand};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// Could not establish the connection.
    #[error("connect failed: {0}")]
    Connect(#[source] E),

    /// The connection dropped while running.
    #[error("connectivity lost: {reason}")]
    ConnectivityLost {
        /// Human-readable cause.
        reason: String,
    },

    /// The driver's input source failed.
    #[error("driver error: {0}")]
    Driver(#[source] E),
}

impl<E: std::error::Error + 'static> RuntimeError<E> {
    /// Returns true if reconnecting may help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::ConnectivityLost { .. })
    }
}

/// Generic runtime that orchestrates a session over a driver.
///
/// The session outlives individual connections: calling [`Runtime::run`]
/// again after a connectivity loss reconnects and the session re-joins its
/// current room, or replays a room switch made while offline.
///
/// # Type Parameters
///
/// - `D`: platform-specific I/O driver
/// - `E`: environment supplying clocks to the session
/// - `O`: observer receiving change notifications
/// - `P`: preference store
pub struct Runtime<D, E, O, P>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: Session<E>,
    observer: O,
    preferences: P,
    server_addr: String,
}

impl<D, E, O, P> Runtime<D, E, O, P>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
    O: SessionObserver,
    P: PreferenceStore,
{
    /// Create a runtime around an existing session.
    pub fn new(
        driver: D,
        session: Session<E>,
        observer: O,
        preferences: P,
        server_addr: String,
    ) -> Self {
        Self { driver, session, observer, preferences, server_addr }
    }

    /// Connect and run the event loop until the user quits.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Connect`] if the connection cannot be made,
    /// [`RuntimeError::ConnectivityLost`] if it drops, and
    /// [`RuntimeError::Driver`] if the input source fails. Retry policy is the
    /// caller's.
    pub async fn run(&mut self) -> Result<(), RuntimeError<D::Error>> {
        self.driver.connect(&self.server_addr).await.map_err(RuntimeError::Connect)?;
        info!(server = %self.server_addr, "connected");
        self.dispatch(SessionEvent::Connected).await?;

        loop {
            let input = match self.driver.next_input().await {
                Ok(input) => input,
                Err(error) => {
                    for action in self.disconnect(&error.to_string()) {
                        self.notify(action);
                    }
                    return Err(RuntimeError::Driver(error));
                },
            };

            match input {
                DriverInput::Command(UiCommand::Quit) => {
                    info!("quit requested");
                    // Leaving on purpose is not a connectivity loss.
                    self.disconnect("client quit");
                    return Ok(());
                },
                DriverInput::Command(command) => self.handle_command(command).await?,
                DriverInput::Frame(frame) => self.handle_frame(&frame).await?,
                DriverInput::Tick => {
                    let now = self.driver.now();
                    self.dispatch(SessionEvent::Tick { now }).await?;
                },
                DriverInput::Closed { reason } => return Err(self.lose_connection(reason)),
            }
        }
    }

    /// The session.
    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The preference store.
    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    async fn handle_command(&mut self, command: UiCommand) -> Result<(), RuntimeError<D::Error>> {
        let Some(event) = command.into_session_event() else {
            return Ok(());
        };
        match self.session.handle(event) {
            Ok(actions) => self.execute(actions).await,
            Err(error) => {
                warn!(%error, "command rejected");
                self.observer.on_command_rejected(&error);
                Ok(())
            },
        }
    }

    async fn handle_frame(&mut self, frame: &Frame) -> Result<(), RuntimeError<D::Error>> {
        match Payload::from_frame(frame) {
            Ok(payload) => self.dispatch(SessionEvent::Received(payload)).await,
            Err(error) => {
                warn!(%error, event = frame.header.event_code(), "dropping undecodable frame");
                Ok(())
            },
        }
    }

    async fn dispatch(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<(), RuntimeError<D::Error>> {
        match self.session.handle(event) {
            Ok(actions) => self.execute(actions).await,
            Err(error) => {
                warn!(%error, "session rejected event");
                Ok(())
            },
        }
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), RuntimeError<D::Error>> {
        for action in actions {
            match action {
                SessionAction::Send(payload) => self.send(payload).await?,
                other => self.notify(other),
            }
        }
        Ok(())
    }

    async fn send(&mut self, payload: Payload) -> Result<(), RuntimeError<D::Error>> {
        let kind = payload.kind();
        let frame = match payload.into_frame() {
            Ok(frame) => frame,
            Err(error) => {
                error!(%error, %kind, "failed to encode outbound payload");
                return Ok(());
            },
        };

        debug!(%kind, "sending");
        if let Err(error) = self.driver.send_frame(frame).await {
            return Err(self.lose_connection(error.to_string()));
        }
        Ok(())
    }

    fn notify(&mut self, action: SessionAction) {
        match action {
            SessionAction::Send(payload) => {
                warn!(kind = %payload.kind(), "send action reached notify");
            },
            SessionAction::RoomsChanged => self.observer.on_rooms_changed(self.session.rooms()),
            SessionAction::RosterChanged { room_id } => {
                self.observer.on_roster_changed(&room_id, self.session.presence().roster(&room_id));
            },
            SessionAction::MessageAppended(event) => self.observer.on_message(&event),
            SessionAction::TransferProgress { file_name, progress } => {
                self.observer.on_transfer_progress(&file_name, progress);
            },
            SessionAction::CurrentRoomChanged { room_id } => {
                if let Err(error) = self.preferences.persist(LAST_ROOM_KEY, &room_id) {
                    warn!(%error, "failed to remember room");
                }
                self.observer.on_current_room_changed(&room_id);
            },
            SessionAction::ConnectivityLost { reason } => {
                self.observer.on_connectivity_lost(&reason);
            },
        }
    }

    /// Stop the driver and tell the session the transport is gone, so the
    /// next [`Runtime::run`] starts from a disconnected session.
    fn disconnect(&mut self, reason: &str) -> Vec<SessionAction> {
        self.driver.stop();
        match self.session.handle(SessionEvent::Disconnected { reason: reason.to_string() }) {
            Ok(actions) => actions,
            Err(error) => {
                warn!(%error, "session rejected disconnect");
                Vec::new()
            },
        }
    }

    fn lose_connection(&mut self, reason: String) -> RuntimeError<D::Error> {
        for action in self.disconnect(&reason) {
            self.notify(action);
        }
        RuntimeError::ConnectivityLost { reason }
    }
}
