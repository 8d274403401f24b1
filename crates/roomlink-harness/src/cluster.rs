//! Several sessions wired to one simulated server.
//!
//! Every payload crosses the real frame codec in both directions, so the
//! cluster exercises encoding, the server model and session logic together
//! without sockets. Delivery is explicit: [`SimCluster::deliver_all`] pumps
//! server outboxes into sessions until nothing is left in flight.

use std::time::Duration;

use roomlink_core::{Session, SessionAction, SessionConfig, SessionError, SessionEvent};
use roomlink_proto::{Frame, Payload};
use tracing::warn;

use crate::{
    ChaosConfig, ClientId, InvariantRegistry, SessionSnapshot, SimEnv, SimServer, Violation,
};

/// Upper bound on delivery rounds, guarding against relay loops.
const MAX_ROUNDS: usize = 1_000;

/// One simulated participant.
pub struct SimClient {
    /// Server-side connection id.
    pub id: ClientId,
    /// The participant's session.
    pub session: Session<SimEnv>,
    /// Every action the session emitted, in order.
    pub actions: Vec<SessionAction>,
}

/// Simulated cluster of sessions sharing one server and one clock.
pub struct SimCluster {
    env: SimEnv,
    server: SimServer,
    clients: Vec<SimClient>,
    invariants: InvariantRegistry,
}

impl SimCluster {
    /// Cluster whose server hosts `rooms`.
    pub fn new<S: Into<String>>(rooms: impl IntoIterator<Item = S>) -> Self {
        Self::with_server(SimServer::new(rooms))
    }

    /// Cluster whose server hosts `rooms` and delivers with seeded chaos.
    pub fn with_chaos<S: Into<String>>(
        rooms: impl IntoIterator<Item = S>,
        chaos: ChaosConfig,
    ) -> Self {
        Self::with_server(SimServer::new(rooms).with_chaos(chaos))
    }

    fn with_server(server: SimServer) -> Self {
        Self {
            env: SimEnv::new(),
            server,
            clients: Vec::new(),
            invariants: InvariantRegistry::standard(),
        }
    }

    /// Connect a participant with default settings and return its index.
    pub fn add_client(&mut self, name: &str, initial_room: &str) -> usize {
        self.add_client_with(SessionConfig::new(name, initial_room))
    }

    /// Connect a participant with explicit settings and return its index.
    pub fn add_client_with(&mut self, config: SessionConfig) -> usize {
        let id = self.server.connect();
        let session = Session::new(self.env.clone(), config);
        self.clients.push(SimClient { id, session, actions: Vec::new() });

        let index = self.clients.len() - 1;
        self.feed(index, SessionEvent::Connected);
        index
    }

    /// Run a user command on one client and route what it sends.
    ///
    /// # Errors
    ///
    /// Returns the session's rejection; nothing is sent in that case.
    pub fn command(
        &mut self,
        index: usize,
        event: SessionEvent<Duration>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let actions = self.clients[index].session.handle(event)?;
        self.route(index, &actions);
        Ok(actions)
    }

    /// Pump server outboxes into sessions until quiescent.
    ///
    /// Returns the number of payloads delivered.
    pub fn deliver_all(&mut self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_ROUNDS {
            if !self.server.has_pending() {
                break;
            }
            for index in 0..self.clients.len() {
                let id = self.clients[index].id;
                for payload in self.server.take_outbound(id) {
                    if let Some(payload) = through_codec(payload) {
                        self.feed(index, SessionEvent::Received(payload));
                        delivered += 1;
                    }
                }
            }
        }
        delivered
    }

    /// Drop one client's connection on both ends.
    pub fn disconnect(&mut self, index: usize, reason: &str) {
        self.server.disconnect(self.clients[index].id);
        self.feed(index, SessionEvent::Disconnected { reason: reason.to_string() });
    }

    /// Re-establish one client's connection.
    pub fn reconnect(&mut self, index: usize) {
        self.server.reconnect(self.clients[index].id);
        self.feed(index, SessionEvent::Connected);
    }

    /// Close a room on the server.
    pub fn close_room(&mut self, room_id: &str) -> bool {
        self.server.close_room(room_id)
    }

    /// Advance the shared clock and tick every session.
    pub fn advance(&mut self, by: Duration) {
        self.env.advance(by);
        let now = self.env.elapsed();
        for index in 0..self.clients.len() {
            self.feed(index, SessionEvent::Tick { now });
        }
    }

    /// One client's session.
    pub fn session(&self, index: usize) -> &Session<SimEnv> {
        &self.clients[index].session
    }

    /// One client.
    pub fn client(&self, index: usize) -> &SimClient {
        &self.clients[index]
    }

    /// Mutable access to one client, for draining recorded actions.
    pub fn client_mut(&mut self, index: usize) -> &mut SimClient {
        &mut self.clients[index]
    }

    /// The server.
    pub fn server(&self) -> &SimServer {
        &self.server
    }

    /// Mutable access to the server, for injecting raw payloads.
    pub fn server_mut(&mut self) -> &mut SimServer {
        &mut self.server
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the cluster has no clients.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Check the standard invariants on every session.
    ///
    /// # Errors
    ///
    /// Returns every violation found, across all clients.
    pub fn check_invariants(&self) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> = self
            .clients
            .iter()
            .filter_map(|client| {
                self.invariants.check_all(&SessionSnapshot::from_session(&client.session)).err()
            })
            .flatten()
            .collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Assert the standard invariants on every session.
    pub fn assert_invariants(&self, context: &str) {
        for client in &self.clients {
            let snapshot = SessionSnapshot::from_session(&client.session);
            self.invariants.assert_all(&snapshot, &format!("{context} ({})", client.id));
        }
    }

    fn feed(&mut self, index: usize, event: SessionEvent<Duration>) {
        match self.clients[index].session.handle(event) {
            Ok(actions) => self.route(index, &actions),
            Err(error) => warn!(%error, "session rejected event"),
        }
    }

    fn route(&mut self, index: usize, actions: &[SessionAction]) {
        let id = self.clients[index].id;
        for action in actions {
            if let SessionAction::Send(payload) = action {
                if let Some(payload) = through_codec(payload.clone()) {
                    self.server.receive(id, payload);
                }
            }
        }
        self.clients[index].actions.extend_from_slice(actions);
    }
}

fn through_codec(payload: Payload) -> Option<Payload> {
    let frame = payload.into_frame().inspect_err(|error| warn!(%error, "encode failed")).ok()?;
    let mut wire = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut wire).inspect_err(|error| warn!(%error, "frame encode failed")).ok()?;

    let frame =
        Frame::decode(&wire).inspect_err(|error| warn!(%error, "frame decode failed")).ok()?;
    Payload::from_frame(&frame).inspect_err(|error| warn!(%error, "decode failed")).ok()
}
