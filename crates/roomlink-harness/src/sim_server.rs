//! In-memory room server for simulation.
//!
//! `SimServer` is the authority a session talks to in tests: it keeps the
//! room list and per-room membership, answers `join` with the room's roster
//! and relays chat traffic to every member of the room, the sender included.
//! Tests drive it explicitly; nothing runs in the background.
//!
//! Delivery is per-client outboxes drained with [`SimServer::take_outbound`].
//! With a [`ChaosConfig`] the drain reorders file chunks among themselves and
//! duplicates some of them, driven by a seeded RNG so failures replay.

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
};

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use roomlink_proto::{
    Payload,
    payloads::room::{
        JoinRequest, ParticipantEntry, ParticipantInfo, RoomEntry, RoomInfo, RosterUpdate,
    },
};
use tracing::{debug, trace, warn};

/// Server-side connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Seeded delivery faults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosConfig {
    /// RNG seed.
    pub seed: u64,
    /// Probability that a relayed chunk is delivered twice.
    pub duplicate_probability: f64,
    /// Shuffle chunks within each drained batch.
    pub reorder_chunks: bool,
}

impl ChaosConfig {
    /// Reordering plus a 25% chunk duplication rate.
    pub fn new(seed: u64) -> Self {
        Self { seed, duplicate_probability: 0.25, reorder_chunks: true }
    }
}

struct Chaos {
    config: ChaosConfig,
    rng: ChaCha8Rng,
}

#[derive(Default)]
struct ClientState {
    name: Option<String>,
    room: Option<String>,
    connected: bool,
    outbox: VecDeque<Payload>,
}

/// Simulated chat server.
pub struct SimServer {
    rooms: Vec<RoomInfo>,
    clients: BTreeMap<ClientId, ClientState>,
    next_client_id: u64,
    chaos: Option<Chaos>,
}

impl SimServer {
    /// Server hosting the given rooms, in listing order.
    pub fn new<S: Into<String>>(rooms: impl IntoIterator<Item = S>) -> Self {
        let rooms = rooms.into_iter().map(RoomInfo::named).collect();
        Self { rooms, clients: BTreeMap::new(), next_client_id: 1, chaos: None }
    }

    /// Enable seeded delivery faults.
    #[must_use]
    pub fn with_chaos(mut self, config: ChaosConfig) -> Self {
        self.chaos = Some(Chaos { config, rng: ChaCha8Rng::seed_from_u64(config.seed) });
        self
    }

    /// Accept a new connection. The client is sent the room list.
    pub fn connect(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        self.clients.insert(id, ClientState::default());
        self.reconnect(id);
        id
    }

    /// Re-accept a known client. Membership starts empty until it joins.
    pub fn reconnect(&mut self, id: ClientId) {
        let snapshot = self.rooms.iter().cloned().map(RoomEntry::Info).collect();
        let client = self.clients.entry(id).or_default();
        client.connected = true;
        client.room = None;
        client.outbox.push_back(Payload::ActiveRooms(snapshot));
        debug!(%id, "client connected");
    }

    /// Drop a connection. Its room's roster is re-broadcast.
    pub fn disconnect(&mut self, id: ClientId) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        client.connected = false;
        client.outbox.clear();
        let left = client.room.take();
        debug!(%id, "client disconnected");
        if let Some(room) = left {
            self.broadcast_roster(&room);
        }
    }

    /// Process one payload from a client.
    pub fn receive(&mut self, from: ClientId, payload: Payload) {
        if !self.is_connected(from) {
            warn!(%from, kind = ?payload.kind(), "payload from disconnected client");
            return;
        }

        match payload {
            Payload::Join(JoinRequest { name, room }) => self.join(from, name, room),
            Payload::LeaveRoom(room) => self.leave(from, &room),
            Payload::CreateRoom(name) => self.create_room(&name),
            Payload::ChatMessage(message) => {
                let room = message.room.clone();
                self.relay(&room, &Payload::ChatMessage(message));
            },
            Payload::FileChunk(chunk) => {
                let room = chunk.room_id.clone();
                self.relay(&room, &Payload::FileChunk(chunk));
            },
            other => warn!(%from, kind = ?other.kind(), "server-only payload from client"),
        }
    }

    /// Close a room: members are evicted and every client is told.
    pub fn close_room(&mut self, room_id: &str) -> bool {
        let before = self.rooms.len();
        self.rooms.retain(|room| room.id != room_id);
        if self.rooms.len() == before {
            return false;
        }

        for client in self.clients.values_mut().filter(|client| client.connected) {
            if client.room.as_deref() == Some(room_id) {
                client.room = None;
            }
            client.outbox.push_back(Payload::RoomClosed(room_id.to_string()));
        }
        debug!(room_id, "room closed");
        true
    }

    /// Push an arbitrary payload to one client.
    pub fn push(&mut self, to: ClientId, payload: Payload) {
        if let Some(client) = self.clients.get_mut(&to) {
            client.outbox.push_back(payload);
        }
    }

    /// Drain a client's outbox, applying chaos if configured.
    ///
    /// Non-chunk payloads keep their relative order; chunks may be shuffled
    /// among the slots chunks occupied and some may be repeated.
    pub fn take_outbound(&mut self, id: ClientId) -> Vec<Payload> {
        let Some(client) = self.clients.get_mut(&id) else {
            return Vec::new();
        };
        let batch: Vec<Payload> = client.outbox.drain(..).collect();

        match &mut self.chaos {
            Some(chaos) => chaos.apply(batch),
            None => batch,
        }
    }

    /// Whether any connected client has undelivered payloads.
    pub fn has_pending(&self) -> bool {
        self.clients.values().any(|client| client.connected && !client.outbox.is_empty())
    }

    /// Listed room ids.
    pub fn room_ids(&self) -> Vec<&str> {
        self.rooms.iter().map(|room| room.id.as_str()).collect()
    }

    /// Room a client is currently in.
    pub fn room_of(&self, id: ClientId) -> Option<&str> {
        self.clients.get(&id).and_then(|client| client.room.as_deref())
    }

    /// Names of the members of a room, in client id order.
    pub fn members(&self, room_id: &str) -> Vec<&str> {
        self.clients
            .values()
            .filter(|client| client.connected && client.room.as_deref() == Some(room_id))
            .filter_map(|client| client.name.as_deref())
            .collect()
    }

    /// Whether a client is connected.
    pub fn is_connected(&self, id: ClientId) -> bool {
        self.clients.get(&id).is_some_and(|client| client.connected)
    }

    fn join(&mut self, id: ClientId, name: String, room: String) {
        if !self.rooms.iter().any(|listed| listed.id == room) {
            warn!(%id, %room, "join for unknown room");
            return;
        }

        let previous = self.clients.get_mut(&id).and_then(|client| {
            client.name = Some(name);
            client.room.replace(room.clone())
        });
        trace!(%id, %room, "joined");

        if let Some(previous) = previous.filter(|previous| *previous != room) {
            self.broadcast_roster(&previous);
        }
        self.broadcast_roster(&room);
    }

    fn leave(&mut self, id: ClientId, room: &str) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        if client.room.as_deref() != Some(room) {
            return;
        }
        client.room = None;
        self.broadcast_roster(room);
    }

    fn create_room(&mut self, name: &str) {
        if self.rooms.iter().any(|room| room.id == name) {
            debug!(name, "room already exists");
            return;
        }

        let info = RoomInfo::named(name);
        self.rooms.push(info.clone());
        for client in self.clients.values_mut().filter(|client| client.connected) {
            client.outbox.push_back(Payload::NewRoom(info.clone()));
        }
    }

    fn relay(&mut self, room_id: &str, payload: &Payload) {
        for client in self.clients.values_mut() {
            if client.connected && client.room.as_deref() == Some(room_id) {
                client.outbox.push_back(payload.clone());
            }
        }
    }

    fn broadcast_roster(&mut self, room_id: &str) {
        let users = self
            .clients
            .iter()
            .filter(|(_, client)| client.connected && client.room.as_deref() == Some(room_id))
            .filter_map(|(id, client)| {
                let name = client.name.clone()?;
                Some(ParticipantEntry::Info(ParticipantInfo { id: id.to_string(), name }))
            })
            .collect();

        let update = Payload::ActiveUsers(RosterUpdate { room: room_id.to_string(), users });
        self.relay(room_id, &update);
    }
}

impl Chaos {
    fn apply(&mut self, batch: Vec<Payload>) -> Vec<Payload> {
        let mut slots = Vec::with_capacity(batch.len());
        let mut chunks = Vec::new();
        for payload in batch {
            if matches!(payload, Payload::FileChunk(_)) {
                if self.rng.gen_bool(self.config.duplicate_probability) {
                    chunks.push(payload.clone());
                    slots.push(None);
                }
                chunks.push(payload);
                slots.push(None);
            } else {
                slots.push(Some(payload));
            }
        }

        if self.config.reorder_chunks {
            chunks.shuffle(&mut self.rng);
        }

        let mut chunks = chunks.into_iter();
        slots.into_iter().filter_map(|slot| slot.or_else(|| chunks.next())).collect()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use roomlink_proto::payloads::chat::{FileChunk, TextMessage};

    use super::*;

    fn join(server: &mut SimServer, name: &str, room: &str) -> ClientId {
        let id = server.connect();
        server.receive(id, Payload::Join(JoinRequest { name: name.into(), room: room.into() }));
        id
    }

    fn chunk(index: u32) -> Payload {
        Payload::FileChunk(FileChunk {
            file_name: "a.bin".to_string(),
            chunk: Bytes::from(vec![u8::try_from(index).unwrap_or(0)]),
            chunk_index: index,
            total_chunks: 8,
            room_id: "general".to_string(),
            sender: "ada".to_string(),
        })
    }

    #[test]
    fn connect_sends_room_list() {
        let mut server = SimServer::new(["general", "random"]);
        let id = server.connect();

        let outbound = server.take_outbound(id);
        let Some(Payload::ActiveRooms(rooms)) = outbound.first() else {
            unreachable!("expected active rooms, got {outbound:?}");
        };
        assert_eq!(rooms.len(), 2);
    }

    #[test]
    fn join_broadcasts_roster_to_room() {
        let mut server = SimServer::new(["general"]);
        let ada = join(&mut server, "ada", "general");
        let bob = join(&mut server, "bob", "general");

        assert_eq!(server.members("general"), vec!["ada", "bob"]);
        let to_ada = server.take_outbound(ada);
        let Some(Payload::ActiveUsers(update)) = to_ada.last() else {
            unreachable!("expected roster, got {to_ada:?}");
        };
        assert_eq!(update.users.len(), 2);
        assert!(!server.take_outbound(bob).is_empty());
    }

    #[test]
    fn chat_is_relayed_to_room_only() {
        let mut server = SimServer::new(["general", "random"]);
        let ada = join(&mut server, "ada", "general");
        let bob = join(&mut server, "bob", "random");
        server.take_outbound(ada);
        server.take_outbound(bob);

        let message = TextMessage {
            id: 1,
            sender: "ada".into(),
            room: "general".into(),
            timestamp: 0,
            text: "hi".into(),
        };
        server.receive(ada, Payload::ChatMessage(message));

        assert_eq!(server.take_outbound(ada).len(), 1);
        assert!(server.take_outbound(bob).is_empty());
    }

    #[test]
    fn close_room_evicts_members() {
        let mut server = SimServer::new(["general", "random"]);
        let ada = join(&mut server, "ada", "random");

        assert!(server.close_room("random"));
        assert!(!server.close_room("random"));
        assert_eq!(server.room_of(ada), None);
        assert_eq!(server.room_ids(), vec!["general"]);
    }

    #[test]
    fn chaos_keeps_non_chunk_order() {
        let mut server = SimServer::new(["general"]).with_chaos(ChaosConfig::new(7));
        let ada = join(&mut server, "ada", "general");
        server.take_outbound(ada);

        server.push(ada, Payload::RoomClosed("x".into()));
        for index in 0..8 {
            server.push(ada, chunk(index));
        }
        server.push(ada, Payload::RoomClosed("y".into()));

        let outbound = server.take_outbound(ada);
        assert!(outbound.len() >= 10);
        assert_eq!(outbound.first(), Some(&Payload::RoomClosed("x".into())));
        assert_eq!(outbound.last(), Some(&Payload::RoomClosed("y".into())));
        for index in 0..8 {
            assert!(outbound.contains(&chunk(index)));
        }
    }

    #[test]
    fn chaos_is_deterministic_per_seed() {
        let run = |seed| {
            let mut server = SimServer::new(["general"]).with_chaos(ChaosConfig::new(seed));
            let id = server.connect();
            server.take_outbound(id);
            for index in 0..8 {
                server.push(id, chunk(index));
            }
            server.take_outbound(id)
        };

        assert_eq!(run(42), run(42));
    }
}
