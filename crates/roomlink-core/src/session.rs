//! Session state machine.
//!
//! Wires the directory, presence tracker, membership controller, message
//! stream and transfer engine behind one [`Session::handle`] entry point.
//!
//! # Flow
//!
//! ```text
//! UI intent / server payload / tick
//!              │
//!              ▼
//!      Session::handle(event)
//!              │
//!              ▼
//!      Vec<SessionAction>  ──► Send(payload) to transport
//!                          ──► change notifications to the UI
//! ```
//!
//! Inbound payloads never fail the call. Anything malformed is dropped,
//! logged and counted in [`SessionStats`]. Commands fail with a
//! [`SessionError`] before touching any state.
//!
//! # Local rooms
//!
//! The directory otherwise only lists rooms the server announced. Two
//! entries are added locally: the initial room at construction, and the
//! fallback room when the current room closes and nothing else is listed.
//! Rosters for unlisted rooms are dropped, so the room being joined has to
//! be listed before the server confirms it. The next snapshot replaces both.

use bytes::Bytes;
use roomlink_proto::{
    Payload,
    payloads::{
        chat::{FileChunk, FileReceived, ProgressUpdate, TextMessage},
        room::{JoinRequest, RoomEntry, RosterUpdate},
    },
};
use tracing::{debug, info, warn};

use crate::{
    ChatEvent, ChunkRejection, FileEvent, MembershipController, MembershipPhase, MembershipStep,
    MessageStream, Participant, PresenceTracker, Room, RoomDirectory, SessionAction, SessionConfig,
    SessionError, SessionEvent, SessionStats, TextEvent,
    env::Environment,
    transfer::{ChunkOutcome, OutboundTransfer, TransferEngine},
};

/// Client session for one participant.
///
/// Owns all local state. Exactly one room is current at a time once the
/// first connect has happened; before that the session only knows the room it
/// intends to join.
pub struct Session<E: Environment> {
    env: E,
    config: SessionConfig,
    connected: bool,
    directory: RoomDirectory,
    presence: PresenceTracker,
    membership: MembershipController,
    stream: MessageStream,
    transfers: TransferEngine<E::Instant>,
    stats: SessionStats,
    last_event_id: u64,
}

impl<E: Environment> Session<E> {
    /// Create a disconnected session.
    ///
    /// The directory starts with the initial room so the first roster for it
    /// is accepted before any snapshot arrives.
    pub fn new(env: E, config: SessionConfig) -> Self {
        let mut directory = RoomDirectory::new();
        directory.announce(Room::named(config.initial_room.clone()));

        Self {
            membership: MembershipController::new(config.initial_room.clone()),
            transfers: TransferEngine::new(config.chunk_size, config.max_chunks_per_transfer),
            env,
            config,
            connected: false,
            directory,
            presence: PresenceTracker::new(),
            stream: MessageStream::new(),
            stats: SessionStats::default(),
            last_event_id: 0,
        }
    }

    /// Process an event and return actions for the caller to execute.
    ///
    /// # Errors
    ///
    /// Only user commands fail: [`SessionError::NotConnected`] when offline,
    /// [`SessionError::RoomNotFound`] for unknown rooms and the empty-input
    /// errors for blank text, names or files. State is unchanged on error.
    pub fn handle(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Connected => Ok(self.handle_connected()),
            SessionEvent::Disconnected { reason } => Ok(self.handle_disconnected(reason)),
            SessionEvent::Received(payload) => Ok(self.handle_payload(payload)),
            SessionEvent::Tick { now } => Ok(self.handle_tick(now)),
            SessionEvent::SelectRoom { room_id } => self.handle_select_room(&room_id),
            SessionEvent::SendText { text } => self.handle_send_text(text),
            SessionEvent::SendFile { file_name, bytes } => self.handle_send_file(file_name, bytes),
            SessionEvent::CreateRoom { name } => self.handle_create_room(&name),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns true while the transport is up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Current room, once entered.
    pub fn current_room(&self) -> Option<&str> {
        self.membership.current()
    }

    /// Join progress for the current room.
    pub fn membership_phase(&self) -> MembershipPhase {
        self.membership.phase()
    }

    /// Membership controller.
    pub fn membership(&self) -> &MembershipController {
        &self.membership
    }

    /// Known rooms.
    pub fn rooms(&self) -> &RoomDirectory {
        &self.directory
    }

    /// Rosters.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Chat log.
    pub fn stream(&self) -> &MessageStream {
        &self.stream
    }

    /// Events visible in the current room.
    pub fn current_view(&self) -> impl Iterator<Item = &ChatEvent> + Clone {
        let room_id = self.membership.current().unwrap_or_default();
        self.stream.view_for_room(room_id)
    }

    /// Number of inbound transfers still collecting chunks.
    pub fn active_transfers(&self) -> usize {
        self.transfers.active_count()
    }

    /// Drop counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    fn handle_connected(&mut self) -> Vec<SessionAction> {
        if self.connected {
            return Vec::new();
        }
        self.connected = true;
        info!(participant = %self.config.participant_name, "session connected");

        let steps = self.membership.on_connected();
        self.apply_steps(steps)
    }

    fn handle_disconnected(&mut self, reason: String) -> Vec<SessionAction> {
        if !self.connected {
            return Vec::new();
        }
        self.connected = false;
        self.membership.on_disconnected();

        let abandoned = self.transfers.abandon_all();
        self.stats.abandoned_transfers += abandoned as u64;

        warn!(%reason, abandoned, "session disconnected");
        vec![SessionAction::ConnectivityLost { reason }]
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<SessionAction> {
        let Some(timeout) = self.config.transfer_stall_timeout else {
            return Vec::new();
        };
        for key in self.transfers.expire_stalled(now, timeout) {
            self.stats.stalled_transfers += 1;
            warn!(file_name = %key.file_name, sender = %key.sender, "dropping stalled transfer");
        }
        Vec::new()
    }

    fn handle_select_room(&mut self, room_id: &str) -> Result<Vec<SessionAction>, SessionError> {
        if !self.directory.contains(room_id) {
            return Err(SessionError::RoomNotFound { room_id: room_id.to_string() });
        }
        let steps = self.membership.select(room_id);
        Ok(self.apply_steps(steps))
    }

    fn handle_send_text(&mut self, text: String) -> Result<Vec<SessionAction>, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let room = self.connected_room()?;

        let message = TextMessage {
            id: self.next_event_id(),
            sender: self.config.participant_name.clone(),
            room,
            timestamp: self.env.unix_millis(),
            text,
        };
        Ok(vec![SessionAction::Send(Payload::ChatMessage(message))])
    }

    fn handle_send_file(
        &mut self,
        file_name: String,
        bytes: Bytes,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if bytes.is_empty() {
            return Err(SessionError::EmptyFile { file_name });
        }
        let room = self.connected_room()?;

        let too_many = |total: u32| SessionError::MalformedChunk {
            file_name: file_name.clone(),
            reason: ChunkRejection::TooManyChunks {
                total,
                max: self.config.max_chunks_per_transfer,
            },
        };
        let transfer = OutboundTransfer::new(
            file_name.clone(),
            self.config.participant_name.clone(),
            room,
            bytes,
            self.config.chunk_size,
        )
        .ok_or_else(|| too_many(u32::MAX))?;
        if transfer.total_chunks() > self.config.max_chunks_per_transfer {
            return Err(too_many(transfer.total_chunks()));
        }

        debug!(%file_name, chunks = transfer.total_chunks(), "uploading file");
        let mut actions = Vec::with_capacity(transfer.total_chunks() as usize * 2);
        for (chunk, progress) in transfer {
            actions.push(SessionAction::Send(Payload::FileChunk(chunk)));
            actions
                .push(SessionAction::TransferProgress { file_name: file_name.clone(), progress });
        }
        Ok(actions)
    }

    fn handle_create_room(&mut self, name: &str) -> Result<Vec<SessionAction>, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyRoomName);
        }
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        Ok(vec![SessionAction::Send(Payload::CreateRoom(name.to_string()))])
    }

    fn handle_payload(&mut self, payload: Payload) -> Vec<SessionAction> {
        match payload {
            Payload::ActiveRooms(entries) => self.handle_active_rooms(entries),
            Payload::NewRoom(info) => {
                if self.directory.announce(Room::from(info)) {
                    vec![SessionAction::RoomsChanged]
                } else {
                    Vec::new()
                }
            },
            Payload::RoomClosed(room_id) => self.handle_room_closed(room_id),
            Payload::ActiveUsers(update) => self.handle_roster(update),
            Payload::ChatMessage(message) => self.handle_text(message),
            Payload::FileChunk(chunk) => self.handle_chunk(chunk),
            Payload::FileReceived(file) => self.handle_file_received(file),
            Payload::ProgressUpdate(update) => self.handle_progress(update),
            other @ (Payload::Join(_) | Payload::LeaveRoom(_) | Payload::CreateRoom(_)) => {
                self.stats.malformed_events += 1;
                warn!(kind = %other.kind(), "dropping client-only event from server");
                Vec::new()
            },
        }
    }

    fn handle_active_rooms(&mut self, entries: Vec<RoomEntry>) -> Vec<SessionAction> {
        let rooms = entries.into_iter().map(|entry| Room::from(entry.into_info()));
        if !self.directory.apply_snapshot(rooms) {
            return Vec::new();
        }

        let directory = &self.directory;
        self.presence.retain_rooms(|room_id| directory.contains(room_id));
        debug!(rooms = self.directory.len(), "room snapshot applied");
        vec![SessionAction::RoomsChanged]
    }

    fn handle_room_closed(&mut self, room_id: String) -> Vec<SessionAction> {
        if self.directory.remove(&room_id).is_none() {
            debug!(%room_id, "close for unlisted room ignored");
            return Vec::new();
        }

        let mut actions = vec![SessionAction::RoomsChanged];
        if self.presence.drop_room(&room_id) {
            actions.push(SessionAction::RosterChanged { room_id: room_id.clone() });
        }

        if self.membership.target() == Some(room_id.as_str()) {
            let fallback = self.directory.fallback_for(&room_id, &self.config.fallback_room);
            info!(closed = %room_id, %fallback, "current room closed, falling back");
            if self.directory.announce(Room::named(fallback.clone())) {
                debug!(%fallback, "fallback room listed locally until the next snapshot");
            }
            let steps = self.membership.fall_back(&fallback);
            actions.extend(self.apply_steps(steps));
        }
        actions
    }

    fn handle_roster(&mut self, update: RosterUpdate) -> Vec<SessionAction> {
        if !self.directory.contains(&update.room) {
            debug!(room_id = %update.room, "roster for unlisted room ignored");
            return Vec::new();
        }

        let participants =
            update.users.into_iter().map(|entry| Participant::from(entry.into_info()));
        self.presence.apply_roster(&update.room, participants);
        if self.membership.on_roster(&update.room) {
            debug!(room_id = %update.room, "room joined");
        }
        vec![SessionAction::RosterChanged { room_id: update.room }]
    }

    fn handle_text(&mut self, message: TextMessage) -> Vec<SessionAction> {
        if !self.directory.was_known(&message.room) {
            self.stats.malformed_events += 1;
            warn!(room_id = %message.room, "dropping message for unknown room");
            return Vec::new();
        }
        self.append(|id| ChatEvent::Text(TextEvent::from_message(id, message)))
    }

    fn handle_chunk(&mut self, chunk: FileChunk) -> Vec<SessionAction> {
        if !self.directory.was_known(&chunk.room_id) {
            self.stats.malformed_events += 1;
            warn!(room_id = %chunk.room_id, "dropping chunk for unknown room");
            return Vec::new();
        }

        let file_name = chunk.file_name.clone();
        match self.transfers.accept(chunk, self.env.now()) {
            Ok(ChunkOutcome::Progress { file_name, progress }) => {
                vec![SessionAction::TransferProgress { file_name, progress }]
            },
            Ok(ChunkOutcome::Completed(done)) => {
                let timestamp = self.env.unix_millis();
                let mut actions =
                    vec![SessionAction::TransferProgress { file_name, progress: 1.0 }];
                actions.extend(self.append(|id| {
                    ChatEvent::File(FileEvent {
                        id,
                        sender: done.key.sender,
                        room_id: done.key.room_id,
                        timestamp,
                        file_name: done.key.file_name,
                        file_bytes: done.bytes,
                    })
                }));
                actions
            },
            Ok(ChunkOutcome::Duplicate) => {
                self.stats.duplicate_chunks += 1;
                debug!(%file_name, "duplicate chunk ignored");
                Vec::new()
            },
            Ok(ChunkOutcome::AlreadyCompleted) => {
                self.stats.ignored_completions += 1;
                Vec::new()
            },
            Err(reason) => {
                self.stats.malformed_chunks += 1;
                let error = SessionError::MalformedChunk { file_name, reason };
                warn!(%error, "dropping chunk");
                Vec::new()
            },
        }
    }

    fn handle_file_received(&mut self, file: FileReceived) -> Vec<SessionAction> {
        let Some(room_id) = self.membership.current().map(str::to_string) else {
            self.stats.malformed_events += 1;
            warn!(file_name = %file.file_name, "dropping file received before any room was joined");
            return Vec::new();
        };

        let timestamp = self.env.unix_millis();
        self.append(|id| {
            ChatEvent::File(FileEvent {
                id,
                sender: file.sender,
                room_id,
                timestamp,
                file_name: file.file_name,
                file_bytes: file.file_data,
            })
        })
    }

    fn handle_progress(&mut self, update: ProgressUpdate) -> Vec<SessionAction> {
        if !update.progress.is_finite() {
            self.stats.malformed_events += 1;
            warn!(file_name = %update.file_name, "dropping non-finite progress");
            return Vec::new();
        }
        vec![SessionAction::TransferProgress {
            file_name: update.file_name,
            progress: update.progress.clamp(0.0, 1.0),
        }]
    }

    fn apply_steps(&mut self, steps: Vec<MembershipStep>) -> Vec<SessionAction> {
        let mut actions = Vec::with_capacity(steps.len());
        for step in steps {
            match step {
                MembershipStep::Leave { room_id } => {
                    actions.push(SessionAction::Send(Payload::LeaveRoom(room_id)));
                },
                MembershipStep::Join { room_id } => {
                    actions.push(SessionAction::Send(Payload::Join(JoinRequest {
                        name: self.config.participant_name.clone(),
                        room: room_id,
                    })));
                },
                MembershipStep::ClearView { room_id } => self.stream.clear_view(&room_id),
                MembershipStep::SetCurrent { room_id } => {
                    actions.push(SessionAction::CurrentRoomChanged { room_id });
                },
            }
        }
        actions
    }

    /// Every logged event gets its id here, so ids are unique per session.
    fn append(&mut self, build: impl FnOnce(u64) -> ChatEvent) -> Vec<SessionAction> {
        let event = build(self.next_event_id());
        self.stream.append(event.clone());
        vec![SessionAction::MessageAppended(event)]
    }

    fn connected_room(&self) -> Result<String, SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.membership.current().map(str::to_string).ok_or(SessionError::NotConnected)
    }

    /// Ids follow the wall clock but never repeat or go backwards.
    fn next_event_id(&mut self) -> u64 {
        let id = self.env.unix_millis().max(self.last_event_id + 1);
        self.last_event_id = id;
        id
    }
}
