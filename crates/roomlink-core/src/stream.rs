//! Append-only chat log.
//!
//! Events are stored once in arrival order. A room view is a filter over the
//! log starting at that room's cutoff, so clearing a view on room switch never
//! discards history.

use std::collections::HashMap;

use bytes::Bytes;
use roomlink_proto::payloads::chat::TextMessage;

use crate::RoomId;

/// A text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
    /// Session-unique id, assigned on arrival.
    pub id: u64,
    /// Id the sender put on the wire. Senders do not coordinate, so this
    /// may repeat across messages.
    pub wire_id: u64,
    /// Sender display name.
    pub sender: String,
    /// Room the message was posted to.
    pub room_id: RoomId,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Message body.
    pub text: String,
}

impl TextEvent {
    /// Log entry for `message` under the local `id`.
    pub fn from_message(id: u64, message: TextMessage) -> Self {
        Self {
            id,
            wire_id: message.id,
            sender: message.sender,
            room_id: message.room,
            timestamp: message.timestamp,
            text: message.text,
        }
    }
}

/// A completed file transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Locally assigned id.
    pub id: u64,
    /// Sender display name.
    pub sender: String,
    /// Room the file was shared in.
    pub room_id: RoomId,
    /// Milliseconds since the Unix epoch, at completion.
    pub timestamp: u64,
    /// Original file name.
    pub file_name: String,
    /// Reassembled contents.
    pub file_bytes: Bytes,
}

/// One entry in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Text message.
    Text(TextEvent),
    /// File share.
    File(FileEvent),
}

impl ChatEvent {
    /// Event id.
    pub fn id(&self) -> u64 {
        match self {
            Self::Text(event) => event.id,
            Self::File(event) => event.id,
        }
    }

    /// Room the event belongs to.
    pub fn room_id(&self) -> &str {
        match self {
            Self::Text(event) => &event.room_id,
            Self::File(event) => &event.room_id,
        }
    }

    /// Sender display name.
    pub fn sender(&self) -> &str {
        match self {
            Self::Text(event) => &event.sender,
            Self::File(event) => &event.sender,
        }
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Text(event) => event.timestamp,
            Self::File(event) => event.timestamp,
        }
    }
}

/// Chat log with per-room views.
///
/// # Invariants
///
/// - Events are never reordered or removed
/// - A room's view starts at its cutoff and only moves forward
#[derive(Debug, Clone, Default)]
pub struct MessageStream {
    events: Vec<ChatEvent>,
    view_start: HashMap<RoomId, usize>,
}

impl MessageStream {
    /// Empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the end of the log.
    pub fn append(&mut self, event: ChatEvent) {
        self.events.push(event);
    }

    /// Hide everything currently logged for `room_id` from its view.
    pub fn clear_view(&mut self, room_id: &str) {
        self.view_start.insert(room_id.to_string(), self.events.len());
    }

    /// Events visible in `room_id`, in arrival order.
    ///
    /// The iterator is `Clone`, so a renderer can walk the view repeatedly.
    pub fn view_for_room<'a>(
        &'a self,
        room_id: &'a str,
    ) -> impl Iterator<Item = &'a ChatEvent> + Clone + 'a {
        let start = self.view_start.get(room_id).copied().unwrap_or(0);
        self.events[start..].iter().filter(move |event| event.room_id() == room_id)
    }

    /// Every event logged for `room_id`, ignoring the view cutoff.
    pub fn history_for_room<'a>(
        &'a self,
        room_id: &'a str,
    ) -> impl Iterator<Item = &'a ChatEvent> + Clone + 'a {
        self.events.iter().filter(move |event| event.room_id() == room_id)
    }

    /// The whole log.
    pub fn events(&self) -> &[ChatEvent] {
        &self.events
    }

    /// Number of logged events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: u64, room_id: &str, body: &str) -> ChatEvent {
        ChatEvent::Text(TextEvent {
            id,
            wire_id: id,
            sender: "ada".to_string(),
            room_id: room_id.to_string(),
            timestamp: id,
            text: body.to_string(),
        })
    }

    #[test]
    fn view_filters_by_room() {
        let mut stream = MessageStream::new();
        stream.append(text(1, "general", "hi"));
        stream.append(text(2, "rust", "borrowck"));
        stream.append(text(3, "general", "bye"));

        let ids: Vec<u64> = stream.view_for_room("general").map(ChatEvent::id).collect();
        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn view_is_restartable() {
        let mut stream = MessageStream::new();
        stream.append(text(1, "general", "hi"));

        let view = stream.view_for_room("general");
        assert_eq!(view.clone().count(), 1);
        assert_eq!(view.count(), 1);
    }

    #[test]
    fn clear_view_keeps_history() {
        let mut stream = MessageStream::new();
        stream.append(text(1, "general", "old"));
        stream.clear_view("general");
        stream.append(text(2, "general", "new"));

        let visible: Vec<u64> = stream.view_for_room("general").map(ChatEvent::id).collect();
        let history: Vec<u64> = stream.history_for_room("general").map(ChatEvent::id).collect();
        assert_eq!(visible, [2]);
        assert_eq!(history, [1, 2]);
    }

    #[test]
    fn clearing_one_room_leaves_others() {
        let mut stream = MessageStream::new();
        stream.append(text(1, "general", "a"));
        stream.append(text(2, "rust", "b"));
        stream.clear_view("general");

        assert_eq!(stream.view_for_room("general").count(), 0);
        assert_eq!(stream.view_for_room("rust").count(), 1);
    }
}
