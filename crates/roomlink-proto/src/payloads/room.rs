//! Room, membership, and roster payloads.

use serde::{Deserialize, Serialize};

/// `join`: announce the participant and the room they want to be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Participant display name.
    pub name: String,
    /// Room id to join.
    pub room: String,
}

/// A room as described by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Unique room id.
    pub id: String,
    /// Display name. May equal `id`.
    pub name: String,
}

impl RoomInfo {
    /// Room whose display name is its id.
    pub fn named(id: impl Into<String>) -> Self {
        let id = id.into();
        Self { name: id.clone(), id }
    }
}

/// Entry of an `active rooms` snapshot.
///
/// Servers send either full `{id, name}` objects or bare room names; a bare
/// name is both id and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomEntry {
    /// Full room description.
    Info(RoomInfo),
    /// Bare room name.
    Name(String),
}

impl RoomEntry {
    /// Normalize into a [`RoomInfo`].
    #[must_use]
    pub fn into_info(self) -> RoomInfo {
        match self {
            Self::Info(info) => info,
            Self::Name(name) => RoomInfo::named(name),
        }
    }
}

/// A participant as reported in a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Server-assigned participant id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Roster entry: a full participant or a bare display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticipantEntry {
    /// Full participant description.
    Info(ParticipantInfo),
    /// Bare name, used as both id and name.
    Name(String),
}

impl ParticipantEntry {
    /// Normalize into a [`ParticipantInfo`].
    #[must_use]
    pub fn into_info(self) -> ParticipantInfo {
        match self {
            Self::Info(info) => info,
            Self::Name(name) => ParticipantInfo { id: name.clone(), name },
        }
    }
}

/// `active users`: the complete roster of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterUpdate {
    /// Room the roster belongs to.
    pub room: String,
    /// Every participant currently in the room.
    pub users: Vec<ParticipantEntry>,
}
