//! Room membership sequencing.
//!
//! Switching rooms is an ordered sequence: leave the old room, join the new
//! one, clear the new room's view, then record it as current. The controller
//! computes that sequence and tracks where the join stands; the session turns
//! each [`MembershipStep`] into a wire message or a local effect.
//!
//! # State Machine
//!
//! ```text
//! Idle ──connect──► Joining ──roster for room──► Joined
//!   ▲                  │                            │
//!   └────disconnect────┴────────disconnect──────────┘
//! ```
//!
//! Selecting a room while disconnected queues it. The queued switch runs in
//! full on the next connect; a reconnect with nothing queued only re-joins.

use tracing::debug;

use crate::RoomId;

/// One step of a room transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipStep {
    /// Tell the server we left a room.
    Leave {
        /// Room being left.
        room_id: RoomId,
    },
    /// Tell the server we joined a room.
    Join {
        /// Room being joined.
        room_id: RoomId,
    },
    /// Clear the message view for a room.
    ClearView {
        /// Room whose view is cleared.
        room_id: RoomId,
    },
    /// The room is now current.
    SetCurrent {
        /// New current room.
        room_id: RoomId,
    },
}

/// Where the current room's join stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipPhase {
    /// No join sent on this connection.
    Idle,
    /// Join sent, no roster for the room yet.
    Joining,
    /// Roster received for the room.
    Joined,
}

/// Sequences joins and leaves for the single current room.
///
/// # Invariants
///
/// - At most one current room
/// - Every transition leaves the previous room before joining the next
/// - Selecting the room already being joined or joined emits nothing
#[derive(Debug, Clone)]
pub struct MembershipController {
    current: Option<RoomId>,
    queued: Option<RoomId>,
    phase: MembershipPhase,
    connected: bool,
}

impl MembershipController {
    /// Controller that joins `initial_room` on first connect.
    pub fn new(initial_room: impl Into<RoomId>) -> Self {
        Self {
            current: None,
            queued: Some(initial_room.into()),
            phase: MembershipPhase::Idle,
            connected: false,
        }
    }

    /// Current room, once one has been entered.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Room queued for the next connect.
    pub fn queued(&self) -> Option<&str> {
        self.queued.as_deref()
    }

    /// Room the controller is heading for: the queued room if any, else the
    /// current one.
    pub fn target(&self) -> Option<&str> {
        self.queued.as_deref().or(self.current.as_deref())
    }

    /// Join progress for the current room.
    pub fn phase(&self) -> MembershipPhase {
        self.phase
    }

    /// Request a switch to `room_id`.
    ///
    /// Connected: returns the full transition. Disconnected: queues the room
    /// and returns nothing. Returns nothing if `room_id` is already the target.
    pub fn select(&mut self, room_id: &str) -> Vec<MembershipStep> {
        let settled = self.phase != MembershipPhase::Idle || !self.connected;
        if self.target() == Some(room_id) && settled {
            return Vec::new();
        }

        if !self.connected {
            debug!(room_id, "queueing room switch until reconnect");
            self.queued =
                (self.current.as_deref() != Some(room_id)).then(|| room_id.to_string());
            return Vec::new();
        }

        self.queued = None;
        self.transition(room_id.to_string())
    }

    /// Move off a room that no longer exists.
    ///
    /// Like [`Self::select`] but never a no-op: falling back to the room
    /// that just closed re-joins it.
    pub fn fall_back(&mut self, room_id: &str) -> Vec<MembershipStep> {
        if !self.connected {
            self.queued = Some(room_id.to_string());
            return Vec::new();
        }
        self.queued = None;
        self.transition(room_id.to_string())
    }

    /// Transport came up.
    ///
    /// Replays a queued switch, otherwise re-joins the current room.
    pub fn on_connected(&mut self) -> Vec<MembershipStep> {
        self.connected = true;
        if let Some(room_id) = self.queued.take() {
            return self.transition(room_id);
        }
        match &self.current {
            Some(room_id) => {
                self.phase = MembershipPhase::Joining;
                vec![MembershipStep::Join { room_id: room_id.clone() }]
            },
            None => Vec::new(),
        }
    }

    /// Transport dropped. The server forgets our joins, so the phase resets.
    pub fn on_disconnected(&mut self) {
        self.connected = false;
        self.phase = MembershipPhase::Idle;
    }

    /// A roster arrived for `room_id`. Returns true if it completed the join.
    pub fn on_roster(&mut self, room_id: &str) -> bool {
        if self.phase == MembershipPhase::Joining && self.current.as_deref() == Some(room_id) {
            self.phase = MembershipPhase::Joined;
            return true;
        }
        false
    }

    fn transition(&mut self, room_id: RoomId) -> Vec<MembershipStep> {
        let mut steps = Vec::with_capacity(4);
        if let Some(previous) = self.current.take() {
            steps.push(MembershipStep::Leave { room_id: previous });
        }
        steps.push(MembershipStep::Join { room_id: room_id.clone() });
        steps.push(MembershipStep::ClearView { room_id: room_id.clone() });
        steps.push(MembershipStep::SetCurrent { room_id: room_id.clone() });

        debug!(room_id = %room_id, "switching room");
        self.current = Some(room_id);
        self.phase = MembershipPhase::Joining;
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave(room_id: &str) -> MembershipStep {
        MembershipStep::Leave { room_id: room_id.to_string() }
    }

    fn join(room_id: &str) -> MembershipStep {
        MembershipStep::Join { room_id: room_id.to_string() }
    }

    fn clear(room_id: &str) -> MembershipStep {
        MembershipStep::ClearView { room_id: room_id.to_string() }
    }

    fn set(room_id: &str) -> MembershipStep {
        MembershipStep::SetCurrent { room_id: room_id.to_string() }
    }

    fn switched(from: &str, to: &str) -> [MembershipStep; 4] {
        [leave(from), join(to), clear(to), set(to)]
    }

    fn connected_in(room_id: &str) -> MembershipController {
        let mut controller = MembershipController::new(room_id);
        controller.on_connected();
        controller
    }

    #[test]
    fn first_connect_joins_initial_room() {
        let mut controller = MembershipController::new("general");
        assert_eq!(controller.on_connected(), [join("general"), clear("general"), set("general")]);
        assert_eq!(controller.current(), Some("general"));
        assert_eq!(controller.phase(), MembershipPhase::Joining);
    }

    #[test]
    fn switch_leaves_before_joining() {
        let mut controller = connected_in("general");
        assert_eq!(controller.select("random"), switched("general", "random"));
        assert_eq!(controller.current(), Some("random"));
    }

    #[test]
    fn reselecting_current_room_is_noop() {
        let mut controller = connected_in("general");
        assert!(controller.select("general").is_empty());

        controller.on_roster("general");
        assert!(controller.select("general").is_empty());
    }

    #[test]
    fn roster_completes_join() {
        let mut controller = connected_in("general");
        assert!(!controller.on_roster("random"));
        assert!(controller.on_roster("general"));
        assert_eq!(controller.phase(), MembershipPhase::Joined);
        assert!(!controller.on_roster("general"));
    }

    #[test]
    fn selection_while_disconnected_is_queued() {
        let mut controller = connected_in("general");
        controller.on_disconnected();

        assert!(controller.select("random").is_empty());
        assert_eq!(controller.queued(), Some("random"));
        assert_eq!(controller.current(), Some("general"));

        assert_eq!(controller.on_connected(), switched("general", "random"));
        assert_eq!(controller.queued(), None);
    }

    #[test]
    fn later_selection_replaces_queued_one() {
        let mut controller = connected_in("general");
        controller.on_disconnected();
        controller.select("random");
        controller.select("rust");

        assert_eq!(controller.on_connected(), switched("general", "rust"));
    }

    #[test]
    fn selecting_current_room_while_disconnected_cancels_queue() {
        let mut controller = connected_in("general");
        controller.on_disconnected();
        controller.select("random");
        controller.select("general");

        assert_eq!(controller.queued(), None);
        assert_eq!(controller.on_connected(), [join("general")]);
    }

    #[test]
    fn plain_reconnect_rejoins_only() {
        let mut controller = connected_in("general");
        controller.on_disconnected();
        assert_eq!(controller.phase(), MembershipPhase::Idle);
        assert_eq!(controller.on_connected(), [join("general")]);
        assert_eq!(controller.phase(), MembershipPhase::Joining);
    }

    #[test]
    fn fall_back_to_same_room_rejoins() {
        let mut controller = connected_in("general");
        assert_eq!(controller.fall_back("general"), switched("general", "general"));
    }

    #[test]
    fn fall_back_while_disconnected_is_queued() {
        let mut controller = connected_in("rust");
        controller.on_disconnected();
        assert!(controller.fall_back("general").is_empty());
        assert_eq!(controller.on_connected(), switched("rust", "general"));
    }

    #[test]
    fn selection_before_first_connect_replaces_initial_room() {
        let mut controller = MembershipController::new("general");
        controller.select("random");
        assert_eq!(controller.on_connected(), [join("random"), clear("random"), set("random")]);
    }
}
