//! End-to-end room scenarios over the simulated server.

use roomlink_core::{ChatEvent, MembershipPhase, SessionAction, SessionError, SessionEvent};
use roomlink_harness::SimCluster;
use roomlink_proto::{Payload, payloads::room::JoinRequest};

fn texts(cluster: &SimCluster, index: usize) -> Vec<String> {
    cluster
        .session(index)
        .current_view()
        .filter_map(|event| match event {
            ChatEvent::Text(text) => Some(format!("{}: {}", text.sender, text.text)),
            ChatEvent::File(_) => None,
        })
        .collect()
}

fn roster(cluster: &SimCluster, index: usize, room: &str) -> Vec<String> {
    cluster.session(index).presence().roster(room).iter().map(|p| p.name.clone()).collect()
}

fn sent(actions: &[SessionAction]) -> Vec<&Payload> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Send(payload) => Some(payload),
            _ => None,
        })
        .collect()
}

#[test]
fn clients_see_each_other_and_chat() {
    let mut cluster = SimCluster::new(["general", "random"]);
    let ada = cluster.add_client("ada", "general");
    let bob = cluster.add_client("bob", "general");
    cluster.deliver_all();

    assert_eq!(cluster.session(ada).membership_phase(), MembershipPhase::Joined);
    assert_eq!(roster(&cluster, ada, "general"), vec!["ada", "bob"]);
    assert_eq!(roster(&cluster, bob, "general"), vec!["ada", "bob"]);

    cluster.command(ada, SessionEvent::SendText { text: "hello".into() }).expect("send");
    cluster.command(bob, SessionEvent::SendText { text: "hi ada".into() }).expect("send");
    cluster.deliver_all();

    let expected = vec!["ada: hello".to_string(), "bob: hi ada".to_string()];
    assert_eq!(texts(&cluster, ada), expected);
    assert_eq!(texts(&cluster, bob), expected);
    cluster.assert_invariants("after chat");
}

#[test]
fn switching_rooms_updates_rosters_and_clears_view() {
    let mut cluster = SimCluster::new(["general", "random"]);
    let ada = cluster.add_client("ada", "general");
    let bob = cluster.add_client("bob", "general");
    cluster.deliver_all();
    cluster.command(bob, SessionEvent::SendText { text: "before".into() }).expect("send");
    cluster.deliver_all();

    let select = SessionEvent::SelectRoom { room_id: "random".into() };
    let actions = cluster.command(ada, select).expect("select");
    assert_eq!(
        sent(&actions),
        vec![
            &Payload::LeaveRoom("general".into()),
            &Payload::Join(JoinRequest { name: "ada".into(), room: "random".into() }),
        ]
    );
    cluster.deliver_all();

    assert_eq!(cluster.session(ada).current_room(), Some("random"));
    assert_eq!(cluster.server().room_of(cluster.client(ada).id), Some("random"));
    assert_eq!(roster(&cluster, bob, "general"), vec!["bob"]);
    assert_eq!(roster(&cluster, ada, "random"), vec!["ada"]);
    assert!(texts(&cluster, ada).is_empty());

    cluster.command(ada, SessionEvent::SelectRoom { room_id: "general".into() }).expect("select");
    cluster.deliver_all();
    assert!(texts(&cluster, ada).is_empty(), "view is cleared on every switch");
    assert_eq!(cluster.session(ada).stream().history_for_room("general").count(), 1);
    cluster.assert_invariants("after switching");
}

#[test]
fn reselecting_joined_room_sends_nothing() {
    let mut cluster = SimCluster::new(["general"]);
    let ada = cluster.add_client("ada", "general");
    cluster.deliver_all();

    let select = SessionEvent::SelectRoom { room_id: "general".into() };
    let actions = cluster.command(ada, select).expect("select");
    assert!(actions.is_empty());
}

#[test]
fn unknown_room_is_rejected_without_state_change() {
    let mut cluster = SimCluster::new(["general"]);
    let ada = cluster.add_client("ada", "general");
    cluster.deliver_all();

    let result = cluster.command(ada, SessionEvent::SelectRoom { room_id: "nowhere".into() });
    assert_eq!(result, Err(SessionError::RoomNotFound { room_id: "nowhere".into() }));
    assert_eq!(cluster.session(ada).current_room(), Some("general"));
}

#[test]
fn created_room_reaches_everyone_only_after_server_ack() {
    let mut cluster = SimCluster::new(["general"]);
    let ada = cluster.add_client("ada", "general");
    let bob = cluster.add_client("bob", "general");
    cluster.deliver_all();

    cluster.command(ada, SessionEvent::CreateRoom { name: "  rust  ".into() }).expect("create");
    assert!(!cluster.session(ada).rooms().contains("rust"));

    cluster.deliver_all();
    for index in [ada, bob] {
        assert!(cluster.session(index).rooms().contains("rust"));
    }

    cluster.command(bob, SessionEvent::SelectRoom { room_id: "rust".into() }).expect("select");
    cluster.deliver_all();
    assert_eq!(cluster.server().members("rust"), vec!["bob"]);
}

#[test]
fn closing_current_room_falls_back() {
    let mut cluster = SimCluster::new(["general", "random"]);
    let ada = cluster.add_client("ada", "general");
    cluster.deliver_all();
    cluster.command(ada, SessionEvent::SelectRoom { room_id: "random".into() }).expect("select");
    cluster.deliver_all();

    assert!(cluster.close_room("random"));
    cluster.deliver_all();

    let session = cluster.session(ada);
    assert_eq!(session.current_room(), Some("general"));
    assert!(!session.rooms().contains("random"));
    assert!(!session.presence().has_roster("random"));
    assert_eq!(cluster.server().members("general"), vec!["ada"]);
    cluster.assert_invariants("after close");
}

#[test]
fn closing_fallback_room_moves_to_first_remaining() {
    let mut cluster = SimCluster::new(["general", "random"]);
    let ada = cluster.add_client("ada", "general");
    cluster.deliver_all();
    cluster.client_mut(ada).actions.clear();

    cluster.close_room("general");
    cluster.deliver_all();

    let sends: Vec<Payload> = sent(&cluster.client(ada).actions).into_iter().cloned().collect();
    assert_eq!(sends.first(), Some(&Payload::LeaveRoom("general".into())));
    assert!(matches!(sends.get(1), Some(Payload::Join(join)) if join.room == "random"));
    assert_eq!(cluster.session(ada).current_room(), Some("random"));
    assert_eq!(cluster.session(ada).membership_phase(), MembershipPhase::Joined);
}

#[test]
fn switch_while_offline_is_replayed_on_reconnect() {
    let mut cluster = SimCluster::new(["general", "random"]);
    let ada = cluster.add_client("ada", "general");
    cluster.deliver_all();

    cluster.disconnect(ada, "wifi dropped");
    assert_eq!(
        cluster.command(ada, SessionEvent::SendText { text: "anyone?".into() }),
        Err(SessionError::NotConnected)
    );
    let queued =
        cluster.command(ada, SessionEvent::SelectRoom { room_id: "random".into() }).expect("queue");
    assert!(queued.is_empty());
    assert_eq!(cluster.session(ada).current_room(), Some("general"));

    cluster.reconnect(ada);
    cluster.deliver_all();

    assert_eq!(cluster.session(ada).current_room(), Some("random"));
    assert_eq!(cluster.server().room_of(cluster.client(ada).id), Some("random"));
    assert_eq!(cluster.session(ada).membership_phase(), MembershipPhase::Joined);
}

#[test]
fn plain_reconnect_rejoins_current_room() {
    let mut cluster = SimCluster::new(["general"]);
    let ada = cluster.add_client("ada", "general");
    let bob = cluster.add_client("bob", "general");
    cluster.deliver_all();

    cluster.disconnect(bob, "timeout");
    cluster.deliver_all();
    assert_eq!(roster(&cluster, ada, "general"), vec!["ada"]);

    cluster.reconnect(bob);
    cluster.deliver_all();
    assert_eq!(roster(&cluster, ada, "general"), vec!["ada", "bob"]);
    assert_eq!(cluster.session(bob).membership_phase(), MembershipPhase::Joined);
}

#[test]
fn messages_for_other_rooms_stay_out_of_view() {
    let mut cluster = SimCluster::new(["general", "random"]);
    let ada = cluster.add_client("ada", "general");
    let bob = cluster.add_client("bob", "random");
    cluster.deliver_all();

    cluster.command(bob, SessionEvent::SendText { text: "psst".into() }).expect("send");
    cluster.deliver_all();

    assert!(texts(&cluster, ada).is_empty());
    assert_eq!(texts(&cluster, bob), vec!["bob: psst".to_string()]);
}
