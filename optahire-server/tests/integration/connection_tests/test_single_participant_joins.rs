use optahire_core::{ConnectionId, RoomId, ServerMessage};
use optahire_server::{RelaySettings, RoomPhase};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{candidate, interviewer};

#[tokio::test]
async fn test_single_participant_joins_room() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let a = ConnectionId::new();

    relay
        .handle
        .join(a, interviewer("ada"), RoomId::from("R1"))
        .await
        .expect("Failed to send join");

    let ack = relay
        .inbox
        .expect(&a, "callRoomJoined")
        .await
        .expect("Join not acknowledged");
    let ServerMessage::CallRoomJoined {
        room_id,
        participants,
        ice_servers,
    } = ack
    else {
        unreachable!();
    };
    assert_eq!(room_id, RoomId::from("R1"));
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].connection_id, a);
    assert_eq!(ice_servers.len(), 2);

    let snapshot = relay
        .handle
        .snapshot(RoomId::from("R1"))
        .await
        .unwrap()
        .expect("Room should exist");
    assert_eq!(snapshot.phase, RoomPhase::Waiting);
}

#[tokio::test]
async fn test_rejoining_same_room_is_idempotent() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay
        .handle
        .join(b, candidate("bob"), RoomId::from("R1"))
        .await
        .unwrap();

    let ack = relay.inbox.expect(&b, "callRoomJoined").await.unwrap();
    let ServerMessage::CallRoomJoined { participants, .. } = ack else {
        unreachable!();
    };
    assert_eq!(participants.len(), 2);

    // The existing participant is not told about a duplicate join.
    relay.inbox.expect_quiet(&a).await.unwrap();

    let stats = relay.handle.stats().await.unwrap();
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.participants, 2);
}

#[tokio::test]
async fn test_blank_room_id_is_rejected() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let a = ConnectionId::new();

    relay
        .handle
        .join(a, interviewer("ada"), RoomId::from("   "))
        .await
        .unwrap();

    let msg = relay.inbox.expect(&a, "error").await.unwrap();
    assert_eq!(msg, ServerMessage::error("Invalid room ID provided"));

    let stats = relay.handle.stats().await.unwrap();
    assert_eq!(stats.rooms, 0);
}
