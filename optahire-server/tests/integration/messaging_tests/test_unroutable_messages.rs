use optahire_core::{ConnectionId, RoomId, ServerMessage};
use optahire_server::RelaySettings;
use serde_json::json;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{candidate, interviewer};

#[tokio::test]
async fn test_offer_without_peer_is_dropped_silently() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let a = relay.join(interviewer("ada"), "R1").await;

    relay
        .handle
        .relay_offer(a, RoomId::from("R1"), json!({"sdp": "o1"}))
        .await
        .unwrap();
    relay
        .handle
        .relay_ice_candidate(a, RoomId::from("R1"), json!({"candidate": "c1"}))
        .await
        .unwrap();

    relay.inbox.expect_quiet(&a).await.unwrap();
    assert_eq!(relay.signaling.count().await, 1);
}

#[tokio::test]
async fn test_outsider_cannot_inject_signals() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;
    let mallory = relay.join(candidate("mallory"), "R2").await;

    relay
        .handle
        .relay_offer(mallory, RoomId::from("R1"), json!({"sdp": "evil"}))
        .await
        .unwrap();
    assert_eq!(
        relay.inbox.next_for(&mallory).await.unwrap(),
        ServerMessage::error("You are not a participant in this room")
    );

    relay.inbox.expect_quiet(&a).await.unwrap();
    relay.inbox.expect_quiet(&b).await.unwrap();
}

#[tokio::test]
async fn test_signal_to_unknown_room_is_rejected() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let a = ConnectionId::new();

    relay
        .handle
        .relay_answer(a, RoomId::from("nowhere"), json!({"sdp": "a1"}))
        .await
        .unwrap();
    assert_eq!(
        relay.inbox.next_for(&a).await.unwrap(),
        ServerMessage::error("Room does not exist")
    );

    relay.handle.end_call(a, None).await.unwrap();
    assert_eq!(
        relay.inbox.next_for(&a).await.unwrap(),
        ServerMessage::error("You have not joined a call room")
    );
}
