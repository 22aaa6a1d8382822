use optahire_core::{RoomId, ServerMessage};
use optahire_server::RelaySettings;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{candidate, interviewer};

#[tokio::test]
async fn test_interviewer_ends_call_for_both() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay
        .handle
        .end_call(a, Some(RoomId::from("R1")))
        .await
        .unwrap();

    let expected = ServerMessage::CallEnded {
        room_id: RoomId::from("R1"),
        message: "The interviewer has ended the call".to_owned(),
    };
    assert_eq!(relay.inbox.next_for(&a).await.unwrap(), expected);
    assert_eq!(relay.inbox.next_for(&b).await.unwrap(), expected);

    assert!(
        relay
            .handle
            .snapshot(RoomId::from("R1"))
            .await
            .unwrap()
            .is_none()
    );

    // Both are free; later leaves and disconnects do nothing.
    relay.handle.leave(b, None).await.unwrap();
    relay.handle.disconnect(a).await.unwrap();
    relay.inbox.expect_quiet(&a).await.unwrap();
    relay.inbox.expect_quiet(&b).await.unwrap();
    assert_eq!(relay.handle.stats().await.unwrap().participants, 0);
}

#[tokio::test]
async fn test_candidate_cannot_end_call() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay.handle.end_call(b, None).await.unwrap();

    let msg = relay.inbox.expect(&b, "error").await.unwrap();
    assert_eq!(
        msg,
        ServerMessage::error("only interviewers can end the call for everyone")
    );
    relay.inbox.expect_quiet(&a).await.unwrap();

    let stats = relay.handle.stats().await.unwrap();
    assert_eq!(stats.participants, 2);
}

#[tokio::test]
async fn test_any_participant_ends_call_when_permitted() {
    init_tracing();

    let settings = RelaySettings {
        end_call_requires_interviewer: false,
        ..RelaySettings::default()
    };
    let mut relay = create_test_relay(settings);
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay.handle.end_call(b, None).await.unwrap();

    let expected = ServerMessage::CallEnded {
        room_id: RoomId::from("R1"),
        message: "bob has ended the call".to_owned(),
    };
    assert_eq!(relay.inbox.next_for(&a).await.unwrap(), expected);
    assert_eq!(relay.inbox.next_for(&b).await.unwrap(), expected);
    assert_eq!(relay.handle.stats().await.unwrap().rooms, 0);
}
