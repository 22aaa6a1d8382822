use optahire_core::{MediaKind, MediaState, RoomId, ServerMessage, UserId};
use optahire_server::RelaySettings;

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{candidate, interviewer};

#[tokio::test]
async fn test_toggles_are_mirrored_to_peer() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay
        .handle
        .relay_toggle(b, None, MediaKind::Video, false)
        .await
        .unwrap();
    assert_eq!(
        relay.inbox.next_for(&a).await.unwrap(),
        ServerMessage::ParticipantToggleVideo {
            user_id: UserId::from("bob"),
            enabled: false,
        }
    );

    relay
        .handle
        .relay_toggle(b, Some(RoomId::from("R1")), MediaKind::Audio, false)
        .await
        .unwrap();
    assert_eq!(
        relay.inbox.next_for(&a).await.unwrap(),
        ServerMessage::ParticipantToggleAudio {
            user_id: UserId::from("bob"),
            enabled: false,
        }
    );

    // The sender gets no echo.
    relay.inbox.expect_quiet(&b).await.unwrap();

    let snapshot = relay
        .handle
        .snapshot(RoomId::from("R1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        snapshot.participants[1].media,
        MediaState {
            audio: false,
            video: false,
        }
    );
}

#[tokio::test]
async fn test_toggle_while_alone_is_recorded_only() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let a = relay.join(interviewer("ada"), "R1").await;

    relay
        .handle
        .relay_toggle(a, None, MediaKind::Audio, false)
        .await
        .unwrap();
    relay.inbox.expect_quiet(&a).await.unwrap();

    // A late joiner sees the muted state in the room listing.
    relay.join(candidate("bob"), "R1").await;
    let snapshot = relay
        .handle
        .snapshot(RoomId::from("R1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!snapshot.participants[0].media.audio);
    assert!(snapshot.participants[0].media.video);
}

#[tokio::test]
async fn test_toggle_for_foreign_room_is_rejected() {
    init_tracing();

    let mut relay = create_test_relay(RelaySettings::default());
    let (a, b) = relay
        .pair(interviewer("ada"), candidate("bob"), "R1")
        .await;

    relay
        .handle
        .relay_toggle(b, Some(RoomId::from("R2")), MediaKind::Video, false)
        .await
        .unwrap();

    assert_eq!(
        relay.inbox.next_for(&b).await.unwrap(),
        ServerMessage::error("You are not a participant in this room")
    );
    relay.inbox.expect_quiet(&a).await.unwrap();
}
