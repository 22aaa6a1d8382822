use crate::auth::extract_token;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use optahire_core::{ClientMessage, ConnectionId, Identity, ServerMessage};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// Upgrades an authenticated request to a signaling socket. The token is
/// checked before the upgrade so rejected clients get a plain 401.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
    State(service): State<SignalingService>,
) -> Response {
    let identity = match extract_token(&headers, params.token.as_deref()) {
        Ok(token) => service.authenticate(&token).await,
        Err(e) => Err(e),
    };

    match identity {
        Ok(identity) => {
            let connection = ConnectionId::new();
            ws.on_upgrade(move |socket| handle_socket(socket, connection, identity, service))
                .into_response()
        }
        Err(e) => {
            warn!("Rejected signaling connection: {}", e);
            (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    connection: ConnectionId,
    identity: Identity,
    service: SignalingService,
) {
    info!(
        "User connected: {} ({}) on connection {}",
        identity.user_id, identity.display_name, connection
    );

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_connection(connection, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(signal) => {
                                if let ClientMessage::JoinCallRoom { room_id } = &signal
                                    && let Err(e) = service.authorize_room(&identity, room_id).await
                                {
                                    warn!(
                                        "{} ({}) refused room {}: {}",
                                        connection, identity.user_id, room_id, e
                                    );
                                    service.send_message(
                                        connection,
                                        &ServerMessage::error(e.user_message()),
                                    );
                                    continue;
                                }
                                if let Err(e) =
                                    service.relay.dispatch(connection, &identity, signal).await
                                {
                                    error!("Relay died: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", connection, e);
                                service.send_message(
                                    connection,
                                    &ServerMessage::error("Invalid signaling message"),
                                );
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Either half ending means the socket is gone; leave is idempotent.
    let _ = service.relay.disconnect(connection).await;
    service.remove_connection(&connection);
    info!("WebSocket disconnected: {}", connection);
}
