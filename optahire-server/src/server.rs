use crate::auth::{Authenticator, StaticTokenAuthenticator};
use crate::config::ServerConfig;
use crate::relay::{Relay, RelayCommand, RelayHandle, RelaySettings};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// The running relay plus the HTTP surface in front of it.
///
/// Constructing it starts the relay task; [`SignalingServer::shutdown`]
/// notifies every participant and waits for the task to finish.
pub struct SignalingServer {
    config: ServerConfig,
    service: SignalingService,
    relay_task: JoinHandle<()>,
}

impl SignalingServer {
    pub fn new(config: ServerConfig, authenticator: Arc<dyn Authenticator>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RelayCommand>(config.relay_queue_capacity);

        let service = SignalingService::new(RelayHandle::new(cmd_tx), authenticator);
        let relay = Relay::new(
            RelaySettings::from(&config),
            cmd_rx,
            Arc::new(service.clone()),
        );
        let relay_task = tokio::spawn(relay.run());

        Self {
            config,
            service,
            relay_task,
        }
    }

    /// Uses the token grants listed in the config.
    pub fn from_config(config: ServerConfig) -> Self {
        let authenticator = StaticTokenAuthenticator::new(config.tokens.clone());
        if authenticator.is_empty() {
            warn!("No tokens configured; every connection will be rejected");
        } else {
            info!("Loaded {} token grants", authenticator.len());
        }
        Self::new(config, Arc::new(authenticator))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &SignalingService {
        &self.service
    }

    pub fn router(&self) -> Router {
        router(self.service.clone(), &self.config.path)
    }

    pub async fn serve<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().context("listener has no local address")?;
        info!(
            "Signaling server listening on ws://{}{}",
            addr, self.config.path
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .context("HTTP server failed")?;

        self.shutdown().await
    }

    pub async fn shutdown(self) -> Result<()> {
        info!("Stopping relay");
        self.service
            .relay()
            .shutdown()
            .await
            .context("relay already stopped")?;
        self.relay_task.await.context("relay task panicked")?;
        Ok(())
    }
}

pub fn router(service: SignalingService, path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(path, get(ws_handler))
        .route("/healthz", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Response {
    match service.relay().stats().await {
        Ok(stats) => Json(json!({
            "status": "ok",
            "rooms": stats.rooms,
            "participants": stats.participants,
            "connections": service.connection_count(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "error": e.to_string() })),
        )
            .into_response(),
    }
}
