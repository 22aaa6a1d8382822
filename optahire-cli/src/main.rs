use anyhow::{Context, Result};
use clap::Parser;
use optahire_server::{ServerConfig, SignalingServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "optahire-signal")]
#[command(about = "Signaling relay for OptaHire video interviews")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(short, long, env = "OPTAHIRE_SIGNAL_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "OPTAHIRE_SIGNAL_BIND")]
    bind: Option<SocketAddr>,

    #[arg(long)]
    path: Option<String>,

    /// Seconds an offer may wait for an answer.
    #[arg(long)]
    negotiation_timeout: Option<u64>,

    /// Used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(path) = self.path {
            config.path = path;
        }
        if let Some(secs) = self.negotiation_timeout {
            config.negotiation_timeout_secs = secs;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.into_config()?;
    info!(
        "Starting signaling server ({} ICE servers, {}s negotiation timeout)",
        config.ice_servers.len(),
        config.negotiation_timeout_secs
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    let server = SignalingServer::from_config(config);
    server.serve(listener, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
