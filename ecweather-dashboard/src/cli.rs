use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use ecweather_core::{Config, EcccProvider};
use ecweather_dashboard::{AppState, create_router};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ecweather-dashboard", version, about = "Canadian weather stations dashboard")]
pub struct Cli {
    /// Address to listen on; overrides `server.host` from the config file.
    #[arg(long, env = "ECWEATHER_HOST")]
    pub host: Option<String>,

    /// Port to listen on; overrides `server.port` from the config file.
    #[arg(long, env = "ECWEATHER_PORT")]
    pub port: Option<u16>,

    /// Config file to use instead of the platform default location.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }

        Ok(cfg)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let cfg = self.load_config()?;
        info!(
            host = %cfg.server.host,
            port = cfg.server.port,
            language = ?cfg.provider.language,
            "Configuration loaded"
        );

        let provider = EcccProvider::new(cfg.provider.clone())?;
        let state =
            AppState::new(Arc::new(provider), cfg.dashboard.clone(), cfg.provider.language)?;
        let app = create_router(state).layer(TraceLayer::new_for_http());

        let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("Dashboard listening on http://{addr}");

        axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
