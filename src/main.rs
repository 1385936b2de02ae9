use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use annict_season::annict::AnnictClient;
use annict_season::config;
use annict_season::season::FetchLimits;
use annict_season::web::{self, AppState};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Serve Annict season broadcast listings and printable recording lists"
)]
struct Args {
    /// Path to YAML config file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind`
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        cfg.server.bind = bind;
    }
    let addr = cfg.server.socket_addr()?;

    let access_token = cfg.access_token();
    if access_token.is_none() {
        warn!(
            "{} is not set; season queries will fail until it is configured",
            config::ACCESS_TOKEN_ENV
        );
    }

    let annict = AnnictClient::from_config(&cfg.annict)?;
    info!(endpoint = %annict.endpoint(), "annict client ready");

    let shutdown = CancellationToken::new();
    let state = AppState::new(
        Arc::new(annict),
        access_token,
        FetchLimits::from(&cfg.annict),
        shutdown.clone(),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                signal.cancel();
            }
            Err(err) => error!(?err, "failed to listen for ctrl-c"),
        }
    });

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}
