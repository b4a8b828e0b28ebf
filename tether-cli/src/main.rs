use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tether_server::engine::{Engine, Outbox};
use tether_server::http::AppState;
use tether_server::{SecretStore, SpaceCatalog, router};

/// Public signaling and control-arbitration server for a fleet of
/// telepresence robots.
#[derive(Parser)]
#[command(name = "tetherd", version, about)]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5080)]
    port: u16,

    /// Path to the YAML space catalog.
    #[arg(long, env = "TETHER_SPACES", default_value = "tether_spaces.yml")]
    spaces: PathBuf,

    /// Directory of `<robot_id>.key` secret files.
    #[arg(long, env = "TETHER_SECRETS_DIR", default_value = "robot_secrets")]
    secrets_dir: PathBuf,

    /// Directory holding the built operator SPA.
    #[arg(long, env = "TETHER_STATIC_DIR", default_value = "webapp/dist")]
    static_dir: PathBuf,

    /// Verbose logging.
    #[arg(long, env = "DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let catalog = SpaceCatalog::load(&args.spaces).with_context(|| {
        format!("failed to load space catalog from {}", args.spaces.display())
    })?;
    let secrets = SecretStore::load(&args.secrets_dir).with_context(|| {
        format!(
            "failed to load robot secrets from {}",
            args.secrets_dir.display()
        )
    })?;

    let catalog = Arc::new(catalog);
    let outbox = Arc::new(Outbox::new());
    let engine = Engine::new(Arc::clone(&catalog), Arc::new(secrets), outbox);
    let state = Arc::new(AppState::new(engine, catalog, args.static_dir));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "tetherd listening; WebSocket endpoint at /ws");

    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}
