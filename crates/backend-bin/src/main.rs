use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{config::Settings, router, storage, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Register/login backend
#[derive(Debug, Parser)]
#[command(name = "credgate", version, about)]
struct Cli {
    /// TOML config file; defaults to ./credgate.toml when present
    #[arg(short, long, env = "CREDGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides `bind_addr`
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Log level, overrides `log_level`
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        if let Some(bind) = self.bind {
            settings.bind_addr = bind;
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Create storage
    let store = storage::open_store(&settings.store)?;
    info!(
        backend = ?settings.store.backend,
        records = store.len().await?,
        unique_usernames = settings.store.unique_usernames,
        "credential store ready"
    );

    // Create application state; hashing the timing decoy is CPU-bound
    let bind_addr = settings.bind_addr;
    let state = tokio::task::spawn_blocking(move || AppState::new(store, &settings)).await??;
    info!(
        algorithm = ?state.credentials.hasher().algorithm(),
        origin = ?state.allowed_origin,
        "credential service ready"
    );

    let app = router::create_router(Arc::new(state));

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
