// RKL stats service entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open the document store
// 4. Start the trigger source (listener or replay file)
// 5. Run the application loop until the source ends or Ctrl+C

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use rkl_core::config;
use rkl_core::db::Database;
use rkl_service::{app, source};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("RKL stats service starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={} ({:?}, {:?})",
        config.league.name, config.league.kind, config.league.environment
    );

    config::prepare_db_dir(&config.db_path).context("failed to prepare database directory")?;
    let db_path = config.db_path.to_string_lossy().into_owned();
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {db_path}");

    let (tx, rx) = mpsc::channel(256);
    let source = source::from_config(&config);
    info!("Receiving game writes from {}", source.describe());
    let source_handle = tokio::spawn(async move {
        if let Err(e) = source.run(tx).await {
            error!("Trigger source error: {e:#}");
        }
    });

    tokio::select! {
        stats = app::run(rx, Arc::new(db), config.naming()) => {
            let stats = stats.context("application loop failed")?;
            info!("Trigger source finished: {stats:?}");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
        }
    }

    source_handle.abort();
    info!("RKL stats service shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to `logs/rkl-service.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("rkl-service.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rkl=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
