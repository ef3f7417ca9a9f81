pub mod clock;
pub mod completion;
pub mod config;
pub mod context;
pub mod dates;
pub mod db;
pub mod models;
pub mod occurrence;
pub mod reminders;
pub mod store;
pub mod tasks;

use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::clock::SystemClock;
use crate::config::EngineConfig;
use crate::context::CareContext;
use crate::db::DatabaseError;
use crate::reminders::LogNotifier;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    if let Err(e) = serve() {
        tracing::error!(error = %e, "{} stopped", config::APP_NAME);
    }
}

/// Open the database, load the session and scan for reminders until Ctrl-C.
fn serve() -> Result<(), RunError> {
    let engine = EngineConfig::from_env();
    let path = config::database_path();
    let conn = db::share(db::open_database(&path)?);
    tracing::info!(path = %path.display(), "Database opened");

    let mut ctx = CareContext::load(db::sqlite_stores(&conn), Box::new(SystemClock), engine.clone());
    ctx.set_notifier(Box::new(LogNotifier));
    tracing::info!(
        calendar = ctx.calendar_tasks().len(),
        today = ctx.today_tasks().len(),
        unread = ctx.unread_count(),
        "Session ready"
    );

    let shared = context::share(ctx);
    let handle = reminders::start_reminder_loop(
        shared.clone(),
        Duration::from_secs(engine.scan_interval_secs),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(tokio::signal::ctrl_c())?;

    tracing::info!("Shutdown requested");
    handle.shutdown();
    drop(handle);
    Ok(())
}
