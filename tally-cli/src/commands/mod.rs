//! CLI command implementations

pub mod balance;
pub mod logs;
pub mod migrate;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tally_core::{EntryPoint, LogEvent, LoggingService, TallyContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (it should never block an
/// operation)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_tally_dir();
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the tally directory from environment or default
pub fn get_tally_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TALLY_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".tally")
    }
}

/// Get or create tally context
pub fn get_context() -> Result<TallyContext> {
    let data_dir = get_tally_dir();

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create tally directory: {:?}", data_dir))?;

    TallyContext::new(&data_dir).context("Failed to initialize tally context")
}
