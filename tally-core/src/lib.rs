//! Tally Core - Business logic for bulk transaction migration
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Transaction, BalanceSummary, errors)
//! - **ports**: Trait definitions for external dependencies (TransactionRepository)
//! - **services**: Business logic orchestration (migrate, balance, status)
//! - **adapters**: Concrete implementations (DuckDB, in-memory test fake)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::TransactionRepository;
use services::{BalanceService, MigrateService, StatusService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind};
pub use domain::{BalanceSummary, Transaction, TransactionKind};
pub use services::{EntryPoint, LogEvent, LoggingService, MigrateError, MigrateSummary, RowError, TimeRange};

/// Main context for Tally operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct TallyContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub migrate_service: MigrateService,
    pub balance_service: BalanceService,
    pub status_service: StatusService,
}

impl TallyContext {
    /// Create a new Tally context
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(&config.db_file);
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        // Create services against the port, not the concrete adapter
        let port: Arc<dyn TransactionRepository> = repository.clone();
        let migrate_service = MigrateService::new(Arc::clone(&port));
        let balance_service = BalanceService::new(Arc::clone(&port));
        let status_service = StatusService::new(port);

        Ok(Self {
            config,
            repository,
            migrate_service,
            balance_service,
            status_service,
        })
    }
}
