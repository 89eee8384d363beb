//! Log database migrations - embedded SQL files
//!
//! Same format as the transactions database migrations; applied to
//! logs.duckdb by the LoggingService.

use crate::services::migration::MigrationSet;

/// All migrations for the event-log database.
pub const LOG_MIGRATIONS: MigrationSet = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
