//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod balance;
mod status;
pub mod logging;
pub mod migrate;
pub mod migration;

pub use balance::{BalanceService, TimeRange};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migrate::{MigrateError, MigrateService, MigrateSummary, ParsedRow, RowError};
pub use migration::{MigrationResult, MigrationService};
pub use status::{DateRange, StatusService, StatusSummary};
