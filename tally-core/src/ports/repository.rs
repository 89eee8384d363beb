//! Repository port - storage abstraction

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::result::Result;
use crate::domain::{BalanceSummary, Transaction};
use crate::services::DateRange;

/// Storage abstraction for transactions.
///
/// This trait defines the storage operations the services depend on.
/// Implementations (adapters) provide the actual database access logic;
/// tests use an in-memory fake.
pub trait TransactionRepository: Send + Sync {
    /// Return the subset of `ids` that already exist in storage.
    ///
    /// An empty input yields an empty set without a storage round-trip.
    /// Never mutates storage.
    fn existing_ids(&self, ids: &[i64]) -> Result<HashSet<i64>>;

    /// Persist all transactions under a single all-or-nothing storage
    /// transaction. An empty list is a no-op success.
    fn bulk_insert(&self, transactions: &[Transaction]) -> Result<()>;

    /// True if the user has at least one transaction, at any datetime.
    fn user_has_any_transaction(&self, user_id: i64) -> Result<bool>;

    /// Aggregate signed amounts for a user within the inclusive
    /// `[from, to]` window.
    fn user_balance_summary(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BalanceSummary>;

    /// Total number of stored transactions.
    fn transaction_count(&self) -> Result<i64>;

    /// Earliest and latest stored transaction datetimes.
    fn transaction_date_range(&self) -> Result<DateRange>;
}
