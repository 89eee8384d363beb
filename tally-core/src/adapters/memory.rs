//! In-memory repository fake for pipeline tests
//!
//! Mirrors the real adapter's contract closely enough for service tests:
//! unique ids, all-or-nothing inserts, kind-based aggregation. Failure
//! injection lets tests drive the internal-error paths, and every port
//! call is recorded so tests can assert which stages touched storage.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::result::{Error, Result};
use crate::domain::{BalanceSummary, Transaction, TransactionKind};
use crate::ports::TransactionRepository;
use crate::services::DateRange;

#[derive(Default)]
struct Inner {
    transactions: BTreeMap<i64, Transaction>,
    calls: Vec<&'static str>,
    fail_existing_ids: bool,
    fail_bulk_insert: bool,
}

/// In-memory transaction repository
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate storage without going through the port
    pub fn seed(&self, transactions: Vec<Transaction>) {
        let mut inner = self.inner.lock().unwrap();
        for tx in transactions {
            inner.transactions.insert(tx.id, tx);
        }
    }

    /// Make the next `existing_ids` calls fail
    pub fn fail_existing_ids(&self) {
        self.inner.lock().unwrap().fail_existing_ids = true;
    }

    /// Make the next `bulk_insert` calls fail
    pub fn fail_bulk_insert(&self) {
        self.inner.lock().unwrap().fail_bulk_insert = true;
    }

    /// Port methods invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Snapshot of stored transactions keyed by id
    pub fn stored(&self) -> BTreeMap<i64, Transaction> {
        self.inner.lock().unwrap().transactions.clone()
    }
}

impl TransactionRepository for MemoryRepository {
    fn existing_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("existing_ids");
        if inner.fail_existing_ids {
            return Err(Error::database("exists query failed"));
        }
        Ok(ids
            .iter()
            .copied()
            .filter(|id| inner.transactions.contains_key(id))
            .collect())
    }

    fn bulk_insert(&self, transactions: &[Transaction]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("bulk_insert");
        if inner.fail_bulk_insert {
            return Err(Error::database("insert failed"));
        }
        // All-or-nothing: reject the whole batch before storing anything,
        // the way the real backend's unique constraint rolls back
        if transactions
            .iter()
            .any(|tx| inner.transactions.contains_key(&tx.id))
        {
            return Err(Error::database("duplicate key violates unique constraint"));
        }
        for tx in transactions {
            inner.transactions.insert(tx.id, tx.clone());
        }
        Ok(())
    }

    fn user_has_any_transaction(&self, user_id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("user_has_any_transaction");
        Ok(inner
            .transactions
            .values()
            .any(|tx| tx.user_id == user_id))
    }

    fn user_balance_summary(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BalanceSummary> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("user_balance_summary");

        let mut summary = BalanceSummary::zero();
        for tx in inner.transactions.values() {
            if tx.user_id != user_id || tx.datetime < from || tx.datetime > to {
                continue;
            }
            summary.balance += tx.amount;
            // Aggregate on the stored kind, never re-derived from the amount
            match tx.kind {
                TransactionKind::Debit => summary.total_debits += -tx.amount,
                TransactionKind::Credit => summary.total_credits += tx.amount,
            }
        }
        Ok(summary)
    }

    fn transaction_count(&self) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("transaction_count");
        Ok(inner.transactions.len() as i64)
    }

    fn transaction_date_range(&self) -> Result<DateRange> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("transaction_date_range");
        let earliest = inner
            .transactions
            .values()
            .map(|tx| tx.datetime)
            .min()
            .map(|dt| dt.naive_utc().to_string());
        let latest = inner
            .transactions
            .values()
            .map(|tx| tx.datetime)
            .max()
            .map(|dt| dt.naive_utc().to_string());
        Ok(DateRange { earliest, latest })
    }
}
