//! Transaction domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of a transaction, derived from the sign of its amount.
///
/// Computed once when the transaction is built and stored alongside it;
/// readers never recompute it from the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Debit if the amount is negative, credit otherwise (zero is a credit).
    pub fn from_amount(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

/// A single financial transaction belonging to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Globally unique identifier
    pub id: i64,
    /// Owner identifier; not validated against any user registry
    pub user_id: i64,
    /// Signed monetary amount, exact to at least 2 fraction digits
    pub amount: Decimal,
    /// UTC instant; never later than the migration's reference "now"
    pub datetime: DateTime<Utc>,
    pub kind: TransactionKind,
}

impl Transaction {
    /// Create a new transaction, deriving the kind from the amount sign
    pub fn new(id: i64, user_id: i64, amount: Decimal, datetime: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            amount,
            datetime,
            kind: TransactionKind::from_amount(amount),
        }
    }
}
