//! Balance summary domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated amounts for one user within an inclusive time window.
///
/// `total_debits` is reported as a positive magnitude; `balance` is the
/// plain signed sum over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub balance: Decimal,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
}

impl BalanceSummary {
    pub fn zero() -> Self {
        Self {
            balance: Decimal::ZERO,
            total_debits: Decimal::ZERO,
            total_credits: Decimal::ZERO,
        }
    }
}
