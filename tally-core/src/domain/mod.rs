//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod balance;
mod transaction;
pub mod result;

pub use balance::BalanceSummary;
pub use transaction::{Transaction, TransactionKind};
