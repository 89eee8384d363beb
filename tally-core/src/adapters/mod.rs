//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the TransactionRepository port
//! - An in-memory fake of the same port for pipeline tests

pub mod duckdb;

#[cfg(test)]
pub mod memory;
