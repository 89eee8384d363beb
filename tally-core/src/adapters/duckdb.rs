//! DuckDB repository implementation

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use duckdb::{params, params_from_iter, Connection, ToSql};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{BalanceSummary, Transaction};
use crate::migrations::MIGRATIONS;
use crate::ports::TransactionRepository;
use crate::services::{DateRange, MigrationService};

/// Rows per multi-row INSERT statement inside one bulk transaction
const INSERT_BATCH_SIZE: usize = 500;

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn db_err(e: duckdb::Error) -> Error {
    Error::database(e.to_string())
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
}

impl DuckDbRepository {
    /// Open (or create) the database at `db_path`.
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which can occur when multiple processes touch the database
    /// file at the same moment.
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[tally] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Extension autoloading is never needed for this schema; disabling it
        // avoids code-signing trouble with cached extensions on macOS.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        MigrationService::new(&conn, MIGRATIONS).run_pending()?;
        Ok(())
    }
}

impl TransactionRepository for DuckDbRepository {
    fn existing_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        let mut result = HashSet::new();
        if ids.is_empty() {
            return Ok(result);
        }

        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; ids.len()].join(",");
        let query = format!("SELECT id FROM transactions WHERE id IN ({})", placeholders);
        let mut stmt = conn.prepare(&query).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter().copied()), |row| {
                row.get::<_, i64>(0)
            })
            .map_err(db_err)?;
        for id in rows {
            result.insert(id.map_err(db_err)?);
        }
        Ok(result)
    }

    fn bulk_insert(&self, transactions: &[Transaction]) -> Result<()> {
        if transactions.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(db_err)?;

        // Batch multi-row inserts to bound statement size; all chunks run
        // under the same outer transaction, so a failure in any chunk rolls
        // back every chunk.
        for chunk in transactions.chunks(INSERT_BATCH_SIZE) {
            insert_batch(&tx, chunk)?;
        }

        tx.commit().map_err(db_err)?;
        Ok(())
    }

    fn user_has_any_transaction(&self, user_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let result: std::result::Result<i64, duckdb::Error> = conn.query_row(
            "SELECT 1 FROM transactions WHERE user_id = ? LIMIT 1",
            params![user_id],
            |row| row.get(0),
        );
        match result {
            Ok(_) => Ok(true),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(db_err(e)),
        }
    }

    fn user_balance_summary(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BalanceSummary> {
        let conn = self.conn.lock().unwrap();
        // COALESCE avoids NULLs on empty windows; sums come back as text so
        // they round-trip through Decimal without a float detour.
        let (balance, debits, credits): (String, String, String) = conn
            .query_row(
                "SELECT
                    COALESCE(SUM(amount), 0)::VARCHAR AS balance,
                    COALESCE(SUM(CASE WHEN kind = 'debit' THEN -amount ELSE 0 END), 0)::VARCHAR AS total_debits,
                    COALESCE(SUM(CASE WHEN kind = 'credit' THEN amount ELSE 0 END), 0)::VARCHAR AS total_credits
                 FROM transactions
                 WHERE user_id = ? AND datetime BETWEEN ? AND ?",
                params![
                    user_id,
                    from.naive_utc().to_string(),
                    to.naive_utc().to_string()
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(db_err)?;

        Ok(BalanceSummary {
            balance: parse_decimal(&balance)?,
            total_debits: parse_decimal(&debits)?,
            total_credits: parse_decimal(&credits)?,
        })
    }

    fn transaction_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn transaction_date_range(&self) -> Result<DateRange> {
        let conn = self.conn.lock().unwrap();
        let (earliest, latest) = conn
            .query_row(
                "SELECT MIN(datetime)::VARCHAR, MAX(datetime)::VARCHAR FROM transactions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err)?;
        Ok(DateRange { earliest, latest })
    }
}

fn insert_batch(tx: &duckdb::Transaction, transactions: &[Transaction]) -> Result<()> {
    let mut sql =
        String::from("INSERT INTO transactions (id, user_id, amount, datetime, kind) VALUES ");
    let mut values: Vec<Box<dyn ToSql>> = Vec::with_capacity(transactions.len() * 5);
    for (i, t) in transactions.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str("(?, ?, ?, ?, ?)");
        values.push(Box::new(t.id));
        values.push(Box::new(t.user_id));
        // Fixed 2-decimal textual precision; timestamps normalized to UTC
        values.push(Box::new(format!("{:.2}", t.amount)));
        values.push(Box::new(t.datetime.naive_utc().to_string()));
        values.push(Box::new(t.kind.as_str()));
    }

    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    tx.execute(&sql, params.as_slice()).map_err(db_err)?;
    Ok(())
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    value
        .parse::<Decimal>()
        .map_err(|e| Error::database(format!("invalid decimal from storage: {}", e)))
}
