//! Migrate service - bulk CSV transaction migration
//!
//! Runs a single pass over the input stream (header check, per-row
//! validation, domain transaction construction), then a conflict check
//! against storage, then one all-or-nothing bulk insert. The stages are
//! evaluated strictly in that order and the first failing stage decides
//! the outcome; later stages are never reached.

use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::result::Error;
use crate::domain::Transaction;
use crate::ports::TransactionRepository;

/// The strict order of required CSV columns.
pub const EXPECTED_HEADERS: [&str; 4] = ["id", "user_id", "amount", "datetime"];

/// A row-level validation or conflict detail.
///
/// `row` is the 1-based data row ordinal; 0 marks a file-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl RowError {
    fn file(message: impl Into<String>) -> Self {
        Self {
            row: 0,
            field: "file",
            value: String::new(),
            message: message.into(),
        }
    }
}

/// Raw string values of a structurally valid row, kept so later stages can
/// reference the original input text even when a value failed to parse.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub row: usize,
    pub id: String,
    pub user_id: String,
    pub amount: String,
    pub datetime: String,
}

/// Result of a successful migration.
#[derive(Debug, Serialize)]
pub struct MigrateSummary {
    /// Number of inserted rows
    pub inserted: usize,
}

/// A failed migration: one outcome classification plus row-level detail.
///
/// The row errors are advisory detail; `error` alone decides the outcome
/// class (`bad_request`, `conflict` or `internal`).
#[derive(Debug, Error)]
#[error("{error}")]
pub struct MigrateError {
    pub error: Error,
    pub row_errors: Vec<RowError>,
}

impl MigrateError {
    fn new(error: Error, row_errors: Vec<RowError>) -> Self {
        Self { error, row_errors }
    }
}

/// Everything one parse pass produces.
struct ParsedFile {
    transactions: Vec<Transaction>,
    rows: Vec<ParsedRow>,
    row_errors: Vec<RowError>,
}

/// Migrate service for bulk CSV ingestion
pub struct MigrateService {
    repository: Arc<dyn TransactionRepository>,
    /// Reference "now" for future-datetime validation. Injected so the
    /// parse pass is deterministic under test.
    now: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl MigrateService {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self {
            repository,
            now: Box::new(Utc::now),
        }
    }

    /// Create a service with a fixed clock
    pub fn with_now(
        repository: Arc<dyn TransactionRepository>,
        now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        Self {
            repository,
            now: Box::new(now),
        }
    }

    /// Run the migration pipeline over a CSV stream.
    ///
    /// On success returns the inserted row count. On failure returns the
    /// outcome classification plus zero or more row errors; nothing is
    /// persisted unless every row was valid and conflict-free.
    pub fn migrate(&self, input: impl Read) -> Result<MigrateSummary, MigrateError> {
        let parsed = match self.read_and_validate(input) {
            Ok(parsed) => parsed,
            // Header or CSV malformed: validation failure, storage untouched
            Err(_) => {
                return Err(MigrateError::new(
                    Error::bad_request("validation_error", "validation failed"),
                    vec![RowError::file("invalid or missing header")],
                ));
            }
        };

        if !parsed.row_errors.is_empty() {
            return Err(MigrateError::new(
                Error::bad_request("validation_error", "validation failed"),
                parsed.row_errors,
            ));
        }
        if parsed.transactions.is_empty() {
            return Err(MigrateError::new(
                Error::bad_request("validation_error", "validation failed"),
                vec![RowError::file("CSV contains no data rows")],
            ));
        }

        let ids: Vec<i64> = parsed.transactions.iter().map(|tx| tx.id).collect();
        let existing = self
            .repository
            .existing_ids(&ids)
            .map_err(|e| MigrateError::new(e, Vec::new()))?;
        if !existing.is_empty() {
            let row_errors = parsed
                .rows
                .iter()
                .filter(|row| !row.id.is_empty())
                .filter_map(|row| {
                    let id = row.id.parse::<i64>().ok()?;
                    existing.contains(&id).then(|| RowError {
                        row: row.row,
                        field: "id",
                        value: row.id.clone(),
                        message: "id already exists in DB".to_string(),
                    })
                })
                .collect();
            return Err(MigrateError::new(
                Error::conflict("duplicate_id", "conflict"),
                row_errors,
            ));
        }

        self.repository
            .bulk_insert(&parsed.transactions)
            .map_err(|e| MigrateError::new(e, Vec::new()))?;

        Ok(MigrateSummary {
            inserted: parsed.transactions.len(),
        })
    }

    /// Single pass over the CSV: header check, per-row validation, and
    /// domain transaction construction. Never touches storage.
    fn read_and_validate(&self, input: impl Read) -> anyhow::Result<ParsedFile> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let now = (self.now)();

        let mut transactions = Vec::new();
        let mut rows = Vec::new();
        let mut row_errors = Vec::new();
        // id -> first data row it was seen at
        let mut seen_ids: HashMap<i64, usize> = HashMap::new();

        for (record_idx, record) in reader.records().enumerate() {
            let record = record?;

            // Header (mandatory): first 4 columns must match in order
            if record_idx == 0 {
                if is_header(&record) {
                    continue;
                }
                bail!("invalid or missing header");
            }

            let row_num = record_idx; // data rows start at 1
            let cols = record.len();
            // Require at least the first 4 columns (ignore extras)
            if cols < EXPECTED_HEADERS.len() {
                row_errors.push(RowError {
                    row: row_num,
                    field: "columns",
                    value: cols.to_string(),
                    message: format!(
                        "at least {} columns required: {}",
                        EXPECTED_HEADERS.len(),
                        EXPECTED_HEADERS.join(",")
                    ),
                });
                continue;
            }

            let id_str = record[0].trim().to_string();
            let user_id_str = record[1].trim();
            let amount_str = record[2].trim();
            let datetime_str = record[3].trim();
            rows.push(ParsedRow {
                row: row_num,
                id: id_str.clone(),
                user_id: user_id_str.to_string(),
                amount: amount_str.to_string(),
                datetime: datetime_str.to_string(),
            });

            // Parse and validate, first failure wins
            let id = match id_str.parse::<i64>() {
                Ok(id) => id,
                Err(_) => {
                    row_errors.push(RowError {
                        row: row_num,
                        field: "id",
                        value: id_str,
                        message: "not a valid integer".to_string(),
                    });
                    continue;
                }
            };
            let user_id = match user_id_str.parse::<i64>() {
                Ok(user_id) => user_id,
                Err(_) => {
                    row_errors.push(RowError {
                        row: row_num,
                        field: "user_id",
                        value: user_id_str.to_string(),
                        message: "not a valid integer".to_string(),
                    });
                    continue;
                }
            };
            let amount = match Decimal::from_str(amount_str) {
                Ok(amount) => amount,
                Err(_) => {
                    row_errors.push(RowError {
                        row: row_num,
                        field: "amount",
                        value: amount_str.to_string(),
                        message: "not a valid number".to_string(),
                    });
                    continue;
                }
            };
            let datetime = match DateTime::parse_from_rfc3339(datetime_str) {
                Ok(datetime) => datetime.with_timezone(&Utc),
                Err(_) => {
                    row_errors.push(RowError {
                        row: row_num,
                        field: "datetime",
                        value: datetime_str.to_string(),
                        message: "not a valid RFC3339 datetime".to_string(),
                    });
                    continue;
                }
            };
            if datetime > now {
                row_errors.push(RowError {
                    row: row_num,
                    field: "datetime",
                    value: datetime_str.to_string(),
                    message: "datetime is in the future".to_string(),
                });
                continue;
            }
            // Duplicate id within file
            if let Some(first_row) = seen_ids.get(&id) {
                row_errors.push(RowError {
                    row: row_num,
                    field: "id",
                    value: id.to_string(),
                    message: format!("duplicate id within file (first seen at row {})", first_row),
                });
                continue;
            }
            seen_ids.insert(id, row_num);

            transactions.push(Transaction::new(id, user_id, amount, datetime));
        }

        Ok(ParsedFile {
            transactions,
            rows,
            row_errors,
        })
    }
}

/// True if the record's first 4 columns match the expected header,
/// case-insensitively and whitespace-trimmed.
fn is_header(record: &csv::StringRecord) -> bool {
    if record.len() < EXPECTED_HEADERS.len() {
        return false;
    }
    EXPECTED_HEADERS
        .iter()
        .zip(record.iter())
        .all(|(expected, actual)| actual.trim().eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryRepository;
    use crate::domain::result::ErrorKind;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    fn service(repo: Arc<MemoryRepository>) -> MigrateService {
        MigrateService::with_now(repo, fixed_now)
    }

    #[test]
    fn test_happy_path_inserts_all_rows() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone());

        let csv = "id,user_id,amount,datetime\n\
                   1,10,12.34,2024-06-01T00:00:00Z\n\
                   2,20,-5.00,2024-06-02T00:00:00Z\n";
        let summary = svc.migrate(csv.as_bytes()).unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(repo.transaction_count().unwrap(), 2);
    }

    #[test]
    fn test_header_case_insensitive_and_trimmed() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let csv = " ID , USER_ID ,Amount,Datetime\n1,10,12.34,2024-06-01T00:00:00Z\n";
        let summary = svc.migrate(csv.as_bytes()).unwrap();
        assert_eq!(summary.inserted, 1);
    }

    #[test]
    fn test_invalid_header_is_file_level_error() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone());

        let err = svc
            .migrate("bad,header,here,now\n1,10,12.34,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::BadRequest);
        assert_eq!(err.error.code(), "validation_error");
        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].row, 0);
        assert_eq!(err.row_errors[0].field, "file");
        assert_eq!(err.row_errors[0].message, "invalid or missing header");
        assert!(repo.calls().is_empty(), "storage must not be touched");
    }

    #[test]
    fn test_header_with_correct_names_in_wrong_order_is_rejected() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let err = svc
            .migrate("id,amount,user_id,datetime\n1,12.34,10,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].field, "file");
    }

    #[test]
    fn test_extra_header_and_data_columns_are_ignored() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let csv = "id,user_id,amount,datetime,note\n1,10,12.34,2024-06-01T00:00:00Z,ignored\n";
        let summary = svc.migrate(csv.as_bytes()).unwrap();
        assert_eq!(summary.inserted, 1);
    }

    #[test]
    fn test_too_few_columns() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        // The short row is the only one flagged; the valid row after it is
        // still validated
        let err = svc
            .migrate("id,user_id,amount,datetime\n1,2,3\n4,5,6.00,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors.len(), 1);
        let row_err = &err.row_errors[0];
        assert_eq!(row_err.row, 1);
        assert_eq!(row_err.field, "columns");
        assert_eq!(row_err.value, "3");
        assert_eq!(
            row_err.message,
            "at least 4 columns required: id,user_id,amount,datetime"
        );
    }

    #[test]
    fn test_row_errors_report_field_and_row_number() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone());

        let csv = "id,user_id,amount,datetime\n\
                   abc,10,12.34,2024-06-01T00:00:00Z\n\
                   2,def,12.34,2024-06-01T00:00:00Z\n\
                   3,30,12.3.4,2024-06-01T00:00:00Z\n\
                   4,40,12.34,not-a-date\n";
        let err = svc.migrate(csv.as_bytes()).unwrap_err();

        assert_eq!(err.error.kind(), ErrorKind::BadRequest);
        assert_eq!(err.row_errors.len(), 4);
        assert_eq!(
            (err.row_errors[0].row, err.row_errors[0].field),
            (1, "id")
        );
        assert_eq!(err.row_errors[0].message, "not a valid integer");
        assert_eq!(
            (err.row_errors[1].row, err.row_errors[1].field),
            (2, "user_id")
        );
        assert_eq!(
            (err.row_errors[2].row, err.row_errors[2].field),
            (3, "amount")
        );
        assert_eq!(err.row_errors[2].message, "not a valid number");
        assert_eq!(
            (err.row_errors[3].row, err.row_errors[3].field),
            (4, "datetime")
        );
        assert_eq!(err.row_errors[3].message, "not a valid RFC3339 datetime");
        assert!(repo.calls().is_empty(), "storage must not be touched");
    }

    #[test]
    fn test_amount_must_be_exact_decimal_not_scientific() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let err = svc
            .migrate("id,user_id,amount,datetime\n1,10,1e5,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors[0].field, "amount");
    }

    #[test]
    fn test_future_datetime_rejected() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        // 24 hours past the fixed clock
        let err = svc
            .migrate("id,user_id,amount,datetime\n1,10,12.34,2024-07-02T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].field, "datetime");
        assert_eq!(err.row_errors[0].message, "datetime is in the future");
    }

    #[test]
    fn test_datetime_equal_to_now_is_accepted() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let summary = svc
            .migrate("id,user_id,amount,datetime\n1,10,12.34,2024-07-01T00:00:00Z\n".as_bytes())
            .unwrap();
        assert_eq!(summary.inserted, 1);
    }

    #[test]
    fn test_offset_datetime_is_normalized_to_utc() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        // 23:00+02:00 on July 1 is 21:00Z, within the fixed clock's past
        let err = svc
            .migrate("id,user_id,amount,datetime\n1,10,12.34,2024-07-01T23:00:00+02:00\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors[0].message, "datetime is in the future");

        // 23:00-02:00 on June 30 is 01:00Z July 1, also in the future
        let err = svc
            .migrate("id,user_id,amount,datetime\n1,10,12.34,2024-06-30T23:00:00-02:00\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors[0].message, "datetime is in the future");
    }

    #[test]
    fn test_duplicate_id_within_file_cites_first_row() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let csv = "id,user_id,amount,datetime\n\
                   7,10,12.34,2024-06-01T00:00:00Z\n\
                   8,20,1.00,2024-06-01T00:00:00Z\n\
                   7,30,2.00,2024-06-01T00:00:00Z\n";
        let err = svc.migrate(csv.as_bytes()).unwrap_err();

        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].row, 3);
        assert_eq!(err.row_errors[0].field, "id");
        assert_eq!(
            err.row_errors[0].message,
            "duplicate id within file (first seen at row 1)"
        );
    }

    #[test]
    fn test_empty_input_reports_no_data_rows() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let err = svc.migrate("".as_bytes()).unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::BadRequest);
        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].row, 0);
        assert_eq!(err.row_errors[0].message, "CSV contains no data rows");
    }

    #[test]
    fn test_header_only_file_reports_no_data_rows() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        let err = svc.migrate("id,user_id,amount,datetime\n".as_bytes()).unwrap_err();
        assert_eq!(err.row_errors[0].message, "CSV contains no data rows");
    }

    #[test]
    fn test_row_errors_take_precedence_over_emptiness() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo);

        // Every data row invalid: per-row errors win, not the emptiness message
        let err = svc
            .migrate("id,user_id,amount,datetime\nabc,10,12.34,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].field, "id");
    }

    #[test]
    fn test_conflict_against_storage() {
        let repo = Arc::new(MemoryRepository::new());
        repo.seed(vec![Transaction::new(
            1,
            10,
            Decimal::new(1234, 2),
            fixed_now(),
        )]);
        let svc = service(repo.clone());

        let csv = "id,user_id,amount,datetime\n\
                   1,10,12.34,2024-06-01T00:00:00Z\n\
                   2,20,1.00,2024-06-01T00:00:00Z\n";
        let err = svc.migrate(csv.as_bytes()).unwrap_err();

        assert_eq!(err.error.kind(), ErrorKind::Conflict);
        assert_eq!(err.error.code(), "duplicate_id");
        assert_eq!(err.row_errors.len(), 1);
        assert_eq!(err.row_errors[0].row, 1);
        assert_eq!(err.row_errors[0].field, "id");
        assert_eq!(err.row_errors[0].value, "1");
        assert_eq!(err.row_errors[0].message, "id already exists in DB");
        // No insert attempted, pre-existing row untouched
        assert_eq!(repo.transaction_count().unwrap(), 1);
        assert!(!repo.calls().contains(&"bulk_insert".to_string()));
    }

    #[test]
    fn test_storage_failure_on_conflict_check_is_internal() {
        let repo = Arc::new(MemoryRepository::new());
        repo.fail_existing_ids();
        let svc = service(repo);

        let err = svc
            .migrate("id,user_id,amount,datetime\n1,10,12.34,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Internal);
        assert!(err.row_errors.is_empty());
    }

    #[test]
    fn test_storage_failure_on_insert_is_internal() {
        let repo = Arc::new(MemoryRepository::new());
        repo.fail_bulk_insert();
        let svc = service(repo.clone());

        let err = svc
            .migrate("id,user_id,amount,datetime\n1,10,12.34,2024-06-01T00:00:00Z\n".as_bytes())
            .unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Internal);
        assert!(err.row_errors.is_empty());
        assert_eq!(repo.transaction_count().unwrap(), 0, "nothing persisted");
    }

    #[test]
    fn test_kind_derived_from_amount_sign() {
        use crate::domain::TransactionKind;

        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone());

        let csv = "id,user_id,amount,datetime\n\
                   1,10,12.34,2024-06-01T00:00:00Z\n\
                   2,10,-5.00,2024-06-01T00:00:00Z\n\
                   3,10,0.00,2024-06-01T00:00:00Z\n";
        svc.migrate(csv.as_bytes()).unwrap();

        let stored = repo.stored();
        assert_eq!(stored[&1].kind, TransactionKind::Credit);
        assert_eq!(stored[&2].kind, TransactionKind::Debit);
        assert_eq!(stored[&3].kind, TransactionKind::Credit);
    }

    #[test]
    fn test_fields_are_trimmed_before_parsing() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone());

        let csv = "id,user_id,amount,datetime\n 1 , 10 , 12.34 , 2024-06-01T00:00:00Z \n";
        let summary = svc.migrate(csv.as_bytes()).unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(repo.stored()[&1].user_id, 10);
    }
}
