//! Status service - stored transaction summaries

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::TransactionRepository;

/// Status service for storage summaries
pub struct StatusService {
    repository: Arc<dyn TransactionRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let total_transactions = self.repository.transaction_count()?;
        let date_range = self.repository.transaction_date_range()?;

        Ok(StatusSummary {
            total_transactions,
            date_range,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_transactions: i64,
    pub date_range: DateRange,
}

/// Earliest and latest stored transaction datetimes, as text
#[derive(Debug, Default, Serialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}
