//! Balance service - per-user balance aggregation

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::result::{Error, Result};
use crate::domain::BalanceSummary;
use crate::ports::TransactionRepository;

/// A validated inclusive `[from, to]` query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Parse an optional `from`/`to` pair into a valid window.
    ///
    /// Rules:
    /// - bounds must be RFC 3339 ending with `Z`
    /// - both present: lower = min, upper = max
    /// - one present: the other bound is `now`
    /// - none present: full history up to `now`
    /// - the upper bound must not be after `now`
    pub fn parse(from: Option<&str>, to: Option<&str>, now: DateTime<Utc>) -> Result<Self> {
        let from = from.map(str::trim).filter(|s| !s.is_empty());
        let to = to.map(str::trim).filter(|s| !s.is_empty());

        let (from, to) = match (from, to) {
            (Some(from), Some(to)) => {
                let from = parse_bound(from)?;
                let to = parse_bound(to)?;
                if from <= to {
                    (from, to)
                } else {
                    (to, from)
                }
            }
            (Some(from), None) => (parse_bound(from)?, now),
            (None, Some(to)) => (parse_bound(to)?, now),
            // No limits provided: full history until now
            (None, None) => (beginning_of_time(), now),
        };

        if to > now {
            return Err(Error::bad_request(
                "invalid_range",
                "upper bound cannot be in the future",
            ));
        }
        Ok(Self { from, to })
    }
}

fn parse_bound(value: &str) -> Result<DateTime<Utc>> {
    if !value.ends_with('Z') {
        return Err(Error::bad_request(
            "invalid_datetime",
            "datetime must be RFC3339 with Z",
        ));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::bad_request("invalid_datetime", "datetime must be RFC3339 with Z"))
}

fn beginning_of_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap()
}

/// Balance service for user balance summaries
pub struct BalanceService {
    repository: Arc<dyn TransactionRepository>,
}

impl BalanceService {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// Aggregate amounts within the window for the given user.
    ///
    /// Returns not found if the user has no transactions at all, even when
    /// the window itself is empty.
    pub fn balance(&self, user_id: i64, range: TimeRange) -> Result<BalanceSummary> {
        if !self.repository.user_has_any_transaction(user_id)? {
            return Err(Error::not_found(
                "user_transactions_not_found",
                "user has no transactions",
            ));
        }
        self.repository
            .user_balance_summary(user_id, range.from, range.to)
    }
}
