//! Balance command - per-user balance summary

use anyhow::Result;
use chrono::Utc;

use super::{get_context, get_logger, log_event};
use crate::output;
use tally_core::{LogEvent, TimeRange};

pub fn run(user_id: i64, from: Option<&str>, to: Option<&str>, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;

    let range = TimeRange::parse(from, to, Utc::now())?;

    match ctx.balance_service.balance(user_id, range) {
        Ok(summary) => {
            log_event(
                &logger,
                LogEvent::new("balance_queried").with_command("balance"),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let mut table = output::create_table();
                table.set_header(vec!["Balance", "Total debits", "Total credits"]);
                table.add_row(vec![
                    summary.balance.to_string(),
                    summary.total_debits.to_string(),
                    summary.total_credits.to_string(),
                ]);
                println!("{}", table);
            }
            Ok(())
        }
        Err(err) => {
            log_event(
                &logger,
                LogEvent::new("balance_failed")
                    .with_command("balance")
                    .with_error(err.to_string()),
            );
            Err(err.into())
        }
    }
}
