//! Migrate command - bulk CSV transaction migration

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use super::{get_context, get_logger, log_event};
use crate::output;
use tally_core::LogEvent;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;

    let input = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;

    match ctx.migrate_service.migrate(BufReader::new(input)) {
        Ok(summary) => {
            log_event(
                &logger,
                LogEvent::new("migrate_completed").with_command("migrate"),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::success("Migration complete");
                println!();
                println!("  Inserted: {}", summary.inserted);
            }
            Ok(())
        }
        Err(err) => {
            log_event(
                &logger,
                LogEvent::new("migrate_failed")
                    .with_command("migrate")
                    .with_error(err.error.to_string())
                    .with_error_details(format!("{} row error(s)", err.row_errors.len())),
            );

            if json {
                let payload = serde_json::json!({
                    "code": err.error.code(),
                    "kind": err.error.kind(),
                    "message": err.error.to_string(),
                    "errors": err.row_errors,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                output::error(&format!(
                    "Migration failed: {} ({})",
                    err.error,
                    err.error.code()
                ));

                if !err.row_errors.is_empty() {
                    println!();
                    let mut table = output::create_table();
                    table.set_header(vec!["Row", "Field", "Value", "Message"]);
                    for row_err in &err.row_errors {
                        table.add_row(vec![
                            row_err.row.to_string(),
                            row_err.field.to_string(),
                            row_err.value.clone(),
                            row_err.message.clone(),
                        ]);
                    }
                    println!("{}", table);
                }
            }

            anyhow::bail!("migration rejected ({})", err.error.code())
        }
    }
}
