//! Logs command - recent operational log entries

use anyhow::{anyhow, Result};
use chrono::DateTime;

use super::get_logger;
use crate::output;

pub fn run(limit: usize, json: bool) -> Result<()> {
    let logger = get_logger().ok_or_else(|| anyhow!("Failed to open log database"))?;
    let entries = logger.get_recent(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Command", "Error"]);
    for entry in &entries {
        let time = DateTime::from_timestamp_millis(entry.timestamp)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        table.add_row(vec![
            time,
            entry.event.clone(),
            entry.command.clone().unwrap_or_else(|| "-".to_string()),
            entry.error_message.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", table);

    Ok(())
}
