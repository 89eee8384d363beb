//! Status command - stored transaction summary

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    output::info("Tally status");
    println!();
    println!("  Transactions: {}", status.total_transactions);
    match (&status.date_range.earliest, &status.date_range.latest) {
        (Some(earliest), Some(latest)) => {
            println!("  Date range: {} .. {}", earliest, latest);
        }
        _ => println!("  Date range: -"),
    }

    Ok(())
}
