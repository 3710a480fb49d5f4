//! Jobs command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use jobscript_core::reconcile::incomplete_by_result;

use super::common::load_records;

/// Execute the jobs command.
pub fn execute(dir: &Path, platform: Option<&str>) -> Result<()> {
    let records = load_records(dir, platform)?;
    let groups = incomplete_by_result(&records);

    if groups.is_empty() {
        println!("{} All {} tasks completed", style("✓").green().bold(), records.len());
        return Ok(());
    }

    for (result, group) in &groups {
        println!("{} ({})", style(result).yellow().bold(), group.len());
        for record in group {
            println!("  {:<16} {}", style(record.jobid()).cyan(), record.last_command());
        }
    }

    Ok(())
}
