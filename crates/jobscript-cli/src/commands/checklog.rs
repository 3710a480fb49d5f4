//! Checklog command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use jobscript_core::Summary;

use super::common::load_records;

/// Execute the checklog command.
pub fn execute(dir: &Path, platform: Option<&str>, format: &str) -> Result<()> {
    let records = load_records(dir, platform)?;
    let summary = Summary::from_records(&records);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "table" => print_table(dir, &summary),
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }

    Ok(())
}

fn print_table(dir: &Path, summary: &Summary) {
    println!(
        "{} {}\n",
        style("Logs in").cyan().bold(),
        style(dir.display()).green()
    );
    println!("  Completed:  {}", style(summary.completed).green());
    println!(
        "  Incomplete: {}",
        if summary.incomplete == 0 {
            style(summary.incomplete).green()
        } else {
            style(summary.incomplete).red()
        }
    );

    if !summary.results.is_empty() {
        println!();
        for (result, count) in &summary.results {
            println!("  {:<12} {:>6}", style(result).yellow(), count);
        }
    }
}
