//! Hosts command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use jobscript_core::reconcile::hosts_by_result;

use super::common::load_records;

/// Execute the hosts command.
pub fn execute(dir: &Path, platform: Option<&str>) -> Result<()> {
    let records = load_records(dir, platform)?;
    let hosts = hosts_by_result(&records);

    if hosts.is_empty() {
        println!("{} No incomplete tasks", style("✓").green().bold());
        return Ok(());
    }

    for (result, counts) in &hosts {
        println!("{}", style(result).yellow().bold());
        let mut counts: Vec<(&String, &usize)> = counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (host, count) in counts {
            println!("  {:<20} {:>6}", host, count);
        }
    }

    Ok(())
}
