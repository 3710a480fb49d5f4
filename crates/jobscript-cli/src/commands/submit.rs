//! Submit command implementation.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use jobscript_core::{SubmitMode, Submitted, Submitter};

use super::common::{JobArgs, load_config, resolve_platform};

/// Execute the submit command.
pub async fn execute(args: &JobArgs, dry_run: bool) -> Result<()> {
    let config = load_config()?;
    let platform = resolve_platform(args.platform.as_deref(), &config)?;
    let job = args.job()?;

    let submitter = Submitter::new(platform.backend(), config.settings(platform)?).dry_run(dry_run);

    let spinner = (platform.backend().submit_mode() == SubmitMode::Scheduler && !dry_run)
        .then(|| -> Result<ProgressBar> {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
            spinner.set_message(format!("Submitting to {platform}..."));
            spinner.enable_steady_tick(Duration::from_millis(100));
            Ok(spinner)
        })
        .transpose()?;

    let submitted = submitter.submit(&job).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match submitted? {
        Submitted::Queued { jobid, script_copy } => {
            println!(
                "{} Submitted job {} to {}",
                style("✓").green().bold(),
                style(&jobid).cyan(),
                style(platform).magenta()
            );
            println!("  Script: {}", script_copy.display());
        }
        Submitted::Printed { script } => print!("{script}"),
        Submitted::Ran { status } => {
            if !status.success() {
                anyhow::bail!("Local command failed: {status}");
            }
        }
    }

    Ok(())
}
