//! jobscript Command-Line Interface
//!
//! Writes batch scripts, submits them, and summarizes the logs jobs leave
//! behind.
//!
//! ```text
//! jobscript submit --platform slurm --name fit --array 1-100 -- python fit.py
//! jobscript script --queue short -- ./analyse.sh
//! jobscript checklog logs/
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::JobArgs;
use commands::{checklog, hosts, jobs, platforms, script, submit};

/// jobscript - portable batch scripts for SLURM and LSF clusters
#[derive(Parser)]
#[command(name = "jobscript")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a batch script and submit it
    Submit {
        #[command(flatten)]
        job: JobArgs,

        /// Print the script instead of submitting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the batch script a submission would use
    Script {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Count completed and incomplete tasks in a log directory
    Checklog {
        /// Directory holding the .shell scripts and logs
        dir: PathBuf,

        /// Platform the jobs ran on
        #[arg(short, long)]
        platform: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List incomplete tasks grouped by result
    Jobs {
        /// Directory holding the .shell scripts and logs
        dir: PathBuf,

        /// Platform the jobs ran on
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Show which hosts incomplete tasks ran on, grouped by result
    Hosts {
        /// Directory holding the .shell scripts and logs
        dir: PathBuf,

        /// Platform the jobs ran on
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// List supported platforms
    Platforms,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Submit { job, dry_run } => submit::execute(&job, dry_run).await,
        Commands::Script { job } => script::execute(&job).await,
        Commands::Checklog {
            dir,
            platform,
            format,
        } => checklog::execute(&dir, platform.as_deref(), &format),
        Commands::Jobs { dir, platform } => jobs::execute(&dir, platform.as_deref()),
        Commands::Hosts { dir, platform } => hosts::execute(&dir, platform.as_deref()),
        Commands::Platforms => {
            platforms::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
