//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use jobscript_core::{Config, Job, JobOptions, JobRecord, Platform, scan_dir};

/// Job description shared by `submit` and `script`.
#[derive(Args, Debug, Clone, Default)]
pub struct JobArgs {
    /// Platform (slurm, lsf, print, local); defaults to the configured one
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Shell for the shebang line (e.g. bash, /bin/zsh)
    #[arg(long)]
    pub env: Option<String>,

    /// Setup line run before the command (repeatable)
    #[arg(long)]
    pub setup: Vec<String>,

    /// Job name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Queue or partition
    #[arg(short, long)]
    pub queue: Option<String>,

    /// Account to charge
    #[arg(long)]
    pub account: Option<String>,

    /// Quality of service
    #[arg(long)]
    pub qos: Option<String>,

    /// Job array range (e.g. 1-10,15,20-30:2)
    #[arg(short, long)]
    pub array: Option<String>,

    /// Wall-clock limit (hh:mm, hh:mm:ss or minutes)
    #[arg(short, long)]
    pub runtime: Option<String>,

    /// Log name template with {name}, {jobid} and {ind} fields
    #[arg(long)]
    pub logname: Option<String>,

    /// Directory for log files
    #[arg(long)]
    pub logpath: Option<String>,

    /// Memory limit
    #[arg(long)]
    pub memlimit: Option<String>,

    /// Local scratch limit
    #[arg(long)]
    pub tmplimit: Option<String>,

    /// Hosts to avoid, separated by spaces
    #[arg(long)]
    pub exclude: Option<String>,

    /// Command to run; a single argument is taken as a full shell line,
    /// several are quoted word by word
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl JobArgs {
    /// Options given on the command line.
    pub fn options(&self) -> Result<JobOptions> {
        let given = [
            ("name", &self.name),
            ("queue", &self.queue),
            ("account", &self.account),
            ("qos", &self.qos),
            ("array", &self.array),
            ("runtime", &self.runtime),
            ("logname", &self.logname),
            ("logpath", &self.logpath),
            ("memlimit", &self.memlimit),
            ("tmplimit", &self.tmplimit),
            ("exclude", &self.exclude),
        ];

        let options = JobOptions::from_pairs(
            given
                .iter()
                .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v))),
        )
        .context("Invalid job option")?;
        Ok(options)
    }

    /// The command as one shell line.
    pub fn command_line(&self) -> Result<String> {
        match self.command.as_slice() {
            [line] => Ok(line.clone()),
            words => shlex::try_join(words.iter().map(String::as_str))
                .context("Command contains a NUL byte"),
        }
    }

    /// Build the job.
    pub fn job(&self) -> Result<Job> {
        let mut job = Job::new(self.command_line()?).with_options(self.options()?);
        if !self.setup.is_empty() {
            job = job.with_setup(self.setup.join("\n"));
        }
        if let Some(ref env) = self.env {
            job = job.with_environment(env.clone());
        }
        Ok(job)
    }
}

/// Load configuration from the default sources.
pub fn load_config() -> Result<Config> {
    Config::load().context("Failed to load configuration")
}

/// Resolve the platform: the flag wins, then the configuration, then `print`.
pub fn resolve_platform(flag: Option<&str>, config: &Config) -> Result<Platform> {
    if let Some(name) = flag {
        return Ok(name.parse()?);
    }
    Ok(config.platform()?.unwrap_or(Platform::Print))
}

/// Reconcile every script in `dir` for the given platform.
pub fn load_records(dir: &Path, platform: Option<&str>) -> Result<Vec<JobRecord>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let config = load_config()?;
    let platform = resolve_platform(platform, &config)?;
    scan_dir(platform.backend(), dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))
}
