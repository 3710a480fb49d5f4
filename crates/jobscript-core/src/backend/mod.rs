//! Workload-manager backends.
//!
//! | Platform | Directives | Submit | Decode | Log rules |
//! |----------|------------|--------|--------|-----------|
//! | `slurm`  | `#SBATCH`  | sbatch | yes    | srun/slurmstepd messages |
//! | `lsf`    | `#BSUB`    | bsub   | no     | none |
//! | `print`  | `#BATCH`   | prints the script | yes | none |
//! | `local`  | none       | runs a one-line command directly | - | none |
//!
//! The set is closed: [`Platform`] enumerates every backend and
//! [`Platform::backend`] resolves it to a static implementation.

mod local;
mod lsf;
mod print;
mod slurm;

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use local::Local;
pub use lsf::Lsf;
pub use print::Print;
pub use slurm::Slurm;

use crate::classify::LogClassifier;
use crate::config::PlatformSettings;
use crate::error::{JobError, JobResult};
use crate::job::Job;
use crate::options::JobOptions;
use crate::script::{COMPLETION_LINE, SETUP_MARKER};
use crate::template::LogTemplate;

/// Known workload-manager platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// SLURM workload manager.
    Slurm,
    /// IBM Platform LSF.
    Lsf,
    /// No batch system: print the script instead of submitting it.
    Print,
    /// Run single-line commands on this machine.
    Local,
}

impl Platform {
    /// Every registered platform.
    pub const ALL: [Platform; 4] = [
        Platform::Slurm,
        Platform::Lsf,
        Platform::Print,
        Platform::Local,
    ];

    /// Registry name of the platform.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Slurm => "slurm",
            Platform::Lsf => "lsf",
            Platform::Print => "print",
            Platform::Local => "local",
        }
    }

    /// The backend implementing this platform.
    pub fn backend(&self) -> &'static dyn BatchSystem {
        match self {
            Platform::Slurm => &Slurm,
            Platform::Lsf => &Lsf,
            Platform::Print => &Print,
            Platform::Local => &Local,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = JobError;

    fn from_str(name: &str) -> JobResult<Self> {
        Platform::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| JobError::UnknownPlatform(name.to_string()))
    }
}

/// Resolve a platform name to its backend.
pub fn get(name: &str) -> JobResult<&'static dyn BatchSystem> {
    let platform: Platform = name.parse()?;
    debug!("using {platform} backend");
    Ok(platform.backend())
}

/// How a backend hands the composed script over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Pipe the script into the scheduler's submit command.
    Scheduler,
    /// Print the script; nothing is submitted.
    Print,
    /// Run the command directly, without a script.
    Local,
}

/// Setter for one decoded directive.
pub type DecodeFn = fn(&mut JobOptions, &str) -> JobResult<()>;

/// Everything a platform contributes to writing, submitting and
/// reconciling jobs.
pub trait BatchSystem: LogClassifier + Send + Sync {
    /// The platform this backend implements.
    fn platform(&self) -> Platform;

    /// Comment prefix of directive lines (e.g. `#SBATCH`).
    fn prefix(&self) -> &'static str;

    /// Exported variables: portable name and the scheduler expression it maps to.
    fn env_vars(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Prefix put in front of each main command line.
    fn command_prefix(&self) -> Option<&'static str> {
        None
    }

    /// Extra setup lines after the environment exports.
    fn job_setup(&self) -> &'static [&'static str] {
        &[]
    }

    /// Extra teardown lines after the status capture.
    fn job_end(&self) -> &'static [&'static str] {
        &[]
    }

    /// How scripts are handed over.
    fn submit_mode(&self) -> SubmitMode {
        SubmitMode::Scheduler
    }

    /// Submission command, for [`SubmitMode::Scheduler`] backends.
    fn submit_command(&self) -> Option<&'static str> {
        None
    }

    /// Pattern with an `id` group matching the submit command's output.
    fn submit_pattern(&self) -> Option<&'static Regex> {
        None
    }

    /// Encode options as directive lines.
    fn encode_options(&self, options: &JobOptions) -> Vec<String>;

    /// Decode directive lines back into options.
    fn decode_options(&self, lines: &[String]) -> JobResult<JobOptions>;
}

/// A composed script and the log template it writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedScript {
    /// Full script text.
    pub text: String,

    /// Log template (directory included, `{name}` resolved).
    pub logname: LogTemplate,

    /// Options as encoded into the script.
    pub options: JobOptions,
}

/// Compose the full script for `job`, with `settings` supplying defaults,
/// setup and teardown.
pub fn compose(
    backend: &dyn BatchSystem,
    job: &Job,
    settings: &PlatformSettings,
) -> ComposedScript {
    let mut options = settings.options.merged_with(&job.options);

    let template = options
        .logname
        .clone()
        .unwrap_or_else(|| LogTemplate::default_for(options.name.is_some(), options.is_array()));
    let logname = template
        .under(options.logpath.as_deref().unwrap_or(""))
        .with_name(options.name.as_deref().unwrap_or("job"));
    options.logname = Some(logname.clone());

    let mut prolog = backend.encode_options(&options);
    prolog.push(SETUP_MARKER.to_string());
    prolog.extend(
        backend
            .env_vars()
            .iter()
            .map(|(name, var)| format!("export {name}=${var}")),
    );
    prolog.extend(backend.job_setup().iter().map(ToString::to_string));
    prolog.extend(settings.jobsetup.iter().cloned());

    let mut epilog = vec!["status=$?".to_string()];
    epilog.extend(backend.job_end().iter().map(ToString::to_string));
    epilog.extend(settings.jobend.iter().cloned());
    epilog.push(COMPLETION_LINE.to_string());
    epilog.push("exit $status".to_string());

    let text = job.write(backend.command_prefix(), &prolog, &epilog);

    ComposedScript {
        text,
        logname,
        options,
    }
}

/// Decode directive lines with an ordered `(flag, setter)` table.
///
/// The backend prefix and the following space are stripped; the first flag
/// that prefixes the remainder wins. Lines matching no flag are ignored.
pub(crate) fn decode_with_table(
    prefix: &str,
    table: &[(&str, DecodeFn)],
    lines: &[String],
) -> JobResult<JobOptions> {
    let mut options = JobOptions::default();
    for line in lines {
        let Some(body) = line.strip_prefix(prefix) else {
            continue;
        };
        let body = body.strip_prefix(' ').unwrap_or(body);
        if let Some((flag, set)) = table.iter().find(|(flag, _)| body.starts_with(flag)) {
            set(&mut options, &body[flag.len()..])?;
        }
    }
    Ok(options)
}
