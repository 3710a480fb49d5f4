//! Job submission.
//!
//! One submission is one child process: the composed script goes to the
//! scheduler's submit command on stdin and the job id is read from its
//! stdout. There is no retry and no timeout.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::backend::{self, BatchSystem, ComposedScript, SubmitMode};
use crate::config::PlatformSettings;
use crate::error::{JobError, JobResult};
use crate::job::Job;

/// What happened to a submitted job.
#[derive(Debug)]
pub enum Submitted {
    /// The scheduler accepted the job.
    Queued {
        /// Scheduler job id.
        jobid: String,
        /// Where the `.shell` copy of the script was written.
        script_copy: PathBuf,
    },
    /// The script was composed but not submitted.
    Printed {
        /// The composed script (or the bare command for local jobs).
        script: String,
    },
    /// The command ran on this machine.
    Ran {
        /// Exit status of `sh -c`.
        status: ExitStatus,
    },
}

/// Submits jobs through one backend.
pub struct Submitter {
    backend: &'static dyn BatchSystem,
    settings: PlatformSettings,
    dry_run: bool,
    command: Option<(String, Vec<String>)>,
}

impl Submitter {
    /// Create a submitter for `backend` with resolved platform settings.
    pub fn new(backend: &'static dyn BatchSystem, settings: PlatformSettings) -> Self {
        Self {
            backend,
            settings,
            dry_run: false,
            command: None,
        }
    }

    /// Compose scripts but never run anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace the backend's submit command (e.g. a wrapper on a login node).
    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.command = Some((program.into(), args));
        self
    }

    /// The backend in use.
    pub fn backend(&self) -> &'static dyn BatchSystem {
        self.backend
    }

    /// Compose the script for `job` without submitting it.
    pub fn compose(&self, job: &Job) -> ComposedScript {
        backend::compose(self.backend, job, &self.settings)
    }

    /// Submit `job`.
    pub async fn submit(&self, job: &Job) -> JobResult<Submitted> {
        match self.backend.submit_mode() {
            SubmitMode::Local => self.run_local(job).await,
            SubmitMode::Print => Ok(Submitted::Printed {
                script: self.compose(job).text,
            }),
            SubmitMode::Scheduler if self.dry_run => Ok(Submitted::Printed {
                script: self.compose(job).text,
            }),
            SubmitMode::Scheduler => self.submit_script(job).await,
        }
    }

    async fn run_local(&self, job: &Job) -> JobResult<Submitted> {
        let [command] = job.command.as_slice() else {
            return Err(JobError::Unsupported(
                "non trivial jobs not supported by local backend".to_string(),
            ));
        };

        if self.dry_run {
            return Ok(Submitted::Printed {
                script: command.clone(),
            });
        }

        debug!("running locally: {command}");
        let status = Command::new("sh").arg("-c").arg(command).status().await?;
        if !status.success() {
            warn!("local command exited with {status}");
        }
        Ok(Submitted::Ran { status })
    }

    async fn submit_script(&self, job: &Job) -> JobResult<Submitted> {
        let (program, args) = match self.command {
            Some((ref program, ref args)) => (program.clone(), args.clone()),
            None => match self.backend.submit_command() {
                Some(program) => (program.to_string(), Vec::new()),
                None => {
                    return Err(JobError::Unsupported(format!(
                        "{} has no submit command",
                        self.backend.platform()
                    )));
                }
            },
        };
        let Some(pattern) = self.backend.submit_pattern() else {
            return Err(JobError::Unsupported(format!(
                "{} has no submit output pattern",
                self.backend.platform()
            )));
        };

        let composed = self.compose(job);
        let submit_error = |message: String| JobError::Submit {
            command: program.clone(),
            message,
        };

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| submit_error(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(composed.text.as_bytes())
                .await
                .map_err(|e| submit_error(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| submit_error(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let jobid = pattern
            .captures(&stdout)
            .and_then(|caps| caps.name("id"))
            .map(|m| m.as_str().to_string());

        let jobid = match jobid {
            Some(jobid) if output.status.success() => jobid,
            _ => {
                error!("submission failed\n{}", composed.text);
                error!("stdout: {}", stdout.trim_end());
                error!("stderr: {}", stderr.trim_end());
                return Err(submit_error(format!(
                    "{}: {}",
                    output.status,
                    stderr.trim()
                )));
            }
        };

        let script_copy = PathBuf::from(format!("{}.shell", composed.logname.expand(&jobid, "arr")));
        write_copy(&script_copy, &composed.text).await?;

        info!("submitted job {jobid}");
        Ok(Submitted::Queued { jobid, script_copy })
    }
}

async fn write_copy(path: &Path, text: &str) -> JobResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Platform;
    use crate::options::JobOptions;

    fn settings_in(dir: &Path) -> PlatformSettings {
        let mut settings = PlatformSettings::default();
        settings.options.logpath = Some(dir.display().to_string());
        settings
    }

    #[tokio::test]
    async fn test_dry_run_prints_script() {
        let submitter = Submitter::new(Platform::Slurm.backend(), PlatformSettings::default())
            .dry_run(true);
        let Submitted::Printed { script } = submitter.submit(&Job::new("echo hi")).await.unwrap()
        else {
            panic!("expected a printed script");
        };
        assert!(script.contains("run echo hi"));
    }

    #[tokio::test]
    async fn test_print_backend_never_submits() {
        let submitter = Submitter::new(Platform::Print.backend(), PlatformSettings::default());
        let result = submitter.submit(&Job::new("true")).await.unwrap();
        assert!(matches!(result, Submitted::Printed { .. }));
    }

    #[tokio::test]
    async fn test_local_rejects_multiline() {
        let submitter = Submitter::new(Platform::Local.backend(), PlatformSettings::default());
        let err = submitter
            .submit(&Job::new("echo a\necho b"))
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_local_runs_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let job = Job::new(format!("touch {}", marker.display()));

        let submitter = Submitter::new(Platform::Local.backend(), PlatformSettings::default());
        let Submitted::Ran { status } = submitter.submit(&job).await.unwrap() else {
            panic!("expected a local run");
        };
        assert!(status.success());
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn test_submit_writes_shell_copy() {
        let dir = tempfile::tempdir().unwrap();
        let submitter = Submitter::new(Platform::Slurm.backend(), settings_in(dir.path()))
            .with_command(
                "sh",
                vec![
                    "-c".to_string(),
                    "cat > /dev/null; echo 'Submitted batch job 4242'".to_string(),
                ],
            );
        let job = Job::new("echo hi")
            .with_options(JobOptions::new().with_name("fit").with_array("1-2".parse().unwrap()));

        let Submitted::Queued { jobid, script_copy } = submitter.submit(&job).await.unwrap() else {
            panic!("expected a queued job");
        };
        assert_eq!(jobid, "4242");
        assert_eq!(script_copy, dir.path().join("fit-4242-arr.shell"));

        let text = std::fs::read_to_string(&script_copy).unwrap();
        assert!(text.contains("#SBATCH -a 1-2\n"));
    }

    #[tokio::test]
    async fn test_unexpected_output_is_submit_error() {
        let dir = tempfile::tempdir().unwrap();
        let submitter = Submitter::new(Platform::Slurm.backend(), settings_in(dir.path()))
            .with_command(
                "sh",
                vec![
                    "-c".to_string(),
                    "cat > /dev/null; echo 'sbatch: error: invalid partition' >&2; exit 1"
                        .to_string(),
                ],
            );

        let err = submitter.submit(&Job::new("true")).await.unwrap_err();
        assert!(matches!(err, JobError::Submit { ref command, .. } if command == "sh"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
