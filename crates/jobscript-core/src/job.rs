//! Job types.
//!
//! A [`Job`] is the composer-side description: command, setup and options.
//! Once a log has been read, each job (or each array task) gets a fresh
//! [`TaskOutcome`]; the pair is a [`JobRecord`], which shares the job
//! through an `Arc` so array tasks never copy or mutate it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::options::JobOptions;

/// A batch job: shell payload plus cluster options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Main command lines.
    pub command: Vec<String>,

    /// Setup lines executed before the command.
    pub script_setup: Vec<String>,

    /// Cluster options.
    pub options: JobOptions,

    /// Shell environment for the shebang (e.g. `bash` or `/bin/zsh`).
    pub environment: Option<String>,

    /// Lines between the shebang and the script marker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prolog: Vec<String>,

    /// Lines after the end marker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub epilog: Vec<String>,

    /// Platform job id, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Job {
    /// Create a job from command text; a multi-line string becomes several lines.
    pub fn new(command: impl AsRef<str>) -> Self {
        Self {
            command: split_lines(command.as_ref()),
            ..Default::default()
        }
    }

    /// Create a job from explicit command lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: lines.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Builder: set the setup lines.
    pub fn with_setup(mut self, setup: impl AsRef<str>) -> Self {
        self.script_setup = split_lines(setup.as_ref());
        self
    }

    /// Builder: set the options.
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }

    /// Builder: set the shell environment.
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = Some(env.into());
        self
    }

    /// The shebang line for this job's environment.
    pub fn shebang(&self) -> String {
        match self.environment.as_deref() {
            None | Some("") => "#!/bin/sh".to_string(),
            Some(env) if env.starts_with('/') => format!("#!{env}"),
            Some(env) => format!("#!/usr/bin/env {env}"),
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Final classification of a job or array task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResultCode {
    /// Script reached its end with exit status 0.
    Done,
    /// Script reached its end with a non-zero status (the raw `FAIL <n>` line).
    Fail(String),
    /// Script never reached its completion line.
    Unknown,
    /// No log file was found.
    Lost,
    /// The scheduler reported a problem it did not explain further.
    BatchErr,
    /// Wall-clock limit exceeded.
    Timeout,
    /// The node running the job failed.
    NodeFail,
    /// The job was cancelled.
    Killed,
    /// Out of memory.
    OoMemory,
    /// The job wrote to stderr or a step exited non-zero.
    Error,
    /// An unmapped scheduler cancellation reason.
    Other(String),
}

impl ResultCode {
    /// Interpret a completion line written by the script epilog.
    pub fn from_status_line(line: &str) -> Option<Self> {
        if line == "DONE" {
            Some(ResultCode::Done)
        } else if line.starts_with("FAIL") {
            Some(ResultCode::Fail(line.to_string()))
        } else {
            None
        }
    }

    /// The result name as it appears in reports.
    pub fn as_str(&self) -> &str {
        match self {
            ResultCode::Done => "DONE",
            ResultCode::Fail(line) => line,
            ResultCode::Unknown => "UNKNOWN",
            ResultCode::Lost => "LOST",
            ResultCode::BatchErr => "BATCHERR",
            ResultCode::Timeout => "TIMEOUT",
            ResultCode::NodeFail => "NODEFAIL",
            ResultCode::Killed => "KILLED",
            ResultCode::OoMemory => "OOMEMORY",
            ResultCode::Error => "ERROR",
            ResultCode::Other(reason) => reason,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResultCode {
    fn from(s: &str) -> Self {
        match s {
            "DONE" => ResultCode::Done,
            "UNKNOWN" => ResultCode::Unknown,
            "LOST" => ResultCode::Lost,
            "BATCHERR" => ResultCode::BatchErr,
            "TIMEOUT" => ResultCode::Timeout,
            "NODEFAIL" => ResultCode::NodeFail,
            "KILLED" => ResultCode::Killed,
            "OOMEMORY" => ResultCode::OoMemory,
            "ERROR" => ResultCode::Error,
            s if s.starts_with("FAIL") => ResultCode::Fail(s.to_string()),
            s => ResultCode::Other(s.to_string()),
        }
    }
}

impl Serialize for ResultCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResultCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ResultCode::from(s.as_str()))
    }
}

/// What a log said about one job or array task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Array index, for array tasks.
    pub index: Option<u32>,

    /// Node the task ran on, if the log reveals it.
    pub host: String,

    /// Whether the task completed cleanly.
    pub done: bool,

    /// Result classification.
    pub result: ResultCode,

    /// Lines the job itself wrote to stderr.
    pub stderr: Vec<String>,

    /// Lines the scheduler wrote to stderr.
    pub batch_messages: Vec<String>,
}

impl TaskOutcome {
    /// An outcome with the given result and no log content.
    pub fn new(result: ResultCode) -> Self {
        Self {
            index: None,
            host: String::new(),
            done: false,
            result,
            stderr: Vec::new(),
            batch_messages: Vec::new(),
        }
    }

    /// The outcome of a task whose log file does not exist.
    pub fn lost() -> Self {
        Self::new(ResultCode::Lost)
    }

    /// Builder: set the array index.
    pub fn with_index(mut self, index: Option<u32>) -> Self {
        self.index = index;
        self
    }
}

/// A job paired with the outcome of one of its tasks.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    /// Shared job description.
    pub job: Arc<Job>,

    /// Task outcome.
    pub outcome: TaskOutcome,
}

impl JobRecord {
    /// Pair a job with an outcome.
    pub fn new(job: Arc<Job>, outcome: TaskOutcome) -> Self {
        Self { job, outcome }
    }

    /// Display id: `<id>-<index>` for array tasks, `<id>` otherwise.
    pub fn jobid(&self) -> String {
        let id = self.job.id.as_deref().unwrap_or("job");
        match self.outcome.index {
            Some(index) => format!("{id}-{index}"),
            None => id.to_string(),
        }
    }

    /// The last command line of the job, for reports.
    pub fn last_command(&self) -> &str {
        self.job.command.last().map_or("", String::as_str)
    }
}
