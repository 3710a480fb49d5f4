//! Log reconciliation.
//!
//! After jobs have run, the `.shell` copies written at submission time are
//! read back: the directives give the log template and array range, the
//! file name gives the job id, and each task's `.err` log is classified.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::BatchSystem;
use crate::classify::classify_file;
use crate::error::{JobError, JobResult};
use crate::job::{Job, JobRecord};

const SCRIPT_SUFFIX: &str = ".shell";
const LOG_SUFFIX: &str = ".err";

/// Recover a submitted job from its `.shell` copy and classify its logs.
///
/// Array jobs produce one record per index; all records share the job.
pub fn parse_script(backend: &dyn BatchSystem, script: &Path) -> JobResult<Vec<JobRecord>> {
    let mut job = Job::from_file(script, backend.command_prefix())?;

    let directives: Vec<String> = job
        .prolog
        .iter()
        .filter(|line| line.starts_with(backend.prefix()))
        .cloned()
        .collect();
    let mut options = backend.decode_options(&directives)?;

    let Some(logname) = options.logname.take() else {
        return Err(JobError::MissingOption {
            option: "logname",
            script: script.display().to_string(),
        });
    };
    let (logdir, logname) = logname.split_dir();

    let file_name = script
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(SCRIPT_SUFFIX)
        .unwrap_or(&file_name)
        .to_string();
    let jobid = match logname.match_jobid(&stem)? {
        Some(jobid) => jobid,
        None => {
            debug!("{file_name} does not match {logname}; using the file name as id");
            stem.clone()
        }
    };

    options.logpath = (!logdir.is_empty()).then_some(logdir);
    options.logname = Some(logname.clone());
    job.options = options;
    job.id = Some(jobid.clone());
    let job = Arc::new(job);

    let records = match job.options.array {
        Some(ref array) => {
            let dir = script.parent().unwrap_or_else(|| Path::new(""));
            let mut records = Vec::new();
            for ind in array.indices() {
                let log = dir.join(format!("{}{LOG_SUFFIX}", logname.expand(&jobid, &ind.to_string())));
                let outcome = classify_file(backend, &log)?.with_index(Some(ind));
                records.push(JobRecord::new(Arc::clone(&job), outcome));
            }
            records
        }
        None => {
            let log = log_for_script(script);
            vec![JobRecord::new(Arc::clone(&job), classify_file(backend, &log)?)]
        }
    };

    Ok(records)
}

/// `<name>.shell` → `<name>.err`.
fn log_for_script(script: &Path) -> PathBuf {
    let text = script.to_string_lossy();
    match text.strip_suffix(SCRIPT_SUFFIX) {
        Some(base) => PathBuf::from(format!("{base}{LOG_SUFFIX}")),
        None => script.to_path_buf(),
    }
}

/// Reconcile every `.shell` script in `dir`, in file-name order.
///
/// Scripts that cannot be reconciled are skipped with a warning.
pub fn scan_dir(backend: &dyn BatchSystem, dir: &Path) -> JobResult<Vec<JobRecord>> {
    let mut scripts: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with(SCRIPT_SUFFIX))
        })
        .collect();
    scripts.sort();

    let mut records = Vec::new();
    for script in scripts {
        match parse_script(backend, &script) {
            Ok(found) => records.extend(found),
            Err(e) => warn!("skipping {}: {e}", script.display()),
        }
    }
    Ok(records)
}

/// Completion tallies over a set of task records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Tasks that finished cleanly.
    pub completed: usize,

    /// Tasks that did not.
    pub incomplete: usize,

    /// Incomplete tasks per result code.
    pub results: BTreeMap<String, usize>,
}

impl Summary {
    /// Tally `records`.
    pub fn from_records(records: &[JobRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            if record.outcome.done {
                summary.completed += 1;
            } else {
                summary.incomplete += 1;
                *summary
                    .results
                    .entry(record.outcome.result.to_string())
                    .or_default() += 1;
            }
        }
        summary
    }

    /// Total number of tasks.
    pub fn total(&self) -> usize {
        self.completed + self.incomplete
    }
}

/// Incomplete records grouped by result code.
pub fn incomplete_by_result(records: &[JobRecord]) -> BTreeMap<String, Vec<&JobRecord>> {
    let mut groups: BTreeMap<String, Vec<&JobRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.outcome.done) {
        groups
            .entry(record.outcome.result.to_string())
            .or_default()
            .push(record);
    }
    groups
}

/// Host counts of incomplete records, grouped by result code.
///
/// Tasks whose log named no host are counted under `unknown`.
pub fn hosts_by_result(records: &[JobRecord]) -> BTreeMap<String, BTreeMap<String, usize>> {
    let mut hosts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for (result, group) in incomplete_by_result(records) {
        let counts = hosts.entry(result).or_default();
        for record in group {
            let host = match record.outcome.host.as_str() {
                "" => "unknown",
                host => host,
            };
            *counts.entry(host.to_string()).or_default() += 1;
        }
    }
    hosts
}
