//! Parsers for SLURM output: sbatch replies and job stderr messages.

use std::sync::LazyLock;

use regex::Regex;

use crate::classify::{LineKind, Refinement};
use crate::job::ResultCode;

/// `sbatch` reply: "Submitted batch job 12345".
pub(super) static SUBMITTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Submitted\sbatch\sjob\s(?P<id>\d+)").expect("sbatch pattern is valid")
});

/// "slurmstepd: error: *** JOB 123 ON node01 CANCELLED AT ... DUE TO TIME LIMIT ***"
static CANCELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^slurmstepd:.*JOB (\d+) ON (\S+) CANCELLED.*DUE TO ([\w\s]+)")
        .expect("cancel pattern is valid")
});

/// Substring rules for scheduler messages, tried in order.
static MESSAGE_RULES: &[(&[&str], ResultCode)] = &[
    (&["DUE TO TIME LIMIT", "Timed out waiting"], ResultCode::Timeout),
    (&["DUE TO NODE FAILURE"], ResultCode::NodeFail),
    (&["CANCELLED"], ResultCode::Killed),
    (&["Out Of Memory", "oom-kill"], ResultCode::OoMemory),
    (&["Exited with exit code"], ResultCode::Error),
];

/// Decide what a stderr line is.
pub(super) fn line_kind(line: &str) -> LineKind {
    if line.starts_with("pyjob:") {
        let host = line
            .split_once("host:")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .unwrap_or("");
        LineKind::Host(host.to_string())
    } else if let Some(rest) = line.strip_prefix("cpu-bind=MASK") {
        let rest = rest.trim_start_matches([' ', '-']);
        let host = rest.split(',').next().unwrap_or(rest).trim();
        LineKind::Host(host.to_string())
    } else if line.starts_with("srun:") || line.starts_with("slurmstepd:") {
        LineKind::Batch
    } else {
        LineKind::Stderr
    }
}

/// Explain a scheduler message, if it is one SLURM is known to write.
pub(super) fn refine(message: &str) -> Option<Refinement> {
    if let Some(caps) = CANCELLED.captures(message) {
        let reason = caps[3].trim();
        let result = match reason {
            "NODE FAILURE" => ResultCode::NodeFail,
            "TIME LIMIT" => ResultCode::Timeout,
            other => ResultCode::Other(other.to_string()),
        };
        return Some(Refinement {
            result,
            host: Some(caps[2].to_string()),
        });
    }

    MESSAGE_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| message.contains(n)))
        .map(|(_, result)| Refinement::result(result.clone()))
}
