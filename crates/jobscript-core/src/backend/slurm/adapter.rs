//! SLURM adapter.

use regex::Regex;

use super::{parser, templates};
use crate::backend::{BatchSystem, Platform};
use crate::classify::{LineKind, LogClassifier, Refinement};
use crate::error::JobResult;
use crate::options::JobOptions;

/// Shell function that runs the main command in the background and
/// forwards termination signals to it.
const TRAP_RUN: &[&str] = &[
    "run()",
    "{",
    "  trap 'kill -TERM $pid; wait $pid' INT USR1 USR2 TERM",
    "  $@ &",
    "  pid=$!",
    "  wait $pid",
    "  status=$?",
    "  trap - INT USR1 USR2 TERM",
    "  return $status",
    "}",
];

const ENV_VARS: &[(&str, &str)] = &[
    ("JOBID", "{SLURM_ARRAY_JOB_ID:-$SLURM_JOB_ID}"),
    ("JOBINDEX", "SLURM_ARRAY_TASK_ID"),
];

/// SLURM workload manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct Slurm;

impl BatchSystem for Slurm {
    fn platform(&self) -> Platform {
        Platform::Slurm
    }

    fn prefix(&self) -> &'static str {
        templates::PREFIX
    }

    fn env_vars(&self) -> &'static [(&'static str, &'static str)] {
        ENV_VARS
    }

    fn command_prefix(&self) -> Option<&'static str> {
        Some("run")
    }

    fn job_setup(&self) -> &'static [&'static str] {
        TRAP_RUN
    }

    fn submit_command(&self) -> Option<&'static str> {
        Some("sbatch")
    }

    fn submit_pattern(&self) -> Option<&'static Regex> {
        Some(&parser::SUBMITTED)
    }

    fn encode_options(&self, options: &JobOptions) -> Vec<String> {
        templates::encode(options)
    }

    fn decode_options(&self, lines: &[String]) -> JobResult<JobOptions> {
        templates::decode(lines)
    }
}

impl LogClassifier for Slurm {
    fn line_kind(&self, line: &str) -> LineKind {
        parser::line_kind(line)
    }

    fn refine(&self, message: &str) -> Option<Refinement> {
        parser::refine(message)
    }
}
