//! Run jobs on this machine through `sh -c`.
//!
//! Only single-line commands are supported; no script is written, so the
//! backend has no directives.

use crate::backend::{BatchSystem, Platform, SubmitMode};
use crate::classify::LogClassifier;
use crate::error::JobResult;
use crate::options::JobOptions;

/// Local execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Local;

impl BatchSystem for Local {
    fn platform(&self) -> Platform {
        Platform::Local
    }

    fn prefix(&self) -> &'static str {
        "#LOCAL"
    }

    fn submit_mode(&self) -> SubmitMode {
        SubmitMode::Local
    }

    fn encode_options(&self, _options: &JobOptions) -> Vec<String> {
        Vec::new()
    }

    fn decode_options(&self, _lines: &[String]) -> JobResult<JobOptions> {
        Ok(JobOptions::default())
    }
}

impl LogClassifier for Local {}
