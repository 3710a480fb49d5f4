//! Backend for machines without a batch system: the composed script is
//! printed instead of submitted. Directives are plain `#BATCH key value`
//! lines, so every option (unknown keys included) survives a round trip.

use crate::backend::{BatchSystem, Platform, SubmitMode};
use crate::classify::LogClassifier;
use crate::error::JobResult;
use crate::options::JobOptions;

const PREFIX: &str = "#BATCH";

fn encode(options: &JobOptions) -> Vec<String> {
    options
        .to_pairs()
        .into_iter()
        .map(|(key, value)| format!("{PREFIX} {key} {value}"))
        .collect()
}

fn decode(lines: &[String]) -> JobResult<JobOptions> {
    let mut options = JobOptions::default();
    for line in lines {
        let Some(body) = line.strip_prefix(PREFIX) else {
            continue;
        };
        let body = body.trim();
        match body.split_once(' ') {
            Some((key, value)) => options.set(key, value.trim())?,
            None if !body.is_empty() => options.set(body, "")?,
            None => {}
        }
    }
    Ok(options)
}

/// Print scripts; nothing is submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Print;

impl BatchSystem for Print {
    fn platform(&self) -> Platform {
        Platform::Print
    }

    fn prefix(&self) -> &'static str {
        PREFIX
    }

    fn submit_mode(&self) -> SubmitMode {
        SubmitMode::Print
    }

    fn encode_options(&self, options: &JobOptions) -> Vec<String> {
        encode(options)
    }

    fn decode_options(&self, lines: &[String]) -> JobResult<JobOptions> {
        decode(lines)
    }
}

impl LogClassifier for Print {}
