//! IBM Platform LSF backend.
//!
//! Scripts can be written and submitted; reading `#BSUB` directives back
//! is not supported, so LSF jobs cannot be reconciled.

use std::sync::LazyLock;

use regex::Regex;

use crate::backend::{BatchSystem, Platform};
use crate::classify::LogClassifier;
use crate::error::{JobError, JobResult};
use crate::options::JobOptions;

const PREFIX: &str = "#BSUB";

const ENV_VARS: &[(&str, &str)] = &[("JOBID", "LSB_JOBID"), ("JOBINDEX", "LSB_JOBINDEX")];

/// `bsub` reply: "Job <12345> is submitted to queue <normal>."
static SUBMITTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Job\s<(?P<id>\d+)>").expect("bsub pattern is valid"));

/// IBM Platform LSF.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lsf;

impl BatchSystem for Lsf {
    fn platform(&self) -> Platform {
        Platform::Lsf
    }

    fn prefix(&self) -> &'static str {
        PREFIX
    }

    fn env_vars(&self) -> &'static [(&'static str, &'static str)] {
        ENV_VARS
    }

    fn submit_command(&self) -> Option<&'static str> {
        Some("bsub")
    }

    fn submit_pattern(&self) -> Option<&'static Regex> {
        Some(&SUBMITTED)
    }

    fn encode_options(&self, options: &JobOptions) -> Vec<String> {
        let mut hdr = Vec::new();

        if let Some(ref name) = options.name {
            hdr.push(format!("-J {name}"));
        }
        if let Some(ref queue) = options.queue {
            hdr.push(format!("-q {queue}"));
        }
        if let Some(ref runtime) = options.runtime {
            hdr.push(format!("-W {runtime}"));
        }
        if let Some(ref logname) = options.logname {
            let log = logname.expand("%J", "%I");
            hdr.push(format!("-o {log}.out"));
            hdr.push(format!("-e {log}.err"));
        }
        if let Some(ref memlimit) = options.memlimit {
            hdr.push(format!("-M {memlimit}"));
            hdr.push(format!("-R rusage[mem={memlimit}]"));
        }
        if let Some(ref tmplimit) = options.tmplimit {
            hdr.push(format!("-R rusage[tmp={tmplimit}]"));
        }
        if !options.exclude.is_empty() {
            let hosts: Vec<String> = options
                .exclude
                .iter()
                .map(|host| format!("hname!={host}"))
                .collect();
            hdr.push(format!("-R \"select[{}]\"", hosts.join(" && ")));
        }

        hdr.into_iter().map(|line| format!("{PREFIX} {line}")).collect()
    }

    fn decode_options(&self, _lines: &[String]) -> JobResult<JobOptions> {
        Err(JobError::NotImplemented {
            backend: "lsf",
            operation: "decode_options",
        })
    }
}

impl LogClassifier for Lsf {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let mut options = JobOptions::new()
            .with_name("fit")
            .with_queue("normal")
            .with_runtime("2:00")
            .with_logname("logs/fit-{jobid}-{ind}");
        options.memlimit = Some("4000".to_string());
        options.exclude = vec!["h1".to_string(), "h2".to_string()];

        assert_eq!(
            Lsf.encode_options(&options),
            vec![
                "#BSUB -J fit",
                "#BSUB -q normal",
                "#BSUB -W 2:00",
                "#BSUB -o logs/fit-%J-%I.out",
                "#BSUB -e logs/fit-%J-%I.err",
                "#BSUB -M 4000",
                "#BSUB -R rusage[mem=4000]",
                "#BSUB -R \"select[hname!=h1 && hname!=h2]\"",
            ]
        );
    }

    #[test]
    fn test_decode_not_implemented() {
        let err = Lsf.decode_options(&["#BSUB -J x".to_string()]).unwrap_err();
        assert!(matches!(err, JobError::NotImplemented { backend: "lsf", .. }));
    }

    #[test]
    fn test_submit_pattern() {
        let caps = SUBMITTED
            .captures("Job <4711> is submitted to queue <normal>.")
            .unwrap();
        assert_eq!(&caps["id"], "4711");
    }
}
