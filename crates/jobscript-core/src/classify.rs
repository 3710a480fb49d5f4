//! Log classification.
//!
//! Turns the captured stderr of a job into a [`TaskOutcome`]. The steps
//! run in a fixed order and later steps may override earlier ones:
//!
//! 1. A missing log is `LOST`.
//! 2. Lines are split into scheduler messages and job stderr; host markers
//!    are consumed.
//! 3. The last line must be the script's own `DONE` / `FAIL <n>` line,
//!    otherwise the result is `UNKNOWN`.
//! 4. Any scheduler message forces `BATCHERR`, refined by the first message
//!    the backend recognizes.
//! 5. A `DONE` job that still wrote to stderr is an `ERROR`.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::JobResult;
use crate::job::{ResultCode, TaskOutcome};

/// How a single log line is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// The line names the execution host; it is not kept.
    Host(String),
    /// A message from the batch system.
    Batch,
    /// Output of the job itself.
    Stderr,
}

/// Result of a scheduler message that explains the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    /// The more specific result code.
    pub result: ResultCode,
    /// Execution host, when the message names it.
    pub host: Option<String>,
}

impl Refinement {
    /// A refinement without host information.
    pub fn result(result: ResultCode) -> Self {
        Self { result, host: None }
    }
}

/// Backend-specific knowledge about scheduler log messages.
///
/// The defaults treat every line as job output, which suits backends whose
/// scheduler writes nothing into the job's stderr.
pub trait LogClassifier {
    /// Decide what a raw log line is.
    fn line_kind(&self, _line: &str) -> LineKind {
        LineKind::Stderr
    }

    /// Map a scheduler message to a result, if the message is recognized.
    fn refine(&self, _message: &str) -> Option<Refinement> {
        None
    }
}

/// Classify the lines of a log; `None` means the log file does not exist.
pub fn classify<C: LogClassifier + ?Sized>(classifier: &C, lines: Option<&[String]>) -> TaskOutcome {
    let Some(lines) = lines else {
        return TaskOutcome::lost();
    };

    let mut outcome = TaskOutcome::new(ResultCode::Unknown);
    for line in lines {
        match classifier.line_kind(line) {
            LineKind::Host(host) => outcome.host = host,
            LineKind::Batch => outcome.batch_messages.push(line.clone()),
            LineKind::Stderr => outcome.stderr.push(line.clone()),
        }
    }

    let status = lines.last().map_or("", |l| l.trim());
    match ResultCode::from_status_line(status) {
        Some(result) => {
            outcome.done = result == ResultCode::Done;
            outcome.result = result;
            outcome.stderr.pop();
        }
        None => {
            outcome.done = false;
            outcome.result = ResultCode::Unknown;
        }
    }

    if !outcome.batch_messages.is_empty() {
        outcome.done = false;
        outcome.result = ResultCode::BatchErr;
        if let Some(refinement) = outcome
            .batch_messages
            .iter()
            .find_map(|message| classifier.refine(message))
        {
            outcome.result = refinement.result;
            if let Some(host) = refinement.host {
                outcome.host = host;
            }
        }
    }

    if outcome.done && !outcome.stderr.is_empty() {
        outcome.result = ResultCode::Error;
        outcome.done = false;
    }

    outcome
}

/// Read a log file into lines; a missing file is `Ok(None)`.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_log(path: &Path) -> JobResult<Option<Vec<String>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect(),
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("log {} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Read and classify a log file.
pub fn classify_file<C: LogClassifier + ?Sized>(
    classifier: &C,
    path: &Path,
) -> JobResult<TaskOutcome> {
    let lines = read_log(path)?;
    Ok(classify(classifier, lines.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Treats `sched:` lines as scheduler messages and `host=` lines as markers.
    struct TestRules;

    impl LogClassifier for TestRules {
        fn line_kind(&self, line: &str) -> LineKind {
            if let Some(host) = line.strip_prefix("host=") {
                LineKind::Host(host.to_string())
            } else if line.starts_with("sched:") {
                LineKind::Batch
            } else {
                LineKind::Stderr
            }
        }

        fn refine(&self, message: &str) -> Option<Refinement> {
            message
                .contains("limit")
                .then(|| Refinement::result(ResultCode::Timeout))
        }
    }

    struct Plain;
    impl LogClassifier for Plain {}

    fn log(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_log_is_lost() {
        let outcome = classify(&TestRules, None);
        assert!(!outcome.done);
        assert_eq!(outcome.result, ResultCode::Lost);
    }

    #[test]
    fn test_done() {
        let outcome = classify(&TestRules, Some(&log(&["DONE"])));
        assert!(outcome.done);
        assert_eq!(outcome.result, ResultCode::Done);
        assert!(outcome.stderr.is_empty());
    }

    #[test]
    fn test_done_with_residue_is_error() {
        let outcome = classify(&TestRules, Some(&log(&["output line", "DONE"])));
        assert!(!outcome.done);
        assert_eq!(outcome.result, ResultCode::Error);
        assert_eq!(outcome.stderr, vec!["output line"]);
    }

    #[test]
    fn test_fail_keeps_line() {
        let outcome = classify(&TestRules, Some(&log(&["oops", "FAIL 2"])));
        assert!(!outcome.done);
        assert_eq!(outcome.result, ResultCode::Fail("FAIL 2".to_string()));
        assert_eq!(outcome.stderr, vec!["oops"]);
    }

    #[test]
    fn test_terminal_line_is_trimmed() {
        let outcome = classify(&Plain, Some(&log(&["  DONE  "])));
        assert!(outcome.done);
    }

    #[test]
    fn test_no_terminal_line_is_unknown() {
        let outcome = classify(&Plain, Some(&log(&["partial output"])));
        assert_eq!(outcome.result, ResultCode::Unknown);

        let outcome = classify(&Plain, Some(&[]));
        assert_eq!(outcome.result, ResultCode::Unknown);
    }

    #[test]
    fn test_batch_message_overrides_done() {
        let outcome = classify(&TestRules, Some(&log(&["sched: something odd", "DONE"])));
        assert!(!outcome.done);
        assert_eq!(outcome.result, ResultCode::BatchErr);
        assert_eq!(outcome.batch_messages, vec!["sched: something odd"]);
        assert!(outcome.stderr.is_empty());
    }

    #[test]
    fn test_first_recognized_message_wins() {
        let outcome = classify(
            &TestRules,
            Some(&log(&["sched: noise", "sched: time limit", "FAIL 1"])),
        );
        assert_eq!(outcome.result, ResultCode::Timeout);
    }

    #[test]
    fn test_host_marker_consumed() {
        let outcome = classify(&TestRules, Some(&log(&["host=node17", "DONE"])));
        assert_eq!(outcome.host, "node17");
        assert!(outcome.done);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = classify_file(&Plain, &dir.path().join("nope.err")).unwrap();
        assert_eq!(outcome.result, ResultCode::Lost);
    }

    #[test]
    fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.err");
        std::fs::write(&path, "DONE\n").unwrap();
        let outcome = classify_file(&Plain, &path).unwrap();
        assert!(outcome.done);
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2.err");
        std::fs::write(&path, b"bin \xff\xfe garbage\nFAIL 1\n").unwrap();

        let lines = read_log(&path).unwrap().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("bin "));

        let outcome = classify_file(&Plain, &path).unwrap();
        assert_eq!(outcome.result, ResultCode::Fail("FAIL 1".to_string()));
    }
}
