//! Error handling for script generation, submission and log reconciliation.

use thiserror::Error;

/// Result type for jobscript operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors that can occur while building, submitting or reconciling jobs.
#[derive(Error, Debug)]
pub enum JobError {
    /// Malformed text that a codec could not interpret.
    #[error("Format error: {0}")]
    Format(String),

    /// The backend does not support the requested operation.
    #[error("{backend}: {operation} is not implemented")]
    NotImplemented {
        backend: &'static str,
        operation: &'static str,
    },

    /// No backend is registered under the requested name.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// The submission command failed or produced unexpected output.
    #[error("{command} submission failed: {message}")]
    Submit { command: String, message: String },

    /// The backend cannot run this kind of job.
    #[error("Unsupported job: {0}")]
    Unsupported(String),

    /// A script lacks an option needed to locate its logs.
    #[error("Missing option '{option}' in {script}")]
    MissingOption { option: &'static str, script: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl From<regex::Error> for JobError {
    fn from(e: regex::Error) -> Self {
        JobError::Format(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JobError::Format("bad token 'x'".to_string());
        assert_eq!(err.to_string(), "Format error: bad token 'x'");

        let err = JobError::NotImplemented {
            backend: "lsf",
            operation: "decode_options",
        };
        assert_eq!(err.to_string(), "lsf: decode_options is not implemented");

        let err = JobError::UnknownPlatform("pbs".to_string());
        assert_eq!(err.to_string(), "Unknown platform: pbs");

        let err = JobError::Submit {
            command: "sbatch".to_string(),
            message: "exit status 1".to_string(),
        };
        assert_eq!(err.to_string(), "sbatch submission failed: exit status 1");
    }
}
