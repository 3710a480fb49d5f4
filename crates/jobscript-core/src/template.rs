//! Log-name templates.
//!
//! A log name such as `analysis-{jobid}-{ind}` is expanded in two places:
//! by the scheduler at run time (after the backend swapped the fields for
//! its own placeholder tokens) and by the reconciliation pass, which needs
//! the inverse mapping from a file name back to the job id.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::JobResult;

/// Placeholder for the platform job id.
pub const JOBID_FIELD: &str = "{jobid}";

/// Placeholder for the array task index.
pub const INDEX_FIELD: &str = "{ind}";

/// Placeholder for the job name.
pub const NAME_FIELD: &str = "{name}";

static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\w*\}").expect("field pattern is valid"));

/// A log path template with `{field}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogTemplate(String);

impl LogTemplate {
    /// Wrap a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The default template: `[{name}-]{jobid}[-{ind}]`.
    pub fn default_for(named: bool, array: bool) -> Self {
        let mut template = String::new();
        if named {
            template.push_str(NAME_FIELD);
            template.push('-');
        }
        template.push_str(JOBID_FIELD);
        if array {
            template.push('-');
            template.push_str(INDEX_FIELD);
        }
        Self(template)
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replace the `{jobid}` and `{ind}` fields.
    pub fn expand(&self, jobid: &str, ind: &str) -> String {
        self.0.replace(JOBID_FIELD, jobid).replace(INDEX_FIELD, ind)
    }

    /// Replace the `{name}` field, leaving the others in place.
    pub fn with_name(&self, name: &str) -> Self {
        Self(self.0.replace(NAME_FIELD, name))
    }

    /// Prefix the template with a directory, unless the directory is empty
    /// or the template is already an absolute path.
    pub fn under(&self, dir: &str) -> Self {
        if dir.is_empty() || self.0.starts_with('/') {
            self.clone()
        } else if dir.ends_with('/') {
            Self(format!("{dir}{}", self.0))
        } else {
            Self(format!("{dir}/{}", self.0))
        }
    }

    /// Split into the directory part and the file-name part.
    pub fn split_dir(&self) -> (String, LogTemplate) {
        match self.0.rsplit_once('/') {
            Some((dir, name)) => {
                let dir = if dir.is_empty() { "/" } else { dir };
                (dir.to_string(), Self::new(name))
            }
            None => (String::new(), self.clone()),
        }
    }

    /// Build the inverse regex: each `{field}` becomes a named capture group,
    /// `{}` an anonymous one, and literal text matches itself.
    pub fn to_regex(&self) -> JobResult<Regex> {
        let mut pattern = String::from("^");
        let mut seen = HashSet::new();
        let mut last = 0;

        for field in FIELD.find_iter(&self.0) {
            pattern.push_str(&regex::escape(&self.0[last..field.start()]));
            let name = &field.as_str()[1..field.as_str().len() - 1];
            if name.is_empty() || !seen.insert(name) {
                pattern.push_str("(.*)");
            } else {
                pattern.push_str(&format!("(?P<{name}>.*)"));
            }
            last = field.end();
        }
        pattern.push_str(&regex::escape(&self.0[last..]));
        pattern.push('$');

        Ok(Regex::new(&pattern)?)
    }

    /// Recover the job id from a file name produced by this template.
    pub fn match_jobid(&self, file_name: &str) -> JobResult<Option<String>> {
        let re = self.to_regex()?;
        Ok(re
            .captures(file_name)
            .and_then(|caps| caps.name("jobid"))
            .map(|m| m.as_str().to_string()))
    }
}

impl fmt::Display for LogTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
