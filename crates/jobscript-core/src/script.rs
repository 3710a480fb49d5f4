//! Script composition and parsing.
//!
//! Every generated script has the same skeleton, delimited by marker lines
//! so it can be read back without understanding the directives:
//!
//! ```text
//! #!/bin/sh
//! <prolog: directives, #PYJOB setup, environment exports, setup>
//! #PYJOB script
//!
//! <script setup>
//! <command lines>
//!
//! #PYJOB end
//! <epilog: status capture, teardown, completion line>
//! ```

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::JobResult;
use crate::job::Job;

/// Marker that opens the setup section of the prolog.
pub const SETUP_MARKER: &str = "#PYJOB setup";

/// Marker that opens the user script.
pub const SCRIPT_MARKER: &str = "#PYJOB script";

/// Marker that closes the user script.
pub const END_MARKER: &str = "#PYJOB end";

/// Epilog line that reports the final status on stderr.
pub const COMPLETION_LINE: &str = "[ $status -eq 0 ] && echo DONE>&2 || echo FAIL $status>&2";

impl Job {
    /// Render the job as script text.
    ///
    /// Each command line is preceded by `prefix` when one is given, so
    /// backends can wrap the main commands (e.g. to forward signals).
    pub fn write(&self, prefix: Option<&str>, prolog: &[String], epilog: &[String]) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(
            prolog.len() + epilog.len() + self.script_setup.len() + self.command.len() + 5,
        );

        lines.push(self.shebang());
        lines.extend(prolog.iter().cloned());
        lines.push(SCRIPT_MARKER.to_string());
        lines.push(String::new());
        lines.extend(self.script_setup.iter().cloned());
        match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => lines.extend(self.command.iter().map(|c| format!("{prefix} {c}"))),
            None => lines.extend(self.command.iter().cloned()),
        }
        lines.push(String::new());
        lines.push(END_MARKER.to_string());
        lines.extend(epilog.iter().cloned());

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Parse script text back into a job.
    ///
    /// Directives are not interpreted: everything before the script marker
    /// lands in `prolog` and everything after the end marker in `epilog`.
    /// Scripts without markers are accepted and treated as a bare command.
    pub fn parse(text: &str, prefix: Option<&str>) -> Job {
        let mut lines: Vec<String> = text
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        let environment = match lines.first() {
            Some(first) if first.starts_with("#!") => {
                let shebang = lines.remove(0);
                parse_shebang(&shebang)
            }
            _ => None,
        };

        let start = lines.iter().position(|l| l == SCRIPT_MARKER);
        let end = lines.iter().position(|l| l == END_MARKER);

        let (prolog, epilog, body) = match (start, end) {
            (Some(start), Some(end)) if start < end => {
                let mut first = start + 1;
                let mut last = end;
                while first < last && lines[first].trim().is_empty() {
                    first += 1;
                }
                while last > first && lines[last - 1].trim().is_empty() {
                    last -= 1;
                }
                (
                    lines[..start].to_vec(),
                    lines[end + 1..].to_vec(),
                    lines[first..last].to_vec(),
                )
            }
            _ => {
                warn!("script has no {SCRIPT_MARKER}/{END_MARKER} markers; reading it as a bare command");
                (Vec::new(), Vec::new(), lines)
            }
        };

        let (script_setup, command) = split_command(body, prefix);

        Job {
            command,
            script_setup,
            environment,
            prolog,
            epilog,
            ..Default::default()
        }
    }

    /// Read and parse a script file.
    pub fn from_file(path: impl AsRef<Path>, prefix: Option<&str>) -> JobResult<Job> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&text, prefix))
    }
}

impl fmt::Display for Job {
    /// Render with the options as `#opt key=value` comment lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prolog: Vec<String> = self
            .options
            .to_pairs()
            .into_iter()
            .map(|(k, v)| format!("#opt {k}={v}"))
            .collect();
        f.write_str(&self.write(None, &prolog, &[]))
    }
}

fn parse_shebang(line: &str) -> Option<String> {
    if line == "#!/bin/sh" {
        None
    } else if let Some(env) = line.strip_prefix("#!/usr/bin/env") {
        let env = env.trim();
        (!env.is_empty()).then(|| env.to_string())
    } else {
        line.strip_prefix("#!").map(|s| s.trim().to_string())
    }
}

/// Whether `line` is a command line wrapped with `prefix`.
fn has_prefix(line: &str, prefix: &str) -> bool {
    match line.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Split the script body into setup lines and command lines.
fn split_command(body: Vec<String>, prefix: Option<&str>) -> (Vec<String>, Vec<String>) {
    let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
        return (Vec::new(), body);
    };

    match body.iter().position(|l| has_prefix(l, prefix)) {
        Some(first) => {
            let mut setup = body;
            let command = setup
                .split_off(first)
                .into_iter()
                .map(|line| {
                    if has_prefix(&line, prefix) {
                        line[prefix.len()..].trim().to_string()
                    } else {
                        line
                    }
                })
                .collect();
            (setup, command)
        }
        None => {
            debug!("no line carries the '{prefix}' prefix; using the last line as the command");
            let mut setup = body;
            let command = setup.pop().into_iter().collect();
            (setup, command)
        }
    }
}
