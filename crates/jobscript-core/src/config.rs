//! Configuration loading.
//!
//! Configuration is a YAML mapping of sections to flat `key: value`
//! settings. The `defaults` section applies to every platform; a section
//! named after a platform overrides it:
//!
//! ```yaml
//! defaults:
//!   platform: slurm
//!   logpath: logs
//! slurm:
//!   queue: short
//!   jobsetup: |
//!     module load python
//! ```
//!
//! Sources, later overriding earlier:
//! 1. `$JOBSCRIPT_CONFIG` if set, otherwise `~/.jobscript.yaml`
//! 2. `./jobscript.yaml`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml_ng::Value;
use tracing::debug;

use crate::backend::Platform;
use crate::error::{JobError, JobResult};
use crate::options::JobOptions;

/// Name of the fallback section.
pub const DEFAULT_SECTION: &str = "defaults";

/// Environment variable naming an alternative user configuration file.
pub const CONFIG_ENV: &str = "JOBSCRIPT_CONFIG";

const USER_FILE: &str = ".jobscript.yaml";
const LOCAL_FILE: &str = "jobscript.yaml";

/// Keys with a meaning of their own; everything else is a job option.
const RESERVED_KEYS: &[&str] = &["platform", "jobsetup", "jobend"];

type Section = BTreeMap<String, String>;

/// Layered configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sections: BTreeMap<String, Section>,
}

/// Settings for one platform: option defaults plus setup and teardown lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSettings {
    /// Defaults for job options; job values win.
    pub options: JobOptions,

    /// Lines appended to the script setup.
    pub jobsetup: Vec<String>,

    /// Lines appended to the script teardown.
    pub jobend: Vec<String>,
}

impl Config {
    /// Load from the default sources; missing files are skipped.
    pub fn load() -> JobResult<Self> {
        Self::load_from(&Self::default_paths())
    }

    /// The default source paths, lowest precedence first.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => paths.push(PathBuf::from(path)),
            None => {
                if let Some(home) = dirs::home_dir() {
                    paths.push(home.join(USER_FILE));
                }
            }
        }
        paths.push(PathBuf::from(LOCAL_FILE));
        paths
    }

    /// Load and merge `paths` in order; missing files are skipped.
    pub fn load_from(paths: &[PathBuf]) -> JobResult<Self> {
        let mut config = Self::default();
        for path in paths {
            if path.is_file() {
                debug!("reading configuration from {}", path.display());
                config.merge(Self::from_file(path)?);
            } else {
                debug!("no configuration at {}", path.display());
            }
        }
        Ok(config)
    }

    /// Load a single configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> JobResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents).map_err(|e| match e {
            JobError::Config(msg) => {
                JobError::Config(format!("{}: {msg}", path.as_ref().display()))
            }
            other => other,
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> JobResult<Self> {
        let raw: Option<BTreeMap<String, Option<BTreeMap<String, Value>>>> =
            serde_yaml_ng::from_str(text)?;

        let mut sections = BTreeMap::new();
        for (name, entries) in raw.unwrap_or_default() {
            let mut section = Section::new();
            for (key, value) in entries.unwrap_or_default() {
                if let Some(value) = scalar_string(&name, &key, value)? {
                    section.insert(key, value);
                }
            }
            sections.insert(name, section);
        }
        Ok(Self { sections })
    }

    /// Overlay `other` on top of this configuration, key by key.
    pub fn merge(&mut self, other: Config) {
        for (name, section) in other.sections {
            self.sections.entry(name).or_default().extend(section);
        }
    }

    /// Look up `key` in `section`, falling back to the defaults section.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .or_else(|| self.sections.get(DEFAULT_SECTION).and_then(|s| s.get(key)))
            .map(String::as_str)
    }

    /// Set a value, creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// The configured default platform.
    pub fn platform(&self) -> JobResult<Option<Platform>> {
        self.get(DEFAULT_SECTION, "platform")
            .map(str::parse)
            .transpose()
    }

    /// Resolve the settings for `platform`.
    pub fn settings(&self, platform: Platform) -> JobResult<PlatformSettings> {
        let mut merged = self.sections.get(DEFAULT_SECTION).cloned().unwrap_or_default();
        if let Some(section) = self.sections.get(platform.name()) {
            merged.extend(section.clone());
        }

        let options = JobOptions::from_pairs(
            merged
                .iter()
                .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;

        Ok(PlatformSettings {
            options,
            jobsetup: lines(merged.get("jobsetup")),
            jobend: lines(merged.get("jobend")),
        })
    }
}

fn lines(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| v.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Read a scalar as a string; lists of scalars become one line each.
fn scalar_string(section: &str, key: &str, value: Value) -> JobResult<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(line) = scalar_string(section, key, item)? {
                    out.push(line);
                }
            }
            out.join("\n")
        }
        _ => {
            return Err(JobError::Config(format!(
                "{section}.{key}: expected a scalar or a list of scalars"
            )));
        }
    };
    Ok(Some(text))
}
