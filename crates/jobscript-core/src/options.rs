//! Typed job options.
//!
//! Options come from three places: configuration sections, command-line
//! flags and decoded script directives. The first two arrive as flat
//! `key = value` strings and are converted here; the array value goes
//! through the range codec and `exclude` becomes a host list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::JobResult;
use crate::range::RangeSet;
use crate::template::LogTemplate;

/// Cluster options for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Job name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Queue (SLURM partition).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,

    /// Account for billing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Quality of service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos: Option<String>,

    /// Job-array specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<RangeSet>,

    /// Wall-clock limit as given by the user (`hh:mm`, `hh:mm:ss`, minutes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    /// Log file template, without the `.out`/`.err` suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logname: Option<LogTemplate>,

    /// Directory the log template is relative to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logpath: Option<String>,

    /// Memory limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memlimit: Option<String>,

    /// Local scratch limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmplimit: Option<String>,

    /// Hosts the job must not run on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Keys no backend recognizes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl JobOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from flat string pairs. Unknown keys land in `extra`.
    pub fn from_pairs<'a, I>(pairs: I) -> JobResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key, value)?;
        }
        Ok(options)
    }

    /// Set one option from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> JobResult<()> {
        match key {
            "name" => self.name = Some(value.to_string()),
            "queue" => self.queue = Some(value.to_string()),
            "account" => self.account = Some(value.to_string()),
            "qos" => self.qos = Some(value.to_string()),
            "array" => self.array = Some(value.parse()?),
            "runtime" => self.runtime = Some(value.to_string()),
            "logname" => self.logname = Some(LogTemplate::new(value)),
            "logpath" => self.logpath = Some(value.to_string()),
            "memlimit" => self.memlimit = Some(value.to_string()),
            "tmplimit" => self.tmplimit = Some(value.to_string()),
            "exclude" => {
                self.exclude = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {
                self.extra.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Set options as `(key, value)` string pairs, recognized keys first.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((key.to_string(), value));
            }
        };

        push("name", self.name.clone());
        push("queue", self.queue.clone());
        push("account", self.account.clone());
        push("qos", self.qos.clone());
        push("array", self.array.as_ref().map(ToString::to_string));
        push("runtime", self.runtime.clone());
        push("logname", self.logname.as_ref().map(ToString::to_string));
        push("logpath", self.logpath.clone());
        push("memlimit", self.memlimit.clone());
        push("tmplimit", self.tmplimit.clone());
        if !self.exclude.is_empty() {
            push("exclude", Some(self.exclude.join(" ")));
        }

        pairs.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }

    /// Overlay `other` on top of these options; set values in `other` win.
    pub fn merged_with(&self, other: &JobOptions) -> JobOptions {
        fn pick<T: Clone>(over: &Option<T>, base: &Option<T>) -> Option<T> {
            over.clone().or_else(|| base.clone())
        }

        let mut extra = self.extra.clone();
        extra.extend(other.extra.clone());

        JobOptions {
            name: pick(&other.name, &self.name),
            queue: pick(&other.queue, &self.queue),
            account: pick(&other.account, &self.account),
            qos: pick(&other.qos, &self.qos),
            array: pick(&other.array, &self.array),
            runtime: pick(&other.runtime, &self.runtime),
            logname: pick(&other.logname, &self.logname),
            logpath: pick(&other.logpath, &self.logpath),
            memlimit: pick(&other.memlimit, &self.memlimit),
            tmplimit: pick(&other.tmplimit, &self.tmplimit),
            exclude: if other.exclude.is_empty() {
                self.exclude.clone()
            } else {
                other.exclude.clone()
            },
            extra,
        }
    }

    /// Whether the options describe a job array.
    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    /// Builder: set the job name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set the queue.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Builder: set the array specification.
    pub fn with_array(mut self, array: RangeSet) -> Self {
        self.array = Some(array);
        self
    }

    /// Builder: set the runtime.
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    /// Builder: set the log name template.
    pub fn with_logname(mut self, logname: impl Into<String>) -> Self {
        self.logname = Some(LogTemplate::new(logname));
        self
    }
}
