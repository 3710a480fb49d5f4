//! `#SBATCH` directive encoding and decoding.

use crate::backend::{DecodeFn, decode_with_table};
use crate::error::JobResult;
use crate::options::JobOptions;
use crate::template::{INDEX_FIELD, JOBID_FIELD, LogTemplate};

pub(super) const PREFIX: &str = "#SBATCH";

/// Encode options as `#SBATCH` lines.
pub(super) fn encode(options: &JobOptions) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(ref name) = options.name {
        lines.push(format!("{PREFIX} --job-name={name}"));
    }
    if let Some(ref queue) = options.queue {
        lines.push(format!("{PREFIX} -p {queue}"));
    }
    if let Some(ref account) = options.account {
        lines.push(format!("{PREFIX} -A {account}"));
    }
    if let Some(ref qos) = options.qos {
        lines.push(format!("{PREFIX} -q {qos}"));
    }
    if let Some(ref array) = options.array {
        lines.push(format!("{PREFIX} -a {array}"));
    }
    if let Some(ref runtime) = options.runtime {
        lines.push(format!("{PREFIX} -t {}", format_runtime(runtime)));
    }
    if let Some(ref logname) = options.logname {
        let jobid = if options.is_array() { "%A" } else { "%j" };
        let log = logname.expand(jobid, "%a");
        lines.push(format!("{PREFIX} -o {log}.out"));
        lines.push(format!("{PREFIX} -e {log}.err"));
    }
    if let Some(ref memlimit) = options.memlimit {
        lines.push(format!("{PREFIX} --mem={memlimit}"));
    }
    if let Some(ref tmplimit) = options.tmplimit {
        lines.push(format!("{PREFIX} --tmp={tmplimit}"));
    }
    if !options.exclude.is_empty() {
        lines.push(format!("{PREFIX} --exclude={}", options.exclude.join(",")));
    }

    lines
}

/// `hh:mm` becomes `hh:mm:00`; every other form is passed through.
fn format_runtime(runtime: &str) -> String {
    if runtime.matches(':').count() == 1 {
        format!("{runtime}:00")
    } else {
        runtime.to_string()
    }
}

/// Decode table, tried in order; the first matching flag wins.
const DECODE: &[(&str, DecodeFn)] = &[
    ("--job-name=", |o, v| set(&mut o.name, v)),
    ("-p ", |o, v| set(&mut o.queue, v)),
    ("-A ", |o, v| set(&mut o.account, v)),
    ("-q ", |o, v| set(&mut o.qos, v)),
    ("-a ", |o, v| {
        o.array = Some(v.trim().parse()?);
        Ok(())
    }),
    ("-t ", |o, v| set(&mut o.runtime, v)),
    ("-o ", |o, v| {
        o.logname = Some(decode_logname(v));
        Ok(())
    }),
    ("--mem=", |o, v| set(&mut o.memlimit, v)),
    ("--tmp=", |o, v| set(&mut o.tmplimit, v)),
    ("--exclude=", |o, v| {
        o.exclude = v
            .trim()
            .split(',')
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();
        Ok(())
    }),
];

fn set(field: &mut Option<String>, value: &str) -> JobResult<()> {
    *field = Some(value.trim().to_string());
    Ok(())
}

fn decode_logname(value: &str) -> LogTemplate {
    let value = value.trim();
    let value = value.strip_suffix(".out").unwrap_or(value);
    LogTemplate::new(
        value
            .replace("%j", JOBID_FIELD)
            .replace("%A", JOBID_FIELD)
            .replace("%a", INDEX_FIELD),
    )
}

/// Decode `#SBATCH` lines back into options.
pub(super) fn decode(lines: &[String]) -> JobResult<JobOptions> {
    decode_with_table(PREFIX, DECODE, lines)
}
