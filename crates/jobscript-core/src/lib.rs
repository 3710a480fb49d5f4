//! Portable Batch Job Scripts for SLURM and LSF Clusters
//!
//! This crate writes batch-job scripts for different cluster workload
//! managers, submits them, and later reconciles the jobs' stderr logs into
//! structured outcomes.
//!
//! # Overview
//!
//! A job goes through four stages:
//! 1. **Options**: typed [`JobOptions`] are encoded as backend directive lines
//! 2. **Composition**: directives, setup, command and teardown become one script
//! 3. **Submission**: the script is piped into the scheduler's submit command
//! 4. **Reconciliation**: the `.shell` copy is read back and each task's log classified
//!
//! # Supported Schedulers
//!
//! | Platform | Directives | Submit | Reconcile |
//! |----------|------------|--------|-----------|
//! | SLURM | `#SBATCH` | sbatch | yes |
//! | LSF | `#BSUB` | bsub | no (directives cannot be decoded) |
//! | print | `#BATCH` | prints the script | yes |
//! | local | none | `sh -c`, single-line commands only | no |
//!
//! # Example: Composing a Script
//!
//! ```ignore
//! use jobscript_core::{Config, Job, JobOptions, Platform, Submitter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let platform = Platform::Slurm;
//!
//!     let job = Job::new("python fit.py --input data.h5")
//!         .with_setup("module load python")
//!         .with_options(
//!             JobOptions::new()
//!                 .with_name("fit")
//!                 .with_queue("short")
//!                 .with_array("1-100".parse()?),
//!         );
//!
//!     let submitter = Submitter::new(platform.backend(), config.settings(platform)?);
//!     let submitted = submitter.submit(&job).await?;
//!     println!("{submitted:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Example: Reconciling Logs
//!
//! ```ignore
//! use jobscript_core::{Platform, Summary, reconcile};
//!
//! let records = reconcile::scan_dir(Platform::Slurm.backend(), "logs".as_ref())?;
//! let summary = Summary::from_records(&records);
//! println!("{} of {} tasks completed", summary.completed, summary.total());
//! ```
//!
//! # Array Ranges
//!
//! Array specifications use the compact `1-10,15,20-30:2` syntax:
//!
//! ```
//! use jobscript_core::RangeSet;
//!
//! let range: RangeSet = "1-3,5".parse().unwrap();
//! assert_eq!(range.indices(), vec![1, 2, 3, 5]);
//! assert_eq!(range.to_string(), "1-3,5");
//! ```

pub mod backend;
pub mod classify;
pub mod config;
pub mod error;
pub mod job;
pub mod options;
pub mod range;
pub mod reconcile;
pub mod script;
pub mod submit;
pub mod template;

pub use backend::{BatchSystem, ComposedScript, Platform, SubmitMode};
pub use classify::{LineKind, LogClassifier, Refinement, classify, classify_file};
pub use config::{Config, PlatformSettings};
pub use error::{JobError, JobResult};
pub use job::{Job, JobRecord, ResultCode, TaskOutcome};
pub use options::JobOptions;
pub use range::{RangeElement, RangeSet};
pub use reconcile::{Summary, parse_script, scan_dir};
pub use submit::{Submitted, Submitter};
pub use template::LogTemplate;
