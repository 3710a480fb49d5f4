//! CLI command implementations.

pub mod checklog;
pub mod common;
pub mod hosts;
pub mod jobs;
pub mod platforms;
pub mod script;
pub mod submit;
