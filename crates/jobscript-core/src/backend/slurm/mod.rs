//! SLURM backend.

mod adapter;
mod parser;
mod templates;

pub use adapter::Slurm;
