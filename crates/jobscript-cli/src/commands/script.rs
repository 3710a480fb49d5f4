//! Script command implementation.
//!
//! Prints the script `submit` would hand to the scheduler.

use anyhow::Result;

use super::common::JobArgs;

/// Execute the script command.
pub async fn execute(args: &JobArgs) -> Result<()> {
    super::submit::execute(args, true).await
}
