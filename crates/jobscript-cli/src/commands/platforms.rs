//! Platforms command implementation.

use console::style;

use jobscript_core::{Platform, SubmitMode};

/// Execute the platforms command.
pub fn execute() {
    println!("{} Supported platforms:\n", style("jobscript").cyan().bold());

    for platform in Platform::ALL {
        let backend = platform.backend();
        let submit = match backend.submit_mode() {
            SubmitMode::Scheduler => backend.submit_command().unwrap_or("-").to_string(),
            SubmitMode::Print => "prints the script".to_string(),
            SubmitMode::Local => "sh -c".to_string(),
        };
        println!("  {} {}", style("●").green(), style(platform).bold());
        println!("    Directives: {}", backend.prefix());
        println!("    Submit:     {submit}");
    }
}
