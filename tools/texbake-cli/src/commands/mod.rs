pub mod bake;
pub mod check;
pub mod config;
pub mod fetch;
pub mod render;

use texbake_job_model::JobOutcome;

/// Print a job outcome as pretty JSON on stdout.
pub(crate) fn print_outcome(outcome: &JobOutcome) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(outcome.success)
}
