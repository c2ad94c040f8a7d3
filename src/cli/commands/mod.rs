//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod serve;
mod summarize;
mod transcript;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve, AppState};
pub use summarize::run_summarize;
pub use transcript::run_transcript;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

/// Run pre-flight checks and build the production pipeline.
fn prepare(operation: Operation, settings: &Settings) -> anyhow::Result<Orchestrator> {
    let credentials = match preflight::check(operation, settings) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => anyhow::bail!("operation {:?} does not use the model service", operation),
        Err(e) => {
            Output::error(&format!("{}", e));
            Output::info("Run 'tubeqa doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    };

    Ok(Orchestrator::from_settings(settings, &credentials)?)
}
