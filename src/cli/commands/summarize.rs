//! Summarize command implementation.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(url: &str, settings: Settings) -> Result<()> {
    let orchestrator = prepare(Operation::Generate, &settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner("Fetching transcript...");
    if let Err(e) = orchestrator.load_video(&mut session, url).await {
        spinner.finish_and_clear();
        Output::error(&format!("Failed to load video: {}", e));
        return Err(e.into());
    }

    spinner.set_message("Summarizing...");
    match orchestrator.summarize(&session).await {
        Ok(summary) => {
            spinner.finish_and_clear();
            println!("\n{}\n", summary.trim());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate summary: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
