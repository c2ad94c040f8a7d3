//! Ask command implementation.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    url: &str,
    question: &str,
    k: Option<usize>,
    show_sources: bool,
    settings: Settings,
) -> Result<()> {
    let orchestrator = prepare(Operation::Generate, &settings)?;
    let k = k.unwrap_or(orchestrator.config().k);
    let mut session = Session::new();

    let spinner = Output::spinner("Fetching transcript...");
    if let Err(e) = orchestrator.load_video(&mut session, url).await {
        spinner.finish_and_clear();
        Output::error(&format!("Failed to load video: {}", e));
        return Err(e.into());
    }

    spinner.set_message("Searching transcript...");
    match orchestrator.ask_question_top_k(&mut session, question, k).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.answer.trim());

            if show_sources && !answer.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in answer.sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
