//! Interactive chat command.
//!
//! One session per run: the transcript index is built on the first question
//! and reused until another video is loaded.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::{Session, SessionPhase};
use crate::transcript::format_timestamp;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line of user input.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Exit,
    Help,
    Summary,
    Load(&'a str),
    Question(&'a str),
    Empty,
}

fn parse_input(input: &str) -> ChatInput<'_> {
    let input = input.trim();
    if input.is_empty() {
        return ChatInput::Empty;
    }

    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    match command.to_lowercase().as_str() {
        "exit" | "quit" if rest.is_empty() => ChatInput::Exit,
        "help" if rest.is_empty() => ChatInput::Help,
        "summary" | "summarize" if rest.is_empty() => ChatInput::Summary,
        "load" if !rest.is_empty() => ChatInput::Load(rest),
        _ => ChatInput::Question(input),
    }
}

fn print_help() {
    Output::kv("load <url>", "load another video (discards the current one)");
    Output::kv("summary", "summarize the loaded video");
    Output::kv("exit", "quit");
    Output::kv("anything else", "ask a question about the loaded video");
}

/// Run the interactive chat command.
pub async fn run_chat(url: Option<String>, settings: Settings) -> Result<()> {
    let orchestrator = prepare(Operation::Generate, &settings)?;
    let mut session = Session::new();

    println!("\n{}", style("tubeqa chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask questions about a video, 'help' for commands, or 'exit' to quit.").dim()
    );

    if let Some(url) = url {
        load(&orchestrator, &mut session, &url).await;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Help => print_help(),
            ChatInput::Load(url) => load(&orchestrator, &mut session, url).await,
            ChatInput::Summary => {
                let spinner = Output::spinner("Summarizing...");
                let result = orchestrator.summarize(&session).await;
                spinner.finish_and_clear();
                match result {
                    Ok(summary) => {
                        println!("\n{} {}\n", style("tubeqa:").cyan().bold(), summary.trim())
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
            ChatInput::Question(question) => {
                let message = if session.phase() == SessionPhase::Indexed {
                    "Thinking..."
                } else {
                    "Indexing transcript..."
                };
                let spinner = Output::spinner(message);
                let result = orchestrator.ask_question(&mut session, question).await;
                spinner.finish_and_clear();
                match result {
                    Ok(answer) => {
                        println!("\n{} {}\n", style("tubeqa:").cyan().bold(), answer.answer.trim())
                    }
                    Err(e) => Output::error(&format!("Error: {}", e)),
                }
            }
        }
    }

    Ok(())
}

async fn load(orchestrator: &Orchestrator, session: &mut Session, url: &str) {
    let spinner = Output::spinner("Fetching transcript...");
    let result = orchestrator.load_video(session, url).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            if let Some(video) = session.video() {
                Output::success(&format!(
                    "Loaded {} ({} caption segments, last at {})",
                    video.video_id,
                    video.transcript.segment_count,
                    format_timestamp(video.transcript.last_start_seconds)
                ));
            }
        }
        Err(e) => Output::error(&format!("Failed to load video: {}", e)),
    }
}
