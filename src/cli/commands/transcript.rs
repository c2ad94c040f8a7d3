//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{
    extract_video_id, normalize, NormalizeMode, TranscriptSource, YoutubeTranscriptSource,
};
use anyhow::{Context, Result};

/// Run the transcript command.
pub async fn run_transcript(
    url: &str,
    timestamps: bool,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubeqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let video_id = extract_video_id(url)
        .with_context(|| format!("Could not find a video id in '{}'", url))?;

    let mode = if timestamps {
        NormalizeMode::Timestamped
    } else {
        settings.transcript.mode
    };

    let source =
        YoutubeTranscriptSource::new(settings.transcript.languages.clone(), settings.temp_dir());

    let spinner = Output::spinner("Fetching transcript...");
    let segments = source.fetch_transcript(&video_id).await;
    spinner.finish_and_clear();

    let transcript = normalize(&video_id, &segments?, mode)?;

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, &transcript.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Output::success(&format!(
                "Wrote {} segments ({} chars) to {}",
                transcript.segment_count,
                transcript.char_len(),
                path.display()
            ));
        }
        None => println!("{}", transcript.text),
    }

    Ok(())
}
