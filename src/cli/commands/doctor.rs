//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{
    mask_secret, Prompts, ServiceCredentials, Settings, ENV_API_KEY, ENV_PROJECT_ID,
    ENV_SERVICE_URL,
};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("tubeqa Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section(
        "External Tools",
        vec![check_tool("yt-dlp", "yt-dlp --version", install_hint_ytdlp())],
    );
    section(
        "Model Service",
        check_credentials(settings, |name| std::env::var(name).ok()),
    );
    section("Pipeline", check_pipeline(settings));
    section("Configuration", vec![check_config_file()]);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using tubeqa.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! tubeqa is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_cmd: &str, hint: &str) -> CheckResult {
    let mut parts = version_cmd.split_whitespace();
    let Some(cmd) = parts.next() else {
        return CheckResult::error(name, "no command to run", hint);
    };

    match Command::new(cmd).args(parts).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();

            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the service endpoint, API key, and project id.
fn check_credentials<F>(settings: &Settings, lookup: F) -> Vec<CheckResult>
where
    F: Fn(&str) -> Option<String>,
{
    let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut results = Vec::new();

    match (set(ENV_SERVICE_URL), &settings.service.url) {
        (Some(url), _) => results.push(CheckResult::ok(ENV_SERVICE_URL, &url)),
        (None, Some(url)) if !url.trim().is_empty() => {
            results.push(CheckResult::ok("service.url", url))
        }
        _ => results.push(CheckResult::error(
            ENV_SERVICE_URL,
            "not set",
            "Set it in .env or the environment, or service.url in the config file",
        )),
    }

    match set(ENV_API_KEY) {
        Some(key) => results.push(CheckResult::ok(
            ENV_API_KEY,
            &format!("configured ({})", mask_secret(&key)),
        )),
        None => results.push(CheckResult::error(
            ENV_API_KEY,
            "not set",
            &format!("Set with: export {}='...'", ENV_API_KEY),
        )),
    }

    match set(ENV_PROJECT_ID) {
        Some(project) => results.push(CheckResult::ok(ENV_PROJECT_ID, &project)),
        None => results.push(CheckResult::error(
            ENV_PROJECT_ID,
            "not set",
            &format!("Set with: export {}='...'", ENV_PROJECT_ID),
        )),
    }

    if results.iter().all(|r| r.status == CheckStatus::Ok) {
        if let Err(e) = ServiceCredentials::resolve(&lookup, settings) {
            results.push(CheckResult::error("Credentials", &e.to_string(), "Check the values above"));
        }
    }

    results
}

/// Check pipeline parameters and prompt templates.
fn check_pipeline(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let chunking = &settings.chunking;
    if chunking.chunk_size > 0 && chunking.chunk_overlap < chunking.chunk_size {
        results.push(CheckResult::ok(
            "Chunking",
            &format!("{} chars, {} overlap", chunking.chunk_size, chunking.chunk_overlap),
        ));
    } else {
        results.push(CheckResult::error(
            "Chunking",
            &format!(
                "invalid (size {}, overlap {})",
                chunking.chunk_size, chunking.chunk_overlap
            ),
            "chunk_overlap must be smaller than chunk_size",
        ));
    }

    if settings.retrieval.k == 0 {
        results.push(CheckResult::warning(
            "Retrieval",
            "k = 0, answers will have no context",
            "Set retrieval.k to 7 or similar",
        ));
    } else {
        results.push(CheckResult::ok(
            "Retrieval",
            &format!("k = {} ({})", settings.retrieval.k, settings.retrieval.metric),
        ));
    }

    match Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    ) {
        Ok(_) => results.push(CheckResult::ok(
            "Prompts",
            settings.prompts.custom_dir.as_deref().unwrap_or("built-in"),
        )),
        Err(e) => results.push(CheckResult::error(
            "Prompts",
            &e.to_string(),
            "Fix summary.toml / qa.toml in the custom prompt directory",
        )),
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubeqa config edit",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
