//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting operations that would otherwise fail midway.

use crate::config::{ServiceCredentials, Settings};
use crate::error::{Result, TubeqaError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a transcript requires yt-dlp.
    Transcript,
    /// Summaries and answers require yt-dlp and service credentials.
    Generate,
    /// The API server has the same needs as `Generate`.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns the resolved credentials when the operation needs them.
pub fn check(operation: Operation, settings: &Settings) -> Result<Option<ServiceCredentials>> {
    match operation {
        Operation::Transcript => {
            check_tool("yt-dlp")?;
            Ok(None)
        }
        Operation::Generate | Operation::Serve => {
            let credentials = ServiceCredentials::from_env(settings)?;
            check_tool("yt-dlp")?;
            Ok(Some(credentials))
        }
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TubeqaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TubeqaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TubeqaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("tubeqa-no-such-tool").unwrap_err();
        assert!(matches!(err, TubeqaError::ToolNotFound(name) if name == "tubeqa-no-such-tool"));
    }
}
