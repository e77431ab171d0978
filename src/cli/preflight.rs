//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{CompassError, Result};
use crate::openai::OPENAI_API_KEY_ENV;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Analysis transcribes (Whisper, ffmpeg) and calls the chat model.
    Analyze,
    /// Cache maintenance is local only.
    Cache,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Analyze => {
            check_env_key(OPENAI_API_KEY_ENV)?;
            let llm_key = settings.llm.resolved_api_key_env();
            if llm_key != OPENAI_API_KEY_ENV {
                check_env_key(&llm_key)?;
            }
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::Cache => {}
    }
    Ok(())
}

/// Check that an API key variable is set and non-empty.
fn check_env_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(CompassError::Config(format!(
            "{var} is empty. Set it with: export {var}='...'"
        ))),
        Err(_) => Err(CompassError::Config(format!(
            "{var} not set. Set it with: export {var}='...'"
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(CompassError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CompassError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(CompassError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_cache_no_requirements() {
        assert!(check(Operation::Cache, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        assert!(matches!(
            check_env_key("COMPASS_TEST_KEY_THAT_IS_NEVER_SET"),
            Err(CompassError::Config(_))
        ));
    }
}
