//! Configuration for the gotest-teamcity converter
//!
//! This module provides the command-line configuration: where to read
//! `go test -v` output from, where to write service messages to, escaping
//! and end-of-input behaviour, and logging options.

use std::path::PathBuf;

use clap::Parser;
use gotest_report::EscapeMode;

/// Convert `go test -v` output into TeamCity service messages
///
/// Example:
///   go test -v ./... 2>&1 | gotest-teamcity
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gotest-teamcity")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Read test output from this file instead of stdin
    #[arg(short, long, env = "GOTEST_TEAMCITY_INPUT")]
    pub input: Option<PathBuf>,

    /// Write service messages to this file instead of stdout
    #[arg(short, long, env = "GOTEST_TEAMCITY_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Escape non-ASCII characters by their first UTF-8 byte only
    ///
    /// Reproduces the output of older converters byte for byte. Multi-byte
    /// characters cannot be recovered by TeamCity in this mode.
    #[arg(long, env = "GOTEST_TEAMCITY_LEGACY_ESCAPING", default_value = "false")]
    pub legacy_escaping: bool,

    /// Report tests of a package whose summary line never arrived
    ///
    /// They are emitted as a suite named `unterminated`. Without this flag
    /// they are dropped with a warning.
    #[arg(long, default_value = "false")]
    pub flush_unterminated: bool,

    /// Write run statistics as JSON to this file
    #[arg(long, env = "GOTEST_TEAMCITY_SUMMARY")]
    pub summary: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never mix with the service
    /// messages on stdout.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Config {
    /// Escaping mode selected by `--legacy-escaping`
    #[must_use]
    pub fn escape_mode(&self) -> EscapeMode {
        if self.legacy_escaping {
            EscapeMode::Legacy
        } else {
            EscapeMode::Unicode
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input path is specified but doesn't exist
    /// - The input path is a directory
    /// - The summary file's parent directory cannot be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(ConfigError::InputNotFound(input.clone()));
            }
            if input.is_dir() {
                return Err(ConfigError::InputIsDirectory(input.clone()));
            }
        }

        if let Some(parent) = self.summary.as_ref().and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::SummaryDirectoryCreateFailed(parent.to_path_buf(), e)
                })?;
            }
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input file not found
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Input path is a directory
    #[error("Input path is a directory: {0}")]
    InputIsDirectory(PathBuf),

    /// Failed to create the summary file's directory
    #[error("Failed to create summary directory {0}: {1}")]
    SummaryDirectoryCreateFailed(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.input.is_none());
        assert!(config.output.is_none());
        assert!(config.summary.is_none());
        assert!(!config.legacy_escaping);
        assert!(!config.flush_unterminated);
        assert!(!config.verbose);
        assert!(!config.quiet);
    }

    #[test]
    fn test_escape_mode_default() {
        assert_eq!(Config::default().escape_mode(), EscapeMode::Unicode);
    }

    #[test]
    fn test_escape_mode_legacy() {
        let config = Config {
            legacy_escaping: true,
            ..Default::default()
        };
        assert_eq!(config.escape_mode(), EscapeMode::Legacy);
    }

    #[test]
    fn test_log_level_default() {
        let config = Config::default();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_log_level_verbose() {
        let config = Config {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_log_level_quiet() {
        let config = Config {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_validate_nonexistent_input() {
        let config = Config {
            input: Some(PathBuf::from("/nonexistent/path/12345/go-test.log")),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InputNotFound(_))));
    }

    #[test]
    fn test_validate_directory_input() {
        let config = Config {
            input: Some(std::env::temp_dir()),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InputIsDirectory(_))));
    }

    #[test]
    fn test_validate_stdin_stdout() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bare_summary_filename() {
        let config = Config {
            summary: Some(PathBuf::from("summary.json")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
