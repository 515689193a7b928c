//! Comprehensive error types for bundler operations.
//!
//! This module defines the CLI-facing error types. Pipeline failures live in
//! [`crate::bundler::Error`] and are wrapped here.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all bundler operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error;

        match self {
            Self::Bundler(Error::Precondition { .. }) => vec![
                "Run from the Flutter project root or pass --project-dir".to_string(),
                "Make sure `flutter` is on PATH, or use --no-build with an existing build".to_string(),
            ],
            Self::Bundler(Error::BootstrapMissing { .. }) => vec![
                "Rebuild the web app: flutter_bootstrap.js is produced by `flutter build web`"
                    .to_string(),
            ],
            Self::Bundler(Error::StageFailed { source, .. })
                if matches!(**source, Error::Patch(_)) =>
            {
                vec![
                    "The vendor file drifted beyond the patch tolerance; regenerate the patch with `diff`"
                        .to_string(),
                    "The pre-patch backup is left next to the patched file".to_string(),
                ]
            }
            Self::Bundler(Error::Builds { .. }) => {
                vec!["Run `flutter build web` manually in the failing project(s)".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
