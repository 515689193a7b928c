//! Error types for the packaging pipeline.
//!
//! Every failure is local-to-fatal: stages never swallow an error and
//! continue with degraded state. The orchestrator wraps stage failures in
//! [`Error::StageFailed`] so the operator sees which step aborted the run
//! together with the underlying cause.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

use super::{builder::Stage, patch::PatchFailure};

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single project whose external build did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBuildFailure {
    /// Project identifier from the descriptor.
    pub project: String,
    /// Exit status, timeout or spawn failure, with captured stderr.
    pub reason: String,
}

impl Display for ProjectBuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.project, self.reason)
    }
}

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A prerequisite is missing; detected before the output directory is touched.
    #[error("precondition failed: {reason}")]
    Precondition {
        /// What is missing.
        reason: String,
    },

    /// A pipeline stage aborted the run.
    #[error("stage `{stage}` failed: {source}")]
    StageFailed {
        /// Stage that failed.
        stage: Stage,
        /// Underlying cause.
        #[source]
        source: Box<Error>,
    },

    /// A patch operation could not be matched within tolerance.
    #[error(transparent)]
    Patch(#[from] PatchFailure),

    /// The compiled output has no bootstrap script to instrument.
    #[error("{} not found in build output", .path.display())]
    BootstrapMissing {
        /// Expected bootstrap location.
        path: PathBuf,
    },

    /// One or more supervised project builds failed.
    #[error("{} project build(s) failed: {}", .failures.len(), join_failures(.failures))]
    Builds {
        /// Every failing project, in descriptor order.
        failures: Vec<ProjectBuildFailure>,
    },

    /// A concurrent copy did not complete.
    #[error("copying {} to {} failed: {reason}", .from.display(), .to.display())]
    CopyFailed {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
        /// Cause.
        reason: String,
    },

    /// An external command exited unsuccessfully.
    #[error("`{command}` failed: {reason}")]
    CommandFailed {
        /// Command line.
        command: String,
        /// Exit status and captured stderr.
        reason: String,
    },

    /// An operation exceeded its deadline.
    #[error("{what} timed out after {}s", .after.as_secs())]
    Timeout {
        /// What was running.
        what: String,
        /// Deadline that elapsed.
        after: Duration,
    },

    /// The run was cancelled.
    #[error("{what} cancelled")]
    Cancelled {
        /// What was running.
        what: String,
    },

    /// Filesystem error with context.
    #[error("{0} `{path}`: {2}", path = .1.display())]
    Fs(&'static str, PathBuf, #[source] std::io::Error),

    /// Free-form error.
    #[error("{0}")]
    GenericError(String),

    /// IO error without path context.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// TOML descriptor error.
    #[error("{0}")]
    Toml(#[from] toml::de::Error),

    /// Directory traversal error.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix error during tree copies.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Template registration error.
    #[error("{0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// Template rendering error.
    #[error("{0}")]
    Render(#[from] handlebars::RenderError),

    /// Invalid glob pattern.
    #[error("{0}")]
    Pattern(#[from] glob::PatternError),

    /// Archive error.
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// Background task panicked or was aborted.
    #[error("{0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<handlebars::TemplateError> for Error {
    fn from(error: handlebars::TemplateError) -> Self {
        Self::Template(Box::new(error))
    }
}

impl Error {
    /// Wraps this error as a failure of `stage`.
    pub fn in_stage(self, stage: Stage) -> Self {
        Self::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost cause, looking through stage wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

fn join_failures(failures: &[ProjectBuildFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Attaches a message to a failing `Option` or `Result`.
pub trait Context<T> {
    /// Converts into a [`Result`] carrying `context` as the error message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Lazily evaluated variant of [`Context::context`].
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

impl<T, E: std::error::Error> Context<T> for std::result::Result<T, E> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

/// Adds path context to IO results.
pub trait ErrorExt<T> {
    /// Maps an IO error into [`Error::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| Error::Fs(context, path.as_ref().to_path_buf(), e))
    }
}

/// Returns early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
