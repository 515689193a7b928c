//! Line-level patches for vendor-generated files.
//!
//! A [`PatchDocument`] is produced once against a known original with
//! [`diff`] and later replayed with [`apply`] against whatever the toolchain
//! emitted this time. Application tolerates the hunks having moved a few
//! lines and a couple of context lines having changed; anything further
//! fails with a [`PatchFailure`] naming the hunk, and nothing is written.
//!
//! Diffing and the unified-diff text form come from `diffy`; placement of
//! hunks in a drifted original is done here.

mod apply;
mod diff;
mod document;

pub use apply::{apply, apply_with};
pub use diff::{CONTEXT_LINES, diff};
pub use document::{Hunk, HunkLine, ParsePatchError, PatchDocument};

/// Tolerance used when locating hunks in a drifted original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzOptions {
    /// Maximum distance, in lines, between a hunk's expected and actual position.
    pub search_window: usize,
    /// Maximum number of leading and trailing context lines that may be ignored.
    pub max_fuzz: usize,
}

impl Default for FuzzOptions {
    fn default() -> Self {
        Self {
            search_window: 64,
            max_fuzz: 2,
        }
    }
}

/// A patch operation that could not be located within tolerance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("patch operation #{operation_index} failed: {reason}")]
pub struct PatchFailure {
    /// Why the operation did not apply.
    pub reason: String,
    /// 0-based index of the first operation that failed.
    pub operation_index: usize,
}

impl PatchFailure {
    pub(crate) fn new(operation_index: usize, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            operation_index,
        }
    }
}
