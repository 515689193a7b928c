//! Flutter web to Chrome extension packager.
//!
//! This library turns the output of `flutter build web` into an unpacked
//! Manifest V3 extension:
//! - a patched bootstrap that loads every asset from the extension origin
//! - runtime shims for the popup or page-overlay topology
//! - a synthesized `manifest.json`
//! - multi-project composition with per-app patches
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod source;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
