//! Build pipeline orchestration.
//!
//! This module provides the [`Pipeline`] that turns a Flutter project into an
//! unpacked extension directory.
//!
//! # Overview
//!
//! The pipeline:
//! 1. Checks preconditions before anything is written
//! 2. Runs `flutter build web` as a supervised child process (unless skipped)
//! 3. Resets the output directory and copies the compiled files into it
//! 4. Writes the manifest, patches the bootstrap and writes the shims
//! 5. Records what was built in `BUILD_INFO.md`, optionally zipping the result
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_extension::bundler::{Pipeline, SettingsBuilder, Topology};
//!
//! # async fn example() -> kodegen_bundler_extension::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .output_dir("chrome-extension")
//!     .topology(Topology::Popup)
//!     .build()?;
//!
//! let record = Pipeline::new(settings).run().await?;
//! println!("bootstrap sha256: {}", record.bootstrap_sha256);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for patched files
//! - [`orchestrator`] - Main [`Pipeline`] struct and stage sequencing
//! - [`process`] - Supervised external commands with timeout and cancellation
//! - [`record`] - `BUILD_INFO.md` generation
//! - [`tool_detection`] - External tool availability checking

pub mod checksum;
mod orchestrator;
pub mod process;
pub mod record;
pub mod tool_detection;

use std::fmt;

pub use orchestrator::Pipeline;
pub use record::BuildRecord;

/// Steps of a packaging run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Build,
    StageDirectory,
    CopyAssets,
    WriteManifest,
    PatchBootstrap,
    WriteShims,
    WriteBuildRecord,
    Package,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 8] = [
        Stage::Build,
        Stage::StageDirectory,
        Stage::CopyAssets,
        Stage::WriteManifest,
        Stage::PatchBootstrap,
        Stage::WriteShims,
        Stage::WriteBuildRecord,
        Stage::Package,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Build => "Build",
            Stage::StageDirectory => "StageDirectory",
            Stage::CopyAssets => "CopyAssets",
            Stage::WriteManifest => "WriteManifest",
            Stage::PatchBootstrap => "PatchBootstrap",
            Stage::WriteShims => "WriteShims",
            Stage::WriteBuildRecord => "WriteBuildRecord",
            Stage::Package => "Package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
