//! Packaging of Flutter web builds as browser extensions.
//!
//! - [`patch`] - line-level diff patches with fuzzy application
//! - [`patcher`] - structural rewrites of the bootstrap and compiled program
//! - [`shims`] - scripts and pages shipped inside the package
//! - [`manifest`] - the extension manifest
//! - [`builder`] - the single-project [`Pipeline`]
//! - [`coordinator`] - multi-project composition

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod globals;
pub mod manifest;
pub mod patch;
pub mod patcher;
pub mod settings;
pub mod shims;
pub mod utils;

pub use builder::{BuildRecord, Pipeline, Stage};
pub use coordinator::{
    CoordinationReport, Coordinator, CoordinatorOptions, DeployTarget, Project, ProjectDescriptor,
};
pub use error::{Error, ProjectBuildFailure, Result};
pub use manifest::{ManifestDescriptor, synthesize};
pub use patch::{FuzzOptions, PatchDocument, PatchFailure};
pub use patcher::{DebugMode, patch_application, patch_bootstrap, patch_bootstrap_file};
pub use settings::{CompileTarget, PackageSettings, Settings, SettingsBuilder, Topology};
pub use shims::{ShimGenerator, ShimGlobals};
