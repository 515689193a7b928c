//! Configuration for a packaging run.
//!
//! [`Settings`] is assembled once from CLI flags by [`SettingsBuilder`] and
//! passed by reference to every stage.

mod builder;
mod core;
mod package;
mod target;

pub use builder::SettingsBuilder;
pub use core::Settings;
pub use package::{DEFAULT_NAME, DEFAULT_VERSION, PackageSettings};
pub use target::{CompileTarget, Topology};
