//! Core Settings struct and implementations.

use super::{CompileTarget, PackageSettings, Topology};
use crate::bundler::patcher::DebugMode;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Immutable configuration for one packaging run.
///
/// Constructed once via [`SettingsBuilder`](super::SettingsBuilder) and only
/// read afterwards.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_extension::bundler::{SettingsBuilder, Topology};
///
/// # fn example() -> kodegen_bundler_extension::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .output_dir("chrome-extension")
///     .topology(Topology::Overlay)
///     .build()?;
/// assert_eq!(settings.name(), "Flutter App Extension");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    package: PackageSettings,

    /// Package directory. Erased and recreated on every run.
    output_dir: PathBuf,

    /// Flutter project root holding `pubspec.yaml`.
    project_dir: PathBuf,

    /// Compiled web output, `<project>/build/web` unless overridden.
    build_dir: PathBuf,

    compile_target: CompileTarget,
    topology: Topology,
    debug_logging: bool,
    skip_build: bool,

    /// Limit for the external `flutter build` process.
    build_timeout: Option<Duration>,

    /// Limit for the whole run.
    deadline: Option<Duration>,

    /// Zip the package to this path after the build record is written.
    archive: Option<PathBuf>,
}

impl Settings {
    /// Returns the extension name.
    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// Returns the extension version.
    pub fn version_string(&self) -> &str {
        &self.package.version
    }

    /// Returns the description, deriving one when none was configured.
    pub fn description(&self) -> String {
        if let Some(description) = &self.package.description {
            return description.clone();
        }
        let host = match self.topology {
            Topology::Popup => "Chrome extension popup",
            Topology::Overlay => "Chrome content script",
        };
        format!("A {host} running Flutter with {}", self.compile_target.language())
    }

    /// Returns the package metadata.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// Returns the package output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the Flutter project directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Returns the compiled web output directory.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn compile_target(&self) -> CompileTarget {
        self.compile_target
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Whether generated code carries console diagnostics.
    pub fn debug_mode(&self) -> DebugMode {
        if self.debug_logging {
            DebugMode::Verbose
        } else {
            DebugMode::Silent
        }
    }

    /// Whether the external build is skipped.
    pub fn skip_build(&self) -> bool {
        self.skip_build
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Returns the archive path, if packaging into a zip was requested.
    pub fn archive(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        package: PackageSettings,
        output_dir: PathBuf,
        project_dir: PathBuf,
        build_dir: PathBuf,
        compile_target: CompileTarget,
        topology: Topology,
        debug_logging: bool,
        skip_build: bool,
        build_timeout: Option<Duration>,
        deadline: Option<Duration>,
        archive: Option<PathBuf>,
    ) -> Self {
        Self {
            package,
            output_dir,
            project_dir,
            build_dir,
            compile_target,
            topology,
            debug_logging,
            skip_build,
            build_timeout,
            deadline,
            archive,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bundler::{CompileTarget, SettingsBuilder, Topology};

    #[test]
    fn description_follows_topology_and_target() {
        let cases = [
            (Topology::Popup, CompileTarget::Binary, "A Chrome extension popup running Flutter with WebAssembly"),
            (Topology::Popup, CompileTarget::Interpreted, "A Chrome extension popup running Flutter with JavaScript"),
            (Topology::Overlay, CompileTarget::Binary, "A Chrome content script running Flutter with WebAssembly"),
            (Topology::Overlay, CompileTarget::Interpreted, "A Chrome content script running Flutter with JavaScript"),
        ];
        for (topology, target, expected) in cases {
            let settings = SettingsBuilder::new()
                .output_dir("out")
                .topology(topology)
                .compile_target(target)
                .build()
                .unwrap();
            assert_eq!(settings.description(), expected);
        }
    }
}
