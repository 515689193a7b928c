//! Builder for constructing Settings.

use super::{CompileTarget, PackageSettings, Settings, Topology};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_extension::bundler::{CompileTarget, PackageSettings, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_extension::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .output_dir("my-extension")
///     .package_settings(PackageSettings {
///         name: "My Flutter Extension".into(),
///         version: "2.0.0".into(),
///         description: None,
///     })
///     .compile_target(CompileTarget::Interpreted)
///     .debug_logging(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SettingsBuilder {
    output_dir: Option<PathBuf>,
    package_settings: PackageSettings,
    project_dir: PathBuf,
    build_dir: Option<PathBuf>,
    compile_target: CompileTarget,
    topology: Topology,
    debug_logging: bool,
    skip_build: bool,
    build_timeout: Option<Duration>,
    deadline: Option<Duration>,
    archive: Option<PathBuf>,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            output_dir: None,
            package_settings: PackageSettings::default(),
            project_dir: PathBuf::from("."),
            build_dir: None,
            compile_target: CompileTarget::default(),
            topology: Topology::default(),
            debug_logging: true,
            skip_build: false,
            build_timeout: None,
            deadline: None,
            archive: None,
        }
    }
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the package output directory.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets package metadata.
    ///
    /// Default: "Flutter App Extension" 1.0.0 with a derived description
    pub fn package_settings(mut self, settings: PackageSettings) -> Self {
        self.package_settings = settings;
        self
    }

    /// Sets the Flutter project directory.
    ///
    /// Default: `.`
    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_dir = path.as_ref().to_path_buf();
        self
    }

    /// Sets the compiled web output directory.
    ///
    /// Default: `<project_dir>/build/web`
    pub fn build_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: [`CompileTarget::Binary`]
    pub fn compile_target(mut self, target: CompileTarget) -> Self {
        self.compile_target = target;
        self
    }

    /// Default: [`Topology::Popup`]
    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Emit console diagnostics in generated code.
    ///
    /// Default: true
    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Use the existing compiled output instead of running `flutter build web`.
    pub fn skip_build(mut self, skip: bool) -> Self {
        self.skip_build = skip;
        self
    }

    pub fn build_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Zip the finished package to `path`.
    pub fn archive<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.archive = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `output_dir` is missing or empty, or if the
    /// package name or version is empty.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let output_dir = self
            .output_dir
            .filter(|p| !p.as_os_str().is_empty())
            .context("output directory is required")?;

        if self.package_settings.name.trim().is_empty() {
            crate::bail!("extension name must not be empty");
        }
        if self.package_settings.version.trim().is_empty() {
            crate::bail!("extension version must not be empty");
        }

        let build_dir = self
            .build_dir
            .unwrap_or_else(|| self.project_dir.join("build").join("web"));

        Ok(Settings::new(
            self.package_settings,
            output_dir,
            self.project_dir,
            build_dir,
            self.compile_target,
            self.topology,
            self.debug_logging,
            self.skip_build,
            self.build_timeout,
            self.deadline,
            self.archive,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let settings = SettingsBuilder::new()
            .output_dir("ext")
            .project_dir("app")
            .build()
            .unwrap();
        assert_eq!(settings.name(), "Flutter App Extension");
        assert_eq!(settings.version_string(), "1.0.0");
        assert_eq!(settings.compile_target(), CompileTarget::Binary);
        assert_eq!(settings.topology(), Topology::Popup);
        assert_eq!(settings.build_dir(), Path::new("app/build/web"));
        assert!(!settings.skip_build());
    }

    #[test]
    fn output_dir_is_required() {
        assert!(SettingsBuilder::new().build().is_err());
        assert!(SettingsBuilder::new().output_dir("").build().is_err());
    }
}
