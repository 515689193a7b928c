//! Extension package metadata.

/// Default extension name.
pub const DEFAULT_NAME: &str = "Flutter App Extension";

/// Default extension version.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Extension metadata written to the manifest and build record.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_extension::bundler::PackageSettings;
///
/// let package = PackageSettings {
///     name: "My Flutter Extension".into(),
///     version: "2.0.0".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct PackageSettings {
    /// Name shown in the browser's extension list and the popup title.
    pub name: String,

    /// Manifest version string, e.g. "1.0.0".
    pub version: String,

    /// Description. When `None`, one is derived from topology and compile target.
    pub description: Option<String>,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            version: DEFAULT_VERSION.into(),
            description: None,
        }
    }
}
