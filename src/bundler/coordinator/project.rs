//! Project descriptors for multi-app packages.
//!
//! A descriptor lists the Flutter projects to compose into one package and
//! the deploy targets each one is copied into. It is read from JSON, or from
//! TOML when the file name ends in `.toml`:
//!
//! ```json
//! {
//!   "project": [
//!     { "id": "notes", "pubspec_path": "../notes/pubspec.yaml", "target": ["popup", "content_scripts"] },
//!     { "id": "clock", "git": "https://github.com/acme/clock.git", "subdir": "app", "targets": ["options"] }
//!   ],
//!   "support_patch": "patches/flutter.js.patch"
//! }
//! ```

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    bail,
    bundler::error::{Error, ErrorExt, Result},
    source::RepositorySource,
};

/// Where a project's app is placed inside the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployTarget {
    /// Toolbar popup page.
    Popup,
    /// Extension options page.
    Options,
    /// Overlay injected into visited pages.
    #[serde(alias = "content_scripts")]
    Overlay,
}

impl DeployTarget {
    /// Directory under the package root holding this target's apps.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Popup => "popup",
            Self::Options => "options",
            Self::Overlay => "overlay",
        }
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One Flutter project in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Directory name of the app inside the package.
    pub id: String,

    /// Project directory, or its `pubspec.yaml`.
    #[serde(default, alias = "pubspec_path", skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Repository to clone the project from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,

    /// Project root inside the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<PathBuf>,

    #[serde(alias = "target")]
    pub targets: Vec<DeployTarget>,
}

impl Project {
    /// Whether the app is copied into `target`.
    pub fn deploys_to(&self, target: DeployTarget) -> bool {
        self.targets.contains(&target)
    }

    /// Resolves the project location. Relative local paths are taken
    /// relative to `base_dir`, and a path to `pubspec.yaml` stands for its
    /// directory.
    pub fn source(&self, base_dir: &Path) -> Result<RepositorySource> {
        match (&self.path, &self.git) {
            (Some(path), None) => {
                let path = base_dir.join(path);
                let dir = if path.file_name().is_some_and(|n| n == "pubspec.yaml") {
                    path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
                } else {
                    path
                };
                Ok(RepositorySource::Local(dir))
            }
            (None, Some(url)) => Ok(RepositorySource::Git {
                url: url.clone(),
                subdir: self.subdir.clone(),
            }),
            (Some(_), Some(_)) => bail!("project `{}` sets both `path` and `git`", self.id),
            (None, None) => bail!("project `{}` needs either `path` or `git`", self.id),
        }
    }
}

/// Projects composed into one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    #[serde(alias = "project")]
    pub projects: Vec<Project>,

    /// Patch for each overlay app's `flutter.js`, relative to the descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_patch: Option<PathBuf>,

    /// Directory of the descriptor file, when loaded from one.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ProjectDescriptor {
    /// Reads and validates a descriptor file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .fs_context("failed to read project descriptor", path)?;

        let mut descriptor: Self = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };
        descriptor.base_dir = Some(
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        );
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Directory relative paths in the descriptor are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Checks ids and locations.
    ///
    /// Ids name directories, so they must be non-empty, unique and free of
    /// path separators. Overlay apps need a support patch.
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            bail!("project descriptor lists no projects");
        }

        let mut seen = HashSet::new();
        for project in &self.projects {
            validate_id(&project.id)?;
            if !seen.insert(project.id.as_str()) {
                bail!("duplicate project id `{}`", project.id);
            }
            if project.targets.is_empty() {
                bail!("project `{}` has no targets", project.id);
            }
            project.source(self.base_dir())?;
            if self.support_patch.is_none() && project.deploys_to(DeployTarget::Overlay) {
                return Err(Error::Precondition {
                    reason: format!(
                        "project `{}` deploys to the overlay, which needs a support_patch for flutter.js",
                        project.id
                    ),
                });
            }
        }
        Ok(())
    }

    /// The support patch path, resolved against the descriptor directory.
    pub fn support_patch_path(&self) -> Option<PathBuf> {
        self.support_patch.as_ref().map(|p| self.base_dir().join(p))
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("project id must not be empty");
    }
    if id.contains(['/', '\\']) || id == "." || id == ".." {
        bail!("project id `{}` must not contain path separators", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
      "project": [
        { "id": "notes", "pubspec_path": "apps/notes/pubspec.yaml", "target": ["popup", "content_scripts"] },
        { "id": "clock", "git": "https://github.com/acme/clock.git", "subdir": "app", "targets": ["options"] }
      ],
      "support_patch": "flutter.js.patch"
    }"#;

    #[test]
    fn accepts_legacy_field_names() {
        let descriptor: ProjectDescriptor = serde_json::from_str(JSON).unwrap();
        descriptor.validate().unwrap();

        let notes = &descriptor.projects[0];
        assert_eq!(notes.targets, [DeployTarget::Popup, DeployTarget::Overlay]);
        assert_eq!(
            notes.source(Path::new("/work")).unwrap(),
            RepositorySource::Local(PathBuf::from("/work/apps/notes"))
        );

        let clock = &descriptor.projects[1];
        assert!(clock.deploys_to(DeployTarget::Options));
        assert_eq!(
            clock.source(Path::new("/work")).unwrap(),
            RepositorySource::Git {
                url: "https://github.com/acme/clock.git".into(),
                subdir: Some("app".into())
            }
        );
    }

    #[tokio::test]
    async fn loads_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.toml");
        std::fs::write(
            &path,
            r#"
support_patch = "flutter.js.patch"

[[projects]]
id = "notes"
path = "notes"
targets = ["overlay"]
"#,
        )
        .unwrap();

        let descriptor = ProjectDescriptor::load(&path).await.unwrap();
        assert_eq!(descriptor.base_dir(), dir.path());
        assert_eq!(descriptor.support_patch_path(), Some(dir.path().join("flutter.js.patch")));
        assert_eq!(descriptor.projects[0].targets, [DeployTarget::Overlay]);
    }

    #[test]
    fn rejects_bad_ids() {
        for id in ["", "a/b", "a\\b", ".."] {
            let descriptor = ProjectDescriptor {
                projects: vec![Project {
                    id: id.into(),
                    path: Some("x".into()),
                    git: None,
                    subdir: None,
                    targets: vec![DeployTarget::Popup],
                }],
                support_patch: None,
                base_dir: None,
            };
            assert!(descriptor.validate().is_err(), "accepted `{id}`");
        }
    }

    #[test]
    fn rejects_duplicates_and_ambiguous_locations() {
        let mut descriptor: ProjectDescriptor = serde_json::from_str(JSON).unwrap();
        descriptor.projects[1].id = "notes".into();
        assert!(descriptor.validate().is_err());

        let mut descriptor: ProjectDescriptor = serde_json::from_str(JSON).unwrap();
        descriptor.projects[0].git = Some("https://github.com/acme/notes.git".into());
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn overlay_without_support_patch_is_a_precondition() {
        let mut descriptor: ProjectDescriptor = serde_json::from_str(JSON).unwrap();
        descriptor.support_patch = None;
        match descriptor.validate().unwrap_err() {
            Error::Precondition { reason } => assert!(reason.contains("`notes`"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }

        descriptor.projects[0].targets = vec![DeployTarget::Popup];
        descriptor.validate().unwrap();
    }
}
