//! Composition of several Flutter projects into one multi-app package.
//!
//! The [`Coordinator`] resolves each project in a [`ProjectDescriptor`]
//! (cloning remote ones), builds them concurrently as separately supervised
//! tasks and copies every build into `<package>/<target>/apps/<id>/` for each
//! target the project declares. Overlay copies get the per-app program
//! rewrite and a patched `flutter.js`; popup and options copies are plain
//! filtered copies.

mod project;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::{process::Command, sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

pub use project::{DeployTarget, Project, ProjectDescriptor};

use crate::bundler::{
    builder::{process::run_supervised, tool_detection},
    error::{Context, Error, ErrorExt, ProjectBuildFailure, Result},
    patch::{self, PatchDocument},
    patcher::{APP_DIR_MARKER, patch_application},
    utils::fs,
};

/// `flutter build web` arguments used when none are configured.
pub const DEFAULT_BUILD_ARGS: &[&str] = &["--csp", "--profile"];

/// Files left out of popup and options copies.
pub const FILTERED_FILES: &[&str] = &[
    "flutter_service_worker.js",
    ".last_build_id",
    "*.map",
    "*.backup",
];

/// Knobs for a coordination run.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Package root the apps are copied into.
    pub package_dir: PathBuf,
    /// Where remote projects are cloned. Defaults to `<descriptor dir>/.workspace`.
    pub workspace: Option<PathBuf>,
    /// Reuse existing `build/web` output instead of building.
    pub skip_build: bool,
    /// Maximum number of concurrent builds.
    pub jobs: usize,
    /// Limit for each project's build and clone.
    pub build_timeout: Option<Duration>,
    /// Arguments after `flutter build web`.
    pub build_args: Vec<String>,
    /// `flutter` executable. Looked up on `PATH` when unset.
    pub flutter: Option<PathBuf>,
}

impl CoordinatorOptions {
    pub fn new(package_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
            workspace: None,
            skip_build: false,
            jobs: num_cpus::get().max(1),
            build_timeout: None,
            build_args: DEFAULT_BUILD_ARGS.iter().map(|s| s.to_string()).collect(),
            flutter: None,
        }
    }
}

/// One app copied into one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedApp {
    pub project: String,
    pub target: DeployTarget,
    /// `<package>/<target>/apps/<id>`.
    pub dir: PathBuf,
}

/// Outcome of [`Coordinator::run`].
#[derive(Debug, Clone, Default)]
pub struct CoordinationReport {
    /// Projects that were built, in descriptor order.
    pub built: Vec<String>,
    pub copied: Vec<CopiedApp>,
}

/// A project whose sources are on disk.
#[derive(Debug, Clone)]
struct ResolvedProject {
    project: Project,
    root: PathBuf,
}

impl ResolvedProject {
    fn build_dir(&self) -> PathBuf {
        self.root.join("build").join("web")
    }
}

/// Builds and composes the projects of one descriptor.
#[derive(Debug)]
pub struct Coordinator {
    descriptor: ProjectDescriptor,
    options: CoordinatorOptions,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(descriptor: ProjectDescriptor, options: CoordinatorOptions) -> Self {
        Self {
            descriptor,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to abort the run; running builds and clones are killed.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Clone workspace in effect for this run.
    pub fn workspace(&self) -> PathBuf {
        if let Some(workspace) = &self.options.workspace {
            return workspace.clone();
        }
        match &self.descriptor.base_dir {
            Some(base) => base.join(".workspace"),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(env!("CARGO_PKG_NAME"))
                .join("workspace"),
        }
    }

    /// Resolves, builds and copies every project.
    pub async fn run(&self) -> Result<CoordinationReport> {
        self.descriptor.validate()?;
        let support_patch = self.load_support_patch().await?;

        let projects = self.resolve().await?;

        let mut report = CoordinationReport::default();
        if self.options.skip_build {
            log::info!("skipping flutter builds");
        } else {
            report.built = self.build_all(&projects).await?;
        }

        for resolved in &projects {
            for &target in &resolved.project.targets {
                self.check_cancelled("copying apps")?;
                let dir = self
                    .options
                    .package_dir
                    .join(target.dir_name())
                    .join("apps")
                    .join(&resolved.project.id);
                log::info!("copying {} into {}", resolved.project.id, dir.display());
                match target {
                    DeployTarget::Overlay => {
                        let support_patch = support_patch.as_ref().ok_or_else(|| Error::Precondition {
                            reason: "overlay apps need a support_patch for flutter.js".into(),
                        })?;
                        copy_overlay_app(&resolved.build_dir(), &dir, support_patch).await?
                    }
                    DeployTarget::Popup | DeployTarget::Options => {
                        copy_page_app(&resolved.build_dir(), &dir).await?
                    }
                }
                report.copied.push(CopiedApp {
                    project: resolved.project.id.clone(),
                    target,
                    dir,
                });
            }
        }

        log::info!(
            "composed {} app copies into {}",
            report.copied.len(),
            self.options.package_dir.display()
        );
        Ok(report)
    }

    fn check_cancelled(&self, what: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled { what: what.into() });
        }
        Ok(())
    }

    async fn load_support_patch(&self) -> Result<Option<PatchDocument>> {
        let Some(path) = self.descriptor.support_patch_path() else {
            return Ok(None);
        };
        let text = tokio::fs::read_to_string(&path)
            .await
            .fs_context("failed to read support patch", &path)?;
        let document = text
            .parse::<PatchDocument>()
            .with_context(|| format!("invalid support patch {}", path.display()))?;
        Ok(Some(document))
    }

    async fn resolve(&self) -> Result<Vec<ResolvedProject>> {
        let workspace = self.workspace();
        let mut resolved = Vec::with_capacity(self.descriptor.projects.len());

        for project in &self.descriptor.projects {
            self.check_cancelled("resolving projects")?;
            let source = project.source(self.descriptor.base_dir())?;
            let root = source
                .resolve_into(&workspace, self.options.build_timeout, &self.cancel)
                .await?;

            let entry = ResolvedProject {
                project: project.clone(),
                root,
            };
            let required = if self.options.skip_build {
                entry.build_dir()
            } else {
                entry.root.join("pubspec.yaml")
            };
            if !required.exists() {
                return Err(Error::Precondition {
                    reason: format!("project `{}`: {} does not exist", project.id, required.display()),
                });
            }
            log::debug!("project {} resolved to {}", project.id, entry.root.display());
            resolved.push(entry);
        }
        Ok(resolved)
    }

    /// Builds every project, at most `jobs` at a time.
    ///
    /// All builds run to completion; failures are reported together.
    async fn build_all(&self, projects: &[ResolvedProject]) -> Result<Vec<String>> {
        let flutter = self
            .options
            .flutter
            .clone()
            .or_else(|| tool_detection::FLUTTER.as_deref().map(Path::to_path_buf))
            .ok_or_else(|| Error::Precondition {
                reason: "flutter is not installed or not in PATH".into(),
            })?;

        let permits = Arc::new(Semaphore::new(self.options.jobs.max(1)));
        let mut join_set = JoinSet::new();

        for (idx, resolved) in projects.iter().enumerate() {
            let permits = Arc::clone(&permits);
            let cancel = self.cancel.clone();
            let timeout = self.options.build_timeout;
            let mut command = Command::new(&flutter);
            command
                .args(["build", "web"])
                .args(&self.options.build_args)
                .current_dir(&resolved.root);

            join_set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (idx, run_supervised(command, timeout, &cancel).await)
            });
        }

        let mut outcomes: Vec<Option<Result<()>>> = projects.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (idx, outcome) = joined?;
            outcomes[idx] = Some(outcome.map(|_| ()));
        }

        let mut built = Vec::new();
        let mut failures = Vec::new();
        for (resolved, outcome) in projects.iter().zip(outcomes) {
            let id = resolved.project.id.clone();
            match outcome {
                Some(Ok(())) => {
                    log::info!("built {}", id);
                    built.push(id);
                }
                Some(Err(e)) => {
                    log::error!("build of {} failed: {}", id, e);
                    failures.push(ProjectBuildFailure {
                        project: id,
                        reason: e.to_string(),
                    });
                }
                None => failures.push(ProjectBuildFailure {
                    project: id,
                    reason: "build task did not report".into(),
                }),
            }
        }

        if failures.is_empty() {
            Ok(built)
        } else {
            Err(Error::Builds { failures })
        }
    }
}

/// Filtered copy of the whole build into a popup or options app directory.
async fn copy_page_app(build_dir: &Path, app_dir: &Path) -> Result<()> {
    let copied = fs::copy_dir_filtered(build_dir, app_dir, FILTERED_FILES).await?;
    log::debug!("copied {} file(s) into {}", copied, app_dir.display());
    Ok(())
}

/// Overlay copy: assets, program fragments, the rewritten program and a
/// patched `flutter.js`. Originals are kept next to their rewrites as `.orig`.
async fn copy_overlay_app(
    build_dir: &Path,
    app_dir: &Path,
    support_patch: &PatchDocument,
) -> Result<()> {
    fs::create_dir_all(app_dir, false).await?;

    let assets = build_dir.join("assets");
    if assets.is_dir() {
        fs::copy_dir(&assets, &app_dir.join("assets")).await?;
    }

    let program_orig = app_dir.join("main.dart.js.orig");
    fs::copy_file(&build_dir.join("main.dart.js"), &program_orig).await?;

    copy_fragments(build_dir, app_dir).await?;

    let original = tokio::fs::read_to_string(&program_orig)
        .await
        .fs_context("failed to read program", &program_orig)?;
    let rewritten = patch_application(&original, APP_DIR_MARKER)?;
    let program = app_dir.join("main.dart.js");
    tokio::fs::write(&program, rewritten)
        .await
        .fs_context("failed to write program", &program)?;

    let loader_orig = app_dir.join("flutter.js.orig");
    let loader = app_dir.join("flutter.js");
    fs::copy_file(&build_dir.join("flutter.js"), &loader_orig).await?;
    let text = tokio::fs::read_to_string(&loader_orig)
        .await
        .fs_context("failed to read loader", &loader_orig)?;
    let patched = patch::apply(support_patch, &text)?;
    tokio::fs::write(&loader, patched)
        .await
        .fs_context("failed to write loader", &loader)
}

/// Copies every `*.part.js` fragment concurrently and waits for all of them.
///
/// The program rewrite must not start while a fragment is still being
/// written, so every copy is awaited even after one fails. The first failure
/// in file order is returned.
async fn copy_fragments(build_dir: &Path, app_dir: &Path) -> Result<()> {
    let fragments = fs::matching_files(build_dir, "*.part.js").await?;
    let mut join_set = JoinSet::new();
    for (idx, from) in fragments.into_iter().enumerate() {
        let Some(name) = from.file_name() else { continue };
        let to = app_dir.join(name);
        join_set.spawn(async move {
            let outcome = tokio::fs::copy(&from, &to).await;
            (idx, from, to, outcome)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let (idx, from, to, outcome) = joined?;
        if let Err(e) = outcome {
            log::error!("copying {} failed: {}", from.display(), e);
            failures.push((
                idx,
                Error::CopyFailed {
                    from,
                    to,
                    reason: e.to_string(),
                },
            ));
        }
    }

    failures.sort_by_key(|(idx, _)| *idx);
    match failures.into_iter().next() {
        Some((_, error)) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fragments_are_all_copied() {
        let build = tempfile::tempdir().unwrap();
        let app = tempfile::tempdir().unwrap();
        for i in 0..5 {
            std::fs::write(build.path().join(format!("main.dart.js_{i}.part.js")), i.to_string()).unwrap();
        }
        std::fs::write(build.path().join("main.dart.js"), "main").unwrap();

        copy_fragments(build.path(), app.path()).await.unwrap();

        for i in 0..5 {
            let copied = std::fs::read_to_string(app.path().join(format!("main.dart.js_{i}.part.js"))).unwrap();
            assert_eq!(copied, i.to_string());
        }
        assert!(!app.path().join("main.dart.js").exists());
    }

    #[tokio::test]
    async fn fragment_failure_names_the_file() {
        let build = tempfile::tempdir().unwrap();
        std::fs::write(build.path().join("a.part.js"), "a").unwrap();
        let missing = build.path().join("no-such-dir");

        let err = copy_fragments(build.path(), &missing).await.unwrap_err();
        match err {
            Error::CopyFailed { from, to, .. } => {
                assert_eq!(from, build.path().join("a.part.js"));
                assert_eq!(to, missing.join("a.part.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_workspace_sits_next_to_descriptor() {
        let descriptor = ProjectDescriptor {
            projects: vec![],
            support_patch: None,
            base_dir: Some(PathBuf::from("/work")),
        };
        let coordinator = Coordinator::new(descriptor, CoordinatorOptions::new("/pkg"));
        assert_eq!(coordinator.workspace(), PathBuf::from("/work/.workspace"));
    }
}
