//! Stage sequencing for one packaging run.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use chrono::Utc;
use path_absolutize::Absolutize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::bundler::{
    Settings,
    error::{Error, ErrorExt, Result},
    manifest,
    patcher::{self, BOOTSTRAP_FILE},
    shims::{self, ShimGenerator},
    utils::{archive, fs},
};

use super::{
    Stage,
    checksum::calculate_sha256,
    process::run_supervised,
    record::{self, BuildRecord},
    tool_detection::{self, FLUTTER},
};

/// Project file that marks a Flutter project root.
pub const PUBSPEC_FILE: &str = "pubspec.yaml";

/// Turns a Flutter project into an unpacked extension directory.
///
/// Stages run strictly in order and the first failure aborts the run,
/// wrapped in [`Error::StageFailed`]. Nothing is retried.
///
/// The output directory is erased at the start of every run and is assumed
/// to be owned by a single run. Running two pipelines against the same
/// output directory concurrently is not detected.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_extension::bundler::{Pipeline, Settings};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(settings: Settings) -> kodegen_bundler_extension::bundler::Result<()> {
/// let cancel = CancellationToken::new();
/// let pipeline = Pipeline::new(settings).with_cancellation(cancel.clone());
/// let record = pipeline.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    settings: Settings,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to abort the run. It is checked between stages and
    /// kills the external build when fired.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a reference to the pipeline settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs every stage and returns what was built.
    ///
    /// Preconditions are checked before the output directory is touched.
    pub async fn run(&self) -> Result<BuildRecord> {
        self.check_preconditions()?;

        let s = &self.settings;
        log::info!(
            "packaging {} {} as {} ({}) into {}",
            s.name(),
            s.version_string(),
            s.topology(),
            s.compile_target(),
            s.output_dir().display()
        );

        match s.deadline() {
            Some(after) => tokio::time::timeout(after, self.run_stages())
                .await
                .map_err(|_| Error::Timeout {
                    what: "packaging run".into(),
                    after,
                })?,
            None => self.run_stages().await,
        }
    }

    fn check_preconditions(&self) -> Result<()> {
        let s = &self.settings;
        let precondition = |reason: String| Err(Error::Precondition { reason });

        let pubspec = s.project_dir().join(PUBSPEC_FILE);
        if !pubspec.is_file() {
            return precondition(format!(
                "no {} found in {}; run from the Flutter project root or pass --project-dir",
                PUBSPEC_FILE,
                s.project_dir().display()
            ));
        }

        if s.skip_build() {
            if !s.build_dir().is_dir() {
                return precondition(format!(
                    "build was skipped but {} does not exist",
                    s.build_dir().display()
                ));
            }
        } else if !*tool_detection::HAS_FLUTTER {
            return precondition("flutter is not installed or not in PATH".into());
        }

        let output = s.output_dir().absolutize()?;
        let project = s.project_dir().absolutize()?;
        let build = s.build_dir().absolutize()?;
        if project.starts_with(&*output) {
            return precondition(format!(
                "output directory {} would erase the project",
                s.output_dir().display()
            ));
        }
        if output.starts_with(&*build) || build.starts_with(&*output) {
            return precondition(format!(
                "output directory {} overlaps the build output {}",
                s.output_dir().display(),
                s.build_dir().display()
            ));
        }
        Ok(())
    }

    async fn run_stages(&self) -> Result<BuildRecord> {
        let s = &self.settings;
        let out = s.output_dir();

        if s.skip_build() {
            log::info!("skipping flutter build, using {}", s.build_dir().display());
        } else {
            self.stage(Stage::Build, self.build()).await?;
        }

        self.stage(Stage::StageDirectory, fs::create_dir_all(out, true))
            .await?;

        self.stage(Stage::CopyAssets, async {
            let copied = fs::copy_dir(s.build_dir(), out).await?;
            log::debug!("copied {} file(s) from {}", copied, s.build_dir().display());
            Ok(())
        })
        .await?;

        self.stage(Stage::WriteManifest, async {
            let manifest = manifest::synthesize(s);
            let requested = shims::requested_resources(s.topology(), s.compile_target());
            let uncovered = manifest.uncovered(&requested)?;
            if !uncovered.is_empty() {
                log::warn!("resources not web accessible: {}", uncovered.join(", "));
            }
            manifest.write(out).await
        })
        .await?;

        let (bootstrap, backup) = self
            .stage(Stage::PatchBootstrap, self.patch_bootstrap())
            .await?;

        let generator = ShimGenerator::new(s);
        self.stage(Stage::WriteShims, async {
            let written = generator.write_all(out).await?;
            log::debug!("wrote {} shim(s)", written.len());
            Ok(())
        })
        .await?;

        let record = self
            .stage(Stage::WriteBuildRecord, self.write_record(&bootstrap, &backup))
            .await?;

        if let Some(archive_path) = s.archive() {
            self.stage(Stage::Package, archive::zip_dir(out, archive_path))
                .await?;
        }

        log::info!("extension ready in {}", out.display());
        Ok(record)
    }

    /// Runs one stage, attributing any failure to it.
    async fn stage<T>(&self, stage: Stage, work: impl Future<Output = Result<T>>) -> Result<T> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                what: "packaging run".into(),
            }
            .in_stage(stage));
        }
        log::info!("[{}] started", stage);
        let value = work.await.map_err(|e| e.in_stage(stage))?;
        log::debug!("[{}] done", stage);
        Ok(value)
    }

    async fn build(&self) -> Result<()> {
        let s = &self.settings;
        let flutter = FLUTTER
            .as_deref()
            .ok_or_else(|| Error::Precondition {
                reason: "flutter is not installed or not in PATH".into(),
            })?;

        let mut command = Command::new(flutter);
        command
            .args(["build", "web"])
            .args(s.compile_target().build_args())
            .current_dir(s.project_dir());

        let output = run_supervised(command, s.build_timeout(), &self.cancel).await?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("flutter: {}", line);
        }
        Ok(())
    }

    async fn patch_bootstrap(&self) -> Result<(PathBuf, PathBuf)> {
        let path = self.settings.output_dir().join(BOOTSTRAP_FILE);
        let present = tokio::fs::try_exists(&path)
            .await
            .fs_context("failed to check for bootstrap", &path)?;
        if !present {
            return Err(Error::BootstrapMissing { path });
        }
        let backup = patcher::patch_bootstrap_file(&path, &self.settings).await?;
        Ok((path, backup))
    }

    async fn write_record(&self, bootstrap: &Path, backup: &Path) -> Result<BuildRecord> {
        let s = &self.settings;
        let record = BuildRecord {
            generated_at: Utc::now(),
            flutter_version: tool_detection::flutter_version().await,
            name: s.name().into(),
            version: s.version_string().into(),
            topology: s.topology(),
            compile_target: s.compile_target(),
            output_dir: s.output_dir().to_path_buf(),
            bootstrap_sha256: calculate_sha256(bootstrap).await?,
            backup_sha256: calculate_sha256(backup).await?,
            package_sha256: calculate_sha256(s.output_dir()).await?,
            rebuild_command: record::rebuild_command(s),
        };
        record.write(s.output_dir()).await?;
        Ok(record)
    }
}
