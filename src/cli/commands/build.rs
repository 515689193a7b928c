//! `build`: package one Flutter project.

use tokio_util::sync::CancellationToken;

use crate::{
    bundler::{PackageSettings, Pipeline, SettingsBuilder},
    cli::{RuntimeConfig, args::{BuildArgs, seconds}},
    error::Result,
};

pub async fn execute(
    args: &BuildArgs,
    runtime_config: &RuntimeConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let mut builder = SettingsBuilder::new()
        .output_dir(&args.output)
        .package_settings(PackageSettings {
            name: args.name.clone(),
            version: args.extension_version.clone(),
            description: args.description.clone(),
        })
        .project_dir(&args.project_dir)
        .compile_target(args.target)
        .topology(args.mode)
        .debug_logging(!args.no_debug)
        .skip_build(args.no_build)
        .build_timeout(seconds(args.timeout))
        .deadline(seconds(args.deadline))
        .archive(args.zip.as_ref());
    if let Some(build_dir) = &args.build_dir {
        builder = builder.build_dir(build_dir);
    }
    let settings = builder.build()?;

    runtime_config.section("Flutter to Chrome extension")?;
    runtime_config.verbose_println(&format!("Extension name: {}", settings.name()))?;
    runtime_config.verbose_println(&format!("Extension version: {}", settings.version_string()))?;
    runtime_config.verbose_println(&format!("Output directory: {}", settings.output_dir().display()))?;
    runtime_config.verbose_println(&format!("Build type: {}", settings.compile_target()))?;
    runtime_config.verbose_println(&format!("Extension mode: {}", settings.topology()))?;
    if args.no_build {
        runtime_config.progress("Skipping Flutter build (--no-build)")?;
    } else {
        runtime_config.progress(&format!(
            "Running flutter build web {}",
            settings.compile_target().build_args().join(" ")
        ))?;
    }

    let pipeline = Pipeline::new(settings).with_cancellation(cancel);
    let record = pipeline.run().await?;

    runtime_config.success("Chrome extension build completed")?;
    runtime_config.indent(&format!("Files: {}", record.output_dir.display()))?;
    runtime_config.indent(&format!("Flutter: {}", record.flutter_version))?;
    runtime_config.indent(&format!("Bootstrap sha256: {}", record.bootstrap_sha256))?;
    if let Some(archive) = pipeline.settings().archive() {
        runtime_config.indent(&format!("Archive: {}", archive.display()))?;
    }

    runtime_config.section("Next steps")?;
    runtime_config.indent("1. Open chrome://extensions/ and enable Developer mode")?;
    runtime_config.indent(&format!(
        "2. Click \"Load unpacked\" and select {}",
        record.output_dir.display()
    ))?;
    match record.topology {
        crate::bundler::Topology::Popup => {
            runtime_config.indent("3. Click the extension icon to open the app")?;
        }
        crate::bundler::Topology::Overlay => {
            runtime_config.indent("3. Visit any page; Ctrl+Shift+F toggles the overlay")?;
        }
    }
    Ok(())
}
