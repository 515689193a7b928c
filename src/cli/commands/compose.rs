//! `compose`: build several projects into one multi-app package.

use tokio_util::sync::CancellationToken;

use crate::{
    bundler::{Coordinator, CoordinatorOptions, ProjectDescriptor},
    cli::{RuntimeConfig, args::{ComposeArgs, seconds}},
    error::Result,
};

pub async fn execute(
    args: &ComposeArgs,
    runtime_config: &RuntimeConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let descriptor = ProjectDescriptor::load(&args.config).await?;
    runtime_config.progress(&format!(
        "Composing {} project(s) from {}",
        descriptor.projects.len(),
        args.config.display()
    ))?;

    let mut options = CoordinatorOptions::new(&args.package);
    options.workspace = args.workspace.clone();
    options.skip_build = args.no_build;
    options.build_timeout = seconds(args.timeout);
    if let Some(jobs) = args.jobs {
        options.jobs = jobs;
    }

    let coordinator = Coordinator::new(descriptor, options).with_cancellation(cancel);
    runtime_config.verbose_println(&format!(
        "Workspace: {}",
        coordinator.workspace().display()
    ))?;

    let report = coordinator.run().await?;

    for id in &report.built {
        runtime_config.verbose_println(&format!("Built {id}"))?;
    }
    runtime_config.success(&format!(
        "Composed {} app copies into {}",
        report.copied.len(),
        args.package.display()
    ))?;
    for app in &report.copied {
        runtime_config.indent(&format!("{} -> {}", app.project, app.dir.display()))?;
    }
    Ok(())
}
