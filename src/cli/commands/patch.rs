//! `diff` and `apply`: stored patches for vendor files.

use crate::{
    bundler::{
        FuzzOptions, PatchDocument,
        error::ErrorExt,
        patch::{apply_with, diff},
    },
    cli::{
        RuntimeConfig,
        args::{ApplyArgs, DiffArgs},
    },
    error::{CliError, Result},
};

pub async fn execute_diff(args: &DiffArgs, runtime_config: &RuntimeConfig) -> Result<()> {
    let original = read(&args.original).await?;
    let modified = read(&args.modified).await?;

    let document = diff(&original, &modified);
    if document.is_empty() {
        runtime_config.warn("Files are identical; writing an empty patch")?;
    }
    tokio::fs::write(&args.output, document.to_string())
        .await
        .fs_context("failed to write patch", &args.output)?;

    runtime_config.success(&format!(
        "Wrote {} hunk(s) to {}",
        document.hunks().len(),
        args.output.display()
    ))?;
    Ok(())
}

pub async fn execute_apply(args: &ApplyArgs, runtime_config: &RuntimeConfig) -> Result<()> {
    let patch_text = read(&args.patch).await?;
    let document: PatchDocument = patch_text.parse().map_err(|e| CliError::InvalidArguments {
        reason: format!("{}: {e}", args.patch.display()),
    })?;
    let original = read(&args.original).await?;

    let defaults = FuzzOptions::default();
    let options = FuzzOptions {
        search_window: args.window.unwrap_or(defaults.search_window),
        max_fuzz: args.fuzz.unwrap_or(defaults.max_fuzz),
    };
    let patched = apply_with(&document, &original, options)
        .map_err(crate::bundler::Error::from)?;

    tokio::fs::write(&args.output, patched)
        .await
        .fs_context("failed to write patched file", &args.output)?;
    runtime_config.success(&format!(
        "Applied {} hunk(s) to {}",
        document.hunks().len(),
        args.output.display()
    ))?;
    Ok(())
}

async fn read(path: &std::path::Path) -> Result<String> {
    Ok(tokio::fs::read_to_string(path)
        .await
        .fs_context("failed to read", path)?)
}
