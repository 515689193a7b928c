//! Zip packaging of a finished extension directory.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::bundler::error::{ErrorExt, Result};

/// Writes every file under `dir` into a zip at `archive`.
///
/// Entry names are relative to `dir` with `/` separators, so the archive can
/// be uploaded to an extension store as-is. Returns the number of files.
pub async fn zip_dir(dir: &Path, archive: &Path) -> Result<usize> {
    let dir = dir.to_path_buf();
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || write_zip(&dir, &archive)).await?
}

fn write_zip(dir: &Path, archive: &Path) -> Result<usize> {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent).fs_context("failed to create directory", parent)?;
    }
    let file = File::create(archive).fs_context("failed to create archive", archive)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        // The archive may live inside the directory being zipped.
        .filter(|p| p != archive)
        .collect();
    entries.sort();

    for path in &entries {
        let name = path
            .strip_prefix(dir)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(name, options)?;
        let mut source = File::open(path).fs_context("failed to open file", path)?;
        io::copy(&mut source, &mut zip).fs_context("failed to compress file", path)?;
    }

    zip.finish()?;
    log::info!("archived {} file(s) into {}", entries.len(), archive.display());
    Ok(entries.len())
}
