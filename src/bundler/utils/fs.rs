//! File system utilities for packaging.
//!
//! Provides idempotent directory creation and tree copies that run their
//! blocking walk on the blocking pool.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("failed to create directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::Fs("failed to remove directory", path.to_path_buf(), e)),
    }
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist. An existing
/// destination is replaced.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("failed to create directory", dest_dir)?;
    }
    fs::copy(from, to)
        .await
        .fs_context("failed to copy file", to)?;
    Ok(())
}

/// Recursively copies a directory into `to`, merging with whatever is there.
///
/// Preserves symlinks on platforms that support them.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    copy_dir_filtered(from, to, &[]).await
}

/// [`copy_dir`] skipping files whose name matches any of `skip`.
///
/// Patterns are globs over the file name only, e.g. `*.map`. Returns the
/// number of files copied.
pub async fn copy_dir_filtered(from: &Path, to: &Path, skip: &[&str]) -> Result<usize> {
    // Validate in async context (cheap, doesn't need spawn_blocking)
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a directory")));
    }
    let skip = skip
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // Clone paths for move into blocking closure
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || copy_tree(&from, &to, &skip)).await?
}

fn copy_tree(from: &Path, to: &Path, skip: &[glob::Pattern]) -> Result<usize> {
    std::fs::create_dir_all(to).fs_context("failed to create directory", to)?;

    let mut copied = 0;
    for entry in walkdir::WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        let name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_dir() && skip.iter().any(|p| p.matches(&name)) {
            log::debug!("skipping {}", entry.path().display());
            continue;
        }

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path())
                .fs_context("failed to read symlink", entry.path())?;
            let link = if entry.path().is_dir() {
                symlink_dir(&target, &dest_path)
            } else {
                symlink_file(&target, &dest_path)
            };
            link.fs_context("failed to create symlink", &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path)
                .fs_context("failed to create directory", &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path)
                .fs_context("failed to copy file", &dest_path)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Files directly inside `dir` whose name matches `pattern`, sorted.
pub async fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = glob::Pattern::new(pattern)?;
    let mut entries = fs::read_dir(dir)
        .await
        .fs_context("failed to read directory", dir)?;

    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("failed to read directory", dir)?
    {
        let is_file = entry
            .file_type()
            .await
            .fs_context("failed to stat", entry.path())?
            .is_file();
        if is_file && pattern.matches(&entry.file_name().to_string_lossy()) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filtered_copy_skips_matching_names() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("assets/fonts")).unwrap();
        std::fs::write(src.path().join("main.dart.js"), "main").unwrap();
        std::fs::write(src.path().join("main.dart.js.map"), "map").unwrap();
        std::fs::write(src.path().join(".last_build_id"), "id").unwrap();
        std::fs::write(src.path().join("assets/fonts/a.ttf"), "font").unwrap();

        let copied = copy_dir_filtered(src.path(), dst.path(), &["*.map", ".last_build_id"])
            .await
            .unwrap();

        assert_eq!(copied, 2);
        assert!(dst.path().join("main.dart.js").is_file());
        assert!(dst.path().join("assets/fonts/a.ttf").is_file());
        assert!(!dst.path().join("main.dart.js.map").exists());
        assert!(!dst.path().join(".last_build_id").exists());
    }

    #[tokio::test]
    async fn erase_resets_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale.txt"), "old").unwrap();

        create_dir_all(&out, true).await.unwrap();

        assert!(out.is_dir());
        assert!(!out.join("stale.txt").exists());
        create_dir_all(&dir.path().join("missing"), true).await.unwrap();
    }

    #[tokio::test]
    async fn matching_files_is_sorted_and_shallow() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        for name in ["main.dart.js_2.part.js", "main.dart.js_1.part.js", "flutter.js"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::write(dir.path().join("nested/x.part.js"), "").unwrap();

        let found = matching_files(dir.path(), "*.part.js").await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["main.dart.js_1.part.js", "main.dart.js_2.part.js"]);
    }
}
