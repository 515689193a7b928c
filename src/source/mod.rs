//! Source repository resolution

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::bundler::{
    Error, Result,
    builder::{process::run_supervised, tool_detection::GIT},
    error::ErrorExt,
    utils::fs,
};

/// Where a project's sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySource {
    /// Checkout already on disk.
    Local(PathBuf),
    /// Remote repository cloned into a workspace.
    Git {
        url: String,
        /// Project root inside the repository.
        subdir: Option<PathBuf>,
    },
}

impl RepositorySource {
    /// Checkout directory for this source under `workspace`.
    ///
    /// Local sources are returned unchanged.
    pub fn checkout_dir(&self, workspace: &Path) -> Result<PathBuf> {
        match self {
            Self::Local(path) => Ok(path.clone()),
            Self::Git { url, .. } => Ok(workspace.join(repo_basename(url)?)),
        }
    }

    /// Makes the sources available and returns the project root.
    ///
    /// Git sources are cloned shallowly into `<workspace>/<repo name>` unless
    /// that directory already exists, in which case it is reused as-is. A
    /// clone only lands there once it completed.
    pub async fn resolve_into(
        &self,
        workspace: &Path,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        match self {
            Self::Local(path) => {
                if !path.exists() {
                    return Err(Error::Precondition {
                        reason: format!("Path does not exist: {}", path.display()),
                    });
                }
                Ok(path.clone())
            }
            Self::Git { url, subdir } => {
                let checkout = self.checkout_dir(workspace)?;
                if checkout.exists() {
                    log::debug!("reusing checkout {}", checkout.display());
                } else {
                    clone_repo(url, &checkout, timeout, cancel).await?;
                }
                Ok(match subdir {
                    Some(subdir) => checkout.join(subdir),
                    None => checkout,
                })
            }
        }
    }
}

/// Repository name from its URL, without a `.git` suffix.
pub fn repo_basename(url: &str) -> Result<String> {
    let path = match url::Url::parse(url) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        // scp-like `git@host:org/repo.git`
        _ => url.rsplit_once(':').map_or(url, |(_, path)| path).to_string(),
    };

    let name = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim_end_matches(".git");
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::GenericError(format!(
            "cannot derive a checkout name from `{url}`"
        )));
    }
    Ok(name.to_string())
}

async fn clone_repo(
    url: &str,
    dest: &Path,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<()> {
    let git = GIT.as_deref().ok_or_else(|| Error::Precondition {
        reason: format!("git is required to clone {url} but is not in PATH"),
    })?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent, false).await?;
    }
    let staging = staging_dir(dest);
    fs::remove_dir_all(&staging).await?;

    log::info!("cloning {} into {}", url, dest.display());
    let mut command = Command::new(git);
    command.args(["clone", "--depth=1", url]).arg(&staging);
    if let Err(e) = run_supervised(command, timeout, cancel).await {
        if let Err(cleanup) = fs::remove_dir_all(&staging).await {
            log::warn!("could not remove partial clone: {}", cleanup);
        }
        return Err(e);
    }

    tokio::fs::rename(&staging, dest)
        .await
        .fs_context("failed to move clone into place", dest)
}

/// `<parent>/.<name>.partial`, where a clone is written before it is complete.
fn staging_dir(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_default());
    name.push(".partial");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_git_suffix() {
        assert_eq!(repo_basename("https://github.com/acme/widgets.git").unwrap(), "widgets");
        assert_eq!(repo_basename("https://github.com/acme/widgets/").unwrap(), "widgets");
        assert_eq!(repo_basename("git@github.com:acme/tools.git").unwrap(), "tools");
        assert!(repo_basename("https://github.com/").is_err());
    }

    #[tokio::test]
    async fn existing_checkout_is_reused() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(workspace.path().join("widgets/app")).unwrap();
        let source = RepositorySource::Git {
            url: "https://example.invalid/acme/widgets.git".into(),
            subdir: Some("app".into()),
        };

        let root = source
            .resolve_into(workspace.path(), None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(root, workspace.path().join("widgets/app"));
    }

    #[test]
    fn staging_sits_next_to_checkout() {
        assert_eq!(
            staging_dir(Path::new("/work/.workspace/widgets")),
            PathBuf::from("/work/.workspace/.widgets.partial")
        );
    }

    #[tokio::test]
    async fn failed_clone_leaves_nothing_to_reuse() {
        let workspace = tempfile::tempdir().unwrap();
        let origin = workspace.path().join("missing-origin").join("widgets.git");
        let source = RepositorySource::Git {
            url: origin.to_string_lossy().into_owned(),
            subdir: None,
        };
        let checkout = workspace.path().join("widgets");

        for _ in 0..2 {
            let outcome = source
                .resolve_into(workspace.path(), None, &CancellationToken::new())
                .await;
            assert!(outcome.is_err());
            assert!(!checkout.exists());
            assert!(!staging_dir(&checkout).exists());
        }
    }

    #[tokio::test]
    async fn cancelled_clone_leaves_nothing_to_reuse() {
        let workspace = tempfile::tempdir().unwrap();
        let source = RepositorySource::Git {
            url: "https://example.invalid/acme/widgets.git".into(),
            subdir: None,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = source.resolve_into(workspace.path(), None, &cancel).await;
        assert!(outcome.is_err());
        assert!(!workspace.path().join("widgets").exists());
        assert!(!workspace.path().join(".widgets.partial").exists());
    }
}
