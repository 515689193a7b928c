//! External tool detection and availability checking.
//!
//! Lookups are cached so repeated runs in one process (the coordinator
//! building several projects) resolve `PATH` once.

use std::{path::PathBuf, sync::LazyLock};

use tokio::process::Command;

/// Location of the `flutter` executable, if it is on `PATH`.
pub static FLUTTER: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("flutter"));

/// Location of the `git` executable, if it is on `PATH`.
pub static GIT: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("git"));

/// Check if flutter is available for `flutter build web`.
pub static HAS_FLUTTER: LazyLock<bool> = LazyLock::new(|| FLUTTER.is_some());

/// Check if git is available for cloning remote projects.
pub static HAS_GIT: LazyLock<bool> = LazyLock::new(|| GIT.is_some());

fn locate(tool: &str) -> Option<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            None
        }
    }
}

/// Placeholder recorded when the framework version cannot be determined.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// First line of `flutter --version`, or [`UNKNOWN_VERSION`].
pub async fn flutter_version() -> String {
    let Some(flutter) = FLUTTER.as_ref() else {
        return UNKNOWN_VERSION.to_string();
    };

    match Command::new(flutter).arg("--version").kill_on_drop(true).output().await {
        Ok(output) if output.status.success() => first_line(&output.stdout),
        Ok(output) => {
            log::warn!(
                "flutter --version exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            UNKNOWN_VERSION.to_string()
        }
        Err(e) => {
            log::warn!("failed to run flutter --version: {}", e);
            UNKNOWN_VERSION.to_string()
        }
    }
}

fn first_line(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map_or_else(|| UNKNOWN_VERSION.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_first_non_empty_line() {
        let stdout = b"\nFlutter 3.24.0 \xe2\x80\xa2 channel stable\nFramework \xe2\x80\xa2 revision 80c2e84975\n";
        assert_eq!(first_line(stdout), "Flutter 3.24.0 • channel stable");
        assert_eq!(first_line(b""), UNKNOWN_VERSION);
    }
}
