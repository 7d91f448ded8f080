//! Repository fetch: materialize a remote Git repository on local disk.
//!
//! The clone is shallow and lands under a caller-owned directory (normally a
//! [`tempfile::TempDir`] that is removed when the request ends). Failures are
//! classified so callers can tell a missing `git` binary apart from a
//! private or nonexistent repository.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Git is not installed or not on PATH.")]
    GitUnavailable,

    #[error("Repository not found or private: {0}")]
    RepositoryNotFound(String),

    #[error("Failed to clone repo: {0}")]
    CloneFailed(String),
}

/// Clone `url` into `<target_dir>/repo` and return that path.
///
/// Workflow:
/// 1. Probe `git --version` so a missing binary is reported distinctly.
/// 2. `git clone --depth <depth> <url> <target_dir>/repo`.
/// 3. Classify a failed clone from its stderr.
pub fn clone_repository(url: &str, target_dir: &Path, depth: u32) -> Result<PathBuf, FetchError> {
    ensure_git_available()?;

    let repo_path = target_dir.join("repo");
    info!(url, dest = %repo_path.display(), "cloning repository");

    let output = Command::new("git")
        .args(["clone", "--depth", &depth.to_string()])
        .arg(url)
        .arg(&repo_path)
        .stdin(Stdio::null())
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::GitUnavailable,
            _ => FetchError::CloneFailed(e.to_string()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_clone_failure(url, stderr.trim()));
    }

    debug!(dest = %repo_path.display(), "clone complete");
    Ok(repo_path)
}

fn ensure_git_available() -> Result<(), FetchError> {
    let status = Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| FetchError::GitUnavailable)?;

    if !status.success() {
        return Err(FetchError::GitUnavailable);
    }
    Ok(())
}

fn classify_clone_failure(url: &str, stderr: &str) -> FetchError {
    if stderr.contains("Repository not found") {
        return FetchError::RepositoryNotFound(url.to_string());
    }
    if stderr.is_empty() {
        FetchError::CloneFailed("unknown error".to_string())
    } else {
        FetchError::CloneFailed(stderr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_classified() {
        let err = classify_clone_failure(
            "https://github.com/acme/ghost",
            "remote: Repository not found.\nfatal: repository 'https://github.com/acme/ghost/' not found",
        );
        match err {
            FetchError::RepositoryNotFound(url) => assert_eq!(url, "https://github.com/acme/ghost"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn empty_stderr_is_unknown_error() {
        let err = classify_clone_failure("https://example.com/x.git", "");
        assert_eq!(err.to_string(), "Failed to clone repo: unknown error");
    }

    #[test]
    fn other_stderr_is_passed_through() {
        let err = classify_clone_failure(
            "https://example.com/x.git",
            "fatal: unable to access 'https://example.com/x.git/': Could not resolve host",
        );
        assert!(matches!(err, FetchError::CloneFailed(ref m) if m.contains("Could not resolve host")));
    }
}
