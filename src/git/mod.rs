//! Local git working copies.
//!
//! Each repository gets one working copy at `<workdir>/<owner>/<repo>`,
//! cloned on first use. [`LocalGit`] runs [`GitEffect`]s against those
//! copies, one effect at a time per repository.

mod squash;
mod transcript;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use crate::effects::{GitEffect, GitInterpreter, GitResponse};
use crate::types::RepoId;

pub use squash::{NOTHING_TO_MERGE, compose_commit_message};

/// Where working copies are cloned from unless configured otherwise.
pub const DEFAULT_REMOTE_BASE: &str = "git@github.com:";

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A git command failed. The transcript is everything run so far,
    /// ending with the failing command's output.
    #[error("{transcript}")]
    Script { transcript: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Create a git Command with clean environment (no system/user config).
///
/// Hooks, aliases and the like from the host's configuration never leak into
/// the bot's commands.
pub(crate) fn git_command(workdir: &Path) -> std::process::Command {
    let mut cmd = std::process::Command::new("git");
    cmd.current_dir(workdir);
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

/// Runs git effects against working copies under a base directory.
#[derive(Debug)]
pub struct LocalGit {
    workdir: PathBuf,
    remote_base: String,
    locks: Mutex<HashMap<RepoId, Arc<tokio::sync::Mutex<()>>>>,
}

impl LocalGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Clone from `<remote_base><owner>/<repo>.git` instead of GitHub.
    pub fn with_remote_base(mut self, remote_base: impl Into<String>) -> Self {
        self.remote_base = remote_base.into();
        self
    }

    /// The working copy for `repo`.
    pub fn repo_dir(&self, repo: &RepoId) -> PathBuf {
        self.workdir.join(&repo.owner).join(&repo.repo)
    }

    fn remote_url(&self, repo: &RepoId) -> String {
        format!("{}{}/{}.git", self.remote_base, repo.owner, repo.repo)
    }

    fn repo_lock(&self, repo: &RepoId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(repo.clone()).or_default())
    }
}

impl GitInterpreter for LocalGit {
    type Error = GitError;

    async fn interpret(&self, effect: GitEffect) -> Result<GitResponse, Self::Error> {
        let repo = effect.repo().clone();
        let lock = self.repo_lock(&repo);
        let _guard = lock.lock().await;

        let repo_dir = self.repo_dir(&repo);
        let url = self.remote_url(&repo);
        debug!(repo = %repo, ?effect, "running git effect");

        tokio::task::spawn_blocking(move || run_effect(&repo_dir, &url, effect)).await?
    }
}

fn run_effect(repo_dir: &Path, url: &str, effect: GitEffect) -> Result<GitResponse, GitError> {
    ensure_clone(repo_dir, url)?;
    match effect {
        GitEffect::SquashMerge(request) => {
            let sha = squash::squash_merge(repo_dir, &request)?;
            info!(repo = %request.repo, pr = %request.pr, sha = %sha, "pushed squash commit");
            Ok(GitResponse::Merged { sha })
        }
        GitEffect::PublishPrBranch { pr, .. } => {
            squash::publish_pr_branch(repo_dir, pr)?;
            Ok(GitResponse::Ok)
        }
        GitEffect::DeletePrBranch { pr, .. } => {
            squash::delete_pr_branch(repo_dir, pr)?;
            Ok(GitResponse::Ok)
        }
    }
}

fn ensure_clone(repo_dir: &Path, url: &str) -> Result<(), GitError> {
    if repo_dir.join(".git").is_dir() {
        return Ok(());
    }
    let (Some(parent), Some(name)) = (repo_dir.parent(), repo_dir.file_name()) else {
        return Err(GitError::Io(std::io::Error::other(format!(
            "invalid working copy path {}",
            repo_dir.display()
        ))));
    };
    info!(url = %url, path = %repo_dir.display(), "cloning working copy");
    squash::clone_repo(parent, url, &name.to_string_lossy())
}
