//! Git operation effect types.
//!
//! These types describe work on the bot's local working copies as data. The
//! interpreter in `crate::git` runs them with the `git` binary; each effect is
//! scoped to one repository's working copy.

use serde::{Deserialize, Serialize};

use crate::types::{PrNumber, RepoId, Sha};

/// Name and email recorded on a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// Everything needed to squash a PR onto its base branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquashRequest {
    pub repo: RepoId,
    pub pr: PrNumber,
    /// Branch the squash commit is pushed to.
    pub target_branch: String,
    /// Identity of the human who asked for the merge.
    pub committer: CommitIdentity,
    /// Replacement commit message. The first commit's message is used when absent.
    pub message: Option<String>,
    /// Link recorded in the `GitHub-Pull-Request:` trailer.
    pub pull_request_url: String,
    /// Approving logins recorded in the `LGTM:` trailer, in approval order.
    pub approvals: Vec<String>,
}

/// A git operation effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitEffect {
    /// Squash-merge a PR and push the result.
    SquashMerge(SquashRequest),

    /// Mirror the PR head to a `pr-<n>` branch on origin.
    PublishPrBranch { repo: RepoId, pr: PrNumber },

    /// Delete the `pr-<n>` branch from origin.
    DeletePrBranch { repo: RepoId, pr: PrNumber },
}

impl GitEffect {
    /// The repository whose working copy this effect touches.
    pub fn repo(&self) -> &RepoId {
        match self {
            GitEffect::SquashMerge(request) => &request.repo,
            GitEffect::PublishPrBranch { repo, .. } | GitEffect::DeletePrBranch { repo, .. } => {
                repo
            }
        }
    }
}

/// Response from a git effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitResponse {
    /// Operation completed successfully with no specific return value.
    Ok,
    /// The squash commit was pushed.
    Merged { sha: Sha },
}
