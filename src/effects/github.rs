//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The octocrab-backed interpreter in `crate::github` executes them; tests use
//! recording mocks.

use serde::{Deserialize, Serialize};

use crate::status::{StatusReport, StatusState};
use crate::types::{CommentId, PrNumber, RepoId, Sha};

/// A GitHub API effect.
///
/// The bot serves every repository that sends it webhooks, so each variant
/// names the repository it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Queries ──────────────────────────────────────────────────────────────
    /// Fetch a single PR by number.
    GetPr { repo: RepoId, pr: PrNumber },

    /// List commit statuses for a SHA, newest first.
    ListStatuses { repo: RepoId, sha: Sha },

    /// Get the status contexts the base branch's protection requires.
    GetRequiredContexts { repo: RepoId, branch: String },

    /// List every collaborator login on the repository.
    ListCollaborators { repo: RepoId },

    /// Get a user's public profile.
    GetUser { login: String },

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Post a new comment on a PR.
    PostComment {
        repo: RepoId,
        pr: PrNumber,
        body: String,
    },

    /// Close the PR's conversation thread.
    CloseIssue { repo: RepoId, pr: PrNumber },

    /// Post a commit status.
    SetStatus {
        repo: RepoId,
        sha: Sha,
        state: StatusState,
        context: String,
        description: String,
    },
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// PR data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrData {
    /// The PR number.
    pub number: PrNumber,
    /// The current head SHA.
    pub head_sha: Sha,
    /// The base branch name.
    pub base_ref: String,
    /// Link to the PR on github.com.
    pub html_url: String,
    /// Login of the PR author.
    pub author_login: String,
}

/// A user's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPr`.
    Pr(PrData),

    /// Response to `ListStatuses`, newest first.
    Statuses(Vec<StatusReport>),

    /// Response to `GetRequiredContexts`.
    ///
    /// Empty when the branch is unprotected or its protection can't be read.
    RequiredContexts(Vec<String>),

    /// Response to `ListCollaborators`.
    Collaborators(Vec<String>),

    /// Response to `GetUser`.
    User(UserProfile),

    /// Response to `PostComment`.
    CommentPosted {
        /// The ID of the newly created comment.
        id: CommentId,
    },

    /// Response to `CloseIssue`.
    IssueClosed,

    /// Response to `SetStatus`.
    StatusSet,
}
