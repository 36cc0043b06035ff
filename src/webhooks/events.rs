//! GitHub webhook event types.
//!
//! Only the fields the bot acts on are kept:
//!
//! - `issue_comment`: commands addressed to the bot
//! - `pull_request`: commit status and `pr-<n>` branch upkeep

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PrNumber, RepoId, Sha};

/// A parsed GitHub webhook event.
///
/// Event types the bot doesn't handle never get this far: the parser returns
/// `None` for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    /// A comment on an issue or on a PR's conversation tab.
    IssueComment(IssueCommentEvent),

    PullRequest(PullRequestEvent),
}

impl GitHubEvent {
    /// Returns the repository this event belongs to.
    pub fn repo_id(&self) -> &RepoId {
        match self {
            GitHubEvent::IssueComment(e) => &e.repo,
            GitHubEvent::PullRequest(e) => &e.repo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
}

/// An issue/PR comment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub repo: RepoId,

    pub action: CommentAction,

    /// Set only when the comment is on a pull request.
    pub pr_number: Option<PrNumber>,

    pub comment_id: CommentId,

    /// Empty for `deleted` actions.
    pub body: String,

    /// Login of the comment's author, who is the one issuing any command.
    pub sender_login: String,
}

/// Pull request actions the bot reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    Opened,
    Reopened,
    /// New commits were pushed to the head branch.
    Synchronize,
    /// Closed, merged or not.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub repo: RepoId,
    pub action: PrAction,
    pub pr_number: PrNumber,
    pub head_sha: Sha,
}
