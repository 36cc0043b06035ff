//! GitHub webhook payload parser.
//!
//! The event type comes from the `X-GitHub-Event` header. Event types and
//! pull request actions the bot doesn't handle parse to `Ok(None)`; malformed
//! payloads are errors.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{CommentId, PrNumber, RepoId, Sha};

use super::events::{
    CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent,
};

#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// ```
/// use merge_gate::webhooks::{GitHubEvent, parse_webhook};
///
/// let payload = br#"{
///     "action": "created",
///     "comment": {
///         "id": 123,
///         "body": "@merge-gate merge",
///         "user": { "login": "octocat" }
///     },
///     "issue": {
///         "number": 42,
///         "pull_request": { "url": "..." }
///     },
///     "repository": { "full_name": "owner/repo" }
/// }"#;
///
/// let event = parse_webhook("issue_comment", payload).unwrap();
/// assert!(matches!(event, Some(GitHubEvent::IssueComment(_))));
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "issue_comment" => parse_issue_comment(payload).map(|e| Some(GitHubEvent::IssueComment(e))),
        "pull_request" => parse_pull_request(payload).map(|opt| opt.map(GitHubEvent::PullRequest)),
        _ => Ok(None),
    }
}

// ─── Raw payloads ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: String,
}

impl RawRepository {
    fn repo_id(&self) -> Result<RepoId, ParseError> {
        RepoId::parse(&self.full_name).ok_or_else(|| ParseError::InvalidField {
            field: "repository.full_name",
            value: self.full_name.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

// ─── issue_comment ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    comment: RawComment,
    issue: RawIssue,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    body: Option<String>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    // Present only when the issue is a pull request
    pull_request: Option<serde_json::Value>,
}

fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "created" => CommentAction::Created,
        "edited" => CommentAction::Edited,
        "deleted" => CommentAction::Deleted,
        other => {
            return Err(ParseError::InvalidField {
                field: "action",
                value: other.to_string(),
            });
        }
    };

    Ok(IssueCommentEvent {
        repo: raw.repository.repo_id()?,
        action,
        pr_number: raw.issue.pull_request.map(|_| PrNumber(raw.issue.number)),
        comment_id: CommentId(raw.comment.id),
        body: raw.comment.body.unwrap_or_default(),
        sender_login: raw.comment.user.login,
    })
}

// ─── pull_request ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    head: RawHead,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: String,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "reopened" => PrAction::Reopened,
        "synchronize" => PrAction::Synchronize,
        "closed" => PrAction::Closed,
        _ => return Ok(None),
    };

    Ok(Some(PullRequestEvent {
        repo: raw.repository.repo_id()?,
        action,
        pr_number: PrNumber(raw.pull_request.number),
        head_sha: Sha::new(raw.pull_request.head.sha),
    }))
}
