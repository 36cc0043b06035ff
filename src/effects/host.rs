//! Typed calls over a [`GitHubInterpreter`].
//!
//! Each method issues one effect and unpacks the matching response variant,
//! so callers never match on `GitHubResponse` themselves.

use std::fmt::Display;

use thiserror::Error;

use super::github::{GitHubEffect, GitHubResponse, PrData, UserProfile};
use super::interpreter::GitHubInterpreter;
use crate::status::{StatusReport, StatusState};
use crate::types::{CommentId, PrNumber, RepoId, Sha};

/// A failed or malformed host API call.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("GitHub API call failed: {0}")]
    Api(String),

    #[error("unexpected response to {effect}: {response:?}")]
    Unexpected {
        effect: &'static str,
        response: Box<GitHubResponse>,
    },
}

/// Borrowed view of a GitHub interpreter with one typed method per effect.
pub struct Host<'a, G> {
    github: &'a G,
}

impl<'a, G> Host<'a, G>
where
    G: GitHubInterpreter + Sync,
    G::Error: Display,
{
    pub fn new(github: &'a G) -> Self {
        Self { github }
    }

    async fn call(&self, effect: GitHubEffect) -> Result<GitHubResponse, HostError> {
        self.github
            .interpret(effect)
            .await
            .map_err(|e| HostError::Api(e.to_string()))
    }

    pub async fn pull_request(&self, repo: &RepoId, pr: PrNumber) -> Result<PrData, HostError> {
        let effect = GitHubEffect::GetPr {
            repo: repo.clone(),
            pr,
        };
        match self.call(effect).await? {
            GitHubResponse::Pr(data) => Ok(data),
            other => Err(unexpected("GetPr", other)),
        }
    }

    pub async fn statuses(&self, repo: &RepoId, sha: &Sha) -> Result<Vec<StatusReport>, HostError> {
        let effect = GitHubEffect::ListStatuses {
            repo: repo.clone(),
            sha: sha.clone(),
        };
        match self.call(effect).await? {
            GitHubResponse::Statuses(reports) => Ok(reports),
            other => Err(unexpected("ListStatuses", other)),
        }
    }

    pub async fn required_contexts(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> Result<Vec<String>, HostError> {
        let effect = GitHubEffect::GetRequiredContexts {
            repo: repo.clone(),
            branch: branch.to_string(),
        };
        match self.call(effect).await? {
            GitHubResponse::RequiredContexts(contexts) => Ok(contexts),
            other => Err(unexpected("GetRequiredContexts", other)),
        }
    }

    pub async fn collaborators(&self, repo: &RepoId) -> Result<Vec<String>, HostError> {
        let effect = GitHubEffect::ListCollaborators { repo: repo.clone() };
        match self.call(effect).await? {
            GitHubResponse::Collaborators(logins) => Ok(logins),
            other => Err(unexpected("ListCollaborators", other)),
        }
    }

    pub async fn user(&self, login: &str) -> Result<UserProfile, HostError> {
        let effect = GitHubEffect::GetUser {
            login: login.to_string(),
        };
        match self.call(effect).await? {
            GitHubResponse::User(profile) => Ok(profile),
            other => Err(unexpected("GetUser", other)),
        }
    }

    pub async fn comment(
        &self,
        repo: &RepoId,
        pr: PrNumber,
        body: impl Into<String>,
    ) -> Result<CommentId, HostError> {
        let effect = GitHubEffect::PostComment {
            repo: repo.clone(),
            pr,
            body: body.into(),
        };
        match self.call(effect).await? {
            GitHubResponse::CommentPosted { id } => Ok(id),
            other => Err(unexpected("PostComment", other)),
        }
    }

    pub async fn close_issue(&self, repo: &RepoId, pr: PrNumber) -> Result<(), HostError> {
        let effect = GitHubEffect::CloseIssue {
            repo: repo.clone(),
            pr,
        };
        match self.call(effect).await? {
            GitHubResponse::IssueClosed => Ok(()),
            other => Err(unexpected("CloseIssue", other)),
        }
    }

    pub async fn set_status(
        &self,
        repo: &RepoId,
        sha: &Sha,
        state: StatusState,
        context: &str,
        description: &str,
    ) -> Result<(), HostError> {
        let effect = GitHubEffect::SetStatus {
            repo: repo.clone(),
            sha: sha.clone(),
            state,
            context: context.to_string(),
            description: description.to_string(),
        };
        match self.call(effect).await? {
            GitHubResponse::StatusSet => Ok(()),
            other => Err(unexpected("SetStatus", other)),
        }
    }
}

fn unexpected(effect: &'static str, response: GitHubResponse) -> HostError {
    HostError::Unexpected {
        effect,
        response: Box::new(response),
    }
}
