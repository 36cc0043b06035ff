//! GitHub effect interpreter using octocrab.
//!
//! Typed octocrab builders are used where they exist. Statuses, branch
//! protection, collaborators, users and issue state go through raw REST
//! calls decoded into local structs.

use serde::{Deserialize, Serialize};

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, PrData, UserProfile};
use crate::status::{StatusReport, StatusState};
use crate::types::{CommentId, PrNumber, RepoId, Sha};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// Page size for status listings (the API maximum).
const STATUS_PAGE_SIZE: u32 = 100;

/// Page size for collaborator listings.
const COLLABORATOR_PAGE_SIZE: u32 = 50;

/// Upper bound on pages fetched by any paginated listing.
const MAX_PAGES: u32 = 20;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        let policy = retry_policy_for(&effect);
        interpret_github_effect(self, effect, RetryConfig::DEFAULT, policy).await
    }
}

/// Posting a comment is the only call that isn't safe to repeat.
fn retry_policy_for(effect: &GitHubEffect) -> RetryPolicy {
    match effect {
        GitHubEffect::PostComment { .. } => RetryPolicy::NoRetry,
        _ => RetryPolicy::RetryTransient,
    }
}

/// Interprets a GitHub effect against the GitHub API.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
    retry_config: RetryConfig,
    retry_policy: RetryPolicy,
) -> Result<GitHubResponse, GitHubApiError> {
    retry_with_backoff(retry_config, retry_policy, || {
        execute_effect(client, effect.clone())
    })
    .await
}

async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPr { repo, pr } => get_pr(client, &repo, pr).await,
        GitHubEffect::ListStatuses { repo, sha } => list_statuses(client, &repo, &sha).await,
        GitHubEffect::GetRequiredContexts { repo, branch } => {
            get_required_contexts(client, &repo, &branch).await
        }
        GitHubEffect::ListCollaborators { repo } => list_collaborators(client, &repo).await,
        GitHubEffect::GetUser { login } => get_user(client, &login).await,
        GitHubEffect::PostComment { repo, pr, body } => {
            post_comment(client, &repo, pr, body).await
        }
        GitHubEffect::CloseIssue { repo, pr } => close_issue(client, &repo, pr).await,
        GitHubEffect::SetStatus {
            repo,
            sha,
            state,
            context,
            description,
        } => set_status(client, &repo, &sha, state, context, description).await,
    }
}

#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u32,
    page: u32,
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

async fn get_pr(
    client: &OctocrabClient,
    repo: &RepoId,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let pull = client
        .inner()
        .pulls(&repo.owner, &repo.repo)
        .get(pr.0)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let author_login = pull
        .user
        .as_ref()
        .map(|user| user.login.clone())
        .unwrap_or_default();
    let html_url = pull
        .html_url
        .as_ref()
        .map(|url| url.to_string())
        .unwrap_or_else(|| format!("https://github.com/{}/pull/{}", repo, pr.0));

    Ok(GitHubResponse::Pr(PrData {
        number: pr,
        head_sha: Sha::new(pull.head.sha),
        base_ref: pull.base.ref_field,
        html_url,
        author_login,
    }))
}

// ─── Statuses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StatusResponse {
    context: String,
    state: String,
    creator: Option<Creator>,
}

#[derive(Debug, Deserialize)]
struct Creator {
    login: String,
}

/// Converts raw status entries, dropping states this bot doesn't know.
fn to_status_reports(raw: Vec<StatusResponse>) -> Vec<StatusReport> {
    raw.into_iter()
        .filter_map(|status| {
            let Some(state) = StatusState::from_api_str(&status.state) else {
                tracing::warn!(context = %status.context, state = %status.state, "ignoring unknown status state");
                return None;
            };
            let reporter = status.creator.map(|c| c.login).unwrap_or_default();
            Some(StatusReport::new(status.context, state, reporter))
        })
        .collect()
}

async fn list_statuses(
    client: &OctocrabClient,
    repo: &RepoId,
    sha: &Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/commits/{}/statuses",
        repo.owner,
        repo.repo,
        sha.as_str()
    );

    let mut all = Vec::new();
    for page in 1..=MAX_PAGES {
        let params = PageParams {
            per_page: STATUS_PAGE_SIZE,
            page,
        };
        let batch: Vec<StatusResponse> = client
            .inner()
            .get(&url, Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        let done = (batch.len() as u32) < STATUS_PAGE_SIZE;
        all.extend(batch);
        if done {
            break;
        }
    }

    Ok(GitHubResponse::Statuses(to_status_reports(all)))
}

// ─── Branch Protection ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RequiredStatusChecks {
    /// Legacy status check contexts.
    #[serde(default)]
    contexts: Vec<String>,
    /// Checks registered with an app id.
    #[serde(default)]
    checks: Vec<RequiredStatusCheck>,
}

#[derive(Debug, Deserialize)]
struct RequiredStatusCheck {
    context: String,
}

fn required_context_names(checks: RequiredStatusChecks) -> Vec<String> {
    let mut names = checks.contexts;
    for check in checks.checks {
        if !names.contains(&check.context) {
            names.push(check.context);
        }
    }
    names
}

async fn get_required_contexts(
    client: &OctocrabClient,
    repo: &RepoId,
    branch: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    // Branch names may contain '/'
    let url = format!(
        "/repos/{}/{}/branches/{}/protection/required_status_checks",
        repo.owner,
        repo.repo,
        urlencoding::encode(branch)
    );

    let result: Result<RequiredStatusChecks, _> = client.inner().get(&url, None::<&()>).await;
    match result {
        Ok(checks) => Ok(GitHubResponse::RequiredContexts(required_context_names(
            checks,
        ))),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found_or_forbidden() {
                tracing::debug!(
                    repo = %repo,
                    branch = %branch,
                    error = %err,
                    "no readable branch protection, treating as no required contexts"
                );
                Ok(GitHubResponse::RequiredContexts(Vec::new()))
            } else {
                Err(err)
            }
        }
    }
}

// ─── Collaborators & Users ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginOnly {
    login: String,
}

async fn list_collaborators(
    client: &OctocrabClient,
    repo: &RepoId,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/collaborators", repo.owner, repo.repo);

    let mut logins = Vec::new();
    for page in 1..=MAX_PAGES {
        let params = PageParams {
            per_page: COLLABORATOR_PAGE_SIZE,
            page,
        };
        let batch: Vec<LoginOnly> = client
            .inner()
            .get(&url, Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        let done = (batch.len() as u32) < COLLABORATOR_PAGE_SIZE;
        logins.extend(batch.into_iter().map(|c| c.login));
        if done {
            break;
        }
    }

    Ok(GitHubResponse::Collaborators(logins))
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    name: Option<String>,
    email: Option<String>,
}

async fn get_user(client: &OctocrabClient, login: &str) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/users/{}", urlencoding::encode(login));
    let user: UserResponse = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::User(UserProfile {
        login: user.login,
        name: user.name.filter(|n| !n.is_empty()),
        email: user.email.filter(|e| !e.is_empty()),
    }))
}

// ─── Comments & Issue State ───────────────────────────────────────────────────

async fn post_comment(
    client: &OctocrabClient,
    repo: &RepoId,
    pr: PrNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let comment = client
        .inner()
        .issues(&repo.owner, &repo.repo)
        .create_comment(pr.0, body)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentPosted {
        id: CommentId(comment.id.into_inner()),
    })
}

#[derive(Debug, Serialize)]
struct IssueStateRequest<'a> {
    state: &'a str,
}

async fn close_issue(
    client: &OctocrabClient,
    repo: &RepoId,
    pr: PrNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/issues/{}", repo.owner, repo.repo, pr.0);
    let _: serde_json::Value = client
        .inner()
        .patch(&url, Some(&IssueStateRequest { state: "closed" }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::IssueClosed)
}

// ─── Commit Statuses ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    state: &'a str,
    context: &'a str,
    description: &'a str,
}

async fn set_status(
    client: &OctocrabClient,
    repo: &RepoId,
    sha: &Sha,
    state: StatusState,
    context: String,
    description: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/statuses/{}", repo.owner, repo.repo, sha.as_str());
    let request = StatusRequest {
        state: state.as_api_str(),
        context: &context,
        description: &description,
    };
    let _: serde_json::Value = client
        .inner()
        .post(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::StatusSet)
}
