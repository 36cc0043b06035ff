//! Performing a merge once the build is green.

use std::fmt::Display;

use tracing::{debug, info, warn};

use super::{CommandRequest, Orchestrator, responses};
use crate::authors::lookup_author;
use crate::build::BuildTrigger;
use crate::commands::override_message;
use crate::effects::{
    CommitIdentity, GitEffect, GitHubInterpreter, GitInterpreter, GitResponse, PrData,
    SquashRequest,
};
use crate::types::Sha;

/// Result of one merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { sha: Sha },
    /// No commit identity could be found for the requester. Nothing was run.
    NoUserInfo,
    /// The squash failed; `output` is the diagnostic shown to the user.
    Failed { output: String },
}

impl<G, M, B> Orchestrator<G, M, B>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: Display,
    M: GitInterpreter + Send + Sync + 'static,
    M::Error: Display,
    B: BuildTrigger + Send + Sync + 'static,
{
    pub(super) async fn perform_merge(&self, request: &CommandRequest, pr: &PrData) -> MergeOutcome {
        info!(repo = %request.repo, pr = %request.pr, sender = %request.sender, "attempting merge");

        let Some(committer) = self.resolve_committer(&request.sender).await else {
            warn!(pr = %request.pr, sender = %request.sender, "no user info, not merging");
            self.post(&request.repo, request.pr, responses::no_user(&request.sender))
                .await;
            return MergeOutcome::NoUserInfo;
        };

        let approvals = self
            .inner
            .approvals
            .approvals(request.pr)
            .await
            .unwrap_or_else(|e| {
                warn!(pr = %request.pr, error = %e, "couldn't read approvals");
                Vec::new()
            });

        let squash = SquashRequest {
            repo: request.repo.clone(),
            pr: request.pr,
            target_branch: pr.base_ref.clone(),
            committer,
            message: override_message(&request.parsed.subject, &request.parsed.description),
            pull_request_url: pr.html_url.clone(),
            approvals,
        };
        let result = self
            .inner
            .git
            .interpret(GitEffect::SquashMerge(squash))
            .await
            .map_err(|e| e.to_string());

        match result {
            Ok(GitResponse::Merged { sha }) => {
                info!(pr = %request.pr, sha = %sha, "merge complete");
                self.post(
                    &request.repo,
                    request.pr,
                    responses::merged(&sha, &pr.author_login),
                )
                .await;
                if let Err(e) = self.host().close_issue(&request.repo, request.pr).await {
                    warn!(pr = %request.pr, error = %e, "failed to close pull request");
                }
                MergeOutcome::Merged { sha }
            }
            Ok(other) => {
                let output = format!("unexpected response from git: {other:?}");
                warn!(pr = %request.pr, "{output}");
                self.post(&request.repo, request.pr, responses::merge_failed(&output))
                    .await;
                MergeOutcome::Failed { output }
            }
            Err(output) => {
                warn!(pr = %request.pr, transcript = %output, "merge failed");
                self.post(&request.repo, request.pr, responses::merge_failed(&output))
                    .await;
                MergeOutcome::Failed { output }
            }
        }
    }

    /// The requester's GitHub profile if it has an email, else their line in
    /// the authors file.
    async fn resolve_committer(&self, login: &str) -> Option<CommitIdentity> {
        match self.host().user(login).await {
            Ok(profile) => {
                if let Some(email) = profile.email.filter(|e| !e.is_empty()) {
                    let name = profile
                        .name
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| login.to_string());
                    return Some(CommitIdentity { name, email });
                }
                debug!(login = %login, "profile has no public email");
            }
            Err(e) => debug!(login = %login, error = %e, "profile lookup failed"),
        }

        let path = self.inner.config.authors_file.as_deref()?;
        match lookup_author(path, login).await {
            Ok(record) => {
                debug!(login = %login, "found identity in authors file");
                let name = if record.name.is_empty() {
                    login.to_string()
                } else {
                    record.name
                };
                Some(CommitIdentity {
                    name,
                    email: record.email,
                })
            }
            Err(e) => {
                warn!(login = %login, error = %e, "authors file lookup failed");
                None
            }
        }
    }
}
