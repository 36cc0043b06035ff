//! The merge orchestrator.
//!
//! Receives comment and pull request events, checks permissions, records
//! approvals and gates merges on the aggregated build verdict. A PR whose
//! build is still pending is handed to a background task that keeps polling
//! until the build settles or the wait ceiling passes.
//!
//! At most one merge attempt is in flight per PR: a merge-gated command
//! claims the PR in the [`PendingSet`] before it looks at the build, and the
//! claim is held until the merge attempt (immediate or after waiting) is over.

mod decide;
mod merge;
mod pending;
mod poll;
mod responses;
mod wait;

#[cfg(test)]
mod tests;

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::approvals::ApprovalStore;
use crate::build::BuildTrigger;
use crate::commands::{Command, ParsedCommand, parse_body, skip_checks};
use crate::effects::{GitEffect, GitHubInterpreter, GitInterpreter, Host, PrData};
use crate::permissions::PermissionResolver;
use crate::status::{CheckPolicy, StatusState, Verdict};
use crate::types::{PrNumber, RepoId};
use crate::webhooks::{CommentAction, IssueCommentEvent, PrAction, PullRequestEvent};

pub use decide::{Decision, decide};
pub use merge::MergeOutcome;
pub use pending::{PendingClaim, PendingSet};
pub use poll::{WaitConfig, format_duration};
pub use wait::{WaitHandle, WaitOutcome};

pub const DEFAULT_LGTM_THRESHOLD: usize = 2;

pub const DEFAULT_STATUS_CONTEXT: &str = "merge-gate";

const STOP_DESCRIPTION: &str = "Not to be merged as is.";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// The bot's login; only comments addressed to it are commands.
    pub username: String,

    /// Approvals needed before an `lgtm` merges.
    pub lgtm_threshold: usize,

    /// Context of the commit statuses the bot posts.
    pub status_context: String,

    /// Fallback source of commit identities.
    pub authors_file: Option<PathBuf>,

    /// Mirror PR heads to `pr-<n>` branches on origin.
    pub manage_pr_branches: bool,

    pub wait: WaitConfig,
}

impl OrchestratorConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            lgtm_threshold: DEFAULT_LGTM_THRESHOLD,
            status_context: DEFAULT_STATUS_CONTEXT.to_string(),
            authors_file: None,
            manage_pr_branches: false,
            wait: WaitConfig::new(),
        }
    }
}

/// How an event was handled.
#[derive(Debug)]
pub enum Disposition {
    /// Not for us: wrong addressee, not a PR, or an action we skip.
    Ignored,
    /// The sender may not issue this command.
    Denied,
    UnknownCommand,
    /// A merge attempt for this PR is already in flight.
    AlreadyPending,
    /// The command couldn't proceed; the reason is logged.
    Aborted,
    /// An approval was recorded without reaching the threshold.
    Approved { approvals: Vec<String> },
    Stopped,
    BuildRequested,
    BuildFailed,
    /// A merge was attempted right away.
    Merge(MergeOutcome),
    /// The build is pending; a background task is waiting on it.
    Waiting(WaitHandle),
    BadBuild(Verdict),
    PullRequestUpdated,
}

/// An addressed command, with what's needed to act on it later.
#[derive(Debug, Clone)]
struct CommandRequest {
    repo: RepoId,
    pr: PrNumber,
    sender: String,
    parsed: ParsedCommand,
    /// `Skip-Check:` values from the comment.
    skip: Vec<String>,
}

struct Inner<G, M, B> {
    config: OrchestratorConfig,
    github: G,
    git: M,
    build: Option<B>,
    permissions: PermissionResolver,
    approvals: ApprovalStore,
    pending: PendingSet,
}

/// Shared handle to the orchestrator. Clones are cheap and share all state.
pub struct Orchestrator<G, M, B> {
    inner: Arc<Inner<G, M, B>>,
}

impl<G, M, B> Clone for Orchestrator<G, M, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G, M, B> Orchestrator<G, M, B>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: Display,
    M: GitInterpreter + Send + Sync + 'static,
    M::Error: Display,
    B: BuildTrigger + Send + Sync + 'static,
{
    pub fn new(
        config: OrchestratorConfig,
        github: G,
        git: M,
        build: Option<B>,
        permissions: PermissionResolver,
        approvals: ApprovalStore,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                github,
                git,
                build,
                permissions,
                approvals,
                pending: PendingSet::new(),
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub fn pending(&self) -> &PendingSet {
        &self.inner.pending
    }

    fn host(&self) -> Host<'_, G> {
        Host::new(&self.inner.github)
    }

    /// Handles an `issue_comment` event.
    #[instrument(skip_all, fields(repo = %event.repo, sender = %event.sender_login))]
    pub async fn handle_comment(&self, event: IssueCommentEvent) -> Disposition {
        if event.action != CommentAction::Created {
            return Disposition::Ignored;
        }
        let parsed = parse_body(&event.body);
        if !parsed.is_addressed_to(&self.inner.config.username) {
            debug!("ignoring comment not addressed to us");
            return Disposition::Ignored;
        }
        let Some(pr) = event.pr_number else {
            debug!("ignoring command on an issue");
            return Disposition::Ignored;
        };

        let command = Command::from_verb(&parsed.verb);
        info!(pr = %pr, ?command, "handling command");
        let request = CommandRequest {
            repo: event.repo,
            pr,
            sender: event.sender_login,
            skip: skip_checks(&event.body),
            parsed,
        };

        if command.is_privileged()
            && !self
                .inner
                .permissions
                .is_allowed(&self.inner.github, &request.repo, &request.sender)
                .await
        {
            self.post(&request.repo, pr, responses::no_access(&request.sender))
                .await;
            return Disposition::Denied;
        }

        match command {
            Command::Merge => self.gated_merge(request).await,
            Command::Lgtm => self.approve(request).await,
            Command::Stop => self.stop(request).await,
            Command::Rebuild => self.rebuild(request).await,
            Command::Unknown => {
                self.post(&request.repo, pr, responses::unknown_command(&request.sender))
                    .await;
                Disposition::UnknownCommand
            }
        }
    }

    /// Handles a `pull_request` event: posts the bot's own commit status and
    /// keeps the `pr-<n>` mirror branch in step.
    #[instrument(skip_all, fields(repo = %event.repo, pr = %event.pr_number))]
    pub async fn handle_pull_request(&self, event: PullRequestEvent) -> Disposition {
        let (description, branch_effect) = match event.action {
            PrAction::Opened | PrAction::Reopened | PrAction::Synchronize => (
                "At your service.",
                GitEffect::PublishPrBranch {
                    repo: event.repo.clone(),
                    pr: event.pr_number,
                },
            ),
            PrAction::Closed => (
                "Closed.",
                GitEffect::DeletePrBranch {
                    repo: event.repo.clone(),
                    pr: event.pr_number,
                },
            ),
        };

        if self.inner.config.manage_pr_branches {
            let result = self
                .inner
                .git
                .interpret(branch_effect)
                .await
                .map_err(|e| e.to_string());
            if let Err(e) = result {
                warn!(error = %e, "failed to update PR branch");
            }
        }

        let result = self
            .host()
            .set_status(
                &event.repo,
                &event.head_sha,
                StatusState::Success,
                &self.inner.config.status_context,
                description,
            )
            .await;
        if let Err(e) = result {
            warn!(error = %e, "failed to set commit status");
        }
        Disposition::PullRequestUpdated
    }

    async fn approve(&self, request: CommandRequest) -> Disposition {
        let approvals = match self
            .inner
            .approvals
            .record_approval(request.pr, &request.sender)
            .await
        {
            Ok(approvals) => approvals,
            Err(e) => {
                warn!(pr = %request.pr, error = %e, "failed to record approval");
                return Disposition::Aborted;
            }
        };

        let threshold = self.inner.config.lgtm_threshold;
        info!(pr = %request.pr, count = approvals.len(), threshold, "approval recorded");
        if approvals.len() < threshold {
            self.post(
                &request.repo,
                request.pr,
                responses::approval_noted(&request.sender, approvals.len(), threshold),
            )
            .await;
            return Disposition::Approved { approvals };
        }
        self.gated_merge(request).await
    }

    async fn stop(&self, request: CommandRequest) -> Disposition {
        let pr = match self.host().pull_request(&request.repo, request.pr).await {
            Ok(pr) => pr,
            Err(e) => {
                warn!(pr = %request.pr, error = %e, "no pull request");
                return Disposition::Aborted;
            }
        };
        let result = self
            .host()
            .set_status(
                &request.repo,
                &pr.head_sha,
                StatusState::Failure,
                &self.inner.config.status_context,
                STOP_DESCRIPTION,
            )
            .await;
        if let Err(e) = result {
            warn!(pr = %request.pr, error = %e, "failed to set commit status");
        }
        self.post(&request.repo, request.pr, responses::not_merging(&request.sender))
            .await;
        Disposition::Stopped
    }

    async fn rebuild(&self, request: CommandRequest) -> Disposition {
        let Some(build) = &self.inner.build else {
            info!(pr = %request.pr, "no build trigger configured");
            return Disposition::Ignored;
        };
        match build.trigger(request.pr).await.map_err(|e| e.to_string()) {
            Ok(()) => Disposition::BuildRequested,
            Err(e) => {
                warn!(pr = %request.pr, error = %e, "build trigger failed");
                self.post(&request.repo, request.pr, responses::build_failed(&e))
                    .await;
                Disposition::BuildFailed
            }
        }
    }

    /// The path shared by `merge` and a threshold-reaching `lgtm`.
    async fn gated_merge(&self, request: CommandRequest) -> Disposition {
        let Some(claim) = self.inner.pending.try_claim(&request.repo, request.pr) else {
            info!(pr = %request.pr, "merge already in flight");
            self.post(
                &request.repo,
                request.pr,
                responses::already_pending(&request.sender),
            )
            .await;
            return Disposition::AlreadyPending;
        };

        let pr = match self.host().pull_request(&request.repo, request.pr).await {
            Ok(pr) => pr,
            Err(e) => {
                warn!(pr = %request.pr, error = %e, "no pull request");
                return Disposition::Aborted;
            }
        };
        let policy = self.check_policy(&request, &pr).await;
        let verdict = self.current_verdict(&request.repo, &pr, &policy).await;
        info!(pr = %request.pr, verdict = %verdict, "build verdict");

        match decide(verdict) {
            Decision::MergeNow => {
                let outcome = self.perform_merge(&request, &pr).await;
                drop(claim);
                Disposition::Merge(outcome)
            }
            Decision::Wait => {
                self.post(&request.repo, request.pr, responses::waiting())
                    .await;
                Disposition::Waiting(self.spawn_wait(request, pr, policy, claim))
            }
            Decision::ReportBad(verdict) => {
                self.post(&request.repo, request.pr, responses::bad_build(verdict))
                    .await;
                Disposition::BadBuild(verdict)
            }
        }
    }

    async fn check_policy(&self, request: &CommandRequest, pr: &PrData) -> CheckPolicy {
        let required = self
            .host()
            .required_contexts(&request.repo, &pr.base_ref)
            .await
            .unwrap_or_else(|e| {
                warn!(pr = %request.pr, error = %e, "couldn't read required contexts");
                Vec::new()
            });
        CheckPolicy::new(&request.skip, &required)
    }

    /// The current verdict. A failed fetch counts as pending, never success.
    async fn current_verdict(&self, repo: &RepoId, pr: &PrData, policy: &CheckPolicy) -> Verdict {
        match self.host().statuses(repo, &pr.head_sha).await {
            Ok(reports) => policy.aggregate(&reports),
            Err(e) => {
                warn!(pr = %pr.number, error = %e, "status fetch failed, treating build as pending");
                Verdict::Pending
            }
        }
    }

    async fn post(&self, repo: &RepoId, pr: PrNumber, body: String) {
        if let Err(e) = self.host().comment(repo, pr, body).await {
            warn!(repo = %repo, pr = %pr, error = %e, "failed to post comment");
        }
    }
}
