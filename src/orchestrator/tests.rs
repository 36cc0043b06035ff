use std::time::Duration;

use super::*;
use crate::approvals::ApprovalStore;
use crate::commands::override_message;
use crate::effects::{GitHubEffect, SquashRequest};
use crate::permissions::PermissionResolver;
use crate::status::StatusState;
use crate::test_utils::{FakeBuild, FakeGit, FakeGitHub, report, sample_pr};
use crate::types::{CommentId, PrNumber, RepoId, Sha};
use crate::webhooks::{CommentAction, IssueCommentEvent, PrAction, PullRequestEvent};

type TestOrchestrator = Orchestrator<FakeGitHub, FakeGit, FakeBuild>;

const PR: PrNumber = PrNumber(7);

struct Harness {
    orchestrator: TestOrchestrator,
    github: FakeGitHub,
    git: FakeGit,
    build: FakeBuild,
}

fn repo() -> RepoId {
    RepoId::new("octo", "widgets")
}

fn merged_sha() -> Sha {
    Sha::new("b".repeat(40))
}

fn harness_with(config: OrchestratorConfig, build: Option<FakeBuild>) -> Harness {
    let github = FakeGitHub::new();
    github.add_pr(sample_pr(PR.0));
    github.set_statuses(vec![report("ci/build", StatusState::Success)]);
    github.set_collaborators(vec!["alice".into(), "bob".into(), "carol".into()]);
    github.add_user("alice", Some("Alice Liddell"), Some("alice@example.com"));
    github.add_user("bob", Some("Bob Stone"), Some("bob@example.com"));

    let git = FakeGit::new();
    let fake_build = build.clone().unwrap_or_default();
    let orchestrator = Orchestrator::new(
        config,
        github.clone(),
        git.clone(),
        build,
        PermissionResolver::default(),
        ApprovalStore::open_in_memory().unwrap(),
    );
    Harness {
        orchestrator,
        github,
        git,
        build: fake_build,
    }
}

fn harness() -> Harness {
    harness_with(OrchestratorConfig::new("merge-gate"), Some(FakeBuild::new()))
}

fn comment(body: &str, sender: &str) -> IssueCommentEvent {
    IssueCommentEvent {
        repo: repo(),
        action: CommentAction::Created,
        pr_number: Some(PR),
        comment_id: CommentId(1),
        body: body.to_string(),
        sender_login: sender.to_string(),
    }
}

fn squash_requests(git: &FakeGit) -> Vec<SquashRequest> {
    git.effects()
        .into_iter()
        .filter_map(|effect| match effect {
            GitEffect::SquashMerge(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn is_set_status(effect: &GitHubEffect) -> bool {
    matches!(effect, GitHubEffect::SetStatus { .. })
}

fn is_close(effect: &GitHubEffect) -> bool {
    matches!(effect, GitHubEffect::CloseIssue { .. })
}

fn is_list_statuses(effect: &GitHubEffect) -> bool {
    matches!(effect, GitHubEffect::ListStatuses { .. })
}

// ─── Addressing ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_not_addressed_to_the_bot_are_ignored() {
    let h = harness();

    for body in ["merge please", "@someone-else merge", ""] {
        let disposition = h.orchestrator.handle_comment(comment(body, "alice")).await;
        assert!(matches!(disposition, Disposition::Ignored), "{body:?}");
    }
    assert!(h.github.effects().is_empty());
    assert!(h.git.effects().is_empty());
}

#[tokio::test]
async fn addressing_is_case_insensitive() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@Merge-Gate: merge", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::Merge(MergeOutcome::Merged { .. })));
}

#[tokio::test]
async fn edited_comments_are_ignored() {
    let h = harness();
    let mut event = comment("@merge-gate merge", "alice");
    event.action = CommentAction::Edited;

    let disposition = h.orchestrator.handle_comment(event).await;

    assert!(matches!(disposition, Disposition::Ignored));
    assert!(h.github.effects().is_empty());
}

#[tokio::test]
async fn commands_on_plain_issues_are_ignored() {
    let h = harness();
    let mut event = comment("@merge-gate merge", "alice");
    event.pr_number = None;

    let disposition = h.orchestrator.handle_comment(event).await;

    assert!(matches!(disposition, Disposition::Ignored));
    assert!(h.github.effects().is_empty());
}

// ─── Permissions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn strangers_are_denied() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "mallory"))
        .await;

    assert!(matches!(disposition, Disposition::Denied));
    assert_eq!(h.github.comments(), vec![responses::no_access("mallory")]);
    assert_eq!(
        h.github
            .count(|e| matches!(e, GitHubEffect::GetPr { .. })),
        0
    );
    assert_eq!(h.git.squash_count(), 0);
}

#[tokio::test]
async fn unknown_verbs_get_help_without_a_permission_check() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate dance", "mallory"))
        .await;

    assert!(matches!(disposition, Disposition::UnknownCommand));
    assert_eq!(h.github.comments(), vec![responses::unknown_command("mallory")]);
    assert_eq!(
        h.github
            .count(|e| matches!(e, GitHubEffect::ListCollaborators { .. })),
        0
    );
}

// ─── Merging ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn green_build_merges_and_thanks_the_author() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate: merge", "alice"))
        .await;

    let Disposition::Merge(outcome) = disposition else {
        panic!("expected an immediate merge, got {disposition:?}");
    };
    assert_eq!(outcome, MergeOutcome::Merged { sha: merged_sha() });

    let requests = squash_requests(&h.git);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.target_branch, "main");
    assert_eq!(request.committer.name, "Alice Liddell");
    assert_eq!(request.committer.email, "alice@example.com");
    assert_eq!(request.message, None);
    assert_eq!(
        request.pull_request_url,
        "https://github.com/octo/widgets/pull/7"
    );
    assert!(request.approvals.is_empty());

    assert_eq!(
        h.github.comments(),
        vec![responses::merged(&merged_sha(), "pat")]
    );
    assert_eq!(h.github.count(is_close), 1);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test]
async fn comment_subject_overrides_the_commit_message() {
    let h = harness();
    let body = "@merge-gate merge\n\nWidgets: stop the wobble\n\nThe wobble was caused by a loose bolt.";

    h.orchestrator.handle_comment(comment(body, "alice")).await;

    let requests = squash_requests(&h.git);
    assert_eq!(
        requests[0].message,
        override_message(
            "Widgets: stop the wobble",
            "The wobble was caused by a loose bolt."
        )
    );
}

#[tokio::test]
async fn squash_is_a_merge_synonym() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate squash it", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::Merge(MergeOutcome::Merged { .. })));
}

#[tokio::test]
async fn bad_build_is_reported_without_merging_or_setting_status() {
    let h = harness();
    h.github.set_statuses(vec![
        report("ci/build", StatusState::Success),
        report("ci/lint", StatusState::Failure),
    ]);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await;

    assert!(matches!(
        disposition,
        Disposition::BadBuild(StatusState::Failure)
    ));
    assert_eq!(
        h.github.comments(),
        vec![responses::bad_build(StatusState::Failure)]
    );
    assert_eq!(h.github.count(is_set_status), 0);
    assert_eq!(h.git.squash_count(), 0);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test]
async fn skip_check_excludes_a_failing_context() {
    let h = harness();
    h.github.set_statuses(vec![
        report("ci/build", StatusState::Success),
        report("ci/flaky", StatusState::Failure),
    ]);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge\n\nSkip-Check: ci/flaky", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::Merge(MergeOutcome::Merged { .. })));
}

#[tokio::test]
async fn merge_failure_posts_the_transcript() {
    let h = harness();
    let transcript = "$ git push origin main\n ! [rejected] main -> main (fetch first)\n";
    h.git.fail_squash(transcript);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await;

    let Disposition::Merge(outcome) = disposition else {
        panic!("expected a merge attempt, got {disposition:?}");
    };
    assert_eq!(
        outcome,
        MergeOutcome::Failed {
            output: transcript.to_string()
        }
    );
    assert_eq!(h.github.comments(), vec![responses::merge_failed(transcript)]);
    assert_eq!(h.github.count(is_close), 0);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test]
async fn missing_user_info_aborts_before_git() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "carol"))
        .await;

    assert!(matches!(
        disposition,
        Disposition::Merge(MergeOutcome::NoUserInfo)
    ));
    assert_eq!(h.github.comments(), vec![responses::no_user("carol")]);
    assert_eq!(h.git.squash_count(), 0);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test]
async fn authors_file_supplies_a_missing_email() {
    let dir = tempfile::tempdir().unwrap();
    let authors = dir.path().join("AUTHORS");
    std::fs::write(&authors, "Carol Quill (carol) <carol@example.com>\n").unwrap();
    let mut config = OrchestratorConfig::new("merge-gate");
    config.authors_file = Some(authors);
    let h = harness_with(config, None);
    h.github.add_user("carol", Some("Carol"), None);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "carol"))
        .await;

    assert!(matches!(disposition, Disposition::Merge(MergeOutcome::Merged { .. })));
    let requests = squash_requests(&h.git);
    assert_eq!(requests[0].committer.name, "Carol Quill");
    assert_eq!(requests[0].committer.email, "carol@example.com");
}

// ─── Waiting ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn pending_build_merges_once_it_turns_green() {
    let h = harness();
    h.github
        .queue_statuses(vec![report("ci/build", StatusState::Pending)]);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await;

    let Disposition::Waiting(handle) = disposition else {
        panic!("expected to wait, got {disposition:?}");
    };
    assert_eq!(handle.pr(), PR);
    assert!(h.orchestrator.pending().contains(&repo(), PR));

    let outcome = handle.join().await.unwrap();

    assert_eq!(
        outcome,
        WaitOutcome::Completed(MergeOutcome::Merged { sha: merged_sha() })
    );
    assert_eq!(
        h.github.comments(),
        vec![
            responses::waiting(),
            responses::merged(&merged_sha(), "pat")
        ]
    );
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn pending_build_that_fails_is_reported() {
    let h = harness();
    h.github
        .queue_statuses(vec![report("ci/build", StatusState::Pending)]);
    h.github
        .set_statuses(vec![report("ci/build", StatusState::Error)]);

    let Disposition::Waiting(handle) = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await
    else {
        panic!("expected to wait");
    };
    let outcome = handle.join().await.unwrap();

    assert_eq!(outcome, WaitOutcome::BadBuild(StatusState::Error));
    assert_eq!(
        h.github.comments(),
        vec![responses::waiting(), responses::bad_build(StatusState::Error)]
    );
    assert_eq!(h.git.squash_count(), 0);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn wait_gives_up_at_the_ceiling_without_merging() {
    let h = harness();
    h.github
        .set_statuses(vec![report("ci/build", StatusState::Pending)]);

    let Disposition::Waiting(handle) = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await
    else {
        panic!("expected to wait");
    };
    let outcome = handle.join().await.unwrap();

    let wait = WaitConfig::new();
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(
        h.github.comments(),
        vec![responses::waiting(), responses::timed_out(wait.ceiling)]
    );
    // The initial check plus every poll that fits under the ceiling.
    assert_eq!(
        h.github.count(is_list_statuses),
        1 + wait.max_polls() as usize
    );
    assert_eq!(h.git.squash_count(), 0);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_status_fetch_counts_as_pending() {
    let h = harness();
    h.github.queue_status_failure();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await;

    let Disposition::Waiting(handle) = disposition else {
        panic!("a failed fetch must not merge or reject, got {disposition:?}");
    };
    assert_eq!(h.git.squash_count(), 0);
    assert_eq!(
        handle.join().await.unwrap(),
        WaitOutcome::Completed(MergeOutcome::Merged { sha: merged_sha() })
    );
}

#[tokio::test(start_paused = true)]
async fn missing_required_context_waits_for_it() {
    let h = harness();
    h.github.set_required(vec!["ci/deploy".into()]);

    let Disposition::Waiting(handle) = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await
    else {
        panic!("expected to wait for the required context");
    };
    h.github.set_statuses(vec![
        report("ci/build", StatusState::Success),
        report("ci/deploy", StatusState::Success),
    ]);

    assert_eq!(
        handle.join().await.unwrap(),
        WaitOutcome::Completed(MergeOutcome::Merged { sha: merged_sha() })
    );
}

#[tokio::test(start_paused = true)]
async fn second_merge_while_waiting_is_rejected() {
    let h = harness();
    h.github
        .set_statuses(vec![report("ci/build", StatusState::Pending)]);

    let Disposition::Waiting(handle) = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await
    else {
        panic!("expected to wait");
    };
    let second = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "bob"))
        .await;

    assert!(matches!(second, Disposition::AlreadyPending));
    assert_eq!(
        h.github.comments(),
        vec![responses::waiting(), responses::already_pending("bob")]
    );

    h.github
        .set_statuses(vec![report("ci/build", StatusState::Success)]);
    handle.join().await.unwrap();
    assert_eq!(h.git.squash_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_merge_commands_claim_the_pr_once() {
    let h = harness();
    h.github
        .set_statuses(vec![report("ci/build", StatusState::Pending)]);

    let (first, second) = tokio::join!(
        h.orchestrator
            .handle_comment(comment("@merge-gate merge", "alice")),
        h.orchestrator
            .handle_comment(comment("@merge-gate merge", "bob")),
    );

    let (handle, other) = match (first, second) {
        (Disposition::Waiting(handle), other) | (other, Disposition::Waiting(handle)) => {
            (handle, other)
        }
        (a, b) => panic!("expected one waiter, got {a:?} and {b:?}"),
    };
    assert!(matches!(other, Disposition::AlreadyPending));

    h.github
        .set_statuses(vec![report("ci/build", StatusState::Success)]);
    handle.join().await.unwrap();
    assert_eq!(h.git.squash_count(), 1);
    assert!(h.orchestrator.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn pr_can_be_merged_again_after_a_wait_ends() {
    let h = harness();
    h.github
        .queue_statuses(vec![report("ci/build", StatusState::Pending)]);
    h.github
        .set_statuses(vec![report("ci/build", StatusState::Failure)]);

    let Disposition::Waiting(handle) = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await
    else {
        panic!("expected to wait");
    };
    handle.join().await.unwrap();

    h.github
        .set_statuses(vec![report("ci/build", StatusState::Success)]);
    let retry = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await;

    assert!(matches!(retry, Disposition::Merge(MergeOutcome::Merged { .. })));
}

// ─── Approvals ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn approval_below_threshold_is_acknowledged() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate lgtm", "alice"))
        .await;

    let Disposition::Approved { approvals } = disposition else {
        panic!("expected an approval, got {disposition:?}");
    };
    assert_eq!(approvals, vec!["alice".to_string()]);
    assert_eq!(h.github.comments(), vec![responses::approval_noted("alice", 1, 2)]);
    assert_eq!(
        h.github
            .count(|e| matches!(e, GitHubEffect::GetPr { .. })),
        0
    );
}

#[tokio::test]
async fn repeated_approval_does_not_count_twice() {
    let h = harness();

    h.orchestrator
        .handle_comment(comment("@merge-gate lgtm", "alice"))
        .await;
    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate LGTM!", "alice"))
        .await;

    let Disposition::Approved { approvals } = disposition else {
        panic!("expected an approval, got {disposition:?}");
    };
    assert_eq!(approvals, vec!["alice".to_string()]);
    assert_eq!(h.git.squash_count(), 0);
}

#[tokio::test]
async fn approval_reaching_threshold_merges_with_trailer() {
    let h = harness();

    h.orchestrator
        .handle_comment(comment("@merge-gate lgtm", "alice"))
        .await;
    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate lgtm", "bob"))
        .await;

    assert!(matches!(disposition, Disposition::Merge(MergeOutcome::Merged { .. })));
    let requests = squash_requests(&h.git);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].approvals, vec!["alice", "bob"]);
    assert_eq!(requests[0].committer.name, "Bob Stone");
}

#[tokio::test]
async fn threshold_of_one_merges_on_first_approval() {
    let mut config = OrchestratorConfig::new("merge-gate");
    config.lgtm_threshold = 1;
    let h = harness_with(config, None);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate lgtm", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::Merge(MergeOutcome::Merged { .. })));
}

// ─── Stop and rebuild ─────────────────────────────────────────────────────────

#[tokio::test]
async fn stop_marks_the_head_commit_failed() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate stop", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::Stopped));
    let statuses: Vec<_> = h
        .github
        .effects()
        .into_iter()
        .filter(is_set_status)
        .collect();
    assert_eq!(
        statuses,
        vec![GitHubEffect::SetStatus {
            repo: repo(),
            sha: sample_pr(PR.0).head_sha,
            state: StatusState::Failure,
            context: DEFAULT_STATUS_CONTEXT.to_string(),
            description: "Not to be merged as is.".to_string(),
        }]
    );
    assert_eq!(h.github.comments(), vec![responses::not_merging("alice")]);
    assert_eq!(h.git.squash_count(), 0);
}

#[tokio::test]
async fn rebuild_triggers_the_builds() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate rebuild", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::BuildRequested));
    assert_eq!(h.build.triggered(), vec![PR]);
    assert!(h.github.comments().is_empty());
}

#[tokio::test]
async fn failed_rebuild_is_reported() {
    let h = harness();
    h.build.fail_with("build queue rejected build Widgets_Ci: 403");

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate build", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::BuildFailed));
    assert_eq!(
        h.github.comments(),
        vec![responses::build_failed(
            "build queue rejected build Widgets_Ci: 403"
        )]
    );
}

#[tokio::test]
async fn rebuild_without_a_trigger_is_ignored() {
    let h = harness_with(OrchestratorConfig::new("merge-gate"), None);

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate rebuild", "alice"))
        .await;

    assert!(matches!(disposition, Disposition::Ignored));
    assert!(h.build.triggered().is_empty());
}

#[tokio::test]
async fn rebuild_requires_permission() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_comment(comment("@merge-gate rebuild", "mallory"))
        .await;

    assert!(matches!(disposition, Disposition::Denied));
    assert!(h.build.triggered().is_empty());
}

// ─── Pull request events ──────────────────────────────────────────────────────

fn pr_event(action: PrAction) -> PullRequestEvent {
    PullRequestEvent {
        repo: repo(),
        action,
        pr_number: PR,
        head_sha: Sha::new("c".repeat(40)),
    }
}

#[tokio::test]
async fn opened_pr_gets_a_success_status() {
    let h = harness();

    let disposition = h
        .orchestrator
        .handle_pull_request(pr_event(PrAction::Opened))
        .await;

    assert!(matches!(disposition, Disposition::PullRequestUpdated));
    assert_eq!(
        h.github.effects(),
        vec![GitHubEffect::SetStatus {
            repo: repo(),
            sha: Sha::new("c".repeat(40)),
            state: StatusState::Success,
            context: DEFAULT_STATUS_CONTEXT.to_string(),
            description: "At your service.".to_string(),
        }]
    );
    assert!(h.git.effects().is_empty(), "branches are unmanaged by default");
}

#[tokio::test]
async fn managed_branches_follow_the_pr() {
    let mut config = OrchestratorConfig::new("merge-gate");
    config.manage_pr_branches = true;
    let h = harness_with(config, None);

    h.orchestrator
        .handle_pull_request(pr_event(PrAction::Synchronize))
        .await;
    h.orchestrator
        .handle_pull_request(pr_event(PrAction::Closed))
        .await;

    assert_eq!(
        h.git.effects(),
        vec![
            GitEffect::PublishPrBranch { repo: repo(), pr: PR },
            GitEffect::DeletePrBranch { repo: repo(), pr: PR },
        ]
    );
    let descriptions: Vec<_> = h
        .github
        .effects()
        .into_iter()
        .filter_map(|effect| match effect {
            GitHubEffect::SetStatus { description, .. } => Some(description),
            _ => None,
        })
        .collect();
    assert_eq!(descriptions, vec!["At your service.", "Closed."]);
}

#[tokio::test]
async fn wait_config_is_used_for_the_timeout_message() {
    let mut config = OrchestratorConfig::new("merge-gate");
    config.wait = WaitConfig {
        ceiling: Duration::from_secs(60),
        ..WaitConfig::new()
    };
    let h = harness_with(config, None);
    h.github
        .set_statuses(vec![report("ci/build", StatusState::Pending)]);

    tokio::time::pause();
    let Disposition::Waiting(handle) = h
        .orchestrator
        .handle_comment(comment("@merge-gate merge", "alice"))
        .await
    else {
        panic!("expected to wait");
    };

    assert_eq!(handle.join().await.unwrap(), WaitOutcome::TimedOut);
    assert_eq!(
        h.github.comments().last(),
        Some(&responses::timed_out(Duration::from_secs(60)))
    );
}
