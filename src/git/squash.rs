//! The squash-merge script and PR branch mirroring.

use std::path::Path;

use crate::effects::SquashRequest;
use crate::types::{PrNumber, Sha};

use super::GitError;
use super::transcript::Transcript;

/// Diagnostic for a PR with no commits beyond its merge base.
pub const NOTHING_TO_MERGE: &str = "Nothing to merge, as far as I can tell.";

/// Appends the pull request and approval trailers to a commit body.
///
/// ```
/// use merge_gate::git::compose_commit_message;
///
/// let message = compose_commit_message(
///     "Fix the frobnicator\n",
///     "https://github.com/o/r/pull/7",
///     &["jb".to_string(), "ab".to_string()],
/// );
/// assert_eq!(
///     message,
///     "Fix the frobnicator\n\nGitHub-Pull-Request: https://github.com/o/r/pull/7\nLGTM: jb, ab\n"
/// );
/// ```
pub fn compose_commit_message(body: &str, pull_request_url: &str, approvals: &[String]) -> String {
    let mut message = format!(
        "{}\n\nGitHub-Pull-Request: {}\n",
        body.trim(),
        pull_request_url
    );
    if !approvals.is_empty() {
        message.push_str(&format!("LGTM: {}\n", approvals.join(", ")));
    }
    message
}

/// Squashes the PR onto its target branch in `repo_dir` and pushes it.
///
/// The commit's author is the author of the first commit on the PR branch;
/// the committer is the requesting user.
pub(crate) fn squash_merge(repo_dir: &Path, request: &SquashRequest) -> Result<Sha, GitError> {
    let source = request.pr.branch_name();
    let target = request.target_branch.as_str();
    let mut script = Transcript::new(repo_dir);

    script.run(&["fetch", "-f", "origin", &pull_head_refspec(request.pr)])?;
    script.run(&["fetch", "-f", "origin", &format!("{target}:orig/{target}")])?;
    script.run(&["reset", "--hard"])?;
    script.run(&["checkout", target])?;
    script.run(&["reset", "--hard", &format!("orig/{target}")])?;
    script.run(&["clean", "-fxd"])?;

    let merge_base = script.query(&["merge-base", &source, target])?;
    let revs = script.query(&["rev-list", &format!("{merge_base}..{source}")])?;
    let Some(first_commit) = revs.split_whitespace().last().map(str::to_string) else {
        return Err(script.fail(NOTHING_TO_MERGE));
    };

    let author_name = script.query(&["log", "-n1", "--pretty=format:%an", &first_commit])?;
    let author_email = script.query(&["log", "-n1", "--pretty=format:%ae", &first_commit])?;
    script.env("GIT_AUTHOR_NAME", author_name);
    script.env("GIT_AUTHOR_EMAIL", author_email);
    script.env("GIT_COMMITTER_NAME", request.committer.name.clone());
    script.env("GIT_COMMITTER_EMAIL", request.committer.email.clone());

    let body = match &request.message {
        Some(message) => message.clone(),
        None => script.query(&["log", "-n1", "--pretty=format:%B", &first_commit])?,
    };
    let message = compose_commit_message(&body, &request.pull_request_url, &request.approvals);

    script.run(&["merge", "--squash", "--no-commit", &source])?;
    script.run_with_stdin(&["commit", "-F", "-"], &message)?;
    let sha = script.run(&["rev-parse", "HEAD"])?;
    script.run(&["push", "origin", target])?;

    Ok(Sha::new(sha))
}

/// Mirrors the PR head to `pr-<n>` on origin.
pub(crate) fn publish_pr_branch(repo_dir: &Path, pr: PrNumber) -> Result<(), GitError> {
    let mut script = Transcript::new(repo_dir);
    script.run(&["fetch", "-f", "origin", &pull_head_refspec(pr)])?;
    script.run(&["push", "-f", "origin", &pr.branch_name()])?;
    Ok(())
}

/// Deletes `pr-<n>` from origin.
pub(crate) fn delete_pr_branch(repo_dir: &Path, pr: PrNumber) -> Result<(), GitError> {
    let mut script = Transcript::new(repo_dir);
    script.run(&["push", "origin", &format!(":{}", pr.branch_name())])?;
    Ok(())
}

/// Clones `url` into `parent/<name>`.
pub(crate) fn clone_repo(parent: &Path, url: &str, name: &str) -> Result<(), GitError> {
    std::fs::create_dir_all(parent)?;
    let mut script = Transcript::new(parent);
    script.run(&["clone", url, name])?;
    Ok(())
}

fn pull_head_refspec(pr: PrNumber) -> String {
    format!("refs/pull/{}/head:{}", pr.0, pr.branch_name())
}
