//! Recording fakes for the effect interpreters, and shared proptest
//! generators.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::build::BuildTrigger;
use crate::effects::{
    GitEffect, GitHubEffect, GitHubInterpreter, GitHubResponse, GitInterpreter, GitResponse,
    PrData, UserProfile,
};
use crate::status::{StatusReport, StatusState};
use crate::types::{CommentId, PrNumber, RepoId, Sha};

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    (1u64..100_000).prop_map(PrNumber)
}

pub fn arb_repo() -> impl Strategy<Value = RepoId> {
    ("[a-z][a-z0-9-]{0,10}", "[a-z][a-z0-9_-]{0,10}").prop_map(|(o, r)| RepoId::new(o, r))
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn sample_pr(number: u64) -> PrData {
    PrData {
        number: PrNumber(number),
        head_sha: Sha::new("a".repeat(40)),
        base_ref: "main".to_string(),
        html_url: format!("https://github.com/octo/widgets/pull/{number}"),
        author_login: "pat".to_string(),
    }
}

pub fn report(context: &str, state: StatusState) -> StatusReport {
    StatusReport::new(context, state, "ci-bot")
}

// ─── GitHub ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct GitHubScript {
    prs: HashMap<PrNumber, PrData>,
    statuses: Vec<StatusReport>,
    /// Consumed before `statuses`; `None` is a failed fetch.
    status_queue: VecDeque<Option<Vec<StatusReport>>>,
    required: Vec<String>,
    collaborators: Option<Vec<String>>,
    users: HashMap<String, UserProfile>,
    next_comment_id: u64,
}

impl Default for GitHubScript {
    fn default() -> Self {
        Self {
            prs: HashMap::new(),
            statuses: Vec::new(),
            status_queue: VecDeque::new(),
            required: Vec::new(),
            collaborators: Some(Vec::new()),
            users: HashMap::new(),
            next_comment_id: 1,
        }
    }
}

/// A scripted GitHub that records every effect it is asked to run.
///
/// Clones share state, so a test can keep one handle and give another to the
/// code under test.
#[derive(Debug, Clone, Default)]
pub struct FakeGitHub {
    script: Arc<Mutex<GitHubScript>>,
    effects: Arc<Mutex<Vec<GitHubEffect>>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pr(&self, pr: PrData) {
        self.script.lock().unwrap().prs.insert(pr.number, pr);
    }

    /// Statuses returned once the queue is empty.
    pub fn set_statuses(&self, statuses: Vec<StatusReport>) {
        self.script.lock().unwrap().statuses = statuses;
    }

    pub fn queue_statuses(&self, statuses: Vec<StatusReport>) {
        self.script
            .lock()
            .unwrap()
            .status_queue
            .push_back(Some(statuses));
    }

    pub fn queue_status_failure(&self) {
        self.script.lock().unwrap().status_queue.push_back(None);
    }

    pub fn set_required(&self, contexts: Vec<String>) {
        self.script.lock().unwrap().required = contexts;
    }

    pub fn set_collaborators(&self, logins: Vec<String>) {
        self.script.lock().unwrap().collaborators = Some(logins);
    }

    pub fn fail_collaborators(&self) {
        self.script.lock().unwrap().collaborators = None;
    }

    pub fn add_user(&self, login: &str, name: Option<&str>, email: Option<&str>) {
        self.script.lock().unwrap().users.insert(
            login.to_string(),
            UserProfile {
                login: login.to_string(),
                name: name.map(str::to_string),
                email: email.map(str::to_string),
            },
        );
    }

    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.effects.lock().unwrap().clone()
    }

    /// Bodies of every posted comment, in order.
    pub fn comments(&self) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                GitHubEffect::PostComment { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&GitHubEffect) -> bool) -> usize {
        self.effects().iter().filter(|e| predicate(e)).count()
    }

    fn respond(&self, effect: &GitHubEffect) -> Result<GitHubResponse, String> {
        let mut script = self.script.lock().unwrap();
        match effect {
            GitHubEffect::GetPr { pr, .. } => script
                .prs
                .get(pr)
                .cloned()
                .map(GitHubResponse::Pr)
                .ok_or_else(|| format!("no such pull request {pr}")),
            GitHubEffect::ListStatuses { .. } => match script.status_queue.pop_front() {
                Some(Some(statuses)) => Ok(GitHubResponse::Statuses(statuses)),
                Some(None) => Err("status fetch failed".to_string()),
                None => Ok(GitHubResponse::Statuses(script.statuses.clone())),
            },
            GitHubEffect::GetRequiredContexts { .. } => {
                Ok(GitHubResponse::RequiredContexts(script.required.clone()))
            }
            GitHubEffect::ListCollaborators { .. } => script
                .collaborators
                .clone()
                .map(GitHubResponse::Collaborators)
                .ok_or_else(|| "collaborator listing failed".to_string()),
            GitHubEffect::GetUser { login } => script
                .users
                .get(login)
                .cloned()
                .map(GitHubResponse::User)
                .ok_or_else(|| format!("no such user {login}")),
            GitHubEffect::PostComment { .. } => {
                let id = CommentId(script.next_comment_id);
                script.next_comment_id += 1;
                Ok(GitHubResponse::CommentPosted { id })
            }
            GitHubEffect::CloseIssue { .. } => Ok(GitHubResponse::IssueClosed),
            GitHubEffect::SetStatus { .. } => Ok(GitHubResponse::StatusSet),
        }
    }
}

impl GitHubInterpreter for FakeGitHub {
    type Error = String;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        self.effects.lock().unwrap().push(effect.clone());
        self.respond(&effect)
    }
}

// ─── Git ──────────────────────────────────────────────────────────────────────

/// A git interpreter that records effects and answers with a fixed result.
#[derive(Debug, Clone)]
pub struct FakeGit {
    effects: Arc<Mutex<Vec<GitEffect>>>,
    squash_result: Arc<Mutex<Result<Sha, String>>>,
}

impl Default for FakeGit {
    fn default() -> Self {
        Self {
            effects: Arc::default(),
            squash_result: Arc::new(Mutex::new(Ok(Sha::new("b".repeat(40))))),
        }
    }
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every squash fail with `transcript`.
    pub fn fail_squash(&self, transcript: &str) {
        *self.squash_result.lock().unwrap() = Err(transcript.to_string());
    }

    pub fn effects(&self) -> Vec<GitEffect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn squash_count(&self) -> usize {
        self.effects()
            .iter()
            .filter(|e| matches!(e, GitEffect::SquashMerge(_)))
            .count()
    }
}

impl GitInterpreter for FakeGit {
    type Error = String;

    async fn interpret(&self, effect: GitEffect) -> Result<GitResponse, Self::Error> {
        self.effects.lock().unwrap().push(effect.clone());
        match effect {
            GitEffect::SquashMerge(_) => self
                .squash_result
                .lock()
                .unwrap()
                .clone()
                .map(|sha| GitResponse::Merged { sha }),
            GitEffect::PublishPrBranch { .. } | GitEffect::DeletePrBranch { .. } => {
                Ok(GitResponse::Ok)
            }
        }
    }
}

// ─── Builds ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FakeBuild {
    triggered: Arc<Mutex<Vec<PrNumber>>>,
    error: Arc<Mutex<Option<String>>>,
}

impl FakeBuild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: &str) {
        *self.error.lock().unwrap() = Some(error.to_string());
    }

    pub fn triggered(&self) -> Vec<PrNumber> {
        self.triggered.lock().unwrap().clone()
    }
}

impl BuildTrigger for FakeBuild {
    type Error = String;

    async fn trigger(&self, pr: PrNumber) -> Result<(), Self::Error> {
        self.triggered.lock().unwrap().push(pr);
        match self.error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
