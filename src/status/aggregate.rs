//! Reduction of per-context build statuses into a single verdict.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// State of a commit status, as reported by GitHub.
///
/// Also used as the aggregated verdict: severity is
/// `error`/`failure` > `pending` > `success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
    Error,
    Failure,
}

/// The aggregated build-check outcome gating a merge.
pub type Verdict = StatusState;

impl StatusState {
    /// Parses the GitHub API representation (`"pending"`, `"success"`, ...).
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(StatusState::Pending),
            "success" => Some(StatusState::Success),
            "error" => Some(StatusState::Error),
            "failure" => Some(StatusState::Failure),
            _ => None,
        }
    }

    pub fn as_api_str(&self) -> &'static str {
        match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
            StatusState::Error => "error",
            StatusState::Failure => "failure",
        }
    }

    /// Returns true for `error` and `failure`.
    pub fn is_bad(&self) -> bool {
        matches!(self, StatusState::Error | StatusState::Failure)
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// One status report for a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub context: String,
    pub state: StatusState,
    pub reporter_login: String,
}

impl StatusReport {
    pub fn new(
        context: impl Into<String>,
        state: StatusState,
        reporter_login: impl Into<String>,
    ) -> Self {
        StatusReport {
            context: context.into(),
            state,
            reporter_login: reporter_login.into(),
        }
    }
}

/// Keeps only the first report per context.
///
/// GitHub lists statuses newest first, so this is the latest report for each
/// context. Input order is preserved.
pub fn latest_per_context(reports: Vec<StatusReport>) -> Vec<StatusReport> {
    let mut seen = HashSet::new();
    reports
        .into_iter()
        .filter(|report| seen.insert(report.context.clone()))
        .collect()
}

/// A skip pattern, matched literally and as a case-insensitive regex.
#[derive(Debug, Clone)]
struct SkipPattern {
    literal: String,
    regex: Option<Regex>,
}

impl SkipPattern {
    fn new(pattern: &str) -> Self {
        // Patterns that are not valid regexes still match literally.
        let regex = RegexBuilder::new(&pattern.to_lowercase())
            .case_insensitive(true)
            .build()
            .ok();
        SkipPattern {
            literal: pattern.to_string(),
            regex,
        }
    }

    fn matches(&self, context: &str) -> bool {
        if self.literal == context {
            return true;
        }
        self.regex
            .as_ref()
            .is_some_and(|re| re.is_match(&context.to_lowercase()))
    }
}

/// Which contexts are ignored and which must be present.
///
/// Captured once when a merge is requested and reused for every poll.
#[derive(Debug, Clone, Default)]
pub struct CheckPolicy {
    skip: Vec<SkipPattern>,
    required: Vec<String>,
}

impl CheckPolicy {
    pub fn new(skip: &[String], required: &[String]) -> Self {
        CheckPolicy {
            skip: skip.iter().map(|p| SkipPattern::new(p)).collect(),
            required: required.to_vec(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns true if `context` matches any skip pattern.
    pub fn is_skipped(&self, context: &str) -> bool {
        self.skip.iter().any(|pattern| pattern.matches(context))
    }

    /// Reduces `reports` (newest first) to a verdict.
    ///
    /// Skipped contexts are ignored entirely. When required contexts are
    /// configured, all other contexts are ignored too. The first `error` or
    /// `failure` among the remaining reports wins outright. Otherwise any
    /// `pending` report, or any required context without a report, yields
    /// `pending`. An empty set with nothing required is `success`.
    pub fn aggregate(&self, reports: &[StatusReport]) -> Verdict {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut present: HashSet<&str> = HashSet::new();
        let mut verdict = StatusState::Success;

        for report in reports {
            if !seen.insert(report.context.as_str()) {
                continue;
            }
            if self.is_skipped(&report.context) {
                continue;
            }
            if !self.required.is_empty() && !self.required.contains(&report.context) {
                continue;
            }
            present.insert(report.context.as_str());

            match report.state {
                StatusState::Error | StatusState::Failure => return report.state,
                StatusState::Pending => verdict = StatusState::Pending,
                StatusState::Success => {}
            }
        }

        let missing_required = self
            .required
            .iter()
            .any(|context| !present.contains(context.as_str()));
        if missing_required {
            return StatusState::Pending;
        }

        verdict
    }
}

/// Reduces status reports under a skip and require policy.
///
/// See [`CheckPolicy::aggregate`] for the rules.
pub fn aggregate(reports: &[StatusReport], skip: &[String], required: &[String]) -> Verdict {
    CheckPolicy::new(skip, required).aggregate(reports)
}
