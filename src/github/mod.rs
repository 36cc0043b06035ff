//! GitHub API client and effect interpreter.
//!
//! Executes `GitHubEffect`s through octocrab, retrying transient failures
//! with exponential backoff.

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, RetryPolicy, retry_with_backoff};
