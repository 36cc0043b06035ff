//! Effect interpreter traits.
//!
//! The orchestrator is generic over these traits so that tests can substitute
//! recording mocks for the network and the local git binary.

use std::future::Future;

use super::git::{GitEffect, GitResponse};
use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     responses: HashMap<GitHubEffect, GitHubResponse>,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     type Error = String;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         self.responses.get(&effect)
///             .cloned()
///             .ok_or_else(|| format!("unexpected effect: {:?}", effect))
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}

/// Interprets Git effects against local working copies.
///
/// Implementations serialize effects per repository: a working copy is
/// shared by every PR of that repository.
pub trait GitInterpreter {
    /// The error type returned by this interpreter.
    ///
    /// Its `Display` output is shown to users verbatim when a merge fails.
    type Error;

    /// Execute a Git effect and return its response.
    fn interpret(
        &self,
        effect: GitEffect,
    ) -> impl Future<Output = Result<GitResponse, Self::Error>> + Send;
}
