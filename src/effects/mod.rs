//! Effects-as-data for GitHub and Git operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Orchestration logic that is independent of the network and the git binary
//! - Testability via mock interpreters
//! - Logging/tracing of intended operations

pub mod git;
pub mod github;
pub mod host;
pub mod interpreter;

pub use git::{CommitIdentity, GitEffect, GitResponse, SquashRequest};
pub use github::{GitHubEffect, GitHubResponse, PrData, UserProfile};
pub use host::{Host, HostError};
pub use interpreter::{GitHubInterpreter, GitInterpreter};
