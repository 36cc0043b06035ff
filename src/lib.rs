//! Merge Gate - a ChatOps bot that squash-merges pull requests on command.
//!
//! Collaborators address the bot in a PR comment (`@merge-gate: merge`). The
//! bot checks their permission, waits for the build to go green and then
//! squash-merges the PR with its local git working copy.

pub mod approvals;
pub mod authors;
pub mod build;
pub mod commands;
pub mod config;
pub mod effects;
pub mod git;
pub mod github;
pub mod orchestrator;
pub mod permissions;
pub mod server;
pub mod status;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
