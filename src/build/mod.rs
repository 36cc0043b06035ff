//! CI build triggering.
//!
//! A `rebuild` command queues one TeamCity build per configured build type on
//! the PR's `pull/<n>` branch.

mod teamcity;

use std::future::Future;

use crate::types::PrNumber;

pub use teamcity::{BuildTriggerError, TeamCityConfig, TeamCityTrigger, build_request_xml};

/// Queues CI builds for a pull request.
pub trait BuildTrigger {
    /// Shown to the user when triggering fails.
    type Error: std::fmt::Display;

    /// Queues every configured build for `pr`.
    ///
    /// All builds are attempted even if one fails; the first error is
    /// returned.
    fn trigger(&self, pr: PrNumber) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
