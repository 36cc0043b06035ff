//! Build status aggregation.
//!
//! GitHub reports commit statuses per context (one stream per CI job). The
//! merge gate reduces the latest report of every relevant context to one
//! [`Verdict`] under a [`CheckPolicy`] of skipped and required contexts.

pub mod aggregate;

pub use aggregate::{
    CheckPolicy, StatusReport, StatusState, Verdict, aggregate, latest_per_context,
};
