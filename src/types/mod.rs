//! Core domain types for the merge gate.

pub mod ids;

pub use ids::{CommentId, DeliveryId, PrNumber, RepoId, Sha};
