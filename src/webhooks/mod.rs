//! Webhook handling for GitHub events.
//!
//! - Signature verification of deliveries (HMAC-SHA256, HMAC-SHA1 fallback)
//! - Parsing of the `issue_comment` and `pull_request` events the bot acts on
//!
//! # Example
//!
//! ```
//! use merge_gate::webhooks::{GitHubEvent, parse_webhook};
//!
//! let payload = br#"{
//!     "action": "closed",
//!     "number": 7,
//!     "pull_request": {"number": 7, "head": {"sha": "0123456789abcdef0123456789abcdef01234567"}},
//!     "repository": {"full_name": "octo/widgets"}
//! }"#;
//! let event = parse_webhook("pull_request", payload).unwrap().unwrap();
//! assert!(matches!(event, GitHubEvent::PullRequest(_)));
//! ```

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{
    CommentAction, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent,
};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    SignatureAlgorithm, compute_signature, format_signature_header, parse_signature_header,
    verify_delivery, verify_signature,
};
