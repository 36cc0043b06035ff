//! Command parsing for bot commands.
//!
//! Users talk to the bot by addressing it on the first line of a PR comment:
//!
//! - `@{bot_name}: merge` (or `squash`) - squash-merge once the build is green
//! - `@{bot_name}: lgtm` - record an approval; merges at the approval threshold
//! - `@{bot_name}: stop` - mark the PR as not to be merged
//! - `@{bot_name}: build` (or `rebuild`) - trigger the external builds
//!
//! Lines after the command may override the squash commit message (first
//! non-blank line is the subject, the rest the description), and
//! `Skip-Check: <context> ...` lines exclude status contexts from gating.
//!
//! # Example
//!
//! ```
//! use merge_gate::commands::{Command, parse_body};
//!
//! let parsed = parse_body("@merge-gate: squash please\n\nFix the frobnicator");
//! assert!(parsed.is_addressed_to("merge-gate"));
//! assert_eq!(Command::from_verb(&parsed.verb), Command::Merge);
//! assert_eq!(parsed.subject, "Fix the frobnicator");
//! ```

mod fields;
mod parser;
mod reflow;
mod types;

pub use fields::{field_values, skip_checks};
pub use parser::{ParsedCommand, parse_body};
pub use reflow::{COMMIT_BODY_WIDTH, override_message, reflow};
pub use types::Command;
