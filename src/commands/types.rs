//! Command verbs understood by the bot.

use serde::{Deserialize, Serialize};

/// A command verb, decided once from the first line of an addressed comment.
///
/// Classification matches on prefixes of the lower-cased verb, so
/// `merge please` and `squash it` are both [`Command::Merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// `merge` / `squash`: squash-merge once the build is green.
    Merge,

    /// `lgtm`: record an approval; merges once enough approvals exist.
    Lgtm,

    /// `stop`: mark the PR as not to be merged.
    Stop,

    /// `build` / `rebuild`: trigger the configured external builds.
    Rebuild,

    /// Anything else addressed to the bot.
    Unknown,
}

impl Command {
    /// Classifies a verb string.
    pub fn from_verb(verb: &str) -> Command {
        let verb = verb.to_lowercase();
        if verb.starts_with("merge") || verb.starts_with("squash") {
            Command::Merge
        } else if verb.starts_with("lgtm") {
            Command::Lgtm
        } else if verb.starts_with("stop") {
            Command::Stop
        } else if verb.starts_with("build") || verb.starts_with("rebuild") {
            Command::Rebuild
        } else {
            Command::Unknown
        }
    }

    /// Returns true if issuing this command requires repository permission.
    pub fn is_privileged(&self) -> bool {
        !matches!(self, Command::Unknown)
    }
}
