//! Comment bodies the bot posts.

use std::fmt::Display;
use std::time::Duration;

use super::poll::format_duration;
use crate::status::Verdict;
use crate::types::Sha;

pub fn no_access(sender: &str) -> String {
    format!(":hand: I'm sorry, @{sender}. I'm afraid I can't do that.")
}

pub fn unknown_command(sender: &str) -> String {
    format!(
        "I'm sorry, @{sender}. I'm afraid I don't know what you mean. I know how to `merge` things!"
    )
}

pub fn already_pending(sender: &str) -> String {
    format!(":hourglass: @{sender}, I'm already working on merging this one. Hang tight!")
}

pub fn approval_noted(sender: &str, count: usize, threshold: usize) -> String {
    format!(":+1: Thanks, @{sender}! That's {count} of the {threshold} LGTMs needed to merge.")
}

pub fn waiting() -> String {
    ":clock1: Build status is `pending`. I'll wait to see if this becomes successful and then merge!"
        .to_string()
}

pub fn bad_build(verdict: Verdict) -> String {
    format!(":no_good: Build status is `{verdict}` -- refusing to merge.")
}

pub fn timed_out(ceiling: Duration) -> String {
    format!(
        ":watch: Patiently waited {} for the build status to turn green, but enough is enough. Let me know when things look good.",
        format_duration(ceiling)
    )
}

pub fn not_merging(sender: &str) -> String {
    format!(":stop_sign: OK, @{sender}. Marked as not to be merged as is.")
}

pub fn no_user(sender: &str) -> String {
    format!(":question: Couldn't retrieve user information for @{sender} - not merging.")
}

pub fn merged(sha: &Sha, author: &str) -> String {
    format!(":ok_hand: Merged as {sha}. Thanks, @{author}!")
}

pub fn merge_failed(output: &str) -> String {
    format!(":no_entry: Merge failed:\n\n```\n{output}\n```\n")
}

pub fn build_failed(error: impl Display) -> String {
    format!(":construction: Couldn't trigger a build: {error}")
}
