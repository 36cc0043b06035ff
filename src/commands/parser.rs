//! Parser for comment bodies addressed to the bot.
//!
//! A comment body has the shape:
//!
//! ```text
//! @merge-gate: merge
//!
//! Optional subject line
//!
//! Optional description, possibly spanning
//! several lines.
//! ```
//!
//! The parser is total: malformed input yields empty fields, never an error.

use serde::{Deserialize, Serialize};

/// A comment body split into addressee, verb and optional commit-message override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// Login the first line is addressed to (`@name` or `@name:`), or empty.
    pub recipient: String,
    /// The remaining words of the first line, joined by single spaces.
    pub verb: String,
    /// First non-blank line after the command line.
    pub subject: String,
    /// Everything after the subject, with surrounding blank lines removed.
    pub description: String,
}

impl ParsedCommand {
    /// Returns true if the comment is addressed to `username` (ASCII case-insensitive).
    pub fn is_addressed_to(&self, username: &str) -> bool {
        !self.recipient.is_empty() && self.recipient.eq_ignore_ascii_case(username)
    }
}

/// Parses a raw comment body.
///
/// # Examples
///
/// ```
/// use merge_gate::commands::parse_body;
///
/// let parsed = parse_body("@bot: merge this\n\nSubject line\n\nBody line 1\nBody line 2");
/// assert_eq!(parsed.recipient, "bot");
/// assert_eq!(parsed.verb, "merge this");
/// assert_eq!(parsed.subject, "Subject line");
/// assert_eq!(parsed.description, "Body line 1\nBody line 2");
///
/// let parsed = parse_body("no addressee here");
/// assert_eq!(parsed.recipient, "");
/// assert_eq!(parsed.verb, "no addressee here");
/// ```
pub fn parse_body(body: &str) -> ParsedCommand {
    let mut lines = body.lines();
    let first = lines.next().unwrap_or("");
    let (recipient, verb) = split_command_line(first);

    let mut rest = lines.skip_while(|line| is_blank(line));
    let subject = rest.next().map(|line| line.trim().to_string()).unwrap_or_default();

    let mut remaining: Vec<&str> = rest.skip_while(|line| is_blank(line)).collect();
    while remaining.last().is_some_and(|line| is_blank(line)) {
        remaining.pop();
    }

    ParsedCommand {
        recipient,
        verb,
        subject,
        description: remaining.join("\n"),
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Splits the first line into the addressee and the remaining words.
///
/// The addressee token is `@` followed by one or more characters that are
/// neither whitespace nor `:`, optionally followed by a single `:`. Only the
/// first such token counts; any text glued to it in the same word is kept.
fn split_command_line(line: &str) -> (String, String) {
    let mut recipient = String::new();
    let mut words = Vec::new();

    for word in line.split_whitespace() {
        if recipient.is_empty() {
            if let Some((name, leftover)) = extract_mention(word) {
                recipient = name.to_string();
                if !leftover.is_empty() {
                    words.push(leftover);
                }
                continue;
            }
        }
        words.push(word.to_string());
    }

    (recipient, words.join(" "))
}

/// Finds `@name[:]` inside a whitespace-free word.
///
/// Returns the name and whatever text surrounds the token.
fn extract_mention(word: &str) -> Option<(&str, String)> {
    let mut search = 0;
    while let Some(offset) = word[search..].find('@') {
        let at = search + offset;
        let after = &word[at + 1..];
        let name_len = after.find(':').unwrap_or(after.len());
        if name_len > 0 {
            let name = &after[..name_len];
            let tail = after[name_len..].strip_prefix(':').unwrap_or(&after[name_len..]);
            return Some((name, format!("{}{}", &word[..at], tail)));
        }
        search = at + 1;
    }
    None
}
