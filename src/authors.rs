//! Authors file lookup.
//!
//! The authors file maps GitHub logins to commit identities, one per line:
//!
//! ```text
//! Jane Doe (janedoe) <jane@example.com>
//! Frobble Banana, Jr. (froba) <frobble.jr@example.com>
//! ```
//!
//! Fields are whitespace-delimited with no escaping: the display name is
//! everything before the parenthesised login, and the email is the field
//! after it with its surrounding brackets removed.

use std::path::Path;

use thiserror::Error;

/// One line of the authors file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub login: String,
    pub name: String,
    pub email: String,
}

/// Errors from authors file lookup.
#[derive(Debug, Error)]
pub enum AuthorsError {
    /// The file could not be read.
    #[error("reading authors file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No line in the file has the requested login.
    #[error("{0} not found in authors file")]
    NotFound(String),
}

/// Parses every well-formed line of an authors file.
///
/// Lines without a `(login)` field followed by an email field are skipped.
pub fn parse_authors(contents: &str) -> Vec<AuthorRecord> {
    contents.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<AuthorRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let idx = fields
        .iter()
        .position(|f| f.len() > 2 && f.starts_with('(') && f.ends_with(')'))?;

    let login = &fields[idx][1..fields[idx].len() - 1];
    let email_field = fields.get(idx + 1)?;
    let mut chars = email_field.chars();
    chars.next();
    chars.next_back();
    let email = chars.as_str();
    if email.is_empty() {
        return None;
    }

    Some(AuthorRecord {
        login: login.to_string(),
        name: fields[..idx].join(" "),
        email: email.to_string(),
    })
}

/// Looks up `login` in the authors file at `path`.
pub async fn lookup_author(path: &Path, login: &str) -> Result<AuthorRecord, AuthorsError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AuthorsError::Io {
            path: path.display().to_string(),
            source,
        })?;

    parse_authors(&contents)
        .into_iter()
        .find(|record| record.login == login)
        .ok_or_else(|| AuthorsError::NotFound(login.to_string()))
}
