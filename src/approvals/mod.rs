//! Durable approval ("LGTM") records.
//!
//! Approvals live in an SQLite table used as a key-value bucket:
//! the key is `pr-<number>` and the value is a JSON array of logins in the
//! order they approved. A login appears at most once per key.
//!
//! SQLite is synchronous, so every operation runs on the blocking pool via
//! `tokio::task::spawn_blocking` and holds the connection lock only for the
//! duration of one transaction.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use thiserror::Error;
use tracing::debug;

use crate::types::PrNumber;

/// Errors from the approval store.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// SQLite reported an error.
    #[error("approval database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value is not a JSON array of logins.
    #[error("corrupt approval record for {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Creating the database directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task running the query panicked or was cancelled.
    #[error("approval task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The connection mutex was poisoned by a panic in another task.
    #[error("approval database lock poisoned")]
    Poisoned,
}

/// Approval store backed by SQLite.
#[derive(Clone)]
pub struct ApprovalStore {
    conn: Arc<Mutex<Connection>>,
}

impl ApprovalStore {
    /// Opens (or creates) the approval database at `path`.
    ///
    /// The `lgtm` bucket is created if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ApprovalError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %journal_mode, "Opened approval database");
        conn.execute_batch(
            r#"
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> Result<Self, ApprovalError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, ApprovalError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS lgtm (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(ApprovalStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Records that `login` approved `pr`, if it has not already.
    ///
    /// Read, append and write happen in one immediate transaction. Returns the
    /// approval list as stored after the call.
    pub async fn record_approval(
        &self,
        pr: PrNumber,
        login: &str,
    ) -> Result<Vec<String>, ApprovalError> {
        let conn = self.conn.clone();
        let key = pr.approval_key();
        let login = login.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| ApprovalError::Poisoned)?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut logins = read_logins(&tx, &key)?;
            if !logins.contains(&login) {
                logins.push(login);
                let value = serde_json::to_string(&logins).map_err(|source| {
                    ApprovalError::Corrupt {
                        key: key.clone(),
                        source,
                    }
                })?;
                tx.execute(
                    "INSERT OR REPLACE INTO lgtm (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
            }
            tx.commit()?;

            debug!(key = %key, approvals = ?logins, "Recorded approval");
            Ok(logins)
        })
        .await?
    }

    /// Returns the logins that approved `pr`, in approval order.
    ///
    /// A PR nobody approved yet has an empty list.
    pub async fn approvals(&self, pr: PrNumber) -> Result<Vec<String>, ApprovalError> {
        let conn = self.conn.clone();
        let key = pr.approval_key();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| ApprovalError::Poisoned)?;
            read_logins(&conn, &key)
        })
        .await?
    }
}

impl std::fmt::Debug for ApprovalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalStore").finish_non_exhaustive()
    }
}

fn read_logins(conn: &Connection, key: &str) -> Result<Vec<String>, ApprovalError> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM lgtm WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(json) => serde_json::from_str(&json).map_err(|source| ApprovalError::Corrupt {
            key: key.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}
