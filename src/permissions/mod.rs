//! Who may issue privileged commands.
//!
//! A login is allowed if it is on the static always-allowed list or is a
//! collaborator on the repository. Collaborator lists are cached per
//! repository and only refreshed when a check against the cache fails, so a
//! newly added collaborator is picked up on their first command.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::effects::{GitHubInterpreter, Host};
use crate::types::RepoId;

#[derive(Debug, Default)]
pub struct PermissionResolver {
    always_allowed: Vec<String>,
    collaborators: Mutex<HashMap<RepoId, Vec<String>>>,
}

impl PermissionResolver {
    pub fn new(always_allowed: Vec<String>) -> Self {
        Self {
            always_allowed,
            collaborators: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether `login` may issue privileged commands on `repo`.
    ///
    /// Fails closed: if the collaborator list can't be refreshed, the answer
    /// is no.
    pub async fn is_allowed<G>(&self, github: &G, repo: &RepoId, login: &str) -> bool
    where
        G: GitHubInterpreter + Sync,
        G::Error: Display,
    {
        if self.always_allowed.iter().any(|user| user == login) {
            return true;
        }
        if self.cached_contains(repo, login) {
            return true;
        }

        debug!(repo = %repo, "refreshing collaborators");
        let fetched = match Host::new(github).collaborators(repo).await {
            Ok(logins) => logins,
            Err(e) => {
                warn!(repo = %repo, login = %login, error = %e, "collaborator refresh failed, denying");
                return false;
            }
        };
        let logins = normalize(fetched);
        debug!(repo = %repo, count = logins.len(), "collaborators refreshed");

        let allowed = logins.binary_search_by(|user| user.as_str().cmp(login)).is_ok();
        self.lock().insert(repo.clone(), logins);

        if !allowed {
            info!(repo = %repo, login = %login, "permission denied");
        }
        allowed
    }

    /// The cached collaborators for `repo`, if it has ever been fetched.
    pub fn cached(&self, repo: &RepoId) -> Option<Vec<String>> {
        self.lock().get(repo).cloned()
    }

    fn cached_contains(&self, repo: &RepoId, login: &str) -> bool {
        self.lock()
            .get(repo)
            .is_some_and(|users| users.iter().any(|user| user == login))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RepoId, Vec<String>>> {
        self.collaborators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sorts and deduplicates a collaborator listing.
fn normalize(mut logins: Vec<String>) -> Vec<String> {
    logins.sort();
    logins.dedup();
    logins
}
