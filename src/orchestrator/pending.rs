//! PRs with a merge attempt in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::{PrNumber, RepoId};

type Key = (RepoId, PrNumber);

/// The set of PRs currently being merged or waited on.
///
/// Membership is taken with [`PendingSet::try_claim`] and released when the
/// returned [`PendingClaim`] is dropped, on every exit path.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    inner: Arc<Mutex<HashSet<Key>>>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `pr`, or returns `None` if it is already claimed.
    pub fn try_claim(&self, repo: &RepoId, pr: PrNumber) -> Option<PendingClaim> {
        let key = (repo.clone(), pr);
        let inserted = self.lock().insert(key.clone());
        inserted.then(|| PendingClaim {
            set: self.clone(),
            key,
        })
    }

    pub fn contains(&self, repo: &RepoId, pr: PrNumber) -> bool {
        self.lock().contains(&(repo.clone(), pr))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Key>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive membership of one PR in a [`PendingSet`].
#[derive(Debug)]
pub struct PendingClaim {
    set: PendingSet,
    key: Key,
}

impl PendingClaim {
    pub fn pr(&self) -> PrNumber {
        self.key.1
    }
}

impl Drop for PendingClaim {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}
