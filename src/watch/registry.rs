//! In-memory watch list shared by the bot and the discount watcher.
//!
//! All state lives behind one lock, so an entry's membership and its last
//! notified percentage are always created, reset and removed together.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::models::AppId;
use crate::watch::policy::{decide, Decision, DiscountEndPolicy, RewatchPolicy};

/// Chat the notifications go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WatchError {
    #[error("user {user} is not watching app {app_id}")]
    NotFound { user: UserId, app_id: AppId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchEntry {
    pub app_id: AppId,
    pub last_notified_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyWatching,
    /// Existing entry whose notification history was cleared.
    Reset,
}

pub struct WatchRegistry {
    rewatch: RewatchPolicy,
    inner: RwLock<HashMap<UserId, BTreeMap<AppId, WatchEntry>>>,
}

impl WatchRegistry {
    pub fn new(rewatch: RewatchPolicy) -> Self {
        Self {
            rewatch,
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_watch(&self, user: UserId, app_id: AppId) -> AddOutcome {
        let mut inner = self.inner.write().await;
        let entries = inner.entry(user).or_default();

        let outcome = match entries.get_mut(&app_id) {
            None => {
                entries.insert(
                    app_id,
                    WatchEntry {
                        app_id,
                        last_notified_percent: 0,
                    },
                );
                AddOutcome::Added
            }
            Some(entry) => match self.rewatch {
                RewatchPolicy::Preserve => AddOutcome::AlreadyWatching,
                RewatchPolicy::Reset => {
                    entry.last_notified_percent = 0;
                    AddOutcome::Reset
                }
            },
        };

        debug!(%user, app_id, ?outcome, "Watch registered");
        outcome
    }

    /// Returns true if the pair existed.
    pub async fn remove_watch(&self, user: UserId, app_id: AppId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(entries) = inner.get_mut(&user) else {
            return false;
        };

        let removed = entries.remove(&app_id).is_some();
        if entries.is_empty() {
            inner.remove(&user);
        }
        removed
    }

    pub async fn list_watches(&self, user: UserId) -> BTreeSet<AppId> {
        let inner = self.inner.read().await;
        inner
            .get(&user)
            .map(|entries| entries.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every registered (user, app) pair.
    pub async fn snapshot(&self) -> Vec<(UserId, AppId)> {
        let inner = self.inner.read().await;
        inner
            .iter()
            .flat_map(|(user, entries)| entries.keys().map(move |app_id| (*user, *app_id)))
            .collect()
    }

    pub async fn watch_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.values().map(BTreeMap::len).sum()
    }

    pub async fn get_last_notified(&self, user: UserId, app_id: AppId) -> Result<u8, WatchError> {
        let inner = self.inner.read().await;
        inner
            .get(&user)
            .and_then(|entries| entries.get(&app_id))
            .map(|entry| entry.last_notified_percent)
            .ok_or(WatchError::NotFound { user, app_id })
    }

    pub async fn set_last_notified(
        &self,
        user: UserId,
        app_id: AppId,
        percent: u8,
    ) -> Result<(), WatchError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .get_mut(&user)
            .and_then(|entries| entries.get_mut(&app_id))
            .ok_or(WatchError::NotFound { user, app_id })?;
        entry.last_notified_percent = percent;
        Ok(())
    }

    /// Read, decide and write the stored percentage in one critical section.
    pub async fn apply_discount(
        &self,
        user: UserId,
        app_id: AppId,
        observed: u8,
        on_end: DiscountEndPolicy,
    ) -> Result<Decision, WatchError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .get_mut(&user)
            .and_then(|entries| entries.get_mut(&app_id))
            .ok_or(WatchError::NotFound { user, app_id })?;

        let decision = decide(entry.last_notified_percent, observed, on_end);
        if let Some(stored) = decision.new_stored() {
            entry.last_notified_percent = stored;
        }
        Ok(decision)
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new(RewatchPolicy::default())
    }
}
