//! Read-side mailbox cache.
//!
//! Holds the full mailbox list for fast local lookups. The list is fetched
//! in one request, persisted with a `cachedAt` stamp per mailbox, and
//! refetched on the first access after the freshness window lapses or after
//! an explicit invalidation.
//!
//! The refetch runs inline on that access rather than in a background task.
//! A one-shot CLI process exits as soon as the command returns, which would
//! abandon a spawned refetch, so the access waits for it instead. When the
//! refetch fails the access is served from the stale list.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::search;
use crate::api::{Backend, Mailbox};
use crate::config::CacheConfig;
use crate::error::MailroomError;
use crate::storage::Database;

/// Storage key of the persisted mailbox snapshot.
pub const CACHE_KEY: &str = "mailbox_cache";

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// How long a fetched list is served without refetching.
    pub freshness: Duration,
    /// Default cap on search results.
    pub search_limit: usize,
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            freshness: config.freshness(),
            search_limit: config.search_limit,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedMailbox {
    #[serde(flatten)]
    mailbox: Mailbox,
    #[serde(rename = "cachedAt")]
    cached_at: i64,
}

/// Mailbox/tenant lookup cache for one session.
pub struct MailboxCache {
    db: Database,
    backend: Arc<dyn Backend>,
    settings: CacheSettings,
    mailboxes: Vec<Mailbox>,
    cached_at: Option<DateTime<Utc>>,
}

impl MailboxCache {
    /// Create a cache, restoring any persisted snapshot.
    ///
    /// An unreadable snapshot is logged and ignored.
    #[must_use]
    pub fn load(db: Database, backend: Arc<dyn Backend>, settings: CacheSettings) -> Self {
        let mut cache = Self {
            db,
            backend,
            settings,
            mailboxes: Vec::new(),
            cached_at: None,
        };
        cache.restore();
        cache
    }

    /// Number of cached mailboxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    /// When the cached list was fetched.
    #[must_use]
    pub const fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cached_at
    }

    /// Whether the cached list is still inside the freshness window.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    /// Freshness as of `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.cached_at.is_some_and(|at| {
            let age_ms = now.timestamp_millis() - at.timestamp_millis();
            u128::try_from(age_ms).is_ok_and(|age| age < self.settings.freshness.as_millis())
        })
    }

    /// Search with the configured result cap.
    pub async fn search(&mut self, query: &str) -> Vec<Mailbox> {
        let limit = self.settings.search_limit;
        self.search_with_limit(query, limit).await
    }

    /// Search, keeping at most `limit` results.
    ///
    /// A stale list is refetched first; if that fails the stale list is used.
    pub async fn search_with_limit(&mut self, query: &str, limit: usize) -> Vec<Mailbox> {
        self.ensure_fresh().await;
        search::search(&self.mailboxes, query, limit)
    }

    /// Look up a mailbox by id.
    pub async fn get(&mut self, mailbox_id: i64) -> Option<Mailbox> {
        self.ensure_fresh().await;
        self.mailboxes.iter().find(|m| m.id == mailbox_id).cloned()
    }

    /// Refetch the full list now.
    ///
    /// Returns the number of mailboxes cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails. The previous list is kept.
    pub async fn reload(&mut self) -> Result<usize, MailroomError> {
        let mailboxes = self.backend.fetch_mailboxes().await?;
        let now = Utc::now();

        self.persist(&mailboxes, now);
        self.mailboxes = mailboxes;
        self.cached_at = Some(now);

        debug!(count = self.mailboxes.len(), "Mailbox cache refreshed");
        Ok(self.mailboxes.len())
    }

    /// Drop the cached list so the next access refetches it.
    pub fn invalidate(&mut self) {
        self.mailboxes.clear();
        self.cached_at = None;
        if let Err(e) = self.db.remove_item(CACHE_KEY) {
            warn!(error = %e, "Could not remove persisted mailbox cache");
        }
    }

    async fn ensure_fresh(&mut self) {
        if self.is_fresh() {
            return;
        }
        if let Err(e) = self.reload().await {
            warn!(error = %e, cached = self.mailboxes.len(), "Mailbox refetch failed, serving cached data");
        }
    }

    fn restore(&mut self) {
        let raw = match self.db.get_item(CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Mailbox cache unavailable");
                return;
            },
        };

        let snapshot: BTreeMap<String, CachedMailbox> = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Mailbox cache is corrupt, ignoring it");
                return;
            },
        };

        self.cached_at = snapshot
            .values()
            .map(|entry| entry.cached_at)
            .min()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        self.mailboxes = snapshot.into_values().map(|entry| entry.mailbox).collect();
        self.mailboxes
            .sort_by(|a, b| search::compare_numbers(&a.mailbox_number, &b.mailbox_number));
    }

    fn persist(&self, mailboxes: &[Mailbox], at: DateTime<Utc>) {
        let cached_at = at.timestamp_millis();
        let snapshot: BTreeMap<String, CachedMailbox> = mailboxes
            .iter()
            .map(|m| {
                (
                    m.id.to_string(),
                    CachedMailbox {
                        mailbox: m.clone(),
                        cached_at,
                    },
                )
            })
            .collect();

        let result = serde_json::to_string(&snapshot)
            .map_err(MailroomError::from)
            .and_then(|json| self.db.set_item(CACHE_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Could not persist mailbox cache");
        }
    }
}
