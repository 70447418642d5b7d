//! Mailbox and tenant lookups.
//!
//! A best-effort local copy of the mailbox directory for search-as-you-type,
//! independent of the offline write queue.

mod cache;
pub mod search;

pub use cache::{CacheSettings, MailboxCache, CACHE_KEY};
pub use search::MatchRank;
