//! Feature implementations for mailroom.
//!
//! - Offline operation queue and sync replay
//! - Mailbox/tenant lookup cache

pub mod mailbox;
pub mod offline;
