//! Command implementations for mailroom.
//!
//! Every command returns the text to print, rendered for the requested
//! output format.

mod config;
mod mailbox;
mod package;
mod queue;

pub use config::config;
pub use mailbox::mailbox;
pub use package::{intake, pickup, signature};
pub use queue::{queue, sync};
