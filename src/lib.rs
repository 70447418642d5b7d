//! mailroom - front-desk package management with an offline write queue
//!
//! Package intake, pickup and signature capture are sent to the backend when
//! it is reachable and queued in device storage when it is not. Queued writes
//! are replayed in order once connectivity returns. A separate read-side cache
//! keeps the mailbox directory searchable without a round trip.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::MailroomError;
pub use features::offline::OfflineManager;
