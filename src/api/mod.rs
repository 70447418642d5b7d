//! Backend API collaborator.
//!
//! The REST backend is the system of record. This module holds the request
//! shapes it accepts, the `Backend` trait the rest of the crate talks to,
//! and an HTTP implementation.

mod backend;
mod http;
pub mod types;

#[cfg(test)]
pub use backend::MockBackend;
pub use backend::Backend;
pub use http::HttpBackend;
pub use types::{Mailbox, PackageIntake, PackagePickup, SignatureCapture, Tenant};
