//! Command-line interface for mailroom.

pub mod args;
pub mod commands;
