//! Path resolution for mailroom configuration and data files.
//!
//! All mailroom data is stored in `~/.mailroom/` unless `MAILROOM_HOME`
//! points elsewhere:
//! - `config.yaml` - Main configuration file
//! - `mailroom.db` - Device storage (pending operations, mailbox cache)

use std::path::PathBuf;

use crate::error::MailroomError;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "MAILROOM_HOME";

/// Paths to mailroom configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.mailroom/`
    pub root: PathBuf,
    /// Config file: `~/.mailroom/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.mailroom/mailroom.db`
    pub database: PathBuf,
}

impl Paths {
    /// Create paths based on `MAILROOM_HOME` or the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, MailroomError> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME").map_err(|_| {
            MailroomError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".mailroom")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("mailroom.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), MailroomError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                MailroomError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_root(PathBuf::from(".mailroom")))
    }
}
