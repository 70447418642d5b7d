//! Configuration management for mailroom.
//!
//! This module handles loading configuration from `~/.mailroom/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{ApiConfig, CacheConfig, ColorSetting, Config, GeneralConfig};
