//! Config file commands.

use serde_json::json;

use crate::cli::args::{ConfigCommands, OutputFormat};
use crate::config::{Config, Paths};
use crate::error::MailroomError;
use crate::output::to_json;

/// Execute config subcommands.
///
/// `config` is the effective configuration, overrides included.
///
/// # Errors
///
/// Returns an error if the file already exists without `--force`, or if it
/// cannot be written.
pub fn config(
    paths: &Paths,
    config: &Config,
    cmd: ConfigCommands,
    format: OutputFormat,
) -> Result<String, MailroomError> {
    match cmd {
        ConfigCommands::Init { force } => init(paths, force, format),
        ConfigCommands::Show => match format {
            OutputFormat::Json => to_json(config),
            OutputFormat::Pretty => serde_yaml::to_string(config)
                .map(|yaml| yaml.trim_end().to_string())
                .map_err(|e| MailroomError::Config(format!("Failed to serialize config: {e}"))),
        },
    }
}

fn init(paths: &Paths, force: bool, format: OutputFormat) -> Result<String, MailroomError> {
    if paths.config_file.exists() && !force {
        return Err(MailroomError::Config(format!(
            "{} already exists; use --force to overwrite it",
            paths.config_file.display()
        )));
    }

    Config::default().save_to_path(&paths.config_file)?;

    match format {
        OutputFormat::Json => to_json(&json!({"written": paths.config_file.display().to_string()})),
        OutputFormat::Pretty => Ok(format!("Wrote {}", paths.config_file.display())),
    }
}
