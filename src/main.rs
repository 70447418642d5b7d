use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use mailroom::api::{Backend, HttpBackend};
use mailroom::cli::args::{Cli, Commands};
use mailroom::cli::commands;
use mailroom::config::{ColorSetting, Config, Paths};
use mailroom::features::mailbox::{CacheSettings, MailboxCache};
use mailroom::features::offline::OfflineManager;
use mailroom::storage::Database;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MAILROOM_LOG";

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = match &cli.data_dir {
        Some(dir) => Paths::with_root(dir.clone()),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;

    let mut config = Config::load_from_path(&paths.config_file)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    match config.general.color {
        ColorSetting::Always => colored::control::set_override(true),
        ColorSetting::Never => colored::control::set_override(false),
        ColorSetting::Auto => {},
    }

    let format = cli.output.unwrap_or(config.general.default_output);
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config.api)?);
    let db = Database::open_at(&paths.database)
        .with_context(|| format!("opening {}", paths.database.display()))?;
    let manager = OfflineManager::new(db.clone(), Arc::clone(&backend), !cli.offline);

    let output = match cli.command {
        Commands::Intake(args) => commands::intake(&manager, args, format).await?,
        Commands::Pickup(args) => commands::pickup(&manager, args, format).await?,
        Commands::Signature(args) => commands::signature(&manager, args, format).await?,
        Commands::Sync => commands::sync(&manager, format).await?,
        Commands::Queue(args) => commands::queue(manager.queue(), args.command, format)?,
        Commands::Config(args) => commands::config(&paths, &config, args.command, format)?,
        Commands::Mailbox(args) => {
            let mut cache = MailboxCache::load(db, backend, CacheSettings::from(&config.cache));
            commands::mailbox(&mut cache, args.command, format).await?
        },
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
