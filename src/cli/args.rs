use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "mailroom")]
#[command(about = "Front-desk package intake and pickup with an offline queue")]
#[command(long_about = "mailroom - package and mailbox management for the front desk

Scan packages in, hand them out with a signature, and keep working when the
backend is unreachable: writes made offline are queued on this device and
replayed in order once connectivity returns.

QUICK START:
  mailroom intake 1Z999AA10123456784 --tenant 42    Record a package
  mailroom mailbox search lovelace                  Find a mailbox
  mailroom queue status                             Pending operations
  mailroom sync                                     Replay the queue now

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Treat the host as offline: writes are queued, nothing is sent
    #[arg(long, global = true)]
    pub offline: bool,

    /// Backend base URL (overrides `api.base_url`)
    #[arg(long, global = true, env = "MAILROOM_API_URL")]
    pub api_url: Option<String>,

    /// Data directory holding config.yaml and mailroom.db
    #[arg(long, global = true, env = "MAILROOM_HOME")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a received package
    ///
    /// Sent immediately when online; queued for sync otherwise.
    ///
    /// # Examples
    ///
    ///   mailroom intake 1Z999AA10123456784 --tenant 42
    ///   mailroom intake 9400111899223 --tenant 42 --carrier USPS --mailbox 7
    Intake(IntakeArgs),

    /// Hand packages over to a tenant
    ///
    /// # Examples
    ///
    ///   mailroom pickup --tenant 42 --package 101 --package 102 \
    ///       --name "Ada Lovelace" --signature @signature.txt
    Pickup(PickupArgs),

    /// Attach a signature to a package
    Signature(SignatureArgs),

    /// Replay queued operations now
    ///
    /// Operations are sent oldest first; the pass stops at the first one
    /// the backend does not accept.
    Sync,

    /// Inspect or clear the offline queue
    ///
    /// # Subcommands
    ///
    ///   status   Pending count, oldest entry, last sync
    ///   list     Show queued operations in replay order
    ///   clear    Drop every queued operation
    Queue(QueueArgs),

    /// Search the mailbox directory
    ///
    /// # Subcommands
    ///
    ///   search      Find mailboxes by number or tenant name
    ///   reload      Refetch the directory now
    ///   invalidate  Drop the cached directory
    Mailbox(MailboxArgs),

    /// Manage the config file
    ///
    /// # Subcommands
    ///
    ///   init   Write a config file with every default filled in
    ///   show   Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for package intake.
#[derive(Args)]
pub struct IntakeArgs {
    /// Carrier tracking number
    pub tracking_number: String,

    /// Receiving tenant ID
    #[arg(long, short = 't')]
    pub tenant: i64,

    /// Carrier name (UPS, FedEx, USPS, ...)
    #[arg(long, short = 'c')]
    pub carrier: Option<String>,

    /// Mailbox ID, recorded with the queued operation
    #[arg(long, short = 'm')]
    pub mailbox: Option<i64>,
}

/// Arguments for package pickup.
#[derive(Args)]
pub struct PickupArgs {
    /// Tenant collecting the packages
    #[arg(long, short = 't')]
    pub tenant: i64,

    /// Package ID (repeat for several)
    #[arg(long = "package", short = 'p', required = true)]
    pub packages: Vec<i64>,

    /// Name of the person collecting
    #[arg(long, short = 'n')]
    pub name: String,

    /// Signature data, or @FILE to read it from a file
    #[arg(long, short = 's')]
    pub signature: String,

    /// Mailbox ID, recorded with the queued operation
    #[arg(long, short = 'm')]
    pub mailbox: Option<i64>,
}

/// Arguments for signature capture.
#[derive(Args)]
pub struct SignatureArgs {
    /// Package the signature belongs to
    #[arg(long, short = 'p')]
    pub package: i64,

    /// Signature data, or @FILE to read it from a file
    #[arg(long, short = 's')]
    pub signature: String,

    /// Capture time (RFC 3339); defaults to now
    #[arg(long)]
    pub captured_at: Option<String>,
}

/// Arguments for queue commands.
#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

/// Queue subcommands.
#[derive(Subcommand)]
pub enum QueueCommands {
    /// Show queue status
    Status,

    /// List queued operations in replay order
    List {
        /// Maximum operations to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Drop every queued operation
    ///
    /// Queued writes that were never sent are lost.
    Clear {
        /// Confirm clearing
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for mailbox commands.
#[derive(Args)]
pub struct MailboxArgs {
    #[command(subcommand)]
    pub command: MailboxCommands,
}

/// Mailbox subcommands.
#[derive(Subcommand)]
pub enum MailboxCommands {
    /// Find mailboxes by number or tenant name
    Search {
        /// Text to match (case-insensitive)
        query: String,

        /// Maximum results (defaults to `cache.search_limit`)
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Refetch the mailbox directory
    Reload,

    /// Drop the cached mailbox directory
    Invalidate,
}

/// Arguments for config commands.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}
