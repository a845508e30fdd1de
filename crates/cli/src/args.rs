//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// reel-radar: Telegram bot that ranks the movies a group asks for each day
#[derive(Parser, Debug)]
#[command(name = "reel-radar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest group messages and send the daily report on schedule
    Run(RunArgs),

    /// Run the request heuristic over a text
    Classify(ClassifyArgs),

    /// Build, send and purge a report now
    Report(ReportArgs),

    /// Show today's counters
    Stats(StatsArgs),

    /// Manage monitored chats
    Chats(ChatsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Build reports without sending or purging
    #[arg(long)]
    pub dry_run: bool,

    /// Process one poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Write reports to this outbox file instead of sending them
    #[arg(long)]
    pub outbox: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Text to classify
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing text to classify, one message per line (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Report on this local date (YYYY-MM-DD) instead of the configured day
    #[arg(long)]
    pub date: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep the reported records
    #[arg(long)]
    pub no_purge: bool,

    /// Print the report without sending or purging
    #[arg(long)]
    pub dry_run: bool,

    /// Write the report to this outbox file instead of sending it
    #[arg(long)]
    pub outbox: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChatsArgs {
    #[command(subcommand)]
    pub command: ChatsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ChatsCommands {
    /// Start monitoring a chat
    Add {
        /// Telegram chat ID (group IDs are negative)
        #[arg(allow_hyphen_values = true)]
        chat_id: i64,

        /// Admin user ID recorded with the chat
        #[arg(long)]
        added_by: Option<i64>,
    },

    /// Stop monitoring a chat
    Remove {
        /// Telegram chat ID
        #[arg(allow_hyphen_values = true)]
        chat_id: i64,
    },

    /// List monitored chats
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Check specific component (config, store, schedule, telegram, report)
    #[arg(long)]
    pub check: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
