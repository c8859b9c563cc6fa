//! Clap derive structures for the `bcfsync` CLI.
//!
//! Kept free of crate-internal imports so `build.rs` can include it to
//! render man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bcfsync -- keep BCF controller topology in step with the orchestrator
#[derive(Debug, Parser)]
#[command(
    name = "bcfsync",
    version,
    about = "Synchronize orchestrator network topology to BCF SDN controllers",
    long_about = "Builds the full desired topology of a physical network from an\n\
        inventory file and pushes it to the master of a BCF controller pair,\n\
        tracking the controller's topology hash between runs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "BCFSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "BCFSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BCFSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BCFSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BCFSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show reachability and mastership of each controller
    #[command(alias = "st")]
    Status,

    /// List the capabilities each controller advertises
    #[command(alias = "caps")]
    Capabilities,

    /// Build and print the topology snapshot without contacting controllers
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Push the full topology to the master controller
    Sync(SyncArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Snapshot / Sync ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Inventory JSON (overrides profile)
    #[arg(long, short = 'i')]
    pub inventory: Option<PathBuf>,

    /// Physical network id (overrides profile)
    #[arg(long)]
    pub physical_network: Option<String>,

    /// Include the external network used for NAT
    #[arg(long)]
    pub nat: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Inventory JSON (overrides profile); committed hashes are written back
    #[arg(long, short = 'i')]
    pub inventory: Option<PathBuf>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
