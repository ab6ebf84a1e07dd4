//! Clap derive structures for the `hostwatch` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hostwatch_core::{HostStatus, StatusFilter};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hostwatch -- live view of a machine registry
#[derive(Debug, Parser)]
#[command(
    name = "hostwatch",
    version,
    about = "Watch and manage hosts in a hostwatch registry",
    long_about = "Lists, registers and deletes monitored hosts, and renders a live\n\
        dashboard that follows the registry's status stream.",
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
    /// Registry base URL (e.g. http://localhost:8000)
    #[arg(long, short = 's', env = "HOSTWATCH_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format [default: table]
    #[arg(long, short = 'o', env = "HOSTWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto]
    #[arg(long, env = "HOSTWATCH_COLOR", global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// PEM file with the CA that signed the registry certificate
    #[arg(long, env = "HOSTWATCH_CA_CERT", global = true, value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "HOSTWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one host ID per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// `--status` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Every host
    #[default]
    All,
    /// Hosts answering probes
    Active,
    /// Hosts failing probes
    Unreachable,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::All => StatusFilter::ALL,
            StatusArg::Active => StatusFilter::only(HostStatus::Active),
            StatusArg::Unreachable => StatusFilter::only(HostStatus::Unreachable),
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, register and delete hosts
    #[command(alias = "h")]
    Hosts(HostsArgs),

    /// Live dashboard following the status stream
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Hosts ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HostsArgs {
    #[command(subcommand)]
    pub command: HostsCommand,
}

#[derive(Debug, Subcommand)]
pub enum HostsCommand {
    /// List hosts
    #[command(alias = "ls")]
    List {
        /// Only show hosts with this status
        #[arg(long, value_enum, default_value_t = StatusArg::All)]
        status: StatusArg,
    },

    /// Delete a host from the registry
    #[command(alias = "rm")]
    Delete {
        /// Host ID
        id: i64,
    },

    /// Register a host, or update the one with the same IP
    Register {
        /// IP address
        ip: String,

        /// Hostname
        #[arg(long)]
        hostname: String,

        /// MAC address
        #[arg(long)]
        mac: String,

        /// Extra metadata as a JSON object, sent as `metadata`
        #[arg(long)]
        metadata: Option<String>,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only show hosts with this status
    #[arg(long, value_enum, default_value_t = StatusArg::All)]
    pub status: StatusArg,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings as TOML
    Show,
    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
