//! Clap derive structures for the `gatewatch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatewatch -- signal telemetry for 5G/LTE home gateways
#[derive(Debug, Parser)]
#[command(
    name = "gatewatch",
    version,
    about = "Watch 5G/LTE home gateway signal and detect disruptions",
    long_about = "Polls the status page of a fixed-wireless home gateway (Arcadyan, Nokia),\n\
        normalizes radio metrics, tracks staleness behind a circuit breaker,\n\
        and records signal disruptions. Runs once, live, or as a Prometheus exporter.",
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
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "GATEWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Gateway profile to use
    #[arg(long, short = 'g', env = "GATEWATCH_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Gateway URL (overrides the profile)
    #[arg(long, env = "GATEWATCH_URL", global = true)]
    pub url: Option<String>,

    /// Gateway model: auto, arcadyan, nokia, sagemcom
    #[arg(long, env = "GATEWATCH_MODEL", global = true)]
    pub model: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

// ── Output & Log Enums ───────────────────────────────────────────────

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe the gateway and print the detected model
    Detect,

    /// Fetch the current status once
    #[command(alias = "st")]
    Status,

    /// Poll continuously and print every tick and event until Ctrl-C
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Serve Prometheus metrics and JSON endpoints
    Export(ExportArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in milliseconds (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Listen address (overrides config)
    #[arg(long, short = 'l', env = "GATEWATCH_LISTEN")]
    pub listen: Option<String>,

    /// Monitor every configured gateway instead of just the selected one
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (passwords redacted)
    Show,

    /// Print the config file path
    Path,

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
