//! Clap derive structures for the `tecoapi` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tecoapi -- expose TecoApi PLC objects as sensors and switches
#[derive(Debug, Parser)]
#[command(
    name = "tecoapi",
    version,
    about = "Poll and control TecoApi PLC objects",
    long_about = "Builds sensor, binary sensor and switch entities from the TecoApi\n\
        objects declared in the config file, polls them on their scan interval,\n\
        and offers raw object reads and writes.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "TECOAPI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table
    Table,
    /// Pretty-printed JSON
    Json,
    /// One unique id per line
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set up every configured platform and poll until interrupted
    Run,

    /// Read an object and print it
    Get(GetArgs),

    /// Write a JSON value to an object
    Set(SetArgs),

    /// Set up every configured platform once and list its entities
    #[command(alias = "ls")]
    Entities,

    /// Inspect the configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Dotted object path, e.g. ROOM.TEMP
    pub path: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Dotted object path, e.g. LIGHTS.KITCHEN
    pub path: String,

    /// JSON value, e.g. true, 21.5 or '"auto"'
    pub value: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the effective configuration (password masked)
    Show,
}
