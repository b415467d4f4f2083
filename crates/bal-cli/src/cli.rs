use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bal",
    about = "Balance lookup: mirror a remote ledger store and report per-owner balances",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Mirror, scan, decode, and aggregate in one run
    Run(RunArgs),
    /// Replicate the remote store directory into the mirror destination
    Mirror(MirrorArgs),
    /// Scan the mirrored store and write the decode dump
    Scan(ScanArgs),
    /// Aggregate balances from a decode dump and write the reports
    Balance(BalanceArgs),
}

#[derive(Args)]
pub struct ConfigArg {
    /// TOML configuration file
    #[arg(short, long, default_value = "bal.toml")]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

#[derive(Args)]
pub struct MirrorArgs {
    #[command(flatten)]
    pub config: ConfigArg,
    /// Replicate from this local directory instead of the remote host
    #[arg(long)]
    pub source_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

#[derive(Args)]
pub struct BalanceArgs {
    #[command(flatten)]
    pub config: ConfigArg,
    /// Decode dump to aggregate instead of the configured one
    #[arg(long)]
    pub dump: Option<PathBuf>,
}
