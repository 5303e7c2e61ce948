use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "timeturner")]
#[command(about = "Store and browse periodic per-host diagnostic snapshots")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the snapshot browser over HTTP
    Serve(ServeArgs),

    /// Browse stored snapshots from the terminal
    Report(ReportArgs),

    /// Store one snapshot from a CSV file or stdin
    Put(PutArgs),
}

/// Options shared by every command that opens the store.
#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// Config file (defaults to the platform config dir's timeturner/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite database path, or :memory:
    #[arg(long)]
    pub database: Option<String>,

    /// Retention window such as 14d or 36h, or "never"
    #[arg(long)]
    pub retention: Option<String>,

    /// Log every SQL statement at debug level
    #[arg(long, default_value_t = false)]
    pub sql_logging: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Address to listen on
    #[arg(long)]
    pub listen: Option<String>,

    /// Largest accepted PUT body in bytes
    #[arg(long)]
    pub max_body_bytes: Option<usize>,
}

#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Day to inspect (YYYY-MM-DD); omit to list days
    #[arg(long)]
    pub date: Option<String>,

    /// Time on that day (HH:MM:SS); omit to list times
    #[arg(long, requires = "date")]
    pub time: Option<String>,

    /// Host whose snapshot to show
    #[arg(long, requires_all = ["time", "title"])]
    pub host: Option<String>,

    /// Title of the snapshot to show
    #[arg(long, requires = "host")]
    pub title: Option<String>,

    /// Column to sort the snapshot by
    #[arg(long, requires = "title")]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, default_value_t = false, requires = "sort")]
    pub reverse: bool,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct PutArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Capture day (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,

    /// Capture time (HH:MM:SS)
    #[arg(long)]
    pub time: String,

    #[arg(long)]
    pub host: String,

    #[arg(long)]
    pub title: String,

    /// CSV file to read (defaults to stdin)
    pub file: Option<PathBuf>,
}
