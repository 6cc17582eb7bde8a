use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill: a small blogging REST API backed by Redis",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Connect to the store and print a summary
    Check(CheckArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(long, env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,
    /// Listen port, overrides PORT and the config file
    #[arg(long)]
    pub port: Option<u16>,
    /// Redis URL, overrides REDIS_URL and the config file
    #[arg(long)]
    pub redis_url: Option<String>,
    /// Keep everything in process memory instead of Redis
    #[arg(long, conflicts_with = "redis_url")]
    pub memory: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(long, env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub redis_url: Option<String>,
}
