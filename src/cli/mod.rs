//! Command-line interface for Palaver.

use clap::{Parser, Subcommand};

/// Palaver - a small forum backend
#[derive(Parser)]
#[command(name = "palaver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create a default config file
    Init,

    /// Insert demo users, threads, and replies
    Seed,
}
