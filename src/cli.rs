//! Defines the command-line interface for Tododex.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A Discord bot for per-server to-do lists.",
    subcommand_required = false,
    arg_required_else_help = false,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to Discord and serve the /todo commands.
    Run,
    /// Check configuration and the store file without connecting to Discord.
    Doctor,
}
