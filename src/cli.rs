//! Command-line interface for the game service.

use clap::{Parser, Subcommand};

/// Tic-tac-toe oracle - lookup-driven game service
#[derive(Parser, Debug)]
#[command(name = "tictactoe_oracle")]
#[command(about = "Lookup-driven tic-tac-toe game service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory containing the lookup table JSON files
        #[arg(long)]
        book_dir: Option<std::path::PathBuf>,

        /// Delay before a scheduled AI move fires, in milliseconds
        #[arg(long)]
        ai_delay_ms: Option<u64>,
    },

    /// Validate the lookup table files and report entry counts
    CheckBook {
        /// Directory containing the lookup table JSON files
        #[arg(long, default_value = "books")]
        book_dir: std::path::PathBuf,
    },
}
