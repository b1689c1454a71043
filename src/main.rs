//! Tic-tac-toe oracle - unified CLI.
//!
//! Lookup-driven game service with delayed AI turns.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tictactoe_oracle::{
    AppState, BookSource, BookStore, FileBookSource, Mark, ServiceConfig, SessionManager,
    TurnScheduler,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            book_dir,
            ai_delay_ms,
        } => run_server(config, host, port, book_dir, ai_delay_ms).await,
        Command::CheckBook { book_dir } => run_check_book(book_dir).await,
    }
}

/// Run the HTTP game server
async fn run_server(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    book_dir: Option<PathBuf>,
    ai_delay_ms: Option<u64>,
) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    config.apply_overrides(host, port, book_dir, ai_delay_ms);

    info!(addr = %config.bind_addr(), "Starting tic-tac-toe oracle");

    let sessions = SessionManager::new();
    let books = BookStore::new();
    let scheduler = TurnScheduler::new(sessions.clone(), books.clone(), config.ai_delay());

    // Tables load in the background; the server answers immediately and
    // AI turns stall until the load lands.
    let source = FileBookSource::new(config.book_dir().clone());
    {
        let books = books.clone();
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            match books.load_from(&source).await {
                Ok(()) => {
                    info!("Move tables loaded");
                    scheduler.poke_all();
                }
                Err(e) => {
                    error!(error = %e, "Failed to load move tables; AI turns will stall");
                }
            }
        });
    }

    let state = Arc::new(AppState {
        sessions,
        books,
        scheduler,
    });
    let app = tictactoe_oracle::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Server ready");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Validate the lookup table files and report entry counts
async fn run_check_book(book_dir: PathBuf) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let source = FileBookSource::new(book_dir);
    for mark in Mark::iter() {
        let book = source.fetch(mark).await?;
        info!(mark = %mark.symbol(), entries = book.len(), "Table OK");
    }

    Ok(())
}
