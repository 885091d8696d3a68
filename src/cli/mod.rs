//! Command-line interface for the wishlist server.

mod commands;

use clap::{Parser, Subcommand};

/// Wishlist - a shared gift list with one-way reservations
#[derive(Parser)]
#[command(name = "wishlist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Print every gift in the catalog
    #[command(alias = "ls")]
    Gifts,
}

pub use commands::*;
