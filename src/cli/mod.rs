//! CLI module - Command-line interface for Cinetrend
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Cinetrend - movie discovery with a trending search leaderboard
#[derive(Parser)]
#[command(name = "cinetrend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web API server
    #[command(alias = "daemon")]
    Serve {
        /// Keep trending records in memory instead of Appwrite
        #[arg(long)]
        memory_store: bool,
    },

    /// Search movies and count the search towards trending
    #[command(alias = "s")]
    Search {
        /// Search terms; omit to list popular movies
        query: Vec<String>,
    },

    /// Show the trending leaderboard
    #[command(alias = "t")]
    Trending,

    /// Create default config file
    Init,
}

pub use commands::*;
