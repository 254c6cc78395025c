//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::plate::Direction;

/// Vote command arguments.
#[derive(Debug, Args)]
pub struct VoteCommand {
    /// The plate to vote on (whitespace and case are ignored)
    pub plate: String,

    /// Cast a down vote instead of an up vote
    #[arg(short, long)]
    pub down: bool,
}

impl VoteCommand {
    /// The direction selected by the flags.
    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.down {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// Leaderboard command arguments.
#[derive(Debug, Args)]
pub struct TopCommand {
    /// Show the most negative plates instead of the most positive
    #[arg(short, long)]
    pub negative: bool,

    /// Maximum number of rows (defaults to `leaderboard.limit`)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// The plate to show
    pub plate: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Confirm deleting every plate and vote
    #[arg(long)]
    pub yes: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the saved display name
    Show,

    /// Save a display name
    Set {
        /// The display name
        name: String,
    },

    /// Remove the saved display name
    Clear,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate
        file: Option<PathBuf>,
    },
}
