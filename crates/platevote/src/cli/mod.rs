//! Command-line interface for platevote.
//!
//! This module provides the CLI structure for the `pvote` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ProfileCommand, ResetCommand, ShowCommand, StatusCommand, TopCommand,
    VoteCommand,
};

use crate::logging::Verbosity;

/// pvote - Vote on the license plates you see
///
/// Keeps a local ledger of up and down votes per plate and shows the
/// best and worst rated plates.
#[derive(Debug, Parser)]
#[command(name = "pvote")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Vote a plate up (or down with --down)
    Vote(VoteCommand),

    /// Show a leaderboard
    Top(TopCommand),

    /// Show one plate and its votes
    Show(ShowCommand),

    /// Delete all plates and votes
    Reset(ResetCommand),

    /// Show ledger status
    Status(StatusCommand),

    /// View or change the display name
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::Direction;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "pvote");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["pvote", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["pvote", "-v", "status"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["pvote", "-vv", "status"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["pvote", "-q", "-v", "status"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_vote_up() {
        let cli = parse(&["pvote", "vote", "abc 123"]);
        match cli.command {
            Command::Vote(cmd) => {
                assert_eq!(cmd.plate, "abc 123");
                assert_eq!(cmd.direction(), Direction::Up);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_vote_down() {
        let cli = parse(&["pvote", "vote", "--down", "xyz999"]);
        match cli.command {
            Command::Vote(cmd) => assert_eq!(cmd.direction(), Direction::Down),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_vote_requires_plate() {
        assert!(Cli::try_parse_from(["pvote", "vote"]).is_err());
    }

    #[test]
    fn test_parse_top_defaults() {
        let cli = parse(&["pvote", "top"]);
        match cli.command {
            Command::Top(cmd) => {
                assert!(!cmd.negative);
                assert!(cmd.limit.is_none());
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_top_with_options() {
        let cli = parse(&["pvote", "top", "--negative", "--limit", "5", "--json"]);
        match cli.command {
            Command::Top(cmd) => {
                assert!(cmd.negative);
                assert_eq!(cmd.limit, Some(5));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_show() {
        let cli = parse(&["pvote", "show", "abc123", "-j"]);
        assert!(matches!(cli.command, Command::Show(ShowCommand { json: true, .. })));
    }

    #[test]
    fn test_parse_reset() {
        assert!(matches!(
            parse(&["pvote", "reset"]).command,
            Command::Reset(ResetCommand { yes: false })
        ));
        assert!(matches!(
            parse(&["pvote", "reset", "--yes"]).command,
            Command::Reset(ResetCommand { yes: true })
        ));
    }

    #[test]
    fn test_parse_status_json() {
        let cli = parse(&["pvote", "status", "--json"]);
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));
    }

    #[test]
    fn test_parse_profile() {
        assert!(matches!(
            parse(&["pvote", "profile", "show"]).command,
            Command::Profile(ProfileCommand::Show)
        ));
        assert!(matches!(
            parse(&["pvote", "profile", "clear"]).command,
            Command::Profile(ProfileCommand::Clear)
        ));
        match parse(&["pvote", "profile", "set", "Road Warrior"]).command {
            Command::Profile(ProfileCommand::Set { name }) => assert_eq!(name, "Road Warrior"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config() {
        assert!(matches!(
            parse(&["pvote", "config", "show", "--json"]).command,
            Command::Config(ConfigCommand::Show { json: true })
        ));
        assert!(matches!(
            parse(&["pvote", "config", "path"]).command,
            Command::Config(ConfigCommand::Path)
        ));
        match parse(&["pvote", "config", "validate", "/tmp/c.toml"]).command {
            Command::Config(ConfigCommand::Validate { file }) => {
                assert_eq!(file, Some(PathBuf::from("/tmp/c.toml")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = parse(&["pvote", "top", "--config", "/etc/pvote.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pvote.toml")));
    }
}
