//! `pvote` - CLI for platevote
//!
//! This binary records votes and prints leaderboards from the local ledger.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};

use platevote::cli::{
    Cli, Command, ConfigCommand, ProfileCommand, ShowCommand, StatusCommand, TopCommand,
    VoteCommand,
};
use platevote::{
    init_logging, BlobStore, Config, FsBlobStore, LeaderboardEntry, Ledger, LifecycleEvent,
    Profile,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let blob: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.data_dir()));

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Profile(profile_cmd) => handle_profile(blob, profile_cmd).await,
        command => {
            let mut ledger = Ledger::open(Arc::clone(&blob))
                .await?
                .with_policy(config.plate_policy()?);

            let finished = tokio::select! {
                result = run(&mut ledger, &config, blob, command) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };
            match finished {
                Some(result) => result,
                None => {
                    warn!("Interrupted, saving before exit");
                    ledger.handle(LifecycleEvent::Shutdown).await;
                    Ok(())
                }
            }
        }
    }
}

async fn run(
    ledger: &mut Ledger,
    config: &Config,
    blob: Arc<dyn BlobStore>,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Vote(cmd) => handle_vote(ledger, &cmd).await,
        Command::Top(cmd) => handle_top(ledger, config, &cmd),
        Command::Show(cmd) => handle_show(ledger, &cmd),
        Command::Reset(cmd) => {
            if !cmd.yes {
                println!("This will permanently delete every plate and vote.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let outcome = ledger.reset().await?;
            if let Some(e) = &outcome.persist_error {
                println!("Warning: reset not saved yet: {e}");
            }
            println!("All plates and votes deleted.");
            Ok(())
        }
        Command::Status(cmd) => handle_status(ledger, config, blob, &cmd).await,
        Command::Profile(_) | Command::Config(_) => {
            debug!("Command handled before the ledger was opened");
            Ok(())
        }
    }
}

async fn handle_vote(ledger: &mut Ledger, cmd: &VoteCommand) -> anyhow::Result<()> {
    let outcome = ledger
        .record_vote(&cmd.plate, cmd.direction().delta())
        .await?;
    let plate = &outcome.value.plate_text;
    let score = ledger.store().plate(plate)?.map_or(0, |p| p.score);

    if let Some(e) = &outcome.persist_error {
        println!("Warning: vote not saved yet: {e}");
    }
    println!("{} {} -> score {}", cmd.direction(), plate, score);
    Ok(())
}

fn handle_top(ledger: &Ledger, config: &Config, cmd: &TopCommand) -> anyhow::Result<()> {
    let limit = cmd.limit.unwrap_or(config.leaderboard.limit);
    let entries = if cmd.negative {
        ledger.top_negative(limit)?
    } else {
        ledger.top_positive(limit)?
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_leaderboard(
            if cmd.negative { "Worst plates" } else { "Best plates" },
            &entries,
        );
    }
    Ok(())
}

fn print_leaderboard(title: &str, entries: &[LeaderboardEntry]) {
    println!("{title}");
    println!("{}", "-".repeat(title.len()));
    if entries.is_empty() {
        println!("(none yet)");
        return;
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!("{:>3}. {:<12} {:>+6}", rank + 1, entry.plate_text, entry.score);
    }
}

fn handle_show(ledger: &Ledger, cmd: &ShowCommand) -> anyhow::Result<()> {
    let plate = ledger.store().plate(&cmd.plate)?;
    let votes = ledger.store().votes_for(&cmd.plate)?;

    if cmd.json {
        let value = serde_json::json!({
            "plate": plate,
            "votes": votes,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let Some(plate) = plate else {
        println!("No votes recorded for {}", platevote::normalize(&cmd.plate));
        return Ok(());
    };
    println!("Plate:   {}", plate.plate_text);
    println!("Score:   {:+}", plate.score);
    if let Some(updated_at) = plate.updated_at {
        println!("Updated: {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();
    for vote in &votes {
        println!(
            "  {}  {:>+2}  {}",
            vote.created_at.format("%Y-%m-%d %H:%M:%S"),
            vote.value,
            vote.id
        );
    }
    Ok(())
}

async fn handle_status(
    ledger: &Ledger,
    config: &Config,
    blob: Arc<dyn BlobStore>,
    cmd: &StatusCommand,
) -> anyhow::Result<()> {
    let stats = ledger.store().stats()?;
    let display_name = Profile::new(blob).load().await?;
    let data_dir = config.data_dir();

    if cmd.json {
        let status = serde_json::json!({
            "data_dir": data_dir,
            "boot_source": format!("{:?}", ledger.boot_source()),
            "display_name": display_name,
            "total_plates": stats.total_plates,
            "total_votes": stats.total_votes,
            "last_vote_at": stats.last_vote_at,
            "image_size_bytes": stats.image_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("pvote status");
        println!("------------");
        println!("Data dir:    {}", data_dir.display());
        println!("Loaded:      {:?}", ledger.boot_source());
        println!(
            "Profile:     {}",
            display_name.as_deref().unwrap_or("(not set)")
        );
        println!("Plates:      {}", stats.total_plates);
        println!("Votes:       {}", stats.total_votes);
        match stats.last_vote_at {
            Some(at) => println!("Last vote:   {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Last vote:   never"),
        }
        println!("Image size:  {} bytes", stats.image_size_bytes);
    }
    Ok(())
}

async fn handle_profile(blob: Arc<dyn BlobStore>, cmd: ProfileCommand) -> anyhow::Result<()> {
    let profile = Profile::new(blob);
    match cmd {
        ProfileCommand::Show => match profile.load().await? {
            Some(name) => println!("{name}"),
            None => println!("(not set)"),
        },
        ProfileCommand::Set { name } => {
            let saved = profile.save(&name).await?;
            println!("Display name set to {saved}");
        }
        ProfileCommand::Clear => {
            profile.clear().await?;
            println!("Display name cleared");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data dir:           {}", config.data_dir().display());
                println!();
                println!("[Leaderboard]");
                println!("  Limit:              {}", config.leaderboard.limit);
                println!();
                println!("[Voting]");
                println!(
                    "  Plate pattern:      {}",
                    config.voting.plate_pattern.as_deref().unwrap_or("(any)")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
