#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Butter Blast levels headlessly.

mod action;
mod catalog;
mod layout_transfer;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use butter_blast_core::RoundResult;
use butter_blast_session::{Session, SessionError};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{action::Action, catalog::LevelCatalog, layout_transfer::BoardSnapshot};

#[derive(Debug, Parser)]
#[command(name = "butter-blast", version, about = "Headless Butter Blast player")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List the levels of the catalog and their goals.
    Levels {
        /// Level catalog to read instead of the built-in campaign.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Play scripted actions against a level.
    Play(PlayArgs),
    /// Print the layout string of a level's initial board.
    Export(LevelArgs),
}

#[derive(Debug, Args)]
struct LevelArgs {
    /// One-based level number.
    #[arg(long, default_value_t = 1)]
    level: usize,
    /// Seed for tile draws.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Level catalog to read instead of the built-in campaign.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PlayArgs {
    #[command(flatten)]
    level: LevelArgs,
    /// Layout string replacing the initial board.
    #[arg(long)]
    layout: Option<String>,
    /// Action to play, `swap:R,C:R,C` or `blast:R,C`; repeatable.
    #[arg(long = "action")]
    actions: Vec<Action>,
}

/// Entry point for the Butter Blast command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    install_tracing(cli.verbose);

    match cli.command {
        CliCommand::Levels { catalog } => list_levels(&LevelCatalog::load(catalog.as_deref())?),
        CliCommand::Play(args) => play(args),
        CliCommand::Export(args) => export(&args),
    }
}

fn install_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_levels(catalog: &LevelCatalog) -> Result<()> {
    for (index, level) in catalog.levels().iter().enumerate() {
        let palette: Vec<String> = level
            .palette
            .iter()
            .map(|kind| kind.stat_key().id().to_owned())
            .collect();
        println!(
            "{}. {} ({} moves, palette: {}{})",
            index + 1,
            level.name,
            level.moves,
            palette.join(", "),
            if level.specials_enabled {
                ", specials"
            } else {
                ""
            }
        );
        for goal in &level.goals {
            println!("     {} >= {}", goal.stat.id(), goal.target);
        }
    }
    Ok(())
}

fn start_session(args: &LevelArgs) -> Result<Session> {
    let catalog = LevelCatalog::load(args.catalog.as_deref())?;
    let level = catalog.level(args.level)?.clone();
    Session::new(level, args.seed)
        .with_context(|| format!("failed to start level {}", args.level))
}

fn play(args: PlayArgs) -> Result<()> {
    let mut session = start_session(&args.level)?;
    if let Some(layout) = &args.layout {
        let snapshot = BoardSnapshot::decode(layout).context("invalid --layout value")?;
        session.load_layout(snapshot.grid)?;
    }

    println!("{} (seed {})", session.level().name, args.level.seed);
    print!("{}", report::board(session.grid()));

    for action in &args.actions {
        info!(%action, "playing action");
        println!();
        println!("> {action}");
        let rounds = match run_action(&mut session, *action) {
            Ok(rounds) => rounds,
            Err(SessionError::Rejected(reason)) => {
                println!("rejected: {reason}");
                continue;
            }
            Err(error) => return Err(error).context(format!("{action} failed")),
        };
        match rounds {
            Some(rounds) => {
                for (index, round) in rounds.iter().enumerate() {
                    println!("{}", report::round(index, round));
                }
            }
            None => println!("no match, swap reverted"),
        }
        print!("{}", report::board(session.grid()));
    }

    println!();
    println!("{}", report::stats(session.stats()));
    println!("{}", report::goals(session.level(), session.stats()));
    println!("status: {}", report::status(session.status()));
    Ok(())
}

/// Plays one action. Returns `None` when a swap was reverted.
fn run_action(
    session: &mut Session,
    action: Action,
) -> Result<Option<Vec<RoundResult>>, SessionError> {
    match action {
        Action::Swap(a, b) => {
            let outcome = session.apply_swap(a, b)?;
            Ok(outcome.matched.then_some(outcome.rounds))
        }
        Action::Blast(center) => Ok(Some(session.apply_area_blast(center)?.rounds)),
    }
}

fn export(args: &LevelArgs) -> Result<()> {
    let session = start_session(args)?;
    let snapshot = BoardSnapshot {
        grid: session.grid().clone(),
    };
    println!("{}", snapshot.encode());
    Ok(())
}
