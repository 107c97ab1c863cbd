//! A breadth-first crawler for rate-limited social graph APIs.
//!
//! # Overview
//!
//! `gyre` starts from a set of seed accounts and walks the social graph
//! outward: each user's profile, friends, followers, and tweet timeline are
//! fetched from a rate-limited paginated API, new identities feed a
//! breadth-first frontier, and every visited user is persisted as a JSON
//! document that later runs treat as a resume checkpoint.
//!
//! # Quick Start
//!
//! Generate a configuration file, add your seed accounts, and run:
//!
//! ```bash
//! gyre init
//! gyre run --seed somebody --log-level info
//! ```
//!
//! The bearer token for the API is taken from `--token` or the `GYRE_TOKEN`
//! environment variable.
//!
//! # Configuration
//!
//! All knobs live in `gyre.toml`:
//!
//! ```toml
//! seeds = ["somebody"]
//! tweets_min = 5        # at most this many tweets => ignored as inactive
//! followers_max = 10000 # at least this many followers => ignored as too big
//! friends_max = 5000    # at least this many friends => ignored as too big
//! cooldown_secs = 900   # pause after a rate-limit signal
//! ```
//!
//! # Output
//!
//! Under the data directory, one directory per visited user holds
//! `user.json` (profile, disposition, friend/follower/tweet ids, entity
//! tally), `tweets.json`, and `entities.json`. At the end of a run the
//! aggregate documents `resolved_users.json`, `unresolved_users.json`, and
//! `run_stats.json` are written.
//!
//! Interrupted runs resume for free: a user whose `user.json` already exists
//! is never re-fetched, but their stored friends and followers still feed
//! the frontier.
//!
//! # Exit Codes
//!
//! - `0`: the frontier drained and all output was written
//! - `1`: a fatal failure (vanished resource or unclassified API error)

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use gyre::Result;

mod commands;

use crate::commands::{InitArgs, RunArgs, init_config, process_run};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "gyre", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: GyreCommand,
}

#[derive(Subcommand, Debug)]
enum GyreCommand {
    /// Crawl the graph outward from the seed accounts
    Run(Box<RunArgs>),

    /// Generate a default configuration file
    Init(InitArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        GyreCommand::Run(run_args) => process_run(&run_args).await,
        GyreCommand::Init(init_args) => init_config(&init_args),
    }
}
