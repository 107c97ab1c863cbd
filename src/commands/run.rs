//! The `run` command: wire up the crawl stack and drive it to completion.

use super::common::{CommonArgs, LogLevel, init_logging};
use super::progress_reporter::ProgressReporter;
use camino::Utf8PathBuf;
use clap::Parser;
use core::time::Duration;
use directories::BaseDirs;
use gyre::Result;
use gyre::config::Config;
use gyre::crawl::{Client, CrawlSummary, Crawler, Frontier, Gateway, Governor, Progress, RunStats};
use gyre::store::Store;
use ohno::{AppError, IntoAppError};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn process_run(args: &RunArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let config = Config::load(args.common.config.as_deref())?;

    let seeds = if args.common.seeds.is_empty() {
        config.seeds.clone()
    } else {
        args.common.seeds.clone()
    };
    if seeds.is_empty() {
        return Err(AppError::new("no seed accounts given; pass --seed or set `seeds` in gyre.toml"));
    }

    let data_dir = resolve_data_dir(args.common.data_dir.as_ref(), &config)?;
    log::info!("writing crawl output to '{}'", data_dir.display());

    // With logging on, the progress bar would fight the log lines for the
    // terminal, so it is pushed past the horizon.
    let delay = if args.common.log_level == LogLevel::None {
        Duration::from_millis(300)
    } else {
        Duration::from_secs(365 * 24 * 3600)
    };
    let use_colors = args.common.color.use_colors();
    let progress: Arc<dyn Progress> = Arc::new(ProgressReporter::new(delay, use_colors));

    let client = Client::new(args.common.token.as_deref(), config.base_url.as_str())?;
    let governor = Governor::new(config.cooldown());
    let stats = Arc::new(RunStats::default());
    let gateway = Gateway::new(client, governor, Arc::clone(&stats));
    let frontier = Frontier::new(config.limits());
    let store = Store::new(&data_dir, config.labels.clone())?;

    let mut crawler = Crawler::new(gateway, frontier, store, Arc::clone(&stats), Arc::clone(&progress));
    let result = crawler.run(&seeds).await;
    progress.done();

    let summary = result?;
    print_summary(&summary, use_colors);
    Ok(())
}

fn resolve_data_dir(arg: Option<&Utf8PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(dir) = arg {
        return Ok(dir.as_std_path().to_path_buf());
    }

    if let Some(dir) = &config.data_dir {
        return Ok(PathBuf::from(dir));
    }

    Ok(BaseDirs::new()
        .into_app_err("could not determine data directory")?
        .data_dir()
        .join("gyre"))
}

fn print_summary(summary: &CrawlSummary, use_colors: bool) {
    let users = &summary.users;
    let requests = &summary.requests;

    let headline = format!("Crawl complete: {} users visited", users.visited);
    if use_colors {
        println!("{}", headline.green().bold());
    } else {
        println!("{headline}");
    }

    println!("  pending:    {}", users.to_visit);
    println!("  too big:    {}", users.too_big);
    println!("  inactive:   {}", users.inactive);
    println!("  protected:  {}", users.protected);
    println!(
        "  requests:   {} issued, {} outside cooldown, {} resolved",
        requests.requests_issued, requests.requests_without_cooldown, requests.requests_resolved
    );
}
