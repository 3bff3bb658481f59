mod config;
mod error;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::pipeline::{CodeOutcome, Pipeline};
use crate::scraper::MseScraper;
use crate::storage::CsvStore;

#[derive(Parser)]
#[command(
    name = "mse-history",
    about = "Incrementally scrape MSE symbol history into per-code CSV files",
    version
)]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "mse_history=info,warn",
        1 => "mse_history=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    let store = CsvStore::open(&config.storage.data_dir)
        .with_context(|| format!("Failed to open data dir {:?}", config.storage.data_dir))?;
    let scraper = MseScraper::new(&config.scraper, config.pipeline.excluded_prefix)
        .context("Failed to build scraper")?;

    let pipeline = Pipeline::new(config.pipeline, Arc::new(scraper), Arc::new(store));

    let stats = pipeline
        .run(|outcome| match outcome {
            CodeOutcome::Updated { code, rows } => {
                debug!("{}: {} rows appended", code, rows);
                println!("{} is successfully scraped.", code)
            }
            CodeOutcome::Failed { code, error } => println!("Error updating {}: {}", code, error),
        })
        .await?;

    info!(
        "{} codes: {} updated, {} failed, {} rows written",
        stats.codes, stats.succeeded, stats.failed, stats.rows_written
    );
    println!("Total execution time: {:.2} seconds", stats.elapsed.as_secs_f64());
    Ok(())
}
