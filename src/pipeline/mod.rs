//! Pipeline orchestrator: ties scraper → storage together.
//!
//! ## Run shape
//!
//! 1. Fetch the code catalog once. An empty catalog ends the run with no work.
//! 2. Update every code concurrently (at most `code_concurrency` at a time).
//!    Each update reads the last stored date, plans year-bounded windows for
//!    the gap, fetches those windows concurrently (at most
//!    `window_concurrency` per code) and appends the aggregate once.
//! 3. Report each code's outcome as it finishes, then the total elapsed time.
//!
//! One failing code never stops the others. All fetches share the source's
//! single HTTP session.

pub mod windows;

use crate::config::PipelineConfig;
use crate::error::{Result, ScrapeError};
use crate::models::PriceRow;
use crate::scraper::HistorySource;
use crate::storage::CsvStore;
use crate::utils::Timer;
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use self::windows::plan_windows;

// ── Per-code updater ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CodeUpdater {
    source: Arc<dyn HistorySource>,
    store: Arc<CsvStore>,
    window_concurrency: usize,
    lookback_days: u64,
}

impl CodeUpdater {
    /// Bring one code's series up to `today`. Returns the number of rows
    /// appended; zero means nothing was written.
    pub async fn update(&self, code: &str, today: NaiveDate) -> Result<usize> {
        let last_update = self.store.last_update(code)?;
        let windows = plan_windows(last_update, today, self.lookback_days);

        if windows.is_empty() {
            debug!("{}: up to date (last {:?})", code, last_update);
            return Ok(0);
        }
        debug!("{}: {} windows since {:?}", code, windows.len(), last_update);

        let sem = Arc::new(Semaphore::new(self.window_concurrency.max(1)));
        let mut fetches = JoinSet::new();

        for window in windows {
            let source = Arc::clone(&self.source);
            let sem = Arc::clone(&sem);
            let code = code.to_string();

            fetches.spawn(async move {
                let _permit = sem.acquire_owned().await?;
                source.fetch_range(&code, window).await
            });
        }

        // Completion order. Returning early drops the set, which aborts the
        // remaining window fetches of this code.
        let mut rows: Vec<PriceRow> = Vec::new();
        while let Some(joined) = fetches.join_next().await {
            rows.extend(joined??);
        }

        if rows.is_empty() {
            info!("{}: no new rows", code);
            return Ok(0);
        }

        self.store.append(code, &rows)
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Result of one code's update, reported in completion order.
#[derive(Debug)]
pub enum CodeOutcome {
    Updated { code: String, rows: usize },
    Failed { code: String, error: ScrapeError },
}

pub struct Pipeline {
    config: PipelineConfig,
    source: Arc<dyn HistorySource>,
    store: Arc<CsvStore>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, source: Arc<dyn HistorySource>, store: Arc<CsvStore>) -> Self {
        Self { config, source, store }
    }

    pub async fn run(&self, on_outcome: impl FnMut(&CodeOutcome)) -> anyhow::Result<PipelineStats> {
        self.run_at(Local::now().date_naive(), on_outcome).await
    }

    /// Same as [`Pipeline::run`] with an explicit "today".
    pub async fn run_at(
        &self,
        today: NaiveDate,
        mut on_outcome: impl FnMut(&CodeOutcome),
    ) -> anyhow::Result<PipelineStats> {
        let timer = Timer::start("MSE history update");

        // ── 1. Code catalog ───────────────────────────────────────────────────
        let codes = self
            .source
            .fetch_codes()
            .await
            .context("Code catalog fetch failed")?;

        // One updater per series file.
        let mut seen = HashSet::new();
        let codes: Vec<String> = codes
            .into_iter()
            .filter(|code| seen.insert(code.clone()))
            .collect();

        let mut stats = PipelineStats {
            codes: codes.len(),
            ..PipelineStats::default()
        };

        if codes.is_empty() {
            warn!("Empty code catalog, nothing to update");
            stats.elapsed = timer.elapsed();
            return Ok(stats);
        }

        // ── 2. Per-code updates ───────────────────────────────────────────────
        info!("Updating {} codes up to {}", codes.len(), today);

        let updater = CodeUpdater {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            window_concurrency: self.config.window_concurrency,
            lookback_days: self.config.lookback_days,
        };
        let sem = Arc::new(Semaphore::new(self.config.code_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut task_codes = HashMap::new();

        for code in codes {
            let updater = updater.clone();
            let sem = Arc::clone(&sem);
            let task_code = code.clone();

            let handle = tasks.spawn(async move {
                let result = match sem.acquire_owned().await {
                    Ok(_permit) => updater.update(&task_code, today).await,
                    Err(e) => Err(e.into()),
                };
                (task_code, result)
            });
            task_codes.insert(handle.id(), code);
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok((code, Ok(rows))) => {
                    stats.succeeded += 1;
                    stats.rows_written += rows;
                    CodeOutcome::Updated { code, rows }
                }
                Ok((code, Err(error))) => {
                    warn!("{}: {}", code, error);
                    stats.failed += 1;
                    CodeOutcome::Failed { code, error }
                }
                Err(e) => {
                    let code = task_codes.remove(&e.id()).unwrap_or_default();
                    error!("Task panic for {}: {}", code, e);
                    stats.failed += 1;
                    CodeOutcome::Failed {
                        code,
                        error: ScrapeError::Task(e),
                    }
                }
            };
            on_outcome(&outcome);
        }

        // ── 3. Summary ────────────────────────────────────────────────────────
        stats.elapsed = timer.elapsed();
        info!(
            "=== Done: {} codes | {} updated | {} failed | {} rows ===",
            stats.codes, stats.succeeded, stats.failed, stats.rows_written
        );

        Ok(stats)
    }
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub codes: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows_written: usize,
    pub elapsed: Duration,
}
