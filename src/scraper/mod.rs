pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::models::{DateWindow, PriceRow};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use self::cleaner::{clean_history_rows, filter_codes, format_query_date};
use self::http_client::HttpClient;
use self::parsers::{parse_code_options, parse_history_table};

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable history source. Implementations must tolerate concurrent calls
/// from every per-code and per-window task of a run.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Eligible ticker codes, in catalog order. Empty when the catalog control
    /// is missing.
    async fn fetch_codes(&self) -> Result<Vec<String>>;

    /// Rows for one code inside one window. Empty when the page has no table.
    async fn fetch_range(&self, code: &str, window: DateWindow) -> Result<Vec<PriceRow>>;
}

// ── mse.mk scraper ────────────────────────────────────────────────────────────

pub struct MseScraper {
    client: HttpClient,
    base_url: Url,
    catalog_code: String,
    excluded_prefix: char,
}

impl MseScraper {
    pub fn new(config: &ScraperConfig, excluded_prefix: char) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: Url::parse(config.base_url.trim_end_matches('/'))?,
            catalog_code: config.catalog_code.clone(),
            excluded_prefix,
        })
    }

    /// Symbol page, e.g. ADIN → /en/stats/symbolhistory/ADIN
    fn symbol_url(&self, code: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(code);
        }
        url
    }

    /// Symbol page narrowed to one window via FromDate/ToDate (MM/DD/YYYY).
    fn history_url(&self, code: &str, window: DateWindow) -> Url {
        let mut url = self.symbol_url(code);
        url.query_pairs_mut()
            .append_pair("FromDate", &format_query_date(window.start))
            .append_pair("ToDate", &format_query_date(window.end));
        url
    }
}

#[async_trait]
impl HistorySource for MseScraper {
    async fn fetch_codes(&self) -> Result<Vec<String>> {
        let url = self.symbol_url(&self.catalog_code);
        info!("Fetching code catalog ({})", url);

        let html = self.client.get_text(&url).await?;

        let Some(options) = parse_code_options(&html)? else {
            warn!("Code dropdown not found on {}", url);
            return Ok(vec![]);
        };

        let total = options.len();
        let codes = filter_codes(options, self.excluded_prefix);
        info!("Catalog: {} codes, {} eligible", total, codes.len());
        Ok(codes)
    }

    async fn fetch_range(&self, code: &str, window: DateWindow) -> Result<Vec<PriceRow>> {
        let url = self.history_url(code, window);
        debug!("{}: fetching {}", code, window);

        let html = self.client.get_text(&url).await?;

        let Some(raw_rows) = parse_history_table(&html)? else {
            debug!("{}: no table for {}", code, window);
            return Ok(vec![]);
        };

        let rows = clean_history_rows(code, raw_rows);
        debug!("{}: {} rows for {}", code, rows.len(), window);
        Ok(rows)
    }
}
