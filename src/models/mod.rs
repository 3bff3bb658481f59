use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

// ── Fetch window ──────────────────────────────────────────────────────────────

/// Inclusive date range for one history request. Never crosses a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "window start {start} after end {end}");
        Self { start, end }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ── Price history row ─────────────────────────────────────────────────────────

/// Column names of a persisted series, in file order.
pub const CSV_HEADER: [&str; 9] = [
    "Date",
    "LastTradePrice",
    "Max",
    "Min",
    "Avg. Price",
    "%chg.",
    "Volume",
    "Turnover in BEST",
    "TotalTurnover",
];

/// One trading day from the symbol-history table. Everything but the date is
/// kept exactly as the site printed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "LastTradePrice")]
    pub last_trade_price: String,
    #[serde(rename = "Max")]
    pub max: String,
    #[serde(rename = "Min")]
    pub min: String,
    #[serde(rename = "Avg. Price")]
    pub avg_price: String,
    #[serde(rename = "%chg.")]
    pub percent_change: String,
    #[serde(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "Turnover in BEST")]
    pub turnover_best: String,
    #[serde(rename = "TotalTurnover")]
    pub total_turnover: String,
}

// ── Raw scraped rows ──────────────────────────────────────────────────────────

/// Trimmed `<td>` texts of one `<tr>`, before the date is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHistoryRow {
    pub cells: Vec<String>,
}
