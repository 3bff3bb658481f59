use crate::models::{PriceRow, RawHistoryRow};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;

// ── Codes ─────────────────────────────────────────────────────────────────────

/// Drop codes that carry a digit or start with `excluded_prefix`.
/// Order is preserved; repeated labels keep their first occurrence only, so
/// every series file has a single writer.
pub fn filter_codes(codes: Vec<String>, excluded_prefix: char) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| !code.is_empty())
        .filter(|code| is_eligible_code(code, excluded_prefix))
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// Ticker codes are ASCII; only ASCII digits disqualify.
pub fn is_eligible_code(code: &str, excluded_prefix: char) -> bool {
    !code.chars().any(|c| c.is_ascii_digit()) && !code.starts_with(excluded_prefix)
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Parse dates: "6/14/2024" (site), ISO, or "14.6.2024" (mk locale)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d.%m.%Y") {
        return Some(d);
    }
    None
}

/// Query-string form expected by the symbol-history page.
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

// ── Raw table row → PriceRow ──────────────────────────────────────────────────

pub fn history_row_to_price(code: &str, row: RawHistoryRow) -> Option<PriceRow> {
    let Ok(cells) = <[String; 9]>::try_from(row.cells) else {
        // Placeholder rows ("no data") span the table with a single cell.
        return None;
    };
    let [
        date,
        last_trade_price,
        max,
        min,
        avg_price,
        percent_change,
        volume,
        turnover_best,
        total_turnover,
    ] = cells;

    let Some(date) = parse_date(&date) else {
        warn!("{}: skipping row with unparseable date {:?}", code, date);
        return None;
    };

    Some(PriceRow {
        date,
        last_trade_price,
        max,
        min,
        avg_price,
        percent_change,
        volume,
        turnover_best,
        total_turnover,
    })
}

pub fn clean_history_rows(code: &str, rows: Vec<RawHistoryRow>) -> Vec<PriceRow> {
    let total = rows.len();
    let cleaned: Vec<PriceRow> = rows
        .into_iter()
        .filter_map(|row| history_row_to_price(code, row))
        .collect();

    if cleaned.len() < total {
        warn!("{}: dropped {} of {} table rows", code, total - cleaned.len(), total);
    }
    cleaned
}

// ── Tests ─────────────────────────────────────────────────────────────────────
