use crate::error::{Result, ScrapeError};
use crate::models::RawHistoryRow;
use ::scraper::{Html, Selector};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{css:?}: {e:?}")))
}

// ── Code dropdown ─────────────────────────────────────────────────────────────

/// Option labels of `<select id="Code">`, trimmed, in page order.
/// `None` when the dropdown is not on the page.
pub fn parse_code_options(html: &str) -> Result<Option<Vec<String>>> {
    let doc = Html::parse_document(html);
    let select_sel = selector("select#Code")?;
    let option_sel = selector("option")?;

    let Some(select) = doc.select(&select_sel).next() else {
        return Ok(None);
    };

    let labels = select
        .select(&option_sel)
        .map(|opt| opt.text().collect::<String>().trim().to_string())
        .collect();

    Ok(Some(labels))
}

// ── Symbol history table ──────────────────────────────────────────────────────

/// Cell texts of every `<tr>` under the first `<tbody>`.
/// `None` when the page carries no table body, which the site serves for
/// ranges without trades.
pub fn parse_history_table(html: &str) -> Result<Option<Vec<RawHistoryRow>>> {
    let doc = Html::parse_document(html);
    let tbody_sel = selector("tbody")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    let Some(tbody) = doc.select(&tbody_sel).next() else {
        return Ok(None);
    };

    let rows = tbody
        .select(&tr_sel)
        .map(|tr| RawHistoryRow {
            cells: tr
                .select(&td_sel)
                .map(|td| td.text().collect::<String>().trim().to_string())
                .collect(),
        })
        .collect();

    Ok(Some(rows))
}
