//! Per-code CSV series: `<data_dir>/<CODE>.csv`, append-only.

use crate::error::{Result, ScrapeError};
use crate::models::{PriceRow, CSV_HEADER};
use crate::scraper::cleaner::parse_date;
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DATE_COLUMN: &str = "Date";

pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| ScrapeError::io(dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.csv"))
    }

    /// Latest stored date for a code. A missing file, a zero-byte file and a
    /// header-only file are all `None`; anything else unreadable is an error.
    pub fn last_update(&self, code: &str) -> Result<Option<NaiveDate>> {
        let path = self.path_for(code);

        let mut reader = match csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
        {
            Ok(r) => r,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(ScrapeError::persistence(&path, e)),
        };

        let headers = reader
            .headers()
            .map_err(|e| ScrapeError::persistence(&path, e))?;
        if headers.is_empty() {
            return Ok(None);
        }
        let date_idx = headers
            .iter()
            .position(|h| h.trim() == DATE_COLUMN)
            .ok_or_else(|| ScrapeError::MissingColumn {
                path: path.clone(),
                column: DATE_COLUMN,
            })?;

        let mut latest: Option<NaiveDate> = None;
        for record in reader.records() {
            let record = record.map_err(|e| ScrapeError::persistence(&path, e))?;
            let cell = record.get(date_idx).unwrap_or_default();
            let date = parse_date(cell).ok_or_else(|| ScrapeError::InvalidDate {
                path: path.clone(),
                value: cell.to_string(),
            })?;
            latest = latest.max(Some(date));
        }

        debug!("{}: last stored date {:?}", code, latest);
        Ok(latest)
    }

    /// Append rows as given. The header goes first only when the file is new
    /// (or zero-length). No merge, sort or dedup against existing content.
    pub fn append(&self, code: &str, rows: &[PriceRow]) -> Result<usize> {
        let path = self.path_for(code);
        let is_new = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => return Err(ScrapeError::io(&path, e)),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ScrapeError::io(&path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer
                .write_record(CSV_HEADER)
                .map_err(|e| ScrapeError::persistence(&path, e))?;
        }
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| ScrapeError::persistence(&path, e))?;
        }
        writer.flush().map_err(|e| ScrapeError::io(&path, e))?;

        info!("{}: appended {} rows to {:?}", code, rows.len(), path);
        Ok(rows.len())
    }
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(d: NaiveDate) -> PriceRow {
        PriceRow {
            date: d,
            last_trade_price: "21,800.00".into(),
            max: "21,800.00".into(),
            min: "21,600.00".into(),
            avg_price: "21,717.65".into(),
            percent_change: "0.23".into(),
            volume: "17".into(),
            turnover_best: "369,200".into(),
            total_turnover: "369,200".into(),
        }
    }

    fn store() -> (TempDir, CsvStore) {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_has_no_last_update() {
        let (_dir, store) = store();
        assert_eq!(store.last_update("ADIN").unwrap(), None);
    }

    #[test]
    fn empty_and_header_only_files_have_no_last_update() {
        let (_dir, store) = store();
        fs::write(store.path_for("EMPTY"), "").unwrap();
        fs::write(store.path_for("HDR"), format!("{}\n", CSV_HEADER.join(","))).unwrap();

        assert_eq!(store.last_update("EMPTY").unwrap(), None);
        assert_eq!(store.last_update("HDR").unwrap(), None);
    }

    #[test]
    fn header_written_once_across_appends() {
        let (_dir, store) = store();
        store.append("ALK", &[row(date(2024, 6, 10))]).unwrap();
        store
            .append("ALK", &[row(date(2024, 6, 12)), row(date(2024, 6, 11))])
            .unwrap();

        let contents = fs::read_to_string(store.path_for("ALK")).unwrap();
        let headers = contents.lines().filter(|l| l.starts_with("Date,")).count();
        assert_eq!(headers, 1);
        assert_eq!(contents.lines().count(), 4);
        assert!(contents.starts_with(
            "Date,LastTradePrice,Max,Min,Avg. Price,%chg.,Volume,Turnover in BEST,TotalTurnover\n"
        ));
        // Appended in the order given, not sorted.
        let dates: Vec<&str> = contents.lines().skip(1).map(|l| &l[..10]).collect();
        assert_eq!(dates, vec!["2024-06-10", "2024-06-12", "2024-06-11"]);
    }

    #[test]
    fn zero_length_file_gets_header() {
        let (_dir, store) = store();
        fs::write(store.path_for("ALK"), "").unwrap();
        store.append("ALK", &[row(date(2024, 6, 10))]).unwrap();
        assert_eq!(store.last_update("ALK").unwrap(), Some(date(2024, 6, 10)));
    }

    #[test]
    fn last_update_is_max_not_last_row() {
        let (_dir, store) = store();
        store
            .append(
                "XYZ",
                &[row(date(2024, 6, 3)), row(date(2024, 6, 10)), row(date(2024, 6, 7))],
            )
            .unwrap();
        assert_eq!(store.last_update("XYZ").unwrap(), Some(date(2024, 6, 10)));
    }

    #[test]
    fn reads_site_formatted_dates() {
        let (_dir, store) = store();
        let body = format!(
            "{}\n6/14/2024,1,1,1,1,0,1,1,1\n6/13/2024,1,1,1,1,0,1,1,1\n",
            CSV_HEADER.join(",")
        );
        fs::write(store.path_for("ADIN"), body).unwrap();
        assert_eq!(store.last_update("ADIN").unwrap(), Some(date(2024, 6, 14)));
    }

    #[test]
    fn unparseable_date_is_an_error() {
        let (_dir, store) = store();
        let body = format!("{}\nsoon,1,1,1,1,0,1,1,1\n", CSV_HEADER.join(","));
        fs::write(store.path_for("BAD"), body).unwrap();
        assert!(matches!(
            store.last_update("BAD"),
            Err(ScrapeError::InvalidDate { .. })
        ));
    }

    #[test]
    fn missing_date_column_is_an_error() {
        let (_dir, store) = store();
        fs::write(store.path_for("BAD"), "Price,Volume\n1,2\n").unwrap();
        assert!(matches!(
            store.last_update("BAD"),
            Err(ScrapeError::MissingColumn { column: "Date", .. })
        ));
    }
}
