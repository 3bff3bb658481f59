use crate::models::DateWindow;
use chrono::{Datelike, Days, NaiveDate};

/// Split the gap after `last_update` (or `lookback_days` before `today` for a
/// new code) into contiguous windows that each stay inside one calendar year.
/// Empty when the series is already current.
pub fn plan_windows(
    last_update: Option<NaiveDate>,
    today: NaiveDate,
    lookback_days: u64,
) -> Vec<DateWindow> {
    let start = match last_update {
        Some(last) => last.succ_opt(),
        None => today.checked_sub_days(Days::new(lookback_days)),
    };
    let Some(mut start) = start else {
        return vec![];
    };

    let mut windows = Vec::new();
    while start <= today {
        let year_end = NaiveDate::from_ymd_opt(start.year(), 12, 31).unwrap_or(today);
        let end = year_end.min(today);
        windows.push(DateWindow::new(start, end));

        match end.checked_add_days(Days::new(1)) {
            Some(next) => start = next,
            None => break,
        }
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_well_formed(windows: &[DateWindow], from: NaiveDate, to: NaiveDate) {
        assert_eq!(windows.first().map(|w| w.start), Some(from));
        assert_eq!(windows.last().map(|w| w.end), Some(to));
        for w in windows {
            assert!(w.start <= w.end, "{w} is inverted");
            assert_eq!(w.start.year(), w.end.year(), "{w} crosses a year");
            assert!(w.end <= to);
        }
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end.succ_opt(), Some(pair[1].start));
        }
    }

    #[test]
    fn new_code_looks_back_3650_days() {
        let today = date(2024, 6, 15);
        let windows = plan_windows(None, today, 3650);

        // 3650 days, not ten calendar years: 2016, 2020 and 2024 are leap years.
        assert_eq!(windows.len(), 11);
        assert_eq!(windows[0], DateWindow::new(date(2014, 6, 18), date(2014, 12, 31)));
        assert_eq!(windows[1], DateWindow::new(date(2015, 1, 1), date(2015, 12, 31)));
        assert_eq!(windows[10], DateWindow::new(date(2024, 1, 1), date(2024, 6, 15)));
        assert_well_formed(&windows, date(2014, 6, 18), today);
    }

    #[test]
    fn existing_series_resumes_after_last_date() {
        let today = date(2024, 6, 15);
        let windows = plan_windows(Some(date(2024, 6, 10)), today, 3650);
        assert_eq!(windows, vec![DateWindow::new(date(2024, 6, 11), today)]);
    }

    #[test]
    fn current_series_needs_no_windows() {
        let today = date(2024, 6, 15);
        assert!(plan_windows(Some(today), today, 3650).is_empty());
        assert!(plan_windows(Some(date(2024, 7, 1)), today, 3650).is_empty());
    }

    #[test]
    fn single_day_gap() {
        let today = date(2024, 6, 15);
        let windows = plan_windows(Some(date(2024, 6, 14)), today, 3650);
        assert_eq!(windows, vec![DateWindow::new(today, today)]);
    }

    #[test]
    fn gap_across_new_year_splits_at_boundary() {
        let windows = plan_windows(Some(date(2023, 12, 30)), date(2024, 1, 2), 3650);
        assert_eq!(
            windows,
            vec![
                DateWindow::new(date(2023, 12, 31), date(2023, 12, 31)),
                DateWindow::new(date(2024, 1, 1), date(2024, 1, 2)),
            ]
        );
    }

    #[test]
    fn windows_cover_gap_for_many_inputs() {
        let todays = [date(2024, 1, 1), date(2024, 2, 29), date(2024, 12, 31), date(2025, 3, 9)];
        let lasts = [
            date(2010, 5, 5),
            date(2019, 12, 31),
            date(2020, 1, 1),
            date(2023, 12, 31),
            date(2024, 2, 28),
        ];
        for today in todays {
            for last in lasts {
                let windows = plan_windows(Some(last), today, 3650);
                if last >= today {
                    assert!(windows.is_empty());
                } else {
                    assert_well_formed(&windows, last.succ_opt().unwrap(), today);
                }
            }
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let today = date(2024, 6, 15);
        assert_eq!(plan_windows(None, today, 3650), plan_windows(None, today, 3650));
        let last = Some(date(2021, 3, 3));
        assert_eq!(plan_windows(last, today, 3650), plan_windows(last, today, 3650));
    }
}
