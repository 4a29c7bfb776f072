use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::Record;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").expect("date pattern compiles")
});

/// Extracts the `day/month/year` stamp from a provenance string such as
/// `[10:32, 12/3/2024] Alice: `. Two-digit years are read as 20xx.
pub fn parse_meta_date(meta: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(meta)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year_raw = &caps[3];
    let year: i32 = if year_raw.len() == 2 {
        format!("20{year_raw}").parse().ok()?
    } else {
        year_raw.parse().ok()?
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Oldest and newest dated record, if any record carries a parseable stamp.
pub fn date_span(records: &[Record]) -> Option<(NaiveDate, NaiveDate)> {
    records
        .iter()
        .filter_map(|record| parse_meta_date(&record.meta))
        .fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
        })
}
