//! Local-calendar helpers. Day boundaries are local midnights, never UTC.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

pub fn local_date(ms: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .with_timezone(&Local)
        .date_naive()
}

/// Timestamp of the first local instant of `date`.
///
/// When DST skips midnight the first instant after the gap is used.
pub fn midnight_of(date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    if let Some(dt) = Local.from_local_datetime(&naive).earliest() {
        return dt.timestamp_millis();
    }
    let after_gap = naive + Duration::hours(1);
    match Local.from_local_datetime(&after_gap).earliest() {
        Some(dt) => dt.timestamp_millis(),
        None => Utc.from_utc_datetime(&naive).timestamp_millis(),
    }
}

pub fn local_midnight(ms: i64) -> i64 {
    midnight_of(local_date(ms))
}

/// Midnight that ends the day beginning at (or containing) `ms`.
pub fn next_midnight(ms: i64) -> i64 {
    let date = local_date(ms);
    match date.succ_opt() {
        Some(next) => midnight_of(next),
        None => ms + MS_PER_DAY,
    }
}

pub fn format_date_key(ms: i64) -> String {
    date_key(local_date(ms))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Strict `YYYY-MM-DD` parse; zero padding is required.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
    (date_key(date) == key).then_some(date)
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_label(date: NaiveDate) -> String {
    format!("CW-{}", date.iso_week().week())
}

/// First day of the month `offset` months away from the month containing `date`.
pub fn month_start(date: NaiveDate, offset: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + offset;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

pub fn month_end(first: NaiveDate) -> NaiveDate {
    month_start(first, 1).pred_opt().unwrap_or(first)
}

pub fn month_label(first: NaiveDate) -> String {
    first.format("%B %Y").to_string()
}
