//! Canonicalises every stored shape of the ledger document.
//!
//! Older documents carry a persisted `totalCalorieHistory`, a `darkMode`
//! flag instead of `themeMode`, day records without a `calorieLog`, and
//! numbers written as floats. All of them load into the one `LedgerState`;
//! the running total is always derived, so `totalCalorieHistory` is ignored.

use crate::dates::{local_midnight, parse_date_key};
use crate::models::{log_total, DayRecord, LedgerState, LogEntry, ThemeMode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// 9999-12-31T23:59:59.999Z
const MAX_DAY_START: i64 = 253_402_300_799_999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidState {
    Malformed(String),
    InvalidDayStart,
    InvalidBmr,
}

impl fmt::Display for InvalidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidState::Malformed(err) => write!(f, "malformed state: {err}"),
            InvalidState::InvalidDayStart => {
                write!(f, "state has a missing or out-of-range dayStart")
            }
            InvalidState::InvalidBmr => write!(f, "state has a missing or non-positive bmr"),
        }
    }
}

impl std::error::Error for InvalidState {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    day_start: Option<f64>,
    bmr: Option<f64>,
    manual_calories: Option<f64>,
    calorie_log: Option<Vec<StoredEntry>>,
    daily_data: Option<BTreeMap<String, StoredDay>>,
    last_updated: Option<f64>,
    theme_mode: Option<String>,
    dark_mode: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDay {
    bmr: Option<f64>,
    manual_calories: Option<f64>,
    net_calories: Option<f64>,
    calorie_log: Option<Vec<StoredEntry>>,
}

#[derive(Debug, Deserialize)]
struct StoredEntry {
    amount: Option<f64>,
    timestamp: Option<f64>,
}

pub fn parse_state(bytes: &[u8]) -> Result<LedgerState, InvalidState> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|err| InvalidState::Malformed(err.to_string()))?;
    migrate_state(value)
}

/// Converts any known document shape into the canonical one.
///
/// `dayStart` must fall between the epoch and the end of year 9999 and is
/// re-anchored to the local midnight of its day. `bmr` must be positive.
/// Anything else is treated as corruption.
pub fn migrate_state(value: Value) -> Result<LedgerState, InvalidState> {
    let stored: StoredState =
        serde_json::from_value(value).map_err(|err| InvalidState::Malformed(err.to_string()))?;

    let day_start = stored
        .day_start
        .filter(|v| *v > 0.0 && *v <= MAX_DAY_START as f64)
        .map(|v| local_midnight(v as i64))
        .ok_or(InvalidState::InvalidDayStart)?;
    let bmr = stored
        .bmr
        .filter(|v| v.is_finite() && *v >= 1.0)
        .ok_or(InvalidState::InvalidBmr)?
        .round() as i64;

    let theme_mode = match (stored.theme_mode.as_deref(), stored.dark_mode) {
        (Some("light"), _) => ThemeMode::Light,
        (Some("dark"), _) => ThemeMode::Dark,
        (Some(_), _) => ThemeMode::Auto,
        (None, Some(true)) => ThemeMode::Dark,
        (None, Some(false)) => ThemeMode::Light,
        (None, None) => ThemeMode::Auto,
    };

    let mut daily_data = BTreeMap::new();
    for (key, day) in stored.daily_data.unwrap_or_default() {
        if parse_date_key(&key).is_none() {
            warn!("dropping day record with invalid date key {key:?}");
            continue;
        }
        let record = migrate_day(key.clone(), day, bmr);
        daily_data.insert(key, record);
    }

    Ok(LedgerState {
        day_start,
        bmr,
        manual_calories: stored.manual_calories.unwrap_or_default().round() as i64,
        calorie_log: migrate_log(stored.calorie_log),
        daily_data,
        last_updated: stored.last_updated.unwrap_or(day_start as f64) as i64,
        theme_mode,
    })
}

fn migrate_day(date: String, day: StoredDay, fallback_bmr: i64) -> DayRecord {
    let bmr = day.bmr.map_or(fallback_bmr, |v| v.round() as i64);
    let calorie_log = migrate_log(day.calorie_log);
    let manual_calories = match day.manual_calories {
        Some(v) => v.round() as i64,
        None => log_total(&calorie_log),
    };
    let net_calories = day
        .net_calories
        .unwrap_or(manual_calories.saturating_sub(bmr) as f64);

    let mut record = DayRecord {
        date,
        bmr,
        manual_calories,
        net_calories,
        calorie_log,
    };
    record.heal();
    record
}

fn migrate_log(log: Option<Vec<StoredEntry>>) -> Vec<LogEntry> {
    log.unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            Some(LogEntry {
                amount: entry.amount?.round() as i64,
                timestamp: entry.timestamp.unwrap_or_default() as i64,
            })
        })
        .collect()
}
