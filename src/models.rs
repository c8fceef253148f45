use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BMR: i64 = 1800;
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn next(self) -> Self {
        match self {
            ThemeMode::Auto => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub date: String,
    pub bmr: i64,
    pub manual_calories: i64,
    pub net_calories: f64,
    pub calorie_log: Vec<LogEntry>,
}

impl DayRecord {
    /// Records persisted before log-based recomputation existed carry a zero
    /// net alongside a real log.
    pub fn needs_heal(&self) -> bool {
        self.net_calories == 0.0 && !self.calorie_log.is_empty()
    }

    pub fn heal(&mut self) -> bool {
        if !self.needs_heal() {
            return false;
        }
        self.manual_calories = log_total(&self.calorie_log);
        self.net_calories = self.manual_calories.saturating_sub(self.bmr) as f64;
        true
    }
}

/// Sum of logged amounts, saturating at the `i64` bounds.
pub fn log_total(log: &[LogEntry]) -> i64 {
    log.iter()
        .fold(0i64, |total, entry| total.saturating_add(entry.amount))
}

/// The persisted ledger document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub day_start: i64,
    pub bmr: i64,
    pub manual_calories: i64,
    pub calorie_log: Vec<LogEntry>,
    pub daily_data: BTreeMap<String, DayRecord>,
    pub last_updated: i64,
    pub theme_mode: ThemeMode,
}

impl LedgerState {
    pub fn new(day_start: i64, bmr: i64, now: i64) -> Self {
        Self {
            day_start,
            bmr,
            manual_calories: 0,
            calorie_log: Vec::new(),
            daily_data: BTreeMap::new(),
            last_updated: now,
            theme_mode: ThemeMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportFile {
    pub version: u32,
    pub timestamp: i64,
    pub state: LedgerState,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct BmrRequest {
    pub bmr: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDayRequest {
    pub manual_calories: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub device_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct OffsetQuery {
    #[serde(default)]
    pub offset: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct ImportQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub eaten: i64,
    pub burned: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total_calories: f64,
    pub pounds: i64,
    pub percent: i64,
    pub is_deficit: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    pub date: String,
    pub bmr: i64,
    pub elapsed_seconds: i64,
    pub manual_calories: i64,
    pub calories_burned: f64,
    pub net_calories: f64,
    pub totals: Totals,
    pub progress: Progress,
    pub theme_mode: ThemeMode,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetail {
    pub date: String,
    pub manual_calories: i64,
    pub net_calories: f64,
    pub has_data: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeResponse {
    pub theme_mode: ThemeMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    pub enabled: bool,
    pub status: crate::sync::SyncStatus,
    pub device_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: String,
    pub net_calories: f64,
    pub has_data: bool,
    pub is_today: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekView {
    pub label: String,
    pub offset: i32,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayCell>,
    pub totals: Totals,
    pub can_go_forward: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub label: String,
    pub offset: i32,
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
    pub totals: Totals,
    pub can_go_forward: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkPoint {
    pub date: String,
    pub net_calories: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub last_7_days: Vec<SparkPoint>,
    pub progress: Progress,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub applied: bool,
    pub days: usize,
    pub bmr: i64,
    pub last_updated: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub device_id: String,
}

/// Envelope stored by the sync service for each device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub state: serde_json::Value,
    pub last_updated: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutResponse {
    pub ok: bool,
    pub last_updated: i64,
}
