//! The daily ledger: the open day, the closed-day history, and every
//! calculation derived from them.
//!
//! Operations take `now` explicitly and never touch storage or the network.
//! Each mutation reports a [`Change`] so the owner decides what to persist
//! and what to push to the remote store.

use crate::dates::{
    date_key, format_date_key, local_date, local_midnight, SECONDS_PER_DAY,
};
use crate::models::{DayRecord, LedgerState, LogEntry, Progress, Totals};
use chrono::NaiveDate;
use std::mem;
use tracing::info;

pub const CALORIES_PER_POUND: f64 = 3500.0;

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Change {
    Unchanged,
    /// Save locally; not worth a remote push.
    Persist,
    PersistAndSync,
}

impl Change {
    pub fn merge(self, other: Change) -> Change {
        self.max(other)
    }

    pub fn is_dirty(self) -> bool {
        self != Change::Unchanged
    }
}

/// Calories burned at `bmr` per day between two instants.
///
/// Whole seconds only, clamped to one day, rounded to one decimal.
pub fn burn_between(bmr: i64, start: i64, end: i64) -> f64 {
    let elapsed = end.saturating_sub(start).div_euclid(1000).clamp(0, SECONDS_PER_DAY);
    let per_second = bmr as f64 / SECONDS_PER_DAY as f64;
    round_tenth(per_second * elapsed as f64)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone)]
pub struct Ledger {
    state: LedgerState,
}

impl Ledger {
    pub fn new(state: LedgerState) -> Self {
        Self { state }
    }

    /// A blank ledger whose open day is the one containing `now`.
    pub fn fresh(now: i64, bmr: i64) -> Self {
        Self::new(LedgerState::new(local_midnight(now), bmr, now))
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn snapshot(&self) -> LedgerState {
        self.state.clone()
    }

    /// Adopts another document wholesale (import or remote adoption).
    pub fn replace(&mut self, state: LedgerState) -> Change {
        self.state = state;
        Change::PersistAndSync
    }

    pub fn open_day_key(&self) -> String {
        format_date_key(self.state.day_start)
    }

    pub fn elapsed_seconds(&self, now: i64) -> i64 {
        now.saturating_sub(self.state.day_start)
            .div_euclid(1000)
            .clamp(0, SECONDS_PER_DAY)
    }

    pub fn calories_burned(&self, now: i64) -> f64 {
        burn_between(self.state.bmr, self.state.day_start, now)
    }

    /// Net calories for the open day; negative is a deficit.
    pub fn net_calories(&self, now: i64) -> f64 {
        self.state.manual_calories as f64 - self.calories_burned(now)
    }

    /// Net calories for any date, healing a stuck record on the way.
    pub fn net_calories_for_date(&mut self, key: &str, now: i64) -> (f64, Change) {
        if key == self.open_day_key() {
            return (self.net_calories(now), Change::Unchanged);
        }
        match self.state.daily_data.get_mut(key) {
            Some(record) => {
                let change = if record.heal() {
                    info!(date = key, net = record.net_calories, "healed day record");
                    Change::PersistAndSync
                } else {
                    Change::Unchanged
                };
                (record.net_calories, change)
            }
            None => (0.0, Change::Unchanged),
        }
    }

    pub fn has_record(&self, key: &str) -> bool {
        self.state.daily_data.contains_key(key)
    }

    /// Manual total currently stored for a date (the edit dialog's value).
    pub fn manual_calories_for_date(&self, key: &str) -> i64 {
        if key == self.open_day_key() {
            return self.state.manual_calories;
        }
        self.state
            .daily_data
            .get(key)
            .map_or(0, |record| record.manual_calories)
    }

    /// Sum of closed-day net calories, derived on every call.
    pub fn history_total(&self) -> f64 {
        let open = self.open_day_key();
        self.state
            .daily_data
            .iter()
            .filter(|(key, _)| **key != open)
            .map(|(_, record)| record.net_calories)
            .sum()
    }

    pub fn total_calories(&self, now: i64) -> f64 {
        self.history_total() + self.net_calories(now)
    }

    pub fn adjust_calories(&mut self, amount: i64, now: i64) -> Change {
        self.state.manual_calories = self.state.manual_calories.saturating_add(amount);
        self.state.calorie_log.push(LogEntry {
            amount,
            timestamp: now,
        });
        self.state.last_updated = now;
        Change::PersistAndSync
    }

    /// Applies to the open day only; closed days keep their snapshot.
    pub fn set_bmr(&mut self, bmr: i64, now: i64) -> Change {
        if bmr == self.state.bmr {
            return Change::Unchanged;
        }
        self.state.bmr = bmr;
        self.state.last_updated = now;
        Change::PersistAndSync
    }

    /// Replaces a day's manual total with one authoritative value.
    pub fn edit_day(&mut self, key: &str, manual_calories: i64, now: i64) -> Change {
        let log = vec![LogEntry {
            amount: manual_calories,
            timestamp: now,
        }];

        if key == self.open_day_key() {
            self.state.manual_calories = manual_calories;
            self.state.calorie_log = log;
        } else if let Some(record) = self.state.daily_data.get_mut(key) {
            record.manual_calories = manual_calories;
            record.net_calories = manual_calories.saturating_sub(record.bmr) as f64;
            record.calorie_log = log;
        } else {
            let bmr = self.state.bmr;
            self.state.daily_data.insert(
                key.to_string(),
                DayRecord {
                    date: key.to_string(),
                    bmr,
                    manual_calories,
                    net_calories: manual_calories.saturating_sub(bmr) as f64,
                    calorie_log: log,
                },
            );
        }

        self.state.last_updated = now;
        Change::PersistAndSync
    }

    /// Discards today's activity without archiving it.
    pub fn reset_today(&mut self, now: i64) -> Change {
        self.state.manual_calories = 0;
        self.state.calorie_log.clear();
        self.state.day_start = local_midnight(now);
        self.state.last_updated = now;
        Change::PersistAndSync
    }

    /// Drops all history and settings except the BMR default.
    pub fn clear_all(&mut self, now: i64, bmr: i64) -> Change {
        self.state = LedgerState::new(local_midnight(now), bmr, now);
        Change::PersistAndSync
    }

    pub fn toggle_theme(&mut self, now: i64) -> Change {
        self.state.theme_mode = self.state.theme_mode.next();
        self.state.last_updated = now;
        Change::PersistAndSync
    }

    /// Closes the open day if `now` is past its midnight, backfilling every
    /// day skipped in between.
    ///
    /// The closing day burns for the time elapsed since its start, capped at
    /// 24 hours, so a short DST day still burns its full BMR.
    pub fn roll_over(&mut self, now: i64) -> Change {
        let today_start = local_midnight(now);
        if today_start <= self.state.day_start {
            return Change::Unchanged;
        }

        let bmr = self.state.bmr;
        let closing_date = local_date(self.state.day_start);
        let closing_key = date_key(closing_date);
        let burned = burn_between(bmr, self.state.day_start, now);
        let manual_calories = mem::take(&mut self.state.manual_calories);
        let record = DayRecord {
            date: closing_key.clone(),
            bmr,
            manual_calories,
            net_calories: manual_calories as f64 - burned,
            calorie_log: mem::take(&mut self.state.calorie_log),
        };
        info!(date = %closing_key, net = record.net_calories, "closed day");
        self.state.daily_data.insert(closing_key, record);

        let today = local_date(now);
        let mut backfilled = 0;
        for date in closing_date.iter_days().skip(1).take_while(|date| *date < today) {
            let key = date_key(date);
            self.state
                .daily_data
                .entry(key.clone())
                .or_insert_with(|| DayRecord {
                    date: key,
                    bmr,
                    manual_calories: 0,
                    net_calories: -(bmr as f64),
                    calorie_log: Vec::new(),
                });
            backfilled += 1;
        }
        if backfilled > 0 {
            info!(days = backfilled, "backfilled missed days");
        }

        self.state.day_start = today_start;
        self.state.last_updated = now;
        Change::PersistAndSync
    }

    /// Eaten (positive entries) and burned (negative entries) from today's log.
    pub fn today_totals(&self) -> Totals {
        self.state
            .calorie_log
            .iter()
            .fold(Totals { eaten: 0, burned: 0 }, |mut totals, entry| {
                if entry.amount > 0 {
                    totals.eaten = totals.eaten.saturating_add(entry.amount);
                } else {
                    totals.burned = totals.burned.saturating_add(entry.amount.saturating_abs());
                }
                totals
            })
    }

    /// Intake and BMR burn over an inclusive date range; future days are skipped.
    pub fn totals_for_range(&self, start: NaiveDate, end: NaiveDate, now: i64) -> Totals {
        let today = local_date(now);
        let mut eaten: i64 = 0;
        let mut burned = 0.0;

        for date in start.iter_days().take_while(|date| *date <= end) {
            if date > today {
                break;
            }
            if date == today {
                eaten = eaten.saturating_add(self.state.manual_calories.max(0));
                burned += self.calories_burned(now);
            } else if let Some(record) = self.state.daily_data.get(&date_key(date)) {
                eaten = eaten.saturating_add(record.manual_calories.max(0));
                burned += record.bmr as f64;
            }
        }

        Totals {
            eaten,
            burned: burned.round() as i64,
        }
    }

    pub fn progress(&self, now: i64) -> Progress {
        let total = self.total_calories(now);
        let magnitude = total.abs();
        let is_deficit = total < 0.0;
        let pounds = (magnitude / CALORIES_PER_POUND).floor() as i64;
        let percent = ((magnitude % CALORIES_PER_POUND) / CALORIES_PER_POUND * 100.0).round() as i64;

        Progress {
            total_calories: round_tenth(total),
            pounds,
            percent: if is_deficit { percent } else { -percent },
            is_deficit,
        }
    }

    pub fn log_newest_first(&self) -> Vec<LogEntry> {
        self.state.calorie_log.iter().rev().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::midnight_of;
    use chrono::{Duration, Local, NaiveDateTime, NaiveTime, TimeZone};

    const HOUR: i64 = 60 * 60 * 1000;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, h: u32, min: u32) -> i64 {
        let naive = NaiveDateTime::new(date, NaiveTime::from_hms_opt(h, min, 0).unwrap());
        Local.from_local_datetime(&naive).earliest().unwrap().timestamp_millis()
    }

    fn ledger_on(date: NaiveDate, bmr: i64) -> Ledger {
        Ledger::fresh(at(date, 0, 0), bmr)
    }

    #[test]
    fn burn_is_linear_over_the_day() {
        let start = midnight_of(day(2025, 6, 10));
        assert_eq!(burn_between(1800, start, start), 0.0);
        assert_eq!(burn_between(1800, start, start + 12 * HOUR), 900.0);
        assert_eq!(burn_between(1800, start, start + 24 * HOUR), 1800.0);
        assert_eq!(burn_between(1800, start, start + 30 * HOUR), 1800.0);
        assert_eq!(burn_between(1800, start, start - HOUR), 0.0);
        // 1000 s at 2000/day = 23.148...
        assert_eq!(burn_between(2000, start, start + 1_000_999), 23.1);
    }

    #[test]
    fn net_calories_subtract_burn_from_intake() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2400);
        let now = at(date, 3, 0);
        let _ = ledger.adjust_calories(500, now);

        assert_eq!(ledger.calories_burned(now), 300.0);
        assert_eq!(ledger.net_calories(now), 200.0);
        assert_eq!(ledger.elapsed_seconds(now), 10_800);
    }

    #[test]
    fn adjust_appends_to_log_without_bounds() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        let _ = ledger.adjust_calories(100, at(date, 8, 0));
        let _ = ledger.adjust_calories(-100, at(date, 9, 0));
        let change = ledger.adjust_calories(-25_000, at(date, 10, 0));

        assert_eq!(change, Change::PersistAndSync);
        assert_eq!(ledger.state().manual_calories, -25_000);
        assert_eq!(ledger.state().calorie_log.len(), 3);
        assert_eq!(ledger.state().last_updated, at(date, 10, 0));
        assert_eq!(ledger.log_newest_first()[0].amount, -25_000);
        assert_eq!(ledger.today_totals(), Totals { eaten: 100, burned: 25_100 });
    }

    #[test]
    fn rollover_archives_one_record_and_resets_open_day() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.adjust_calories(700, at(date, 8, 0));
        let _ = ledger.adjust_calories(800, at(date, 13, 0));

        let next = midnight_of(day(2025, 6, 11));
        assert_eq!(ledger.roll_over(next), Change::PersistAndSync);

        let state = ledger.state();
        assert_eq!(state.daily_data.len(), 1);
        let record = &state.daily_data["2025-06-10"];
        assert_eq!(record.net_calories, -500.0);
        assert_eq!(record.manual_calories, 1500);
        assert_eq!(record.calorie_log.len(), 2);
        assert_eq!(record.bmr, 2000);
        assert_eq!(state.manual_calories, 0);
        assert!(state.calorie_log.is_empty());
        assert_eq!(state.day_start, next);
        assert_eq!(state.last_updated, next);
    }

    #[test]
    fn rollover_within_the_same_day_is_a_no_op() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.adjust_calories(300, at(date, 8, 0));

        assert_eq!(ledger.roll_over(at(date, 23, 59)), Change::Unchanged);
        assert!(ledger.state().daily_data.is_empty());
        assert_eq!(ledger.state().manual_calories, 300);
    }

    #[test]
    fn backfill_writes_each_missed_day_once() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        let _ = ledger.adjust_calories(2000, at(date, 20, 0));

        let now = at(day(2025, 6, 13), 9, 0);
        let _ = ledger.roll_over(now);

        let data = &ledger.state().daily_data;
        let keys: Vec<_> = data.keys().cloned().collect();
        assert_eq!(keys, vec!["2025-06-10", "2025-06-11", "2025-06-12"]);
        assert_eq!(data["2025-06-10"].net_calories, 200.0);
        for key in ["2025-06-11", "2025-06-12"] {
            assert_eq!(data[key].net_calories, -1800.0);
            assert_eq!(data[key].manual_calories, 0);
            assert!(data[key].calorie_log.is_empty());
        }
        assert_eq!(ledger.open_day_key(), "2025-06-13");
        assert_eq!(ledger.state().day_start, midnight_of(day(2025, 6, 13)));

        assert_eq!(ledger.roll_over(now + HOUR), Change::Unchanged);
        assert_eq!(ledger.state().daily_data.len(), 3);
    }

    #[test]
    fn backfill_keeps_existing_records_of_skipped_days() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        let _ = ledger.edit_day("2025-06-11", 2500, at(date, 9, 0));

        let _ = ledger.roll_over(at(day(2025, 6, 12), 7, 0));

        let record = &ledger.state().daily_data["2025-06-11"];
        assert_eq!(record.manual_calories, 2500);
        assert_eq!(record.net_calories, 700.0);
    }

    #[test]
    fn editing_a_past_day_moves_the_total_by_the_difference() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.adjust_calories(1500, at(date, 12, 0));
        let now = at(day(2025, 6, 11), 15, 30);
        let _ = ledger.roll_over(now);
        let _ = ledger.adjust_calories(400, now);

        let (before_net, _) = ledger.net_calories_for_date("2025-06-10", now);
        assert_eq!(before_net, -500.0);
        let before_total = ledger.total_calories(now);

        assert_eq!(ledger.edit_day("2025-06-10", 2500, now), Change::PersistAndSync);

        let (after_net, _) = ledger.net_calories_for_date("2025-06-10", now);
        assert_eq!(after_net, 500.0);
        assert!((ledger.total_calories(now) - before_total - 1000.0).abs() < 1e-6);

        let record = &ledger.state().daily_data["2025-06-10"];
        assert_eq!(record.calorie_log, vec![LogEntry { amount: 2500, timestamp: now }]);
        assert_eq!(ledger.state().manual_calories, 400);
        assert_eq!(ledger.state().calorie_log.len(), 1);
    }

    #[test]
    fn editing_today_replaces_the_log() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.adjust_calories(100, at(date, 8, 0));
        let _ = ledger.adjust_calories(100, at(date, 9, 0));

        let _ = ledger.edit_day("2025-06-10", 1200, at(date, 10, 0));

        assert_eq!(ledger.state().manual_calories, 1200);
        assert_eq!(ledger.state().calorie_log.len(), 1);
        assert!(ledger.state().daily_data.is_empty());
        assert_eq!(ledger.manual_calories_for_date("2025-06-10"), 1200);
    }

    #[test]
    fn editing_a_gap_day_uses_the_current_bmr() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.set_bmr(2200, at(date, 7, 0));

        let _ = ledger.edit_day("2025-05-01", 1800, at(date, 8, 0));

        let record = &ledger.state().daily_data["2025-05-01"];
        assert_eq!(record.bmr, 2200);
        assert_eq!(record.net_calories, -400.0);
        assert_eq!(record.date, "2025-05-01");
    }

    #[test]
    fn set_bmr_leaves_closed_days_alone() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let now = at(day(2025, 6, 11), 6, 0);
        let _ = ledger.roll_over(now);

        assert_eq!(ledger.set_bmr(2500, now), Change::PersistAndSync);
        assert_eq!(ledger.set_bmr(2500, now), Change::Unchanged);
        assert_eq!(ledger.state().daily_data["2025-06-10"].bmr, 2000);
        assert_eq!(ledger.state().bmr, 2500);
    }

    #[test]
    fn self_heal_is_idempotent() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        ledger.state.daily_data.insert(
            "2025-06-01".to_string(),
            DayRecord {
                date: "2025-06-01".to_string(),
                bmr: 1800,
                manual_calories: 0,
                net_calories: 0.0,
                calorie_log: vec![
                    LogEntry { amount: 700, timestamp: 1 },
                    LogEntry { amount: 500, timestamp: 2 },
                ],
            },
        );
        let now = at(date, 12, 0);

        assert_eq!(
            ledger.net_calories_for_date("2025-06-01", now),
            (-600.0, Change::PersistAndSync)
        );
        assert_eq!(
            ledger.net_calories_for_date("2025-06-01", now),
            (-600.0, Change::Unchanged)
        );
        assert_eq!(ledger.state().daily_data["2025-06-01"].manual_calories, 1200);
    }

    #[test]
    fn missing_dates_read_as_zero() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        assert_eq!(
            ledger.net_calories_for_date("2025-01-01", at(date, 12, 0)),
            (0.0, Change::Unchanged)
        );
        assert!(!ledger.has_record("2025-01-01"));
    }

    #[test]
    fn reset_today_discards_without_archiving() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        let _ = ledger.edit_day("2025-06-09", 2000, at(date, 7, 0));
        let _ = ledger.adjust_calories(900, at(date, 8, 0));

        let _ = ledger.reset_today(at(date, 9, 0));

        assert_eq!(ledger.state().manual_calories, 0);
        assert!(ledger.state().calorie_log.is_empty());
        assert_eq!(ledger.state().day_start, midnight_of(date));
        assert_eq!(ledger.state().daily_data.len(), 1);
    }

    #[test]
    fn range_totals_skip_future_days_and_count_positive_intake() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.edit_day("2025-06-08", 2100, at(date, 7, 0));
        let _ = ledger.edit_day("2025-06-09", -300, at(date, 7, 0));
        let _ = ledger.adjust_calories(600, at(date, 8, 0));
        let now = at(date, 6, 0);

        let totals = ledger.totals_for_range(day(2025, 6, 7), day(2025, 6, 14), now);

        assert_eq!(totals.eaten, 2700);
        assert_eq!(totals.burned, 4500);
    }

    #[test]
    fn progress_splits_pounds_and_percent() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.edit_day("2025-06-01", -5000, at(date, 0, 0));
        let now = midnight_of(date);

        let progress = ledger.progress(now);
        assert!(progress.is_deficit);
        assert_eq!(progress.pounds, 2);
        assert_eq!(progress.percent, 0);

        let _ = ledger.edit_day("2025-06-01", 5750, now);
        let progress = ledger.progress(now);
        assert!(!progress.is_deficit);
        assert_eq!(progress.total_calories, 3750.0);
        assert_eq!(progress.pounds, 1);
        assert_eq!(progress.percent, -7);
    }

    #[test]
    fn theme_cycles_through_modes() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let now = at(date, 1, 0);
        let modes: Vec<_> = (0..3)
            .map(|_| {
                let _ = ledger.toggle_theme(now);
                ledger.state().theme_mode
            })
            .collect();
        use crate::models::ThemeMode::*;
        assert_eq!(modes, vec![Light, Dark, Auto]);
    }

    #[test]
    fn clear_all_starts_over() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 2000);
        let _ = ledger.edit_day("2025-06-01", 100, at(date, 1, 0));
        let now = at(date + Duration::days(2), 10, 0);

        let _ = ledger.clear_all(now, 1800);

        assert!(ledger.state().daily_data.is_empty());
        assert_eq!(ledger.state().bmr, 1800);
        assert_eq!(ledger.open_day_key(), date_key(date + Duration::days(2)));
    }
    #[test]
    fn extreme_adjustments_saturate() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        let now = at(date, 9, 0);

        let _ = ledger.adjust_calories(i64::MAX, now);
        let _ = ledger.adjust_calories(1, now);
        assert_eq!(ledger.state().manual_calories, i64::MAX);

        let _ = ledger.adjust_calories(i64::MIN, now);
        assert_eq!(ledger.state().manual_calories, -1);
        let _ = ledger.adjust_calories(i64::MIN, now);
        assert_eq!(ledger.state().manual_calories, i64::MIN);

        assert_eq!(
            ledger.today_totals(),
            Totals { eaten: i64::MAX, burned: i64::MAX }
        );
        assert!(ledger.net_calories(now).is_finite());
        assert!(ledger.progress(now).is_deficit);
    }

    #[test]
    fn extreme_edits_saturate() {
        let date = day(2025, 6, 10);
        let mut ledger = ledger_on(date, 1800);
        let now = at(date, 9, 0);

        let _ = ledger.edit_day("2025-01-01", i64::MIN, now);
        let record = &ledger.state().daily_data["2025-01-01"];
        assert_eq!(record.manual_calories, i64::MIN);
        assert_eq!(record.net_calories, i64::MIN as f64);

        let _ = ledger.edit_day("2025-01-01", i64::MIN, now);
        assert_eq!(
            ledger.state().daily_data["2025-01-01"].net_calories,
            i64::MIN as f64
        );

        let _ = ledger.edit_day("2025-06-10", i64::MAX, now);
        let _ = ledger.roll_over(at(day(2025, 6, 11), 9, 0));
        assert!(ledger.state().daily_data["2025-06-10"].net_calories > 0.0);
        assert!(ledger.total_calories(at(day(2025, 6, 11), 9, 0)).is_finite());
    }

    #[test]
    fn a_day_closed_late_burns_the_full_bmr() {
        // Covers every DST transition of the local zone.
        let mut date = day(2025, 1, 1);
        while date < day(2026, 1, 1) {
            let mut ledger = Ledger::fresh(midnight_of(date), 2400);
            let _ = ledger.roll_over(midnight_of(date + Duration::days(1)) + 12 * HOUR);
            assert_eq!(
                ledger.state().daily_data[&date_key(date)].net_calories,
                -2400.0,
                "closing {date}"
            );
            date = date + Duration::days(1);
        }
    }
}
