use crate::dates::{
    date_key, local_date, month_end, month_label, month_start, week_label, week_start,
};
use crate::ledger::{Change, Ledger};
use crate::models::{DayCell, MonthView, SparkPoint, StatsResponse, WeekView};
use chrono::{Datelike, Duration, NaiveDate};

/// Seven-day net series plus weight progress.
pub fn build_stats_at(ledger: &mut Ledger, now: i64) -> (StatsResponse, Change) {
    let today = local_date(now);
    let mut change = Change::Unchanged;

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset);
        let key = date_key(date);
        let (net_calories, healed) = ledger.net_calories_for_date(&key, now);
        change = change.merge(healed);
        last_7_days.push(SparkPoint {
            date: key,
            net_calories,
        });
    }

    let stats = StatsResponse {
        last_7_days,
        progress: ledger.progress(now),
    };
    (stats, change)
}

/// ISO week `offset` weeks back from the current one; forward offsets clamp to 0.
pub fn build_week_at(ledger: &mut Ledger, offset: i32, now: i64) -> (WeekView, Change) {
    let offset = offset.min(0);
    let today = local_date(now);
    let start = week_start(today) + Duration::weeks(offset as i64);
    let end = start + Duration::days(6);

    let mut change = Change::Unchanged;
    let mut days = Vec::with_capacity(7);
    for day_offset in 0..7 {
        let (cell, healed) = day_cell(ledger, start + Duration::days(day_offset), today, now);
        change = change.merge(healed);
        days.push(cell);
    }

    let view = WeekView {
        label: week_label(start),
        offset,
        start_date: date_key(start),
        end_date: date_key(end),
        days,
        totals: ledger.totals_for_range(start, end, now),
        can_go_forward: offset < 0,
    };
    (view, change)
}

/// Calendar month `offset` months back; cells start on Monday.
pub fn build_month_at(ledger: &mut Ledger, offset: i32, now: i64) -> (MonthView, Change) {
    let offset = offset.min(0);
    let today = local_date(now);
    let first = month_start(today, offset);
    let last = month_end(first);

    let mut change = Change::Unchanged;
    let mut days = Vec::with_capacity(31);
    for date in first.iter_days().take_while(|date| *date <= last) {
        let (cell, healed) = day_cell(ledger, date, today, now);
        change = change.merge(healed);
        days.push(cell);
    }

    let view = MonthView {
        label: month_label(first),
        offset,
        leading_blanks: first.weekday().num_days_from_monday(),
        days,
        totals: ledger.totals_for_range(first, last, now),
        can_go_forward: offset < 0,
    };
    (view, change)
}

fn day_cell(ledger: &mut Ledger, date: NaiveDate, today: NaiveDate, now: i64) -> (DayCell, Change) {
    let key = date_key(date);
    let is_today = date == today;
    let (net_calories, change) = ledger.net_calories_for_date(&key, now);
    let cell = DayCell {
        has_data: is_today || ledger.has_record(&key),
        date: key,
        net_calories,
        is_today,
    };
    (cell, change)
}
