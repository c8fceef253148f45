use crate::dates::{format_date_key, local_date, parse_date_key};
use crate::errors::AppError;
use crate::ledger::{Change, Ledger};
use crate::models::{
    AdjustRequest, BmrRequest, DayDetail, DeviceRequest, DeviceResponse, EditDayRequest,
    ExportFile, ImportQuery, ImportResponse, LogEntry, MonthView, OffsetQuery, StatsResponse,
    SyncInfo, ThemeResponse, TodayResponse, WeekView,
};
use crate::state::AppState;
use crate::stats::{build_month_at, build_stats_at, build_week_at};
use crate::storage::{export_file, parse_import, save_device_id};
use crate::sync::{adopt_if_newer, is_valid_device_id, pull, SyncStatus, MIN_DEVICE_ID_LEN};
use crate::ui::render_index;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
    Json,
};
use tracing::{info, warn};

const BUTTON_STEP: i64 = 100;

/// Runs one ledger operation under the lock: rolls the day over first,
/// then persists and schedules sync for whatever changed.
async fn apply<T>(state: &AppState, op: impl FnOnce(&mut Ledger, i64) -> (T, Change)) -> T {
    let now = state.now();
    let mut ledger = state.ledger.lock().await;
    let rolled = ledger.roll_over(now);
    let (value, change) = op(&mut *ledger, now);
    state.commit(&ledger, rolled.merge(change)).await;
    value
}

fn today_response(ledger: &Ledger, now: i64) -> TodayResponse {
    let ledger_state = ledger.state();
    TodayResponse {
        date: ledger.open_day_key(),
        bmr: ledger_state.bmr,
        elapsed_seconds: ledger.elapsed_seconds(now),
        manual_calories: ledger_state.manual_calories,
        calories_burned: ledger.calories_burned(now),
        net_calories: ledger.net_calories(now),
        totals: ledger.today_totals(),
        progress: ledger.progress(now),
        theme_mode: ledger_state.theme_mode,
    }
}

fn day_detail(ledger: &mut Ledger, date: &str, now: i64) -> (DayDetail, Change) {
    let (net_calories, change) = ledger.net_calories_for_date(date, now);
    let detail = DayDetail {
        date: date.to_string(),
        manual_calories: ledger.manual_calories_for_date(date),
        net_calories,
        has_data: date == ledger.open_day_key() || ledger.has_record(date),
    };
    (detail, change)
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let today = apply(&state, |ledger, now| {
        (today_response(ledger, now), Change::Unchanged)
    })
    .await;
    Html(render_index(&today))
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    Json(
        apply(&state, |ledger, now| {
            (today_response(ledger, now), Change::Unchanged)
        })
        .await,
    )
}

pub async fn adjust(
    State(state): State<AppState>,
    Json(payload): Json<AdjustRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    if payload.amount == 0 {
        return Err(AppError::bad_request("amount must be non-zero"));
    }
    Ok(Json(apply_adjust(&state, payload.amount).await))
}

pub async fn adjust_add(State(state): State<AppState>) -> Redirect {
    apply_adjust(&state, BUTTON_STEP).await;
    Redirect::to("/")
}

pub async fn adjust_sub(State(state): State<AppState>) -> Redirect {
    apply_adjust(&state, -BUTTON_STEP).await;
    Redirect::to("/")
}

async fn apply_adjust(state: &AppState, amount: i64) -> TodayResponse {
    apply(state, |ledger, now| {
        let change = ledger.adjust_calories(amount, now);
        (today_response(ledger, now), change)
    })
    .await
}

pub async fn set_bmr(
    State(state): State<AppState>,
    Json(payload): Json<BmrRequest>,
) -> Result<Json<TodayResponse>, AppError> {
    if payload.bmr <= 0 {
        return Err(AppError::bad_request("bmr must be positive"));
    }
    let today = apply(&state, |ledger, now| {
        let change = ledger.set_bmr(payload.bmr, now);
        (today_response(ledger, now), change)
    })
    .await;
    Ok(Json(today))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayDetail>, AppError> {
    if parse_date_key(&date).is_none() {
        return Err(AppError::bad_request("date must be YYYY-MM-DD"));
    }
    Ok(Json(apply(&state, |ledger, now| day_detail(ledger, &date, now)).await))
}

pub async fn edit_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(payload): Json<EditDayRequest>,
) -> Result<Json<DayDetail>, AppError> {
    let Some(day) = parse_date_key(&date) else {
        return Err(AppError::bad_request("date must be YYYY-MM-DD"));
    };
    if day > local_date(state.now()) {
        return Err(AppError::bad_request("cannot edit a future date"));
    }

    let detail = apply(&state, |ledger, now| {
        let edited = ledger.edit_day(&date, payload.manual_calories, now);
        let (detail, healed) = day_detail(ledger, &date, now);
        (detail, edited.merge(healed))
    })
    .await;
    info!(date = %date, manual = payload.manual_calories, "edited day");
    Ok(Json(detail))
}

pub async fn reset_today(State(state): State<AppState>) -> Json<TodayResponse> {
    Json(
        apply(&state, |ledger, now| {
            let change = ledger.reset_today(now);
            (today_response(ledger, now), change)
        })
        .await,
    )
}

pub async fn reset_today_form(State(state): State<AppState>) -> Redirect {
    reset_today(State(state)).await;
    Redirect::to("/")
}

pub async fn clear_all(State(state): State<AppState>) -> Json<TodayResponse> {
    let bmr = state.default_bmr;
    Json(
        apply(&state, |ledger, now| {
            let change = ledger.clear_all(now, bmr);
            (today_response(ledger, now), change)
        })
        .await,
    )
}

pub async fn toggle_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(
        apply(&state, |ledger, now| {
            let change = ledger.toggle_theme(now);
            let response = ThemeResponse {
                theme_mode: ledger.state().theme_mode,
            };
            (response, change)
        })
        .await,
    )
}

pub async fn get_log(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(apply(&state, |ledger, _| (ledger.log_newest_first(), Change::Unchanged)).await)
}

pub async fn get_week(
    State(state): State<AppState>,
    Query(query): Query<OffsetQuery>,
) -> Json<WeekView> {
    Json(apply(&state, |ledger, now| build_week_at(ledger, query.offset, now)).await)
}

pub async fn get_month(
    State(state): State<AppState>,
    Query(query): Query<OffsetQuery>,
) -> Json<MonthView> {
    Json(apply(&state, |ledger, now| build_month_at(ledger, query.offset, now)).await)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(apply(&state, build_stats_at).await)
}

pub async fn export_data(State(state): State<AppState>) -> impl IntoResponse {
    let (file, filename): (ExportFile, String) = apply(&state, |ledger, now| {
        let filename = format!("calorie-counter-data-{}.json", format_date_key(now));
        ((export_file(ledger.state(), now), filename), Change::Unchanged)
    })
    .await;
    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )],
        Json(file),
    )
}

/// Without `confirm=true` the file is only validated and summarised.
pub async fn import_data(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportResponse>, AppError> {
    let imported = parse_import(&body)?;
    let mut response = ImportResponse {
        applied: false,
        days: imported.daily_data.len(),
        bmr: imported.bmr,
        last_updated: imported.last_updated,
    };
    if !query.confirm {
        return Ok(Json(response));
    }

    apply(&state, |ledger, now| {
        let replaced = ledger.replace(imported);
        let rolled = ledger.roll_over(now);
        ((), replaced.merge(rolled))
    })
    .await;
    info!(days = response.days, "imported state");
    response.applied = true;
    Ok(Json(response))
}

pub async fn get_device(State(state): State<AppState>) -> Json<DeviceResponse> {
    Json(DeviceResponse {
        device_id: state.device_id.lock().await.clone(),
    })
}

/// Switches to another device id, adopting that id's remote document if it
/// is newer than the local one.
pub async fn set_device(
    State(state): State<AppState>,
    Json(payload): Json<DeviceRequest>,
) -> Result<Json<DeviceResponse>, AppError> {
    let device_id = payload.device_id.trim().to_string();
    if !is_valid_device_id(&device_id) {
        return Err(AppError::bad_request(format!(
            "device id must be at least {MIN_DEVICE_ID_LEN} characters"
        )));
    }
    save_device_id(&state.device_id_path, &device_id).await?;
    *state.device_id.lock().await = device_id.clone();
    info!("device id changed");

    if let Some(remote) = &state.remote {
        match pull(remote, &device_id).await {
            Ok(Some(remote_state)) => {
                let now = state.now();
                let mut ledger = state.ledger.lock().await;
                if adopt_if_newer(&mut ledger, remote_state) {
                    let change = ledger.roll_over(now).merge(Change::Persist);
                    state.commit(&ledger, change).await;
                }
            }
            Ok(None) => {}
            Err(err) => warn!("cloud load failed: {err}"),
        }
    }

    Ok(Json(DeviceResponse { device_id }))
}

pub async fn get_sync(State(state): State<AppState>) -> Json<SyncInfo> {
    Json(sync_info(&state).await)
}

/// Pushes immediately instead of waiting for the quiet period.
pub async fn sync_now(State(state): State<AppState>) -> Result<Json<SyncInfo>, AppError> {
    let Some(sync) = &state.sync else {
        return Err(AppError::bad_request("sync is not configured"));
    };
    let snapshot = {
        let ledger = state.ledger.lock().await;
        state.snapshot(&ledger).await
    };
    sync.flush(snapshot);
    Ok(Json(sync_info(&state).await))
}

async fn sync_info(state: &AppState) -> SyncInfo {
    SyncInfo {
        enabled: state.sync.is_some(),
        status: state
            .sync
            .as_ref()
            .map_or(SyncStatus::Idle, |sync| sync.status()),
        device_id: state.device_id.lock().await.clone(),
    }
}
