use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/adjust/add", post(handlers::adjust_add))
        .route("/adjust/sub", post(handlers::adjust_sub))
        .route("/reset", post(handlers::reset_today_form))
        .route("/api/today", get(handlers::get_today))
        .route("/api/adjust", post(handlers::adjust))
        .route("/api/bmr", post(handlers::set_bmr))
        .route("/api/days/:date", get(handlers::get_day).put(handlers::edit_day))
        .route("/api/reset", post(handlers::reset_today))
        .route("/api/clear", post(handlers::clear_all))
        .route("/api/theme", post(handlers::toggle_theme))
        .route("/api/log", get(handlers::get_log))
        .route("/api/week", get(handlers::get_week))
        .route("/api/month", get(handlers::get_month))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/export", get(handlers::export_data))
        .route("/api/import", post(handlers::import_data))
        .route("/api/device", get(handlers::get_device).put(handlers::set_device))
        .route("/api/sync", get(handlers::get_sync).post(handlers::sync_now))
        .with_state(state)
}
