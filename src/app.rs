use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/prayers/:name/toggle", post(handlers::toggle_prayer_form))
        .route("/deeds/new", post(handlers::add_deed_form))
        .route("/api/today", get(handlers::get_today))
        .route("/api/days/:date", get(handlers::get_day))
        .route(
            "/api/prayers/:name",
            post(handlers::record_prayer).delete(handlers::revoke_prayer),
        )
        .route("/api/deeds", post(handlers::add_deed))
        .route(
            "/api/deeds/:id",
            put(handlers::edit_deed).delete(handlers::delete_deed),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/profile", get(handlers::get_profile))
        .route("/api/totals", get(handlers::get_totals))
        .route("/api/duas", get(handlers::list_duas).post(handlers::add_dua))
        .route(
            "/api/duas/:id",
            put(handlers::edit_dua).delete(handlers::delete_dua),
        )
        .route("/api/quran", get(handlers::get_quran).post(handlers::mark_quran))
        .route("/api/quran/:date/:surah", delete(handlers::delete_quran))
        .route("/api/quote", get(handlers::get_quote))
        .route("/api/watch", get(handlers::watch))
        .with_state(state)
}
