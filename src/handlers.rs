use crate::errors::AppError;
use crate::identity::CurrentUser;
use crate::models::{
    DayView, DeedForm, DeedRequest, DeedView, DuaRequest, DuaView, MagnitudeInput, Prayer,
    ProfileResponse, QuranProgressResponse, QuranRequest, RamadanTotals, StatsResponse, Summary,
    WatchQuery,
};
use crate::quotes::{quote_for, Quote};
use crate::scoring::{parse_magnitude, DeedDraft, ValidationError};
use crate::state::AppState;
use crate::stats::parse_date;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use tokio::time::timeout;
use tracing::debug;

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Html<String>, AppError> {
    let today = today();
    let day = state.tracker.day(&uid, today).await?;
    let summary = state.tracker.summary(&uid).await?;
    Ok(Html(render_index(&day, &summary, &quote_for(today))))
}

pub async fn toggle_prayer_form(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    let prayer = parse_prayer(&name)?;
    state.tracker.toggle_prayer(&uid, today(), prayer).await?;
    Ok(Redirect::to("/"))
}

pub async fn add_deed_form(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Form(form): Form<DeedForm>,
) -> Result<Redirect, AppError> {
    let draft = DeedDraft::new(&form.description, &MagnitudeInput::Text(form.points), &form.kind)?;
    state.tracker.add_deed(&uid, today(), draft).await?;
    Ok(Redirect::to("/"))
}

pub async fn get_today(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<DayView>, AppError> {
    Ok(Json(state.tracker.day(&uid, today()).await?))
}

pub async fn get_day(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<DayView>, AppError> {
    let date = parse_date(&date)?;
    Ok(Json(state.tracker.day(&uid, date).await?))
}

pub async fn record_prayer(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<DayView>, AppError> {
    let prayer = parse_prayer(&name)?;
    Ok(Json(state.tracker.record_prayer(&uid, today(), prayer).await?))
}

pub async fn revoke_prayer(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<DayView>, AppError> {
    let prayer = parse_prayer(&name)?;
    Ok(Json(state.tracker.revoke_prayer(&uid, today(), prayer).await?))
}

pub async fn add_deed(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<DeedRequest>,
) -> Result<(StatusCode, Json<DeedView>), AppError> {
    let draft = payload.to_draft()?;
    let deed = state.tracker.add_deed(&uid, today(), draft).await?;
    Ok((StatusCode::CREATED, Json(deed)))
}

pub async fn edit_deed(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<DeedRequest>,
) -> Result<Json<DeedView>, AppError> {
    let draft = payload.to_draft()?;
    Ok(Json(state.tracker.edit_deed(&uid, today(), &id, draft).await?))
}

pub async fn delete_deed(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DayView>, AppError> {
    Ok(Json(state.tracker.delete_deed(&uid, today(), &id).await?))
}

pub async fn get_stats(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<StatsResponse>, AppError> {
    Ok(Json(state.tracker.stats(&uid, today()).await?))
}

pub async fn get_summary(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<Summary>, AppError> {
    Ok(Json(state.tracker.summary(&uid).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    Ok(Json(state.tracker.profile(&uid).await?))
}

pub async fn get_totals(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<RamadanTotals>, AppError> {
    Ok(Json(state.tracker.totals(&uid).await?))
}

pub async fn list_duas(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<Vec<DuaView>>, AppError> {
    Ok(Json(state.tracker.duas(&uid).await?))
}

pub async fn add_dua(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<DuaRequest>,
) -> Result<(StatusCode, Json<DuaView>), AppError> {
    let text = payload.text.as_deref().unwrap_or_default();
    let dua = state.tracker.add_dua(&uid, text).await?;
    Ok((StatusCode::CREATED, Json(dua)))
}

pub async fn edit_dua(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<DuaRequest>,
) -> Result<Json<DuaView>, AppError> {
    let text = payload.text.as_deref().unwrap_or_default();
    Ok(Json(state.tracker.edit_dua(&uid, &id, text).await?))
}

pub async fn delete_dua(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.tracker.delete_dua(&uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_quran(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<QuranProgressResponse>, AppError> {
    Ok(Json(state.tracker.quran_progress(&uid).await?))
}

pub async fn mark_quran(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<QuranRequest>,
) -> Result<Json<QuranProgressResponse>, AppError> {
    let surah = payload.surah.as_deref().unwrap_or_default();
    if surah.trim().is_empty() {
        return Err(ValidationError::MissingSurah.into());
    }
    let pages = payload
        .pages
        .as_ref()
        .and_then(parse_magnitude)
        .and_then(|pages| u32::try_from(pages).ok())
        .ok_or(ValidationError::InvalidPages)?;
    Ok(Json(state.tracker.mark_quran(&uid, today(), surah, pages).await?))
}

pub async fn delete_quran(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Path((date, surah)): Path<(String, String)>,
) -> Result<Json<QuranProgressResponse>, AppError> {
    let date = parse_date(&date)?;
    Ok(Json(state.tracker.delete_quran_entry(&uid, date, &surah).await?))
}

pub async fn get_quote() -> Json<Quote> {
    Json(quote_for(today()))
}

/// Long-poll: answers with the next snapshot of `path` once it changes, or
/// `204` when nothing changed before the configured timeout.
pub async fn watch(
    State(state): State<AppState>,
    CurrentUser(uid): CurrentUser,
    Query(query): Query<WatchQuery>,
) -> Result<Response, AppError> {
    let path = query.path.unwrap_or_default();
    let mut subscription = state.tracker.watch(&uid, &path).await?;
    // The first delivery is the current value, which the client already has.
    subscription.next().await;

    match timeout(state.config.watch_timeout, subscription.next()).await {
        Ok(Some(snapshot)) => Ok(Json(snapshot).into_response()),
        Ok(None) => Ok(StatusCode::SERVICE_UNAVAILABLE.into_response()),
        Err(_) => {
            debug!(user = %uid, path = %path, "watch timed out without changes");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

fn parse_prayer(name: &str) -> Result<Prayer, ValidationError> {
    name.parse().map_err(ValidationError::UnknownPrayer)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
