//! Axum route handlers for the fleet API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fleet::copy_day::{copy_previous_day, CopyReport};
use crate::fleet::daily::{self, DailyRow, StatusUpdate};
use crate::fleet::observations::{self, ObservationPreview};
use crate::fleet::roster::{self, VehicleRequest, VehicleResponse};
use crate::fleet::summary::{load_summary, DaySummary};
use crate::fleet::timeline::{load_timeline, TimelineView};
use crate::identity::Identity;
use crate::models::calendar::YearMonth;
use crate::models::observation::DailyObservation;
use crate::models::status::StatusRecord;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub date: NaiveDate,
    pub deleted: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Vehicles
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/vehicles
pub async fn handle_list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    Ok(Json(roster::load_roster(state.store.as_ref()).await?))
}

/// POST /api/v1/vehicles
pub async fn handle_create_vehicle(
    State(state): State<AppState>,
    identity: Option<Identity>,
    Json(request): Json<VehicleRequest>,
) -> Result<(StatusCode, Json<VehicleResponse>), AppError> {
    let created = roster::create_vehicle(state.store.as_ref(), identity.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/vehicles/:id
pub async fn handle_update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: Option<Identity>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let updated =
        roster::update_vehicle(state.store.as_ref(), identity.as_ref(), id, request).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/vehicles/:id
pub async fn handle_delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: Option<Identity>,
) -> Result<StatusCode, AppError> {
    roster::delete_vehicle(state.store.as_ref(), identity.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Per-day statuses
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/days/:date/statuses?q=
pub async fn handle_daily_statuses(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DailyRow>>, AppError> {
    let rows = daily::load_daily_rows(state.store.as_ref(), date, query.q.as_deref()).await?;
    Ok(Json(rows))
}

/// PUT /api/v1/days/:date/statuses/:vehicle_id
pub async fn handle_record_status(
    State(state): State<AppState>,
    Path((date, vehicle_id)): Path<(NaiveDate, Uuid)>,
    identity: Option<Identity>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<StatusRecord>, AppError> {
    let record = daily::record_status(
        state.store.as_ref(),
        identity.as_ref(),
        vehicle_id,
        date,
        update,
    )
    .await?;
    Ok(Json(record))
}

/// DELETE /api/v1/days/:date/statuses
pub async fn handle_clear_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    identity: Option<Identity>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = daily::clear_day(state.store.as_ref(), identity.as_ref(), date).await?;
    Ok(Json(DeletedResponse { date, deleted }))
}

/// POST /api/v1/days/:date/copy-previous
///
/// Bounded by `COPY_TIMEOUT_SECS`. A client that disconnects drops the
/// future, which rolls back the store transaction.
pub async fn handle_copy_previous_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    identity: Option<Identity>,
) -> Result<Json<CopyReport>, AppError> {
    let timeout = state.config.copy_timeout;
    let report = tokio::time::timeout(
        timeout,
        copy_previous_day(state.store.as_ref(), date, identity.as_ref()),
    )
    .await
    .map_err(|_| {
        AppError::Timeout(format!(
            "copying statuses into {date} did not finish within {}s",
            timeout.as_secs()
        ))
    })??;
    Ok(Json(report))
}

/// GET /api/v1/days/:date/summary
pub async fn handle_day_summary(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DaySummary>, AppError> {
    Ok(Json(load_summary(state.store.as_ref(), date).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Observations
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/days/:date/observation
pub async fn handle_get_observation(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Option<DailyObservation>>, AppError> {
    Ok(Json(
        observations::get_observation(state.store.as_ref(), date).await?,
    ))
}

/// PUT /api/v1/days/:date/observation
pub async fn handle_save_observation(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    identity: Option<Identity>,
    Json(request): Json<ObservationRequest>,
) -> Result<Json<DailyObservation>, AppError> {
    let saved = observations::save_observation(
        state.store.as_ref(),
        identity.as_ref(),
        date,
        request.content,
    )
    .await?;
    Ok(Json(saved))
}

/// GET /api/v1/observations?limit=
pub async fn handle_observation_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ObservationPreview>>, AppError> {
    Ok(Json(
        observations::observation_history(state.store.as_ref(), query.limit).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Timeline
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/timeline/:month
pub async fn handle_timeline(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> Result<Json<TimelineView>, AppError> {
    let month: YearMonth = month
        .parse()
        .map_err(|e| AppError::Validation(format!("{e}; expected YYYY-MM")))?;
    Ok(Json(load_timeline(state.store.as_ref(), month).await?))
}
