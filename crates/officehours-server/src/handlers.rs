//! API route handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use officehours_core::{OfficeHour, OfficeHourRecord};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{
    HealthResponse, OfficeHoursResponse, OpenQuery, OpenRange, OpenResponse, RangesQuery,
    RangesResponse,
};
use crate::state::AppState;

/// GET /api/office-hours - List all office hours.
pub async fn list_office_hours(State(state): State<AppState>) -> Result<Json<OfficeHoursResponse>> {
    let office_hours = state.store.list_all().await?;
    Ok(Json(OfficeHoursResponse { office_hours }))
}

/// GET /api/office-hours/{id} - Get one office hour.
pub async fn get_office_hour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OfficeHour>> {
    Ok(Json(state.store.get(&id).await?))
}

/// PUT /api/office-hours - Create or replace an office hour.
pub async fn upsert_office_hour(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OfficeHourRecord>, JsonRejection>,
) -> Result<Json<OfficeHour>> {
    let Json(record) = payload?;
    let rule = OfficeHour::try_from(record)?;
    let saved = state.store.upsert(rule).await?;

    info!(id = saved.id().unwrap_or_default(), "Office hour saved");
    state.rules_changed();

    Ok(Json(saved))
}

/// DELETE /api/office-hours/{id} - Delete an office hour.
pub async fn delete_office_hour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.delete_by_id(&id).await?;

    info!(%id, "Office hour deleted");
    state.rules_changed();

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/office-hours/ranges - Governing rule and open ranges for a day.
pub async fn office_hour_ranges(
    State(state): State<AppState>,
    query: std::result::Result<Query<RangesQuery>, QueryRejection>,
) -> Result<Json<RangesResponse>> {
    let Query(query) = query?;
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let day = state.resolver.office_hour_ranges(date, &Local).await?;

    debug!(%date, ranges = day.open_ranges.len(), "Resolved office hour ranges");

    Ok(Json(RangesResponse {
        office_hour: day.office_hour,
        open_ranges: day
            .open_ranges
            .into_iter()
            .map(|interval| OpenRange {
                from: interval.start,
                to: interval.end,
            })
            .collect(),
    }))
}

/// GET /api/open - Whether the business is open at an instant.
pub async fn is_open(
    State(state): State<AppState>,
    query: std::result::Result<Query<OpenQuery>, QueryRejection>,
) -> Result<Json<OpenResponse>> {
    let Query(query) = query?;
    let at = query
        .timestamp
        .map(|ts| ts.with_timezone(&Local))
        .unwrap_or_else(Local::now);
    let open_state = state.resolver.open_state_at(&at).await?;

    Ok(Json(OpenResponse {
        open: open_state.is_open,
        office_hour: open_state.applied,
    }))
}

/// GET /health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
