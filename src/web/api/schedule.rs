use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    catalog::{from_json_values, LoadedCatalog, PassRecord, RejectedRecord},
    config::Permission,
    report::ScheduleReport,
    scheduler::{ScheduleEngine, StationTimeline},
    web::api::error::{ApiError, ApiResult, ErrorResponse},
    web::auth::{require_permission, AppState, AuthenticatedUser},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleRequest {
    /// Extra stations that may take offloaded passes, on top of the configured ones
    #[serde(default)]
    pub stations: Vec<String>,
    #[schema(value_type = Vec<PassRecord>)]
    pub passes: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationResponse {
    pub valid: bool,
    pub accepted: usize,
    pub errors: Vec<RejectedRecord>,
}

#[utoipa::path(
    post,
    path = "/api/schedule",
    tag = "schedule",
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Finalized schedule", body = ScheduleReport),
        (status = 400, description = "No usable pass in the request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions"),
        (status = 500, description = "Scheduling run failed", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn run_schedule(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<ScheduleReport>> {
    require_permission(&user, Permission::RunSchedule)?;

    let submitted = request.passes.len();
    let LoadedCatalog { catalog, rejected } = from_json_values(request.passes);
    if catalog.is_empty() && submitted > 0 {
        return Err(ApiError::Validation(format!(
            "all {} pass records were rejected",
            submitted
        )));
    }

    let mut settings = state.config.engine_settings();
    settings.stations.extend(request.stations);

    let report = tokio::task::spawn_blocking(move || {
        let outcome = ScheduleEngine::new(catalog, &settings).run();
        ScheduleReport::new(outcome, rejected)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    log::info!("{} ran schedule {}", user.name, report.run_id);

    *state.latest.write().await = Some(report.clone());
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/schedule/validate",
    tag = "schedule",
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Validation result", body = ValidationResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions")
    ),
    security(("api_key" = []))
)]
pub async fn validate_catalog(
    State(_state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ScheduleRequest>,
) -> ApiResult<Json<ValidationResponse>> {
    require_permission(&user, Permission::RunSchedule)?;

    let LoadedCatalog { catalog, rejected } = from_json_values(request.passes);
    Ok(Json(ValidationResponse {
        valid: rejected.is_empty(),
        accepted: catalog.len(),
        errors: rejected,
    }))
}

#[utoipa::path(
    get,
    path = "/api/schedule/latest",
    tag = "schedule",
    responses(
        (status = 200, description = "Most recent schedule", body = ScheduleReport),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "Nothing scheduled yet", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn latest_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ScheduleReport>> {
    require_permission(&user, Permission::ViewSchedule)?;

    state
        .latest
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or(ApiError::NotFound("schedule_not_found"))
}

#[utoipa::path(
    get,
    path = "/api/schedule/latest/stations/{id}",
    tag = "schedule",
    params(
        ("id" = String, Path, description = "Ground station id")
    ),
    responses(
        (status = 200, description = "Timeline of one station", body = StationTimeline),
        (status = 401, description = "Missing or invalid API key"),
        (status = 403, description = "Insufficient permissions"),
        (status = 404, description = "No schedule or unknown station", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn latest_station(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<StationTimeline>> {
    require_permission(&user, Permission::ViewSchedule)?;

    let latest = state.latest.read().await;
    let report = latest
        .as_ref()
        .ok_or(ApiError::NotFound("schedule_not_found"))?;
    report
        .station(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::NotFound("station_not_found"))
}
