//! REST handlers.

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use medrec_core::constants::DEFAULT_LIST_LIMIT;
use medrec_core::{CallStartOutcome, CallStartRequest, PatientRecord, PatientSummary};
use medrec_types::PatientId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
}

/// Patient grid listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientList {
    pub items: Vec<PatientSummary>,
}

/// Query parameters for `GET /api/patients`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Maximum number of patients to return (default 200).
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is alive", body = HealthRes)
    )
)]
/// Liveness probe. Always 200, never touches the directory or the sink.
pub async fn healthz() -> Json<HealthRes> {
    Json(HealthRes { ok: true })
}

#[utoipa::path(
    get,
    path = "/api/patients",
    params(ListParams),
    responses(
        (status = 200, description = "Patients from the directory", body = PatientList),
        (status = 500, description = "Directory store failure", body = ErrorBody)
    )
)]
/// List patients for the grid.
///
/// # Errors
/// Returns `500 Internal Server Error` if the directory store is unconfigured, unreachable or
/// answers with a non-2xx status.
#[axum::debug_handler(state = AppState)]
pub async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PatientList>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let items = state.directory.list_patients(limit).await?;
    Ok(Json(PatientList { items }))
}

#[utoipa::path(
    get,
    path = "/api/patients/{patient_id}",
    params(
        ("patient_id" = String, Path, description = "Exact patient identifier")
    ),
    responses(
        (status = 200, description = "Full patient record", body = PatientRecord),
        (status = 404, description = "No patient with this identifier", body = ErrorBody),
        (status = 500, description = "Directory store failure", body = ErrorBody)
    )
)]
/// Fetch one patient by exact identifier.
///
/// # Errors
/// - `404 Not Found` if no row has this identifier.
/// - `500 Internal Server Error` on directory store failure.
#[axum::debug_handler(state = AppState)]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<PatientRecord>> {
    let id = PatientId::parse(&patient_id)
        .map_err(|_| ApiError::validation("patient_id is required"))?;
    state
        .directory
        .get_patient_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Patient {id} not found in directory")))
}

#[utoipa::path(
    post,
    path = "/api/start",
    request_body = CallStartRequest,
    responses(
        (status = 200, description = "Event forwarded; `ok` mirrors the sink's answer", body = CallStartOutcome),
        (status = 400, description = "patient_id blank or no phone resolvable", body = ErrorBody),
        (status = 404, description = "Unknown patient and no name+phone fallback", body = ErrorBody),
        (status = 500, description = "Sink unconfigured or directory failure", body = ErrorBody),
        (status = 502, description = "Sink unreachable", body = ErrorBody)
    )
)]
/// Start a follow-up call for a patient.
///
/// Looks the patient up, merges caller overrides, and forwards one `start_call` event to the
/// webhook sink. A sink that answers non-2xx still yields 200 with `ok: false`.
///
/// # Errors
/// See the response table; every error body carries the underlying cause.
#[axum::debug_handler(state = AppState)]
pub async fn start_call(
    State(state): State<AppState>,
    Json(req): Json<CallStartRequest>,
) -> ApiResult<Json<CallStartOutcome>> {
    let outcome = state.calls.start_call(req).await?;
    Ok(Json(outcome))
}
