//! # API REST
//!
//! REST API for the MedRec voice backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI document (served as JSON)
//! - REST-specific concerns (JSON serialisation, CORS, status codes)
//!
//! All patient and call logic lives in `medrec-core`.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

use axum::{
    http::{HeaderValue, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use medrec_core::{CallStartService, CoreConfig, CorsOrigins, PatientDirectory};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn PatientDirectory>,
    pub calls: CallStartService,
}

impl AppState {
    /// State whose listing endpoints use the same directory as the start-call service.
    pub fn new(calls: CallStartService) -> Self {
        Self {
            directory: calls.directory().clone(),
            calls,
        }
    }

    /// Wire state from configuration.
    ///
    /// # Errors
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn from_config(cfg: &CoreConfig) -> anyhow::Result<Self> {
        Ok(Self::new(medrec_core::call_start_service(cfg)?))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::healthz,
        handlers::list_patients,
        handlers::get_patient,
        handlers::start_call,
    ),
    components(schemas(
        handlers::HealthRes,
        handlers::PatientList,
        error::ErrorBody,
        medrec_core::PatientSummary,
        medrec_core::PatientRecord,
        medrec_core::CallStartRequest,
        medrec_core::CallStartOutcome,
    ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the router with every route and the CORS layer.
pub fn router(state: AppState, cors: &CorsOrigins) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/patients", get(handlers::list_patients))
        .route("/api/patients/:patient_id", get(handlers::get_patient))
        .route("/api/start", post(handlers::start_call))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Origins that are not valid header values are skipped with a warning.
fn cors_layer(cors: &CorsOrigins) -> CorsLayer {
    match cors {
        CorsOrigins::Any => CorsLayer::permissive(),
        CorsOrigins::List(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
        }
    }
}

/// Bind the configured address and serve until the process stops.
///
/// # Errors
/// Returns an error if:
/// - the outbound HTTP client cannot be built,
/// - the address cannot be bound, or
/// - the HTTP server fails while running.
pub async fn serve(cfg: &CoreConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(cfg)?;
    let app = router(state, cfg.cors_origins());

    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    tracing::info!("-- MedRec REST API listening on {}", cfg.rest_addr());
    axum::serve(listener, app).await?;

    Ok(())
}
