use std::sync::Arc;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

// Import domain entities and services
use vital_sentry_domain::services::device_auth::DeviceCredentials;
use vital_sentry_domain::services::ingestion::{
    create_default_ingestion_service, IngestContext, IngestionError, IngestionServiceTrait,
};

// Import our entities
use crate::entities::common::PublicErrorResponse;
use crate::entities::vitals::{IngestResponse, IngestVitalsRequest};

/// Header carrying the declared device identifier
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Header carrying the device's shared-secret API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the internal service secret
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Error response format for API
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a validation error response
    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: "validation_error".to_string(),
            message: message.to_string(),
            details,
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: &str) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create an unauthorized error response
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: "unauthorized".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An unexpected error occurred".to_string(),
            details: None,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "bad_request" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Service type for dependency injection
pub type IngestionService = Arc<dyn IngestionServiceTrait + Send + Sync>;

/// Create a default service for the handlers to use
pub fn create_service() -> IngestionService {
    Arc::new(create_default_ingestion_service())
}

/// Extract a header as an owned string, if present and readable
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Ingest a batch of device readings
#[utoipa::path(
    post,
    path = "/api/v1/vitals/ingest",
    request_body = IngestVitalsRequest,
    params(
        ("x-device-id" = Option<String>, Header, description = "Declared device identifier"),
        ("x-api-key" = Option<String>, Header, description = "Device shared-secret API key"),
        ("x-internal-secret" = Option<String>, Header, description = "Internal service secret"),
    ),
    responses(
        (status = 200, description = "Batch processed", body = IngestResponse),
        (status = 400, description = "Empty or malformed batch", body = PublicErrorResponse),
        (status = 401, description = "Unauthorized device", body = PublicErrorResponse),
        (status = 500, description = "Configuration or persistence failure", body = PublicErrorResponse),
    ),
    tag = "ingestion"
)]
#[instrument(skip(service, headers, payload))]
pub async fn ingest_vitals(
    State(service): State<IngestionService>,
    headers: HeaderMap,
    Json(payload): Json<IngestVitalsRequest>,
) -> Result<impl IntoResponse, Response> {
    info!("Ingestion request received with {} readings", payload.readings.len());

    // Validate the payload shape before touching the pipeline
    if let Err(validation_errors) = payload.validate() {
        warn!("Ingestion payload failed validation: {}", validation_errors);
        let details = serde_json::to_value(&validation_errors).ok();
        return Err(ErrorResponse::validation_error("Invalid reading batch", details).into_response());
    }

    let credentials = DeviceCredentials {
        device_id: header_value(&headers, DEVICE_ID_HEADER),
        api_key: header_value(&headers, API_KEY_HEADER),
        internal_secret: header_value(&headers, INTERNAL_SECRET_HEADER),
    };

    let context = IngestContext {
        credentials,
        session_id: payload.session_id.clone(),
    };
    let readings = payload
        .readings
        .into_iter()
        .map(|reading| reading.into_reading())
        .collect();

    match service.ingest_batch(readings, context).await {
        Ok(summary) => {
            info!(
                "Batch acknowledged: processed={} skipped={} alerts_fired={}",
                summary.processed, summary.skipped, summary.alerts_fired
            );
            Ok((
                StatusCode::OK,
                Json(IngestResponse {
                    status: "success".to_string(),
                    message: "Reading batch processed".to_string(),
                }),
            ))
        }
        Err(IngestionError::EmptyBatch) => {
            warn!("Rejected empty reading batch");
            Err(ErrorResponse::bad_request("Reading batch is empty").into_response())
        }
        Err(IngestionError::Unauthorized(reason)) => {
            warn!("Rejected unauthorized ingestion request: {}", reason);
            Err(ErrorResponse::unauthorized("Device could not be authorized").into_response())
        }
        Err(e @ IngestionError::Configuration(_)) | Err(e @ IngestionError::Persistence { .. }) => {
            error!("Ingestion failed: {}", e);
            Err(ErrorResponse::internal_error().into_response())
        }
    }
}
