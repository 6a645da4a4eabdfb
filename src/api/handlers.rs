use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode, Uri},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{CreateUrlRequest, CreateUrlResponse, StatsView};
use crate::service::{CreateShortUrl, ResolutionService, ServiceError};
use crate::telemetry::{Package, Telemetry};

pub struct AppState {
    pub service: Arc<ResolutionService>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a service failure onto its HTTP status
pub fn service_error_response(err: &ServiceError) -> ApiError {
    let status = match err {
        ServiceError::InvalidUrl
        | ServiceError::InvalidValidity
        | ServiceError::InvalidShortcodeFormat => StatusCode::BAD_REQUEST,
        ServiceError::ShortcodeConflict => StatusCode::CONFLICT,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::GenerationExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

/// Non-numeric validity, `null` included, becomes NaN so the service
/// rejects it after the URL check
fn validity_minutes(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    }
}

/// `null`, `false`, `0` and `""` count as not provided
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Strings as-is, any other value as its JSON text
fn field_text(value: Option<Value>) -> Option<String> {
    match value.filter(|v| !is_blank(v))? {
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Create a new short URL
pub async fn create_short_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>), ApiError> {
    let telemetry = state.service.telemetry();
    telemetry.info(
        Package::Route,
        "POST /shorturls - Create short URL request received",
    );

    let Json(payload) = payload.map_err(|rejection| {
        telemetry.error(
            Package::Handler,
            format!("Malformed request body: {}", rejection.body_text()),
        );
        error_response(StatusCode::BAD_REQUEST, "Request body must be a valid JSON object")
    })?;

    let Some(url) = field_text(payload.url) else {
        telemetry.error(Package::Handler, "Missing required field: url");
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing required field: url",
        ));
    };

    let request = CreateShortUrl {
        url,
        validity_minutes: validity_minutes(payload.validity),
        custom_code: field_text(payload.shortcode),
    };

    match state.service.create_short_url(request).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(CreateUrlResponse {
                short_link: created.short_link,
                expiry: created.expires_at,
            }),
        )),
        Err(e) => Err(service_error_response(&e)),
    }
}

/// Statistics for a short URL
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StatsView>, ApiError> {
    state.service.telemetry().info(
        Package::Route,
        format!("GET /shorturls/{code} - Statistics request received"),
    );

    state
        .service
        .get_statistics(&code)
        .await
        .map(Json)
        .map_err(|e| service_error_response(&e))
}

/// Response for unmatched paths and for methods a path does not serve
pub fn route_not_found(telemetry: &Telemetry, method: &Method, uri: &Uri) -> ApiError {
    telemetry.warn(
        Package::Route,
        format!("404 - Route not found: {method} {uri}"),
    );
    error_response(StatusCode::NOT_FOUND, "Route not found")
}
