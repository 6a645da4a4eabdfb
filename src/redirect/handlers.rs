use axum::{
    extract::{ConnectInfo, Path, State},
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::analytics::{anonymize_ip, extract_client_ip};
use crate::api::handlers::{error_response, service_error_response};
use crate::config::{AnalyticsConfig, RedirectMode};
use crate::models::ClickInfo;
use crate::service::{ResolutionService, ServiceError};
use crate::telemetry::Package;

pub struct RedirectState {
    pub service: Arc<ResolutionService>,
    pub analytics: AnalyticsConfig,
    pub redirect_status: RedirectMode,
}

/// Redirect to original URL
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    redirect(&state, &code, addr, &headers).await
}

/// `GET /shorturls`: `shorturls` is itself a well-formed short code
pub async fn redirect_collection_path(
    State(state): State<Arc<RedirectState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    redirect(&state, "shorturls", addr, &headers).await
}

async fn redirect(
    state: &RedirectState,
    code: &str,
    addr: SocketAddr,
    headers: &HeaderMap,
) -> Response {
    let telemetry = state.service.telemetry();
    telemetry.info(
        Package::Route,
        format!("GET /{code} - Redirect request received"),
    );

    let info = click_info(headers, addr.ip(), &state.analytics);

    match state.service.resolve(code, info).await {
        Ok(original_url) => match HeaderValue::from_str(&original_url) {
            Ok(location) => (
                state.redirect_status.status_code(),
                [(header::LOCATION, location)],
            )
                .into_response(),
            Err(e) => {
                telemetry.error(
                    Package::Handler,
                    format!("Redirect error for /{code}: {e}"),
                );
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response()
            }
        },
        Err(ServiceError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "Short URL not found or has expired")
                .into_response()
        }
        Err(e) => service_error_response(&e).into_response(),
    }
}

/// Request metadata recorded with the click
fn click_info(headers: &HeaderMap, socket_ip: IpAddr, config: &AnalyticsConfig) -> ClickInfo {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut client_ip = extract_client_ip(headers, socket_ip, config);
    if config.ip_anonymization {
        client_ip = anonymize_ip(client_ip);
    }

    ClickInfo {
        source: header_str(header::USER_AGENT),
        referrer: header_str(header::REFERER),
        location: Some(client_ip.to_string()),
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        headers.insert(header::REFERER, HeaderValue::from_static("https://ref.example"));

        let info = click_info(&headers, "198.51.100.23".parse().unwrap(), &AnalyticsConfig::default());
        assert_eq!(info.source.as_deref(), Some("curl/8.0"));
        assert_eq!(info.referrer.as_deref(), Some("https://ref.example"));
        assert_eq!(info.location.as_deref(), Some("198.51.100.23"));
    }

    #[test]
    fn test_click_info_anonymizes_when_configured() {
        let config = AnalyticsConfig {
            ip_anonymization: true,
            ..AnalyticsConfig::default()
        };

        let info = click_info(&HeaderMap::new(), "198.51.100.23".parse().unwrap(), &config);
        assert_eq!(info.source, None);
        assert_eq!(info.referrer, None);
        assert_eq!(info.location.as_deref(), Some("198.51.100.0"));
    }
}
