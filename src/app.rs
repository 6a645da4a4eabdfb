use axum::{
    http::{Method, Uri},
    middleware, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{create_api_router, handlers::route_not_found};
use crate::config::Config;
use crate::redirect::{create_redirect_router, middleware::log_requests};
use crate::service::ResolutionService;

/// Full HTTP surface: API, redirects, CORS and access logging.
///
/// Serve with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// redirect handler reads the peer address.
pub fn create_app(service: Arc<ResolutionService>, config: &Config) -> Router {
    let telemetry = service.telemetry().clone();
    let not_found = move |method: Method, uri: Uri| {
        let telemetry = telemetry.clone();
        async move { route_not_found(&telemetry, &method, &uri) }
    };

    let api_router = create_api_router(Arc::clone(&service));
    let redirect_router = create_redirect_router(
        service,
        config.analytics.clone(),
        config.redirect_status,
    );

    // Unknown methods on known paths get the same 404 as unknown paths.
    // Applied after the merge so it reaches every route.
    redirect_router
        .merge(api_router)
        .fallback(not_found.clone())
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
}
