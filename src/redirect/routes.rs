use axum::{routing::get, Router};
use std::sync::Arc;

use crate::config::{AnalyticsConfig, RedirectMode};
use crate::service::ResolutionService;

use super::handlers::{health_check, redirect_collection_path, redirect_url, RedirectState};

pub fn create_redirect_router(
    service: Arc<ResolutionService>,
    analytics: AnalyticsConfig,
    redirect_status: RedirectMode,
) -> Router {
    let state = Arc::new(RedirectState {
        service,
        analytics,
        redirect_status,
    });

    Router::new()
        .route("/", get(health_check))
        .route("/{code}", get(redirect_url))
        // Static API path shadows `/{code}`; GET on it is still a lookup
        .route("/shorturls", get(redirect_collection_path))
        .with_state(state)
}
