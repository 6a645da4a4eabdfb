use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::service::ResolutionService;

use super::handlers::{create_short_url, get_statistics, AppState};

pub fn create_api_router(service: Arc<ResolutionService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/shorturls", post(create_short_url))
        .route("/shorturls/{code}", get(get_statistics))
        .with_state(state)
}
