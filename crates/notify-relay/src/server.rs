use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::inbox::Inbox;
use crate::sink::DeliverySink;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Producer side of the aggregator's inbox.
    pub inbox: Inbox,
    /// Used directly only for ingress error notices.
    pub sink: Arc<dyn DeliverySink>,
}

pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route(
            "/notification",
            post(handlers::submit_notification).fallback(handlers::method_not_allowed),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
}
