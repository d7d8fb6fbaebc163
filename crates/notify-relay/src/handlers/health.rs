use axum::extract::State;
use axum::http::StatusCode;

use crate::server::AppState;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Not ready once the aggregator has stopped consuming.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.inbox.is_closed() {
        return (StatusCode::SERVICE_UNAVAILABLE, "shutting down");
    }
    (StatusCode::OK, "ok")
}
