//! Notification ingress.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::inbox::InboxError;
use crate::message::Message;
use crate::server::AppState;
use crate::sink::DeliverySink;

const EMPTY_BODY: &str = "Empty or invalid message body received";

/// Optional query parameters of `POST /notification`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NotificationParams {
    pub sender: Option<String>,
    pub level: Option<String>,
}

impl NotificationParams {
    /// Pick `sender` and `level` out of raw query pairs.
    ///
    /// A repeated key keeps its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "sender" => &mut params.sender,
                "level" => &mut params.level,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

/// POST /notification?sender=..&level=..
///
/// The raw request body is the message text; invalid UTF-8 sequences are
/// replaced with U+FFFD. Responds `202` once queued, `400` for an empty body
/// and `503` when the inbox is full.
pub async fn submit_notification(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        debug!("Rejected empty notification body");
        notify_rejected_body(state.sink.clone());
        return (StatusCode::BAD_REQUEST, EMPTY_BODY).into_response();
    }

    let params = NotificationParams::from_pairs(pairs);
    let text = String::from_utf8_lossy(&body).into_owned();
    let msg = Message::new(params.sender, params.level, text);
    match state.inbox.offer(msg) {
        Ok(()) => (StatusCode::ACCEPTED, "Message received").into_response(),
        Err(InboxError::Full) => {
            warn!(capacity = state.inbox.capacity(), "Inbox full, rejecting notification");
            (StatusCode::SERVICE_UNAVAILABLE, "Server busy").into_response()
        }
        Err(InboxError::Closed) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Server shutting down").into_response()
        }
    }
}

/// Any method other than POST on `/notification`.
pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Tell the chat that a bad submission arrived, without holding up the response.
fn notify_rejected_body(sink: Arc<dyn DeliverySink>) {
    tokio::spawn(async move {
        if let Err(e) = sink.deliver(&format!("Error: {EMPTY_BODY}")).await {
            warn!(error = %e, "Failed to deliver rejected-body notice");
        }
    });
}
