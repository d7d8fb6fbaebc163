//! Delivery error types.

use thiserror::Error;

/// Errors that can occur when delivering a digest.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Service answered with something other than its success status
    #[error("non-OK response: {status}, body: {body}")]
    Api { status: u16, body: String },
}

// The request URL carries the bot token; it must not reach logs or the chat.
impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Request(err.without_url())
    }
}
