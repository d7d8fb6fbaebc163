//! Telegram Bot API sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::DeliverySink;
use super::error::DeliveryError;

/// Connection settings for [`TelegramSink`].
pub struct TelegramSinkConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub request_timeout: Duration,
}

/// Sends digests with `sendMessage` using Markdown parse mode.
pub struct TelegramSink {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramSink {
    pub const DEFAULT_API_URL: &'static str = "https://api.telegram.org";
    pub const PARSE_MODE: &'static str = "Markdown";

    #[must_use]
    pub fn new(client: Client, api_url: &str, bot_token: &str, chat_id: String) -> Self {
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            api_url.trim_end_matches('/'),
            bot_token
        );
        Self {
            client,
            endpoint,
            chat_id,
        }
    }

    /// Build a sink with its own HTTP client bounded by `request_timeout`.
    pub fn from_config(config: TelegramSinkConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::new(
            client,
            &config.api_url,
            &config.bot_token,
            config.chat_id,
        ))
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[async_trait]
impl DeliverySink for TelegramSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: Self::PARSE_MODE,
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        // Only 200 counts; Telegram reports failures with 4xx/5xx and a JSON body.
        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api { status, body });
        }

        debug!(bytes = text.len(), "Telegram message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use serde_json::Value;
    use tokio::net::TcpListener;

    use super::*;

    type Seen = Arc<Mutex<Vec<Value>>>;

    /// Stand-in for the Bot API answering every sendMessage with `status`.
    async fn spawn_fake_api(status: AxumStatus, reply: &'static str) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/bottest-token/sendMessage",
                post(
                    move |State(seen): State<Seen>, Json(body): Json<Value>| async move {
                        seen.lock().unwrap().push(body);
                        (status, reply)
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), seen)
    }

    fn sink(api_url: &str) -> TelegramSink {
        TelegramSink::from_config(TelegramSinkConfig {
            api_url: api_url.to_string(),
            bot_token: "test-token".to_string(),
            chat_id: "-1001".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn deliver_posts_markdown_payload() {
        let (url, seen) = spawn_fake_api(AxumStatus::OK, r#"{"ok":true}"#).await;

        sink(&url).deliver("From: *bot1*: down\n").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            serde_json::json!({
                "chat_id": "-1001",
                "text": "From: *bot1*: down\n",
                "parse_mode": "Markdown",
            })
        );
    }

    #[tokio::test]
    async fn trailing_slash_in_api_url_is_ignored() {
        let (url, seen) = spawn_fake_api(AxumStatus::OK, "{}").await;

        sink(&format!("{url}/")).deliver("hi").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_ok_status_is_api_error_with_body() {
        let (url, _) = spawn_fake_api(
            AxumStatus::BAD_REQUEST,
            r#"{"ok":false,"description":"can't parse entities"}"#,
        )
        .await;

        let err = sink(&url).deliver("bad *markdown").await.unwrap_err();
        match err {
            DeliveryError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("can't parse entities"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_success_statuses_are_still_errors() {
        let (url, _) = spawn_fake_api(AxumStatus::ACCEPTED, "").await;

        let err = sink(&url).deliver("hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Api { status: 202, .. }));
    }

    #[tokio::test]
    async fn unreachable_api_is_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = sink(&format!("http://{addr}")).deliver("hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Request(_)));
        assert!(!err.to_string().contains("test-token"));
        assert!(!format!("{err:?}").contains("test-token"));
    }

    #[test]
    fn api_error_display_includes_status_and_body() {
        let err = DeliveryError::Api {
            status: 401,
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "non-OK response: 401, body: Unauthorized");
    }
}
