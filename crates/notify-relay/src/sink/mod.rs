//! Delivery of digests to the downstream chat service.

mod error;
mod telegram;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

pub use error::DeliveryError;
pub use telegram::{TelegramSink, TelegramSinkConfig};

/// Destination for formatted digests.
///
/// Implementations make a single attempt per call. Retrying, if any, is the
/// caller's decision.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError>;
}
