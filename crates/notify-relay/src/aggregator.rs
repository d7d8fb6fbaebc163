//! Windowed merge of inbox messages into digests.
//!
//! The aggregator is a single long-lived task. Each cycle it waits for one
//! message, then keeps collecting until `merge_interval` has elapsed since
//! that first message. Later arrivals join the batch but never push the
//! deadline out, so a window is a fixed-length tumbling window, not a
//! debounce.
//!
//! ```text
//!   Idle ──take()──▶ Collecting ──deadline──▶ Closing ──deliver──▶ Idle
//!                     │    ▲
//!                     └────┘ take(): append
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::inbox::InboxReceiver;
use crate::message::Message;
use crate::sink::DeliverySink;

/// Prefix of the notice sent when a digest could not be delivered.
pub const DELIVERY_ERROR_PREFIX: &str = "Error occurred while processing log message: ";

/// Default window length.
pub const DEFAULT_MERGE_INTERVAL: Duration = Duration::from_secs(1);

/// Consumer of the inbox that emits one digest per merge window.
pub struct Aggregator {
    inbox: InboxReceiver,
    sink: Arc<dyn DeliverySink>,
    merge_interval: Duration,
}

impl Aggregator {
    pub fn new(
        inbox: InboxReceiver,
        sink: Arc<dyn DeliverySink>,
        merge_interval: Duration,
    ) -> Self {
        Self {
            inbox,
            sink,
            merge_interval,
        }
    }

    /// Run the window loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Serve windows until every inbox producer has been dropped.
    ///
    /// Delivery failures never end the loop.
    pub async fn run(mut self) {
        info!(merge_interval = ?self.merge_interval, "Aggregator started");

        while let Some(batch) = self.next_window().await {
            let digest = format_digest(&batch);
            debug!(
                messages = batch.len(),
                bytes = digest.len(),
                "Window closed, delivering digest"
            );
            deliver_with_notice(self.sink.as_ref(), &digest).await;
        }

        info!("Inbox closed, aggregator stopped");
    }

    /// Collect one window. Returns `None` when the inbox is closed and empty.
    ///
    /// If the inbox closes mid-window the batch is returned early so it can
    /// still be delivered during shutdown.
    async fn next_window(&mut self) -> Option<Vec<Message>> {
        let first = self.inbox.take().await?;
        let deadline = Instant::now() + self.merge_interval;
        let mut batch = vec![first];

        let timer = sleep_until(deadline);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = &mut timer => break,
                next = self.inbox.take() => match next {
                    Some(msg) => batch.push(msg),
                    None => {
                        debug!(messages = batch.len(), "Inbox closed mid-window, flushing early");
                        break;
                    }
                },
            }
        }

        Some(batch)
    }
}

/// Concatenate the digest lines of `messages` in order.
pub fn format_digest(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        msg.write_line(&mut out);
    }
    out
}

/// Deliver `digest`; on failure send a single error notice through the same sink.
///
/// The notice is never retried.
async fn deliver_with_notice(sink: &dyn DeliverySink, digest: &str) {
    let Err(err) = sink.deliver(digest).await else {
        info!(bytes = digest.len(), "Digest delivered");
        return;
    };

    warn!(error = %err, "Failed to deliver digest");

    let notice = format!("{DELIVERY_ERROR_PREFIX}{err}");
    if let Err(notice_err) = sink.deliver(&notice).await {
        error!(error = %notice_err, "Failed to deliver error notice");
    }
}
