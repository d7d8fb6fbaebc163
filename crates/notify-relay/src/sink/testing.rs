//! In-memory sink for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{DeliveryError, DeliverySink};

/// Records every delivered text and fails the first `failures` calls.
pub(crate) struct RecordingSink {
    failures: Mutex<usize>,
    tx: mpsc::UnboundedSender<String>,
}

impl RecordingSink {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        Self::failing_first(0)
    }

    pub(crate) fn failing_first(failures: usize) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            failures: Mutex::new(failures),
            tx,
        };
        (sink, rx)
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        let _ = self.tx.send(text.to_string());

        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(DeliveryError::Api {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}
