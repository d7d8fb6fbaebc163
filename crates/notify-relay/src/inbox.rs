//! Bounded inbox between HTTP ingress and the aggregator.
//!
//! Producers never wait: [`Inbox::offer`] either enqueues immediately or
//! reports that the inbox is full. The single consumer side is
//! [`InboxReceiver`], owned by the aggregator task.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::message::Message;

/// Default number of messages the inbox holds before rejecting offers.
pub const DEFAULT_CAPACITY: usize = 100;

/// Reasons an offer can be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InboxError {
    /// The inbox already holds `capacity` undrained messages.
    #[error("inbox is full")]
    Full,

    /// The consumer has gone away (process shutting down).
    #[error("inbox is closed")]
    Closed,
}

/// Producer handle. Cheap to clone; one per request handler is fine.
#[derive(Debug, Clone)]
pub struct Inbox {
    tx: mpsc::Sender<Message>,
}

/// Consumer handle. Exactly one exists per inbox.
#[derive(Debug)]
pub struct InboxReceiver {
    rx: mpsc::Receiver<Message>,
}

impl Inbox {
    /// Create an inbox holding at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> (Self, InboxReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, InboxReceiver { rx })
    }

    /// Enqueue `msg` without waiting.
    pub fn offer(&self, msg: Message) -> Result<(), InboxError> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => InboxError::Full,
            TrySendError::Closed(_) => InboxError::Closed,
        })
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// True once the consumer has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl InboxReceiver {
    /// Wait for the oldest queued message.
    ///
    /// Returns `None` once every [`Inbox`] handle has been dropped and the
    /// queue is drained.
    pub async fn take(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_returns_messages_in_offer_order() {
        let (inbox, mut rx) = Inbox::new(4);
        inbox.offer(Message::text("one")).unwrap();
        inbox.offer(Message::text("two")).unwrap();
        inbox.offer(Message::text("three")).unwrap();

        assert_eq!(rx.take().await.unwrap().body(), "one");
        assert_eq!(rx.take().await.unwrap().body(), "two");
        assert_eq!(rx.take().await.unwrap().body(), "three");
    }

    #[tokio::test]
    async fn offer_on_full_inbox_fails_without_blocking() {
        let (inbox, _rx) = Inbox::new(3);
        for i in 0..3 {
            inbox.offer(Message::text(format!("m{i}"))).unwrap();
        }

        assert_eq!(inbox.offer(Message::text("overflow")), Err(InboxError::Full));
        assert_eq!(inbox.len(), 3);
        assert_eq!(inbox.capacity(), 3);
    }

    #[tokio::test]
    async fn draining_frees_capacity() {
        let (inbox, mut rx) = Inbox::new(1);
        inbox.offer(Message::text("a")).unwrap();
        assert_eq!(inbox.offer(Message::text("b")), Err(InboxError::Full));

        rx.take().await.unwrap();
        assert!(inbox.is_empty());
        inbox.offer(Message::text("b")).unwrap();
    }

    #[tokio::test]
    async fn offer_after_receiver_dropped_is_closed() {
        let (inbox, rx) = Inbox::new(2);
        assert!(!inbox.is_closed());
        drop(rx);
        assert!(inbox.is_closed());
        assert_eq!(inbox.offer(Message::text("late")), Err(InboxError::Closed));
    }

    #[tokio::test]
    async fn take_returns_none_when_all_producers_dropped() {
        let (inbox, mut rx) = Inbox::new(2);
        inbox.offer(Message::text("last")).unwrap();
        drop(inbox);

        assert_eq!(rx.take().await.unwrap().body(), "last");
        assert!(rx.take().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_offers_never_exceed_capacity() {
        let (inbox, _rx) = Inbox::new(10);

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let inbox = inbox.clone();
                tokio::spawn(async move { inbox.offer(Message::text(format!("m{i}"))).is_ok() })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 10);
        assert_eq!(inbox.len(), 10);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (inbox, _rx) = Inbox::new(0);
        assert_eq!(inbox.capacity(), 1);
    }
}
