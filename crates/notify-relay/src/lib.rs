//! notify-relay - Batches log notifications into digests and relays them to a chat.
//!
//! Messages submitted over HTTP are queued in a bounded [`Inbox`], merged by
//! the [`Aggregator`] into one digest per merge window, and pushed to a
//! [`DeliverySink`] (Telegram in production).
//!
//! ```text
//!  POST /notification ──▶ Inbox::offer ──▶ Aggregator (window loop) ──▶ DeliverySink
//! ```

pub mod aggregator;
pub mod config;
pub mod handlers;
pub mod inbox;
pub mod logging;
pub mod message;
pub mod server;
pub mod sink;

pub use aggregator::{Aggregator, format_digest};
pub use inbox::{Inbox, InboxError, InboxReceiver};
pub use message::Message;
pub use sink::{DeliveryError, DeliverySink, TelegramSink};
