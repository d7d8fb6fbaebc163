//! HTTP request handlers.

mod health;
mod notification;

pub use health::{livez, readyz};
pub use notification::{NotificationParams, method_not_allowed, submit_notification};
