//! Outbound chat messages.
//!
//! The watcher only depends on [`Notifier`]; the Telegram implementation
//! lives in the `bot` module.

pub mod format;

use async_trait::async_trait;
use tracing::info;

use crate::watch::registry::UserId;

/// Delivers a text message to a user's chat. Fire and forget: failures are
/// logged by the implementation and never reported back.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user: UserId, text: &str);
}

/// Writes notifications to the log. Used when no chat transport is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, user: UserId, text: &str) {
        info!(%user, text, "Notification");
    }
}
