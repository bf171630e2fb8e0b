//! "Notify me about discounts" button handling.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::store::models::AppId;
use crate::watch::registry::{AddOutcome, UserId, WatchRegistry};

const WATCH_PREFIX: &str = "watch_";

/// Compact callback payload carrying an app id (`watch_<appid>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchToken(pub AppId);

impl WatchToken {
    pub fn encode(self) -> String {
        format!("{WATCH_PREFIX}{}", self.0)
    }

    pub fn parse(token: &str) -> Result<Self, SubscriptionError> {
        token
            .strip_prefix(WATCH_PREFIX)
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|id| id.parse::<AppId>().ok())
            .map(Self)
            .ok_or_else(|| SubscriptionError::Parse(token.to_string()))
    }

    /// Whether a callback payload is meant for this handler at all.
    pub fn matches(token: &str) -> bool {
        token.starts_with(WATCH_PREFIX)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("malformed watch token: {0:?}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscribed {
    pub app_id: AppId,
    pub outcome: AddOutcome,
}

pub struct SubscriptionHandler {
    registry: Arc<WatchRegistry>,
}

impl SubscriptionHandler {
    pub fn new(registry: Arc<WatchRegistry>) -> Self {
        Self { registry }
    }

    /// Register a watch from a callback token. The registry is untouched on parse failure.
    pub async fn handle(&self, user: UserId, token: &str) -> Result<Subscribed, SubscriptionError> {
        let app_id = match WatchToken::parse(token) {
            Ok(WatchToken(app_id)) => app_id,
            Err(e) => {
                warn!(%user, error = %e, "Rejected watch action");
                return Err(e);
            }
        };

        let outcome = self.registry.add_watch(user, app_id).await;
        info!(%user, app_id, ?outcome, "Watch action handled");

        Ok(Subscribed { app_id, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        assert_eq!(WatchToken(620).encode(), "watch_620");
        assert_eq!(WatchToken::parse("watch_620"), Ok(WatchToken(620)));
    }

    #[test]
    fn test_token_rejects_garbage() {
        for bad in [
            "watch_",
            "watch_abc",
            "watch_-1",
            "watch_+620",
            "watch_ 620",
            "watch_620 ",
            "watch_99999999999",
            "620",
            "unwatch_620",
            "",
        ] {
            assert_eq!(
                WatchToken::parse(bad),
                Err(SubscriptionError::Parse(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_matches_prefix_only() {
        assert!(WatchToken::matches("watch_abc"));
        assert!(!WatchToken::matches("music_pause"));
    }

    #[tokio::test]
    async fn test_handle_registers_watch() {
        let registry = Arc::new(WatchRegistry::default());
        let handler = SubscriptionHandler::new(Arc::clone(&registry));

        let sub = handler.handle(UserId(7), "watch_100").await.unwrap();
        assert_eq!(sub.app_id, 100);
        assert_eq!(sub.outcome, AddOutcome::Added);
        assert_eq!(registry.get_last_notified(UserId(7), 100).await, Ok(0));

        let again = handler.handle(UserId(7), "watch_100").await.unwrap();
        assert_eq!(again.outcome, AddOutcome::AlreadyWatching);
    }

    #[tokio::test]
    async fn test_handle_parse_failure_leaves_registry_empty() {
        let registry = Arc::new(WatchRegistry::default());
        let handler = SubscriptionHandler::new(Arc::clone(&registry));

        assert!(handler.handle(UserId(7), "watch_x1").await.is_err());
        assert_eq!(registry.watch_count().await, 0);
    }
}
