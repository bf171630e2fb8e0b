//! Chat front end.
//!
//! [`BotState`] turns incoming text and button presses into replies without
//! knowing the transport. The Telegram glue is in `telegram` and requires
//! the `telegram` feature.

pub mod command;
#[cfg(feature = "telegram")]
pub mod telegram;

use std::sync::Arc;

use tracing::{info, warn};

use crate::notify::format;
use crate::store::listing::lookup_game;
use crate::store::pacing::RequestPacer;
use crate::store::LookupService;
use crate::watch::registry::{UserId, WatchRegistry};
use crate::watch::subscription::{SubscriptionHandler, WatchToken};

use self::command::{parse_command, Command};

/// A reply to send back, optionally with a "watch" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub watch_button: Option<WatchToken>,
}

impl Reply {
    fn text(text: String) -> Self {
        Self {
            text,
            watch_button: None,
        }
    }
}

/// Outcome of a button press: a short toast plus an optional chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReply {
    pub toast: Option<String>,
    pub message: String,
}

pub struct BotState {
    lookup: Arc<dyn LookupService>,
    pacer: RequestPacer,
    registry: Arc<WatchRegistry>,
    subscriptions: SubscriptionHandler,
}

impl BotState {
    pub fn new(
        lookup: Arc<dyn LookupService>,
        registry: Arc<WatchRegistry>,
        pacer: RequestPacer,
    ) -> Self {
        Self {
            subscriptions: SubscriptionHandler::new(Arc::clone(&registry)),
            lookup,
            pacer,
            registry,
        }
    }

    /// Reply to a text message. `None` means ignore it.
    pub async fn handle_text(&self, user: UserId, text: &str) -> Option<Reply> {
        let reply = match parse_command(text)? {
            Command::Start | Command::Help => Reply::text(format::welcome()),
            Command::Watches => {
                let watches = self.registry.list_watches(user).await;
                Reply::text(format::watch_list(&watches))
            }
            Command::Unwatch(Some(app_id)) => {
                let removed = self.registry.remove_watch(user, app_id).await;
                info!(%user, app_id, removed, "Unwatch");
                Reply::text(format::unwatched(app_id, removed))
            }
            Command::Unwatch(None) => Reply::text("Usage: /unwatch <appid>".to_string()),
            Command::Search(term) => self.search(user, &term).await,
        };
        Some(reply)
    }

    async fn search(&self, user: UserId, term: &str) -> Reply {
        info!(%user, term, "Game query");

        match lookup_game(self.lookup.as_ref(), &self.pacer, term).await {
            Ok(game) => Reply {
                text: format::game_card(&game),
                watch_button: game.is_watchable().then_some(WatchToken(game.app_id)),
            },
            Err(e) => {
                warn!(%user, term, error = %e, "Game query failed");
                Reply::text(format::lookup_error(&e))
            }
        }
    }

    /// Handle a button payload. `None` means the payload is not ours.
    pub async fn handle_action(&self, user: UserId, payload: &str) -> Option<ActionReply> {
        if !WatchToken::matches(payload) {
            return None;
        }

        let reply = match self.subscriptions.handle(user, payload).await {
            Ok(sub) => ActionReply {
                toast: Some("🎮 Game added to your watch list!".to_string()),
                message: format::subscribed(sub.outcome),
            },
            Err(_) => ActionReply {
                toast: None,
                message: format::subscribe_failed(),
            },
        };
        Some(reply)
    }
}
