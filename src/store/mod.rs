//! Steam store lookups.
//!
//! The watcher and the bot only see the [`LookupService`] trait;
//! [`client::SteamStoreClient`] is the HTTP implementation.

pub mod client;
pub mod listing;
pub mod models;
pub mod pacing;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::models::{AppId, ItemPriceSnapshot, SearchHit};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("game not found")]
    NotFound,
    #[error("app {0} is not available in your region")]
    Unavailable(AppId),
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("unexpected store response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Resolves names and app ids against a storefront.
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Resolve a free-text name to the best matching app.
    async fn search_by_name(&self, term: &str) -> Result<SearchHit, LookupError>;

    /// Current price state of an app.
    async fn get_details(&self, app_id: AppId) -> Result<ItemPriceSnapshot, LookupError>;
}
