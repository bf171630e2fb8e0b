//! Steam store HTTP client.
//!
//! Talks to the public `storesearch` and `appdetails` endpoints with a
//! request timeout and a fixed-delay retry on transport failures.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::StoreConfig;
use crate::store::models::{store_link, AppId, ItemPriceSnapshot, PriceOverview, SearchHit};
use crate::store::{LookupError, LookupService};

pub struct SteamStoreClient {
    http: reqwest::Client,
    base_url: String,
    country_code: String,
    language: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl SteamStoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country_code: config.country_code.clone(),
            language: config.language.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, LookupError> {
        let url = format!("{}{path}", self.base_url);

        self.with_retry(|| {
            let url = url.clone();
            async move {
                let resp = self
                    .http
                    .get(&url)
                    .query(query)
                    .query(&[
                        ("cc", self.country_code.as_str()),
                        ("l", self.language.as_str()),
                    ])
                    .send()
                    .await?;

                if !resp.status().is_success() {
                    return Err(LookupError::Transport(format!(
                        "{path} returned {}",
                        resp.status()
                    )));
                }

                Ok(resp.json::<T>().await?)
            }
        })
        .await
    }

    /// Retries transport failures after a fixed delay. Lookup outcomes
    /// (not found, unavailable, bad body) are returned immediately.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, LookupError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, LookupError>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Err(LookupError::Transport(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        delay_ms = self.retry_delay.as_millis() as u64,
                        error = %e,
                        "Retrying store request after transport failure"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl LookupService for SteamStoreClient {
    #[instrument(skip(self))]
    async fn search_by_name(&self, term: &str) -> Result<SearchHit, LookupError> {
        let response: SearchResponse = self
            .get_json("/api/storesearch", &[("term", term.to_string())])
            .await?;

        let first = response.items.into_iter().next().ok_or(LookupError::NotFound)?;
        debug!(app_id = first.id, name = %first.name, "Search resolved");

        Ok(SearchHit {
            app_id: first.id,
            link: store_link(first.id),
            name: first.name,
        })
    }

    #[instrument(skip(self))]
    async fn get_details(&self, app_id: AppId) -> Result<ItemPriceSnapshot, LookupError> {
        let mut response: HashMap<String, AppDetailsEnvelope> = self
            .get_json("/api/appdetails", &[("appids", app_id.to_string())])
            .await?;

        let envelope = response
            .remove(&app_id.to_string())
            .ok_or(LookupError::Unavailable(app_id))?;

        match envelope {
            AppDetailsEnvelope {
                success: true,
                data: Some(data),
            } => Ok(convert_details(app_id, data)),
            _ => Err(LookupError::Unavailable(app_id)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: AppId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AppDetailsEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<AppDetailsData>,
}

#[derive(Debug, Deserialize)]
struct AppDetailsData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_free: bool,
    #[serde(default)]
    dlc: Vec<AppId>,
    #[serde(default)]
    price_overview: Option<PriceOverview>,
}

fn convert_details(app_id: AppId, data: AppDetailsData) -> ItemPriceSnapshot {
    ItemPriceSnapshot {
        app_id,
        name: data.name,
        is_free: data.is_free,
        price: data.price_overview,
        related_ids: data.dlc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_envelope_paid_game() {
        let json = r#"{
            "620": {
                "success": true,
                "data": {
                    "name": "Portal 2",
                    "is_free": false,
                    "dlc": [323180, 323181],
                    "price_overview": {
                        "currency": "RUB",
                        "initial": 39900,
                        "final": 9900,
                        "discount_percent": 75,
                        "initial_formatted": "399 руб.",
                        "final_formatted": "99 руб."
                    }
                }
            }
        }"#;
        let mut parsed: HashMap<String, AppDetailsEnvelope> = serde_json::from_str(json).unwrap();
        let envelope = parsed.remove("620").unwrap();
        assert!(envelope.success);

        let snapshot = convert_details(620, envelope.data.unwrap());
        assert_eq!(snapshot.name, "Portal 2");
        assert_eq!(snapshot.related_ids, vec![323180, 323181]);
        assert_eq!(snapshot.final_formatted(), Some("99 руб."));
        assert_eq!(snapshot.price.unwrap().discount_percent, Some(75));
    }

    #[test]
    fn test_details_envelope_failure_has_no_data() {
        let json = r#"{"999": {"success": false}}"#;
        let parsed: HashMap<String, AppDetailsEnvelope> = serde_json::from_str(json).unwrap();
        let envelope = &parsed["999"];
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_free_game_without_price_overview() {
        let json = r#"{"name": "Dota 2", "is_free": true}"#;
        let data: AppDetailsData = serde_json::from_str(json).unwrap();
        let snapshot = convert_details(570, data);
        assert!(snapshot.is_free);
        assert!(snapshot.price.is_none());
        assert!(snapshot.related_ids.is_empty());
    }

    #[test]
    fn test_search_response_without_items() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = StoreConfig {
            base_url: "http://localhost:8080/".to_string(),
            country_code: "us".to_string(),
            language: "english".to_string(),
            request_timeout_seconds: 5,
            dlc_request_delay_ms: 0,
            max_retries: 0,
            retry_delay_ms: 0,
        };
        let client = SteamStoreClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
