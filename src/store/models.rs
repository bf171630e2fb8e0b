use serde::{Deserialize, Serialize};

/// Steam app id of a game or DLC.
pub type AppId = u32;

const STORE_APP_URL: &str = "https://store.steampowered.com/app";

/// Canonical store page for an app.
pub fn store_link(app_id: AppId) -> String {
    format!("{STORE_APP_URL}/{app_id}")
}

/// First hit of a store search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub app_id: AppId,
    pub name: String,
    pub link: String,
}

/// Price block of an app detail response. Amounts are in minor units (kopecks, cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOverview {
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub initial: i64,
    #[serde(rename = "final", default)]
    pub final_price: i64,
    #[serde(default)]
    pub discount_percent: Option<u8>,
    #[serde(default)]
    pub initial_formatted: String,
    #[serde(default)]
    pub final_formatted: String,
}

/// Current price state of a single app, as returned by a detail lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPriceSnapshot {
    pub app_id: AppId,
    pub name: String,
    pub is_free: bool,
    pub price: Option<PriceOverview>,
    pub related_ids: Vec<AppId>,
}

impl ItemPriceSnapshot {
    /// Formatted final price, if the store sent one.
    pub fn final_formatted(&self) -> Option<&str> {
        self.price
            .as_ref()
            .map(|p| p.final_formatted.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Free apps are always available; paid apps need a formatted price.
    pub fn is_available(&self) -> bool {
        self.is_free || self.final_formatted().is_some()
    }
}

/// Display label for a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PriceLabel {
    Free,
    Price(String),
    Unavailable,
}

impl PriceLabel {
    pub fn of(snapshot: &ItemPriceSnapshot) -> Self {
        if snapshot.is_free {
            Self::Free
        } else {
            match snapshot.final_formatted() {
                Some(p) => Self::Price(p.to_string()),
                None => Self::Unavailable,
            }
        }
    }
}

impl std::fmt::Display for PriceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "Free"),
            Self::Price(p) => write!(f, "{p}"),
            Self::Unavailable => write!(f, "Price unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DlcListing {
    pub app_id: AppId,
    pub title: String,
    pub price: PriceLabel,
}

/// A game resolved from a user query, with its DLC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameListing {
    pub app_id: AppId,
    pub title: String,
    pub price: PriceLabel,
    pub link: String,
    pub dlcs: Vec<DlcListing>,
}

impl GameListing {
    /// Only paid games get a watch button.
    pub fn is_watchable(&self) -> bool {
        self.price != PriceLabel::Free
    }
}
