//! Discount derivation from a price snapshot.

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::store::models::ItemPriceSnapshot;

/// Extracts the current discount percentage (0 = none) from a snapshot.
pub trait DiscountStrategy: Send + Sync {
    fn discount_percent(&self, snapshot: &ItemPriceSnapshot) -> u8;
}

/// Which strategy the watcher runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountSource {
    Reported,
    Computed,
    #[default]
    Auto,
}

impl DiscountSource {
    pub fn strategy(self) -> Arc<dyn DiscountStrategy> {
        match self {
            Self::Reported => Arc::new(ReportedDiscount),
            Self::Computed => Arc::new(PriceComparison),
            Self::Auto => Arc::new(ReportedOrComputed),
        }
    }
}

/// Trusts the store's `discount_percent` field.
pub struct ReportedDiscount;

impl DiscountStrategy for ReportedDiscount {
    fn discount_percent(&self, snapshot: &ItemPriceSnapshot) -> u8 {
        snapshot
            .price
            .as_ref()
            .and_then(|p| p.discount_percent)
            .unwrap_or(0)
            .min(100)
    }
}

/// Derives the discount from initial vs final price, rounded to a whole percent.
pub struct PriceComparison;

impl DiscountStrategy for PriceComparison {
    fn discount_percent(&self, snapshot: &ItemPriceSnapshot) -> u8 {
        let Some(ref price) = snapshot.price else {
            return 0;
        };

        if price.initial <= 0 || price.final_price >= price.initial {
            return 0;
        }

        let initial = Decimal::from(price.initial);
        let final_price = Decimal::from(price.final_price.max(0));
        let pct = ((initial - final_price) / initial * dec!(100)).round();

        pct.to_u8().unwrap_or(0).min(100)
    }
}

/// Reported percentage when present and positive, price comparison otherwise.
pub struct ReportedOrComputed;

impl DiscountStrategy for ReportedOrComputed {
    fn discount_percent(&self, snapshot: &ItemPriceSnapshot) -> u8 {
        match ReportedDiscount.discount_percent(snapshot) {
            0 => PriceComparison.discount_percent(snapshot),
            reported => reported,
        }
    }
}
