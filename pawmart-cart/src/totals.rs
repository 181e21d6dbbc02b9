use serde::{Deserialize, Serialize};
use pawmart_catalog::percent_of;

use crate::models::Cart;
use crate::rules::{PromoEngine, PromoReward, PromoRule};

/// Tax and shipping policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsConfig {
    #[serde(default = "default_tax_rate")]
    pub tax_rate_percent: f64,
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold_cents: i64,
    #[serde(default = "default_shipping_fee")]
    pub shipping_fee_cents: i64,
}

fn default_tax_rate() -> f64 { 8.0 }
fn default_free_shipping_threshold() -> i64 { 4_900 }
fn default_shipping_fee() -> i64 { 599 }

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            tax_rate_percent: default_tax_rate(),
            free_shipping_threshold_cents: default_free_shipping_threshold(),
            shipping_fee_cents: default_shipping_fee(),
        }
    }
}

/// Derived money values for a cart
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// How much more merchandise unlocks free shipping (0 once it applies)
    pub free_shipping_remaining_cents: i64,
    pub promo_code: Option<String>,
}

pub struct TotalsCalculator {
    config: TotalsConfig,
}

impl TotalsCalculator {
    pub fn new(config: TotalsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TotalsConfig {
        &self.config
    }

    /// subtotal - discount + shipping + tax, with tax on the discounted amount
    pub fn compute(&self, cart: &Cart, promo: Option<&PromoRule>) -> CartTotals {
        let subtotal = cart.subtotal_cents();
        let discount = promo.map_or(0, |rule| PromoEngine::discount_for(rule, subtotal));
        let taxable = subtotal - discount;

        let free_shipping_promo = promo.is_some_and(|r| r.reward == PromoReward::FreeShipping);
        let meets_threshold = taxable >= self.config.free_shipping_threshold_cents;
        let shipping = if cart.is_empty() || free_shipping_promo || meets_threshold {
            0
        } else {
            self.config.shipping_fee_cents
        };

        let tax = percent_of(taxable, self.config.tax_rate_percent);

        let free_shipping_remaining = if cart.is_empty() || free_shipping_promo {
            0
        } else {
            (self.config.free_shipping_threshold_cents - taxable).max(0)
        };

        CartTotals {
            item_count: cart.item_count(),
            subtotal_cents: subtotal,
            discount_cents: discount,
            shipping_cents: shipping,
            tax_cents: tax,
            total_cents: taxable + shipping + tax,
            free_shipping_remaining_cents: free_shipping_remaining,
            promo_code: promo.map(|r| r.code.clone()),
        }
    }
}

impl Default for TotalsCalculator {
    fn default() -> Self {
        Self::new(TotalsConfig::default())
    }
}
