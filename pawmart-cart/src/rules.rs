use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use pawmart_catalog::{percent_of, PetKind, ProductCategory, format_cents};

use crate::models::Cart;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoRule {
    pub code: String,
    pub description: String,
    pub conditions: Vec<PromoCondition>,
    pub reward: PromoReward,
    pub priority: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PromoCondition {
    MinSubtotal(i64),
    ContainsCategory(ProductCategory),
    ContainsPetKind(PetKind),
    FirstOrderOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromoReward {
    PercentOff {
        percent: f64,
        max_discount_cents: Option<i64>,
    },
    FlatOff {
        amount_cents: i64,
    },
    FreeShipping,
}

/// Facts about the cart and shopper a promo is checked against
#[derive(Debug, Clone, Default)]
pub struct PromoContext {
    pub subtotal_cents: i64,
    pub categories: HashSet<ProductCategory>,
    pub pet_kinds: HashSet<PetKind>,
    pub is_first_order: bool,
}

impl PromoContext {
    pub fn from_cart(cart: &Cart, is_first_order: bool) -> Self {
        Self {
            subtotal_cents: cart.subtotal_cents(),
            categories: cart.lines.iter().filter_map(|l| l.category).collect(),
            pet_kinds: cart.lines.iter().map(|l| l.pet_kind).collect(),
            is_first_order,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PromoError {
    #[error("Unknown promo code: {0}")]
    UnknownCode(String),

    #[error("Promo code is no longer active: {0}")]
    Inactive(String),

    #[error("Promo code {code} does not apply: {reason}")]
    NotApplicable {
        code: String,
        reason: String,
    },
}

/// Looks up promo codes and checks their conditions
pub struct PromoEngine {
    rules: Vec<PromoRule>,
}

impl PromoEngine {
    pub fn new(rules: Vec<PromoRule>) -> Self {
        let mut rules = rules;
        rules.sort_by_key(|r| -r.priority);
        Self { rules }
    }

    pub fn rules(&self) -> &[PromoRule] {
        &self.rules
    }

    /// Case-insensitive code lookup
    pub fn find(&self, code: &str) -> Option<&PromoRule> {
        let code = code.trim();
        self.rules.iter().find(|r| r.code.eq_ignore_ascii_case(code))
    }

    /// Resolve a code and confirm every condition holds for `context`
    pub fn validate(&self, code: &str, context: &PromoContext) -> Result<&PromoRule, PromoError> {
        let rule = self.find(code)
            .ok_or_else(|| PromoError::UnknownCode(code.trim().to_uppercase()))?;

        if !rule.is_active {
            return Err(PromoError::Inactive(rule.code.clone()));
        }

        for condition in &rule.conditions {
            if let Some(reason) = Self::unmet(condition, context) {
                return Err(PromoError::NotApplicable {
                    code: rule.code.clone(),
                    reason,
                });
            }
        }

        Ok(rule)
    }

    /// Discount in cents a rule grants on `subtotal_cents`, never more than the subtotal
    pub fn discount_for(rule: &PromoRule, subtotal_cents: i64) -> i64 {
        let discount = match &rule.reward {
            PromoReward::PercentOff { percent, max_discount_cents } => {
                let raw = percent_of(subtotal_cents, *percent);
                max_discount_cents.map_or(raw, |cap| raw.min(cap))
            }
            PromoReward::FlatOff { amount_cents } => *amount_cents,
            PromoReward::FreeShipping => 0,
        };
        discount.clamp(0, subtotal_cents.max(0))
    }

    fn unmet(condition: &PromoCondition, context: &PromoContext) -> Option<String> {
        match condition {
            PromoCondition::MinSubtotal(min) => (context.subtotal_cents < *min).then(|| {
                format!(
                    "add {} more to reach the {} minimum",
                    format_cents(min - context.subtotal_cents),
                    format_cents(*min)
                )
            }),
            PromoCondition::ContainsCategory(category) => (!context.categories.contains(category))
                .then(|| format!("cart has no {:?} items", category).to_lowercase()),
            PromoCondition::ContainsPetKind(kind) => (!context.pet_kinds.contains(kind))
                .then(|| format!("cart has no {:?} items", kind).to_lowercase()),
            PromoCondition::FirstOrderOnly => (!context.is_first_order)
                .then(|| "valid on your first order only".to_string()),
        }
    }
}

impl Default for PromoEngine {
    fn default() -> Self {
        Self::new(default_promos())
    }
}

pub fn default_promos() -> Vec<PromoRule> {
    vec![
        PromoRule {
            code: "WELCOME10".to_string(),
            description: "10% off your first order".to_string(),
            conditions: vec![PromoCondition::FirstOrderOnly],
            reward: PromoReward::PercentOff {
                percent: 10.0,
                max_discount_cents: None,
            },
            priority: 100,
            is_active: true,
        },
        PromoRule {
            code: "PAWS20".to_string(),
            description: "20% off orders over $100, up to $30".to_string(),
            conditions: vec![PromoCondition::MinSubtotal(10_000)],
            reward: PromoReward::PercentOff {
                percent: 20.0,
                max_discount_cents: Some(3_000),
            },
            priority: 90,
            is_active: true,
        },
        PromoRule {
            code: "FREESHIP".to_string(),
            description: "Free shipping on orders over $25".to_string(),
            conditions: vec![PromoCondition::MinSubtotal(2_500)],
            reward: PromoReward::FreeShipping,
            priority: 80,
            is_active: true,
        },
        PromoRule {
            code: "TREATS5".to_string(),
            description: "$5 off when you buy treats".to_string(),
            conditions: vec![PromoCondition::ContainsCategory(ProductCategory::Treats)],
            reward: PromoReward::FlatOff { amount_cents: 500 },
            priority: 70,
            is_active: true,
        },
        PromoRule {
            code: "SUMMER15".to_string(),
            description: "Summer sale, expired".to_string(),
            conditions: vec![],
            reward: PromoReward::PercentOff {
                percent: 15.0,
                max_discount_cents: None,
            },
            priority: 10,
            is_active: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(subtotal_cents: i64) -> PromoContext {
        PromoContext {
            subtotal_cents,
            ..Default::default()
        }
    }

    #[test]
    fn test_codes_are_case_insensitive() {
        let engine = PromoEngine::default();
        assert_eq!(engine.find(" paws20 ").unwrap().code, "PAWS20");
    }

    #[test]
    fn test_unknown_and_inactive_codes() {
        let engine = PromoEngine::default();
        assert_eq!(
            engine.validate("nope", &context(5_000)).unwrap_err(),
            PromoError::UnknownCode("NOPE".to_string())
        );
        assert_eq!(
            engine.validate("SUMMER15", &context(5_000)).unwrap_err(),
            PromoError::Inactive("SUMMER15".to_string())
        );
    }

    #[test]
    fn test_min_subtotal_reason() {
        let engine = PromoEngine::default();
        let err = engine.validate("PAWS20", &context(8_000)).unwrap_err();
        assert_eq!(
            err,
            PromoError::NotApplicable {
                code: "PAWS20".to_string(),
                reason: "add $20.00 more to reach the $100.00 minimum".to_string(),
            }
        );
    }

    #[test]
    fn test_first_order_only() {
        let engine = PromoEngine::default();
        let mut ctx = context(3_000);
        assert!(engine.validate("WELCOME10", &ctx).is_err());

        ctx.is_first_order = true;
        assert!(engine.validate("WELCOME10", &ctx).is_ok());
    }

    #[test]
    fn test_category_condition() {
        let engine = PromoEngine::default();
        let mut ctx = context(1_000);
        assert!(engine.validate("TREATS5", &ctx).is_err());

        ctx.categories.insert(ProductCategory::Treats);
        assert!(engine.validate("TREATS5", &ctx).is_ok());
    }

    #[test]
    fn test_percent_discount_capped() {
        let engine = PromoEngine::default();
        let rule = engine.find("PAWS20").unwrap();

        assert_eq!(PromoEngine::discount_for(rule, 10_000), 2_000);
        assert_eq!(PromoEngine::discount_for(rule, 50_000), 3_000);
    }

    #[test]
    fn test_flat_discount_never_exceeds_subtotal() {
        let engine = PromoEngine::default();
        let rule = engine.find("TREATS5").unwrap();

        assert_eq!(PromoEngine::discount_for(rule, 399), 399);
        assert_eq!(PromoEngine::discount_for(rule, 2_000), 500);
    }

    #[test]
    fn test_free_shipping_has_no_item_discount() {
        let engine = PromoEngine::default();
        let rule = engine.find("FREESHIP").unwrap();
        assert_eq!(PromoEngine::discount_for(rule, 4_000), 0);
    }
}
