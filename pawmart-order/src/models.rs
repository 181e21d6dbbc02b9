use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use pawmart_catalog::ListingKind;
use pawmart_cart::{CartLine, CartTotals};
use pawmart_core::payment::PaymentMethod;
use pawmart_core::validation::{
    validate_phone, validate_name, validate_postal_code, validate_required, FieldErrors,
};
use pawmart_core::CoreError;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Next state on the happy path; `None` once terminal
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing)
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if to == OrderStatus::Cancelled {
            return self.is_cancellable();
        }
        self.next() == Some(to)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl ShippingAddress {
    /// Validate every field, returning a normalized copy or all field errors at once
    pub fn validate(&self) -> Result<ShippingAddress, CoreError> {
        let mut errors = FieldErrors::new();

        let full_name = errors.check(validate_name("full_name", &self.full_name));
        let phone = errors.check(validate_phone("phone", &self.phone));
        let line1 = errors.check(validate_required("line1", &self.line1));
        let city = errors.check(validate_required("city", &self.city));
        let state = errors.check(validate_required("state", &self.state));
        let postal_code = errors.check(validate_postal_code("postal_code", &self.postal_code));
        let country = errors.check(validate_required("country", &self.country));
        errors.into_result()?;

        Ok(ShippingAddress {
            full_name: full_name.unwrap_or_default(),
            phone: phone.unwrap_or_default(),
            line1: line1.unwrap_or_default(),
            line2: self.line2.as_deref().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
            city: city.unwrap_or_default(),
            state: state.unwrap_or_default(),
            postal_code: postal_code.unwrap_or_default(),
            country: country.unwrap_or_default().to_uppercase(),
        })
    }
}

/// Snapshot of a cart line at the time of purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub listing_id: Uuid,
    pub kind: ListingKind,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            listing_id: line.listing_id,
            kind: line.kind,
            name: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            line_total_cents: line.line_total_cents(),
        }
    }
}

/// A customer's purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: String,
    pub lines: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub totals: CartTotals,
    pub status: OrderStatus,
    pub status_history: Vec<StatusChange>,
    pub tracking_number: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer_id: String,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        totals: CartTotals,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Self {
            id,
            order_number: Self::number_for(&id, now),
            customer_id,
            lines,
            shipping_address,
            payment_method,
            totals,
            status: OrderStatus::Pending,
            status_history: vec![StatusChange {
                from: None,
                to: OrderStatus::Pending,
                at: now,
                note: None,
            }],
            tracking_number: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-facing order number: `PM-YYYYMMDD-XXXXXX`
    fn number_for(id: &Uuid, at: DateTime<Utc>) -> String {
        let short = id.simple().to_string()[..6].to_uppercase();
        format!("PM-{}-{}", at.format("%Y%m%d"), short)
    }

    /// Record a status change; callers validate the transition
    pub fn update_status(&mut self, new_status: OrderStatus, note: Option<String>) -> StatusChange {
        let now = Utc::now();
        let change = StatusChange {
            from: Some(self.status),
            to: new_status,
            at: now,
            note,
        };
        self.status = new_status;
        self.status_history.push(change.clone());
        self.updated_at = now;
        change
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Avery Customer".to_string(),
            phone: "555-000-0001".to_string(),
            line1: "12 Bark Street".to_string(),
            line2: Some("  ".to_string()),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            postal_code: "78701".to_string(),
            country: "us".to_string(),
        }
    }

    #[test]
    fn test_status_transitions() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::Delivered.next(), None);
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Shipped).unwrap(), "\"shipped\"");
        assert_eq!(OrderStatus::Processing.to_string(), "processing");
    }

    #[test]
    fn test_address_normalized() {
        let validated = address().validate().unwrap();
        assert_eq!(validated.phone, "5550000001");
        assert_eq!(validated.line2, None);
        assert_eq!(validated.country, "US");
    }

    #[test]
    fn test_address_reports_every_field() {
        let bad = ShippingAddress {
            full_name: String::new(),
            phone: "12".to_string(),
            line1: " ".to_string(),
            postal_code: "abc".to_string(),
            ..address()
        };
        match bad.validate() {
            Err(CoreError::InvalidFields(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["full_name", "phone", "line1", "postal_code"]);
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_new_order_is_pending() {
        let order = Order::new(
            "customer-1".to_string(),
            vec![],
            address(),
            PaymentMethod::CashOnDelivery,
            CartTotals::default(),
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
        assert!(order.order_number.starts_with("PM-"));
        assert_eq!(order.order_number.len(), "PM-20250101-ABCDEF".len());
    }
}
