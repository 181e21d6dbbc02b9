use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notifications emitted by the storefront whenever shared state changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreEvent {
    CartUpdated {
        shopper_id: String,
        item_count: u32,
        subtotal_cents: i64,
        timestamp: i64,
    },
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        customer_id: String,
        total_cents: i64,
        timestamp: i64,
    },
    OrderStatusChanged {
        order_id: Uuid,
        customer_id: String,
        from: String,
        to: String,
        timestamp: i64,
    },
    UserSignedIn {
        user_id: Uuid,
        is_new: bool,
        timestamp: i64,
    },
}

impl StoreEvent {
    /// Shopper or customer the event concerns, used to filter event streams.
    pub fn audience(&self) -> String {
        match self {
            StoreEvent::CartUpdated { shopper_id, .. } => shopper_id.clone(),
            StoreEvent::OrderPlaced { customer_id, .. } => customer_id.clone(),
            StoreEvent::OrderStatusChanged { customer_id, .. } => customer_id.clone(),
            StoreEvent::UserSignedIn { user_id, .. } => user_id.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::CartUpdated { .. } => "cart.updated",
            StoreEvent::OrderPlaced { .. } => "order.placed",
            StoreEvent::OrderStatusChanged { .. } => "order.status_changed",
            StoreEvent::UserSignedIn { .. } => "user.signed_in",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = StoreEvent::OrderStatusChanged {
            order_id: Uuid::nil(),
            customer_id: "c-1".to_string(),
            from: "pending".to_string(),
            to: "confirmed".to_string(),
            timestamp: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ORDER_STATUS_CHANGED");
        assert_eq!(event.audience(), "c-1");
        assert_eq!(event.name(), "order.status_changed");
    }
}
