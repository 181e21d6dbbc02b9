use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::Order;

/// Parcel record created when an order ships
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub order_id: Uuid,
    pub tracking_number: String,
    pub carrier: String,
    pub shipped_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Generates and tracks shipments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulfillmentService {
    shipments: HashMap<Uuid, Shipment>,
}

impl FulfillmentService {
    pub fn new() -> Self {
        Self {
            shipments: HashMap::new(),
        }
    }

    /// Create the shipment for an order; shipping twice is an error
    pub fn ship(&mut self, order: &Order) -> Result<Shipment, FulfillmentError> {
        if self.shipments.contains_key(&order.id) {
            return Err(FulfillmentError::AlreadyShipped(order.id));
        }

        let shipment = Shipment {
            order_id: order.id,
            tracking_number: self.generate_tracking_number(&order.id),
            carrier: "PawMart Express".to_string(),
            shipped_at: Utc::now(),
            delivered_at: None,
        };
        self.shipments.insert(order.id, shipment.clone());
        Ok(shipment)
    }

    pub fn mark_delivered(&mut self, order_id: &Uuid) -> Result<&Shipment, FulfillmentError> {
        let shipment = self.shipments.get_mut(order_id)
            .ok_or(FulfillmentError::NotFound(*order_id))?;

        if shipment.delivered_at.is_some() {
            return Err(FulfillmentError::AlreadyDelivered(shipment.tracking_number.clone()));
        }

        shipment.delivered_at = Some(Utc::now());
        Ok(shipment)
    }

    pub fn shipment(&self, order_id: &Uuid) -> Option<&Shipment> {
        self.shipments.get(order_id)
    }

    pub fn by_tracking_number(&self, tracking_number: &str) -> Option<&Shipment> {
        self.shipments.values()
            .find(|s| s.tracking_number.eq_ignore_ascii_case(tracking_number))
    }

    /// Format: PMX-{timestamp}-{short_id}
    fn generate_tracking_number(&self, order_id: &Uuid) -> String {
        let timestamp = Utc::now().timestamp();
        let short_id = &order_id.simple().to_string()[..8];
        format!("PMX-{}-{}", timestamp, short_id.to_uppercase())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("Shipment not found for order {0}")]
    NotFound(Uuid),

    #[error("Order already shipped: {0}")]
    AlreadyShipped(Uuid),

    #[error("Shipment already delivered: {0}")]
    AlreadyDelivered(String),
}
