use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::collections::HashMap;
use pawmart_cart::CartTotals;
use pawmart_core::payment::PaymentMethod;

use crate::fulfillment::{FulfillmentError, FulfillmentService};
use crate::models::{Order, OrderLine, OrderStatus, ShippingAddress, StatusChange};

/// Manages order lifecycle and state transitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderManager {
    orders: HashMap<Uuid, Order>,
    fulfillment: FulfillmentService,
}

impl OrderManager {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            fulfillment: FulfillmentService::new(),
        }
    }

    /// Create a pending order from checked-out cart lines
    pub fn place_order(
        &mut self,
        customer_id: String,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
        totals: CartTotals,
    ) -> Result<Order, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let order = Order::new(customer_id, lines, shipping_address, payment_method, totals);
        tracing::info!("Order {} placed for {} ({} cents)", order.order_number, order.customer_id, order.totals.total_cents);

        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    pub fn get_order(&self, order_id: &Uuid) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Look up an order owned by `customer_id`; other customers' orders read as missing
    pub fn order_for(&self, customer_id: &str, order_id: &Uuid) -> Result<&Order, OrderError> {
        self.orders.get(order_id)
            .filter(|o| o.customer_id == customer_id)
            .ok_or(OrderError::NotFound(*order_id))
    }

    /// A customer's orders, newest first
    pub fn orders_for(&self, customer_id: &str) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values()
            .filter(|o| o.customer_id == customer_id)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Every order, newest first
    pub fn all_orders(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Ids of orders still moving through the lifecycle
    pub fn open_order_ids(&self) -> Vec<Uuid> {
        self.orders.values()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.id)
            .collect()
    }

    /// Transition: Pending → Confirmed (payment settled)
    pub fn confirm(&mut self, order_id: &Uuid, payment_reference: Option<String>) -> Result<StatusChange, OrderError> {
        let change = self.transition(order_id, OrderStatus::Confirmed, None)?;
        if let Some(order) = self.orders.get_mut(order_id) {
            order.payment_reference = payment_reference;
        }
        Ok(change)
    }

    /// Transition: Confirmed → Processing
    pub fn start_processing(&mut self, order_id: &Uuid) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Processing, None)
    }

    /// Transition: Processing → Shipped (assigns a tracking number)
    pub fn ship(&mut self, order_id: &Uuid) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Shipped, None)
    }

    /// Transition: Shipped → Delivered
    pub fn deliver(&mut self, order_id: &Uuid) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Delivered, None)
    }

    /// Cancel an order (Pending, Confirmed or Processing only)
    pub fn cancel(&mut self, order_id: &Uuid, reason: Option<String>) -> Result<StatusChange, OrderError> {
        self.transition(order_id, OrderStatus::Cancelled, reason)
    }

    /// Customer-initiated cancel; only the owner may cancel
    pub fn cancel_for(&mut self, customer_id: &str, order_id: &Uuid, reason: Option<String>) -> Result<StatusChange, OrderError> {
        self.order_for(customer_id, order_id)?;
        self.cancel(order_id, reason)
    }

    /// Move to the next state on the happy path
    pub fn advance(&mut self, order_id: &Uuid) -> Result<StatusChange, OrderError> {
        let order = self.get_order_required(order_id)?;
        let next = order.status.next().ok_or(OrderError::AlreadyFinal(order.status))?;
        self.transition(order_id, next, None)
    }

    /// Jump straight to `to`, checked against the transition table
    pub fn set_status(&mut self, order_id: &Uuid, to: OrderStatus, note: Option<String>) -> Result<StatusChange, OrderError> {
        self.transition(order_id, to, note)
    }

    pub fn fulfillment(&self) -> &FulfillmentService {
        &self.fulfillment
    }

    fn transition(&mut self, order_id: &Uuid, to: OrderStatus, note: Option<String>) -> Result<StatusChange, OrderError> {
        let order = self.orders.get_mut(order_id)
            .ok_or(OrderError::NotFound(*order_id))?;

        if !order.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }

        match to {
            OrderStatus::Shipped => {
                let shipment = self.fulfillment.ship(order)?;
                order.tracking_number = Some(shipment.tracking_number);
            }
            OrderStatus::Delivered => {
                self.fulfillment.mark_delivered(order_id)?;
            }
            _ => {}
        }

        let from = order.status;
        let change = order.update_status(to, note);
        tracing::info!("Order {} moved {} -> {}", order.order_number, from, to);
        Ok(change)
    }

    fn get_order_required(&self, order_id: &Uuid) -> Result<&Order, OrderError> {
        self.orders.get(order_id)
            .ok_or(OrderError::NotFound(*order_id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order is already {0}")]
    AlreadyFinal(OrderStatus),

    #[error("Order has no items")]
    EmptyOrder,

    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::address;
    use pawmart_catalog::ListingKind;

    fn line(price: i64, quantity: u32) -> OrderLine {
        OrderLine {
            listing_id: Uuid::new_v4(),
            kind: ListingKind::Product,
            name: "Rope Toy".to_string(),
            unit_price_cents: price,
            quantity,
            line_total_cents: price * quantity as i64,
        }
    }

    fn place(manager: &mut OrderManager, customer: &str) -> Uuid {
        manager
            .place_order(
                customer.to_string(),
                vec![line(1299, 2)],
                address(),
                PaymentMethod::CashOnDelivery,
                CartTotals::default(),
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_order_lifecycle() {
        let mut manager = OrderManager::new();
        let order_id = place(&mut manager, "customer-1");

        manager.confirm(&order_id, Some("sim_123".to_string())).unwrap();
        assert_eq!(manager.get_order(&order_id).unwrap().status, OrderStatus::Confirmed);
        assert_eq!(manager.get_order(&order_id).unwrap().payment_reference.as_deref(), Some("sim_123"));

        manager.start_processing(&order_id).unwrap();
        let change = manager.ship(&order_id).unwrap();
        assert_eq!(change.from, Some(OrderStatus::Processing));
        assert!(manager.get_order(&order_id).unwrap().tracking_number.is_some());

        manager.deliver(&order_id).unwrap();
        let order = manager.get_order(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.status_history.len(), 5);
        assert!(manager.fulfillment().shipment(&order_id).unwrap().delivered_at.is_some());
    }

    #[test]
    fn test_invalid_transition() {
        let mut manager = OrderManager::new();
        let order_id = place(&mut manager, "customer-1");

        let result = manager.ship(&order_id);
        assert!(matches!(
            result,
            Err(OrderError::InvalidTransition { from: OrderStatus::Pending, to: OrderStatus::Shipped })
        ));
    }

    #[test]
    fn test_cancel_rules() {
        let mut manager = OrderManager::new();
        let order_id = place(&mut manager, "customer-1");
        manager.advance(&order_id).unwrap();
        manager.advance(&order_id).unwrap();
        manager.cancel(&order_id, Some("changed my mind".to_string())).unwrap();

        let order = manager.get_order(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.status_history.last().unwrap().note.as_deref(), Some("changed my mind"));
        assert!(matches!(manager.advance(&order_id), Err(OrderError::AlreadyFinal(OrderStatus::Cancelled))));

        let shipped = place(&mut manager, "customer-1");
        for _ in 0..3 {
            manager.advance(&shipped).unwrap();
        }
        assert!(matches!(manager.cancel(&shipped, None), Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn test_customer_scoping() {
        let mut manager = OrderManager::new();
        let mine = place(&mut manager, "customer-1");
        place(&mut manager, "customer-2");

        assert_eq!(manager.orders_for("customer-1").len(), 1);
        assert_eq!(manager.all_orders().len(), 2);
        assert!(manager.order_for("customer-2", &mine).is_err());
        assert!(matches!(
            manager.cancel_for("customer-2", &mine, None),
            Err(OrderError::NotFound(_))
        ));
        assert!(manager.cancel_for("customer-1", &mine, None).is_ok());
        assert_eq!(manager.open_order_ids().len(), 1);
    }

    #[test]
    fn test_empty_order_rejected() {
        let mut manager = OrderManager::new();
        let result = manager.place_order(
            "customer-1".to_string(),
            vec![],
            address(),
            PaymentMethod::CashOnDelivery,
            CartTotals::default(),
        );
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_set_status_uses_transition_table() {
        let mut manager = OrderManager::new();
        let order_id = place(&mut manager, "customer-1");

        assert!(manager.set_status(&order_id, OrderStatus::Delivered, None).is_err());
        assert!(manager.set_status(&order_id, OrderStatus::Confirmed, None).is_ok());
    }
}
