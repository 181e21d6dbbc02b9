use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use pawmart_order::{CheckoutProcessor, Order, OrderError};

use crate::error::StoreError;
use crate::persistence::SnapshotRepository;
use crate::storefront::Storefront;

pub type SharedStore = Arc<RwLock<Storefront>>;

/// Run the simulated payment for a pending order, then record the outcome.
///
/// The store lock is released while the payment is in flight.
pub async fn settle_order(
    store: &RwLock<Storefront>,
    processor: &CheckoutProcessor,
    order_id: Uuid,
) -> Result<Order, StoreError> {
    let (amount_cents, method) = {
        let guard = store.read().await;
        let order = guard.order(&order_id).ok_or(OrderError::NotFound(order_id))?;
        (order.totals.total_cents, order.payment_method.clone())
    };

    let outcome = processor.settle(order_id, amount_cents, &method).await;
    store.write().await.complete_checkout(&order_id, outcome)
}

/// Persist the current state through `repository`
pub async fn save_snapshot(
    store: &RwLock<Storefront>,
    repository: &dyn SnapshotRepository,
) -> Result<(), StoreError> {
    let snapshot = store.read().await.snapshot();
    repository.save(&snapshot).await?;
    Ok(())
}

/// Restore saved state if the repository has any; returns whether it did
pub async fn load_snapshot(
    store: &RwLock<Storefront>,
    repository: &dyn SnapshotRepository,
) -> Result<bool, StoreError> {
    match repository.load().await? {
        Some(snapshot) => {
            store.write().await.restore(snapshot);
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use pawmart_core::payment::PaymentMethod;
    use pawmart_order::{MockPaymentAdapter, OrderStatus, ShippingAddress};
    use crate::persistence::MemoryRepository;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Sam Seller".to_string(),
            phone: "5550000002".to_string(),
            line1: "4 Whisker Way".to_string(),
            line2: None,
            city: "Denver".to_string(),
            state: "CO".to_string(),
            postal_code: "80202".to_string(),
            country: "US".to_string(),
        }
    }

    async fn place(store: &SharedStore, payment: PaymentMethod) -> Order {
        let mut guard = store.write().await;
        let user = guard.user_by_phone("5550000002").unwrap().id.to_string();
        let kibble = guard.catalog().products[0].id;
        guard.add_to_cart(&user, &kibble, 1).unwrap();
        guard.begin_checkout(&user, &address(), payment).unwrap()
    }

    #[tokio::test]
    async fn test_settle_confirms_order() {
        let store: SharedStore = Arc::new(RwLock::new(Storefront::default()));
        let processor = CheckoutProcessor::new(Arc::new(MockPaymentAdapter::new(Duration::ZERO)));

        let order = place(&store, PaymentMethod::Upi { handle: "sam@upi".to_string() }).await;
        let settled = settle_order(&store, &processor, order.id).await.unwrap();
        assert_eq!(settled.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_settle_declined_cancels_order() {
        let store: SharedStore = Arc::new(RwLock::new(Storefront::default()));
        let processor = CheckoutProcessor::new(Arc::new(MockPaymentAdapter::new(Duration::ZERO)));

        let order = place(&store, PaymentMethod::Card { last4: "0002".to_string() }).await;
        let settled = settle_order(&store, &processor, order.id).await.unwrap();
        assert_eq!(settled.status, OrderStatus::Cancelled);
        assert!(settled.status_history.last().unwrap().note.as_deref().unwrap().contains("declined"));
    }

    #[tokio::test]
    async fn test_snapshot_helpers() {
        let store: SharedStore = Arc::new(RwLock::new(Storefront::default()));
        let repo = MemoryRepository::new();

        assert!(!load_snapshot(&store, &repo).await.unwrap());
        place(&store, PaymentMethod::CashOnDelivery).await;
        save_snapshot(&store, &repo).await.unwrap();

        let fresh: SharedStore = Arc::new(RwLock::new(Storefront::default()));
        assert!(load_snapshot(&fresh, &repo).await.unwrap());
        assert_eq!(fresh.read().await.all_orders().len(), 1);
    }
}
