use pawmart_core::payment::{PaymentAdapter, PaymentMethod, PaymentReceipt, PaymentStatus};
use uuid::Uuid;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Runs the payment step of checkout against a pluggable adapter
pub struct CheckoutProcessor {
    adapter: Arc<dyn PaymentAdapter>,
}

impl CheckoutProcessor {
    pub fn new(adapter: Arc<dyn PaymentAdapter>) -> Self {
        Self { adapter }
    }

    /// Settle an order total. A declined payment is an error carrying the receipt.
    pub async fn settle(
        &self,
        order_id: Uuid,
        amount_cents: i64,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt, CheckoutError> {
        let receipt = self
            .adapter
            .process_payment(order_id, amount_cents, method)
            .await
            .map_err(|e| CheckoutError::Gateway(e.to_string()))?;

        match receipt.status {
            PaymentStatus::Approved => {
                tracing::info!("Payment {} approved for order {}", receipt.reference, order_id);
                Ok(receipt)
            }
            PaymentStatus::Declined => {
                tracing::warn!("Payment declined for order {}", order_id);
                Err(CheckoutError::Declined(receipt))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Payment declined: {}", .0.message.as_deref().unwrap_or("no reason given"))]
    Declined(PaymentReceipt),

    #[error("Payment gateway error: {0}")]
    Gateway(String),
}

/// Simulated gateway: waits `delay`, then approves everything except
/// card numbers ending 0002
pub struct MockPaymentAdapter {
    delay: Duration,
}

impl MockPaymentAdapter {
    pub const DECLINED_CARD_LAST4: &'static str = "0002";

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockPaymentAdapter {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

#[async_trait::async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn process_payment(
        &self,
        order_id: Uuid,
        amount_cents: i64,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt, Box<dyn std::error::Error + Send + Sync>> {
        if amount_cents < 0 {
            return Err("Negative payment amount".into());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let declined = matches!(method, PaymentMethod::Card { last4 } if last4 == Self::DECLINED_CARD_LAST4);
        let (status, message) = if declined {
            (PaymentStatus::Declined, Some("Card declined by issuer".to_string()))
        } else {
            (PaymentStatus::Approved, None)
        };

        Ok(PaymentReceipt {
            reference: format!("sim_{}", &order_id.simple().to_string()[..12]),
            order_id,
            amount_cents,
            status,
            message,
            processed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> CheckoutProcessor {
        CheckoutProcessor::new(Arc::new(MockPaymentAdapter::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn test_approved_payment() {
        let order_id = Uuid::new_v4();
        let receipt = processor()
            .settle(order_id, 4599, &PaymentMethod::Card { last4: "4242".to_string() })
            .await
            .unwrap();

        assert_eq!(receipt.status, PaymentStatus::Approved);
        assert_eq!(receipt.order_id, order_id);
        assert!(receipt.reference.starts_with("sim_"));
    }

    #[tokio::test]
    async fn test_declined_card() {
        let result = processor()
            .settle(Uuid::new_v4(), 4599, &PaymentMethod::Card { last4: "0002".to_string() })
            .await;

        match result {
            Err(CheckoutError::Declined(receipt)) => assert_eq!(receipt.status, PaymentStatus::Declined),
            other => panic!("expected decline, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cash_on_delivery_always_approved() {
        let receipt = processor()
            .settle(Uuid::new_v4(), 100, &PaymentMethod::CashOnDelivery)
            .await
            .unwrap();
        assert_eq!(receipt.amount_cents, 100);
    }

    #[tokio::test]
    async fn test_gateway_error() {
        let result = processor()
            .settle(Uuid::new_v4(), -1, &PaymentMethod::CashOnDelivery)
            .await;
        assert!(matches!(result, Err(CheckoutError::Gateway(_))));
    }
}
