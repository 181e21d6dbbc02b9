use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// How the shopper chose to pay. Labels only: nothing is charged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card {
        last4: String,
    },
    Upi {
        handle: String,
    },
}

impl PaymentMethod {
    pub fn label(&self) -> String {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on delivery".to_string(),
            PaymentMethod::Card { last4 } => format!("Card ending {}", last4),
            PaymentMethod::Upi { handle } => format!("UPI {}", handle),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Approved,
    Declined,
}

/// Outcome of a simulated payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub order_id: Uuid,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub message: Option<String>,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Settle an order total with the given method
    async fn process_payment(
        &self,
        order_id: Uuid,
        amount_cents: i64,
        method: &PaymentMethod,
    ) -> Result<PaymentReceipt, Box<dyn std::error::Error + Send + Sync>>;
}
