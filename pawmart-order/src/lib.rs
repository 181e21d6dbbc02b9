pub mod models;
pub mod manager;
pub mod fulfillment;
pub mod checkout;

pub use models::{Order, OrderLine, OrderStatus, ShippingAddress, StatusChange};
pub use manager::{OrderError, OrderManager};
pub use fulfillment::{FulfillmentError, FulfillmentService, Shipment};
pub use checkout::{CheckoutError, CheckoutProcessor, MockPaymentAdapter};
