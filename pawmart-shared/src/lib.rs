pub mod models;
pub mod pii;

pub use models::events::StoreEvent;
pub use pii::Masked;
