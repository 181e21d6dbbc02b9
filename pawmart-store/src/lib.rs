pub mod app_config;
pub mod checkout;
pub mod error;
pub mod events;
pub mod persistence;
pub mod storefront;

pub use app_config::Config;
pub use checkout::{load_snapshot, save_snapshot, settle_order, SharedStore};
pub use error::StoreError;
pub use events::EventBus;
pub use persistence::{JsonFileRepository, MemoryRepository, PersistenceError, SnapshotRepository};
pub use storefront::{
    guest_shopper_id, user_id_of, CartView, ShopperState, StoreSnapshot, Storefront, StorefrontSettings,
};
