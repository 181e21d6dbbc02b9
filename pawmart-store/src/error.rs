use uuid::Uuid;
use pawmart_cart::{CartError, PromoError};
use pawmart_catalog::{InventoryError, ProductError};
use pawmart_core::chat::ChatError;
use pawmart_core::identity::AuthError;
use pawmart_core::CoreError;
use pawmart_order::OrderError;

use crate::persistence::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Listing not found: {0}")]
    ListingNotFound(Uuid),

    #[error("Not in wishlist: {0}")]
    NotInWishlist(Uuid),

    #[error("Sign in to continue")]
    AuthenticationRequired,

    #[error(transparent)]
    Catalog(#[from] ProductError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
