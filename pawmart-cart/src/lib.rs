pub mod models;
pub mod wishlist;
pub mod rules;
pub mod totals;

pub use models::{Cart, CartError, CartLine};
pub use wishlist::{Wishlist, WishlistEntry};
pub use rules::{PromoCondition, PromoContext, PromoEngine, PromoError, PromoReward, PromoRule};
pub use totals::{CartTotals, TotalsCalculator, TotalsConfig};
