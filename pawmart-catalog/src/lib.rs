pub mod product;
pub mod pricing;
pub mod inventory;
pub mod search;
pub mod mock;

pub use product::{Catalog, Gender, Listing, ListingKind, Pet, PetKind, Product, ProductCategory, ProductError};
pub use pricing::{discount_percentage, format_cents, percent_of};
pub use inventory::{InventoryError, InventoryManager};
pub use search::{PetQuery, PetSort, ProductQuery, ProductSort, Page};
