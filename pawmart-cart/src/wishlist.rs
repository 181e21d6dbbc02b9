use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use pawmart_catalog::{Listing, ListingKind};

use crate::models::{Cart, CartError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistEntry {
    pub listing_id: Uuid,
    pub kind: ListingKind,
    pub name: String,
    pub price_cents: i64,
    pub saved_at: DateTime<Utc>,
}

/// Saved-for-later listings, independent of the cart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wishlist {
    pub entries: Vec<WishlistEntry>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a listing; returns false if it was already saved
    pub fn add(&mut self, listing: &dyn Listing) -> bool {
        if self.contains(&listing.listing_id()) {
            return false;
        }
        self.entries.push(WishlistEntry {
            listing_id: listing.listing_id(),
            kind: listing.kind(),
            name: listing.title().to_string(),
            price_cents: listing.unit_price_cents(),
            saved_at: Utc::now(),
        });
        true
    }

    pub fn remove(&mut self, listing_id: &Uuid) -> Option<WishlistEntry> {
        let index = self.entries.iter().position(|e| e.listing_id == *listing_id)?;
        Some(self.entries.remove(index))
    }

    /// Flip membership; returns whether the listing is now saved
    pub fn toggle(&mut self, listing: &dyn Listing) -> bool {
        if self.remove(&listing.listing_id()).is_some() {
            false
        } else {
            self.add(listing)
        }
    }

    pub fn contains(&self, listing_id: &Uuid) -> bool {
        self.entries.iter().any(|e| e.listing_id == *listing_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move one unit of a saved listing into the cart.
    ///
    /// The entry stays saved when the cart rejects the listing.
    pub fn move_to_cart(&mut self, listing: &dyn Listing, cart: &mut Cart, max_line_quantity: u32) -> Result<(), CartError> {
        let listing_id = listing.listing_id();
        if !self.contains(&listing_id) {
            return Err(CartError::LineNotFound(listing_id));
        }
        cart.add(listing, 1, max_line_quantity)?;
        self.remove(&listing_id);
        Ok(())
    }

    /// Union with another wishlist, keeping this list's entries first
    pub fn merge(&mut self, other: Wishlist) {
        for entry in other.entries {
            if !self.contains(&entry.listing_id) {
                self.entries.push(entry);
            }
        }
    }
}
