use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use pawmart_catalog::{Catalog, Listing, ListingKind, PetKind, ProductCategory};

/// A listing in the cart with its quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub listing_id: Uuid,
    pub kind: ListingKind,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub category: Option<ProductCategory>,
    pub pet_kind: PetKind,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn from_listing(listing: &dyn Listing, quantity: u32) -> Self {
        Self {
            listing_id: listing.listing_id(),
            kind: listing.kind(),
            name: listing.title().to_string(),
            unit_price_cents: listing.unit_price_cents(),
            quantity,
            category: listing.category(),
            pet_kind: listing.pet_kind(),
            added_at: Utc::now(),
        }
    }

    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity as i64
    }
}

/// Shopper's cart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub promo_code: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add units of a listing, merging with an existing line.
    ///
    /// The resulting line quantity may not exceed the listing's own limit
    /// (stock, or 1 for pets) nor `max_line_quantity`.
    pub fn add(&mut self, listing: &dyn Listing, quantity: u32, max_line_quantity: u32) -> Result<&CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if !listing.is_available() {
            return Err(CartError::Unavailable(listing.title().to_string()));
        }

        let listing_id = listing.listing_id();
        let existing = self.lines.iter().position(|l| l.listing_id == listing_id);

        if existing.is_some() && listing.kind() == ListingKind::Pet {
            return Err(CartError::AlreadyInCart(listing.title().to_string()));
        }

        let current = existing.map(|i| self.lines[i].quantity).unwrap_or(0);
        let max = listing.max_quantity().min(max_line_quantity);
        let requested = current.saturating_add(quantity);
        if requested > max {
            return Err(CartError::QuantityExceeded { requested, max });
        }

        let index = match existing {
            Some(i) => {
                let line = &mut self.lines[i];
                line.quantity = requested;
                // Price may have changed since the line was added
                line.unit_price_cents = listing.unit_price_cents();
                i
            }
            None => {
                self.lines.push(CartLine::from_listing(listing, quantity));
                self.lines.len() - 1
            }
        };
        self.touch();

        Ok(&self.lines[index])
    }

    /// Set a line's quantity; zero removes the line
    pub fn update_quantity(&mut self, listing: &dyn Listing, quantity: u32, max_line_quantity: u32) -> Result<(), CartError> {
        let listing_id = listing.listing_id();
        let index = self.lines.iter()
            .position(|l| l.listing_id == listing_id)
            .ok_or(CartError::LineNotFound(listing_id))?;

        if quantity == 0 {
            self.lines.remove(index);
            self.touch();
            return Ok(());
        }

        let max = listing.max_quantity().min(max_line_quantity);
        if quantity > max {
            return Err(CartError::QuantityExceeded { requested: quantity, max });
        }

        let line = &mut self.lines[index];
        line.quantity = quantity;
        line.unit_price_cents = listing.unit_price_cents();
        self.touch();
        Ok(())
    }

    pub fn remove(&mut self, listing_id: &Uuid) -> Result<CartLine, CartError> {
        let index = self.lines.iter()
            .position(|l| l.listing_id == *listing_id)
            .ok_or(CartError::LineNotFound(*listing_id))?;
        let line = self.lines.remove(index);
        self.touch();
        Ok(line)
    }

    /// Empty the cart, dropping any applied promo code
    pub fn clear(&mut self) {
        self.lines.clear();
        self.promo_code = None;
        self.touch();
    }

    pub fn contains(&self, listing_id: &Uuid) -> bool {
        self.lines.iter().any(|l| l.listing_id == *listing_id)
    }

    pub fn line(&self, listing_id: &Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.listing_id == *listing_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Fold another cart into this one (guest cart on sign-in).
    ///
    /// Quantities add up but never past `max_line_quantity` or the listing's
    /// current stock; pets already present are not duplicated. Lines for
    /// listings that are gone or sold out are dropped.
    pub fn merge(&mut self, other: Cart, catalog: &Catalog, max_line_quantity: u32) {
        for mut line in other.lines {
            let cap = catalog.find_listing(&line.listing_id)
                .filter(|l| l.is_available())
                .map_or(0, |l| l.max_quantity().min(max_line_quantity));
            if cap == 0 {
                continue;
            }
            match self.lines.iter_mut().find(|l| l.listing_id == line.listing_id) {
                Some(existing) if existing.kind == ListingKind::Pet => {}
                Some(existing) => {
                    existing.quantity = existing.quantity
                        .saturating_add(line.quantity)
                        .min(cap);
                }
                None => {
                    line.quantity = line.quantity.min(cap);
                    self.lines.push(line);
                }
            }
        }
        if self.promo_code.is_none() {
            self.promo_code = other.promo_code;
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Listing not available: {0}")]
    Unavailable(String),

    #[error("Already in cart: {0}")]
    AlreadyInCart(String),

    #[error("Quantity {requested} exceeds the limit of {max}")]
    QuantityExceeded {
        requested: u32,
        max: u32,
    },

    #[error("Cart line not found: {0}")]
    LineNotFound(Uuid),

    #[error("Cart is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawmart_catalog::Catalog;

    #[test]
    fn test_add_merges_lines() {
        let catalog = Catalog::mock();
        let product = &catalog.products[0];
        let mut cart = Cart::new();

        cart.add(product, 2, 10).unwrap();
        cart.add(product, 3, 10).unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal_cents(), product.price_cents * 5);
    }

    #[test]
    fn test_add_respects_line_limit() {
        let catalog = Catalog::mock();
        let product = &catalog.products[0];
        let mut cart = Cart::new();

        cart.add(product, 8, 10).unwrap();
        let err = cart.add(product, 3, 10).unwrap_err();
        assert!(matches!(err, CartError::QuantityExceeded { requested: 11, max: 10 }));
        assert_eq!(cart.item_count(), 8);
    }

    #[test]
    fn test_pet_is_single_unit() {
        let catalog = Catalog::mock();
        let pet = &catalog.pets[0];
        let mut cart = Cart::new();

        assert!(matches!(cart.add(pet, 2, 10), Err(CartError::QuantityExceeded { max: 1, .. })));
        cart.add(pet, 1, 10).unwrap();
        assert!(matches!(cart.add(pet, 1, 10), Err(CartError::AlreadyInCart(_))));
    }

    #[test]
    fn test_sold_out_rejected() {
        let catalog = Catalog::mock();
        let sold_out = catalog.products.iter().find(|p| p.stock == 0).unwrap();
        let mut cart = Cart::new();

        assert!(matches!(cart.add(sold_out, 1, 10), Err(CartError::Unavailable(_))));
        assert!(matches!(cart.add(&catalog.products[0], 0, 10), Err(CartError::InvalidQuantity(0))));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let catalog = Catalog::mock();
        let product = &catalog.products[1];
        let mut cart = Cart::new();

        cart.add(product, 1, 10).unwrap();
        cart.update_quantity(product, 4, 10).unwrap();
        assert_eq!(cart.item_count(), 4);

        cart.update_quantity(product, 0, 10).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(
            cart.update_quantity(product, 1, 10),
            Err(CartError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_clear_drops_promo() {
        let catalog = Catalog::mock();
        let mut cart = Cart::new();
        cart.add(&catalog.products[0], 1, 10).unwrap();
        cart.promo_code = Some("PAWS20".to_string());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.promo_code.is_none());
    }

    #[test]
    fn test_merge_guest_cart() {
        let catalog = Catalog::mock();
        let food = &catalog.products[0];
        let toy = &catalog.products[5];
        let pet = &catalog.pets[1];

        let mut user_cart = Cart::new();
        user_cart.add(food, 9, 10).unwrap();
        user_cart.add(pet, 1, 10).unwrap();

        let mut guest_cart = Cart::new();
        guest_cart.add(food, 4, 10).unwrap();
        guest_cart.add(toy, 1, 10).unwrap();
        guest_cart.add(pet, 1, 10).unwrap();

        user_cart.merge(guest_cart, &catalog, 10);

        assert_eq!(user_cart.line(&food.id).unwrap().quantity, 10);
        assert_eq!(user_cart.line(&pet.id).unwrap().quantity, 1);
        assert!(user_cart.contains(&toy.id));
        assert_eq!(user_cart.lines.len(), 3);
    }

    #[test]
    fn test_merge_clamps_to_stock() {
        let mut catalog = Catalog::mock();
        let food = catalog.products[0].clone();
        let toy = catalog.products[5].clone();

        let mut user_cart = Cart::new();
        user_cart.add(&food, 2, 10).unwrap();

        let mut guest_cart = Cart::new();
        guest_cart.add(&food, 3, 10).unwrap();
        guest_cart.add(&toy, 4, 10).unwrap();

        catalog.set_stock(&food.id, 4).unwrap();
        catalog.set_stock(&toy.id, 0).unwrap();
        user_cart.merge(guest_cart, &catalog, 10);

        assert_eq!(user_cart.line(&food.id).unwrap().quantity, 4);
        assert!(!user_cart.contains(&toy.id));
    }
}
