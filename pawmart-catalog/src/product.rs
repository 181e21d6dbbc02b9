use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Species a product is made for, or the species of a listed pet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PetKind {
    Dog,
    Cat,
    Bird,
    Fish,
    SmallPet,
    Reptile,
}

/// Product categories in the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Food,
    Treats,
    Toys,
    Accessories,
    Health,
    Grooming,
    Bedding,
    Aquarium,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 8] = [
        ProductCategory::Food,
        ProductCategory::Treats,
        ProductCategory::Toys,
        ProductCategory::Accessories,
        ProductCategory::Health,
        ProductCategory::Grooming,
        ProductCategory::Bedding,
        ProductCategory::Aquarium,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// What a cart or wishlist entry points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Product,
    Pet,
}

/// Pet supply product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: ProductCategory,
    pub pet_kind: PetKind,
    pub brand: String,
    pub price_cents: i64,
    /// List price before discount, shown struck through
    pub mrp_cents: Option<i64>,
    pub rating: f32,
    pub review_count: u32,
    pub stock: u32,
    pub is_featured: bool,
    pub tags: Vec<String>,
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Animal listed for adoption/sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: PetKind,
    pub breed: String,
    pub age_months: u32,
    pub gender: Gender,
    pub price_cents: i64,
    pub vaccinated: bool,
    pub description: String,
    pub location: String,
    pub is_available: bool,
    pub listed_at: DateTime<Utc>,
}

/// Uniform view over anything that can sit in a cart or wishlist
pub trait Listing {
    fn listing_id(&self) -> Uuid;

    fn kind(&self) -> ListingKind;

    fn title(&self) -> &str;

    fn unit_price_cents(&self) -> i64;

    /// Pets have no product category
    fn category(&self) -> Option<ProductCategory>;

    fn pet_kind(&self) -> PetKind;

    /// Upper bound on units of this listing a single cart line may hold
    fn max_quantity(&self) -> u32;

    fn is_available(&self) -> bool;
}

impl Listing for Product {
    fn listing_id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Product
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn unit_price_cents(&self) -> i64 {
        self.price_cents
    }

    fn category(&self) -> Option<ProductCategory> {
        Some(self.category)
    }

    fn pet_kind(&self) -> PetKind {
        self.pet_kind
    }

    fn max_quantity(&self) -> u32 {
        self.stock
    }

    fn is_available(&self) -> bool {
        self.stock > 0
    }
}

impl Listing for Pet {
    fn listing_id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> ListingKind {
        ListingKind::Pet
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn unit_price_cents(&self) -> i64 {
        self.price_cents
    }

    fn category(&self) -> Option<ProductCategory> {
        None
    }

    fn pet_kind(&self) -> PetKind {
        self.species
    }

    fn max_quantity(&self) -> u32 {
        1
    }

    fn is_available(&self) -> bool {
        self.is_available
    }
}

/// Catalog lookup errors
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Pet not found: {0}")]
    PetNotFound(Uuid),
}

/// In-memory product and pet catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub pets: Vec<Pet>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, pets: Vec<Pet>) -> Self {
        Self { products, pets }
    }

    pub fn product(&self, id: &Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == *id)
    }

    pub fn pet(&self, id: &Uuid) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == *id)
    }

    /// Resolve a listing of either kind
    pub fn listing(&self, kind: ListingKind, id: &Uuid) -> Result<&dyn Listing, ProductError> {
        match kind {
            ListingKind::Product => self
                .product(id)
                .map(|p| p as &dyn Listing)
                .ok_or(ProductError::NotFound(*id)),
            ListingKind::Pet => self
                .pet(id)
                .map(|p| p as &dyn Listing)
                .ok_or(ProductError::PetNotFound(*id)),
        }
    }

    /// Find a listing by id without knowing its kind
    pub fn find_listing(&self, id: &Uuid) -> Option<&dyn Listing> {
        self.product(id)
            .map(|p| p as &dyn Listing)
            .or_else(|| self.pet(id).map(|p| p as &dyn Listing))
    }

    /// Mirror live inventory onto the product record
    pub fn set_stock(&mut self, id: &Uuid, stock: u32) -> Result<(), ProductError> {
        let product = self.products.iter_mut()
            .find(|p| p.id == *id)
            .ok_or(ProductError::NotFound(*id))?;
        product.stock = stock;
        Ok(())
    }

    /// Pets are single-unit listings: reserving one takes it off the market
    pub fn set_pet_available(&mut self, id: &Uuid, available: bool) -> Result<(), ProductError> {
        let pet = self.pets.iter_mut()
            .find(|p| p.id == *id)
            .ok_or(ProductError::PetNotFound(*id))?;
        pet.is_available = available;
        Ok(())
    }

    /// Number of products per category, in category order
    pub fn category_counts(&self) -> Vec<(ProductCategory, usize)> {
        ProductCategory::ALL
            .iter()
            .map(|c| (*c, self.products.iter().filter(|p| p.category == *c).count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_resolution() {
        let catalog = Catalog::mock();
        let product = &catalog.products[0];
        let pet = &catalog.pets[0];

        let listing = catalog.listing(ListingKind::Product, &product.id).unwrap();
        assert_eq!(listing.title(), product.name);
        assert_eq!(listing.category(), Some(product.category));

        let listing = catalog.find_listing(&pet.id).unwrap();
        assert_eq!(listing.kind(), ListingKind::Pet);
        assert_eq!(listing.max_quantity(), 1);

        assert!(matches!(
            catalog.listing(ListingKind::Pet, &product.id),
            Err(ProductError::PetNotFound(_))
        ));
    }

    #[test]
    fn test_set_stock_updates_availability() {
        let mut catalog = Catalog::mock();
        let id = catalog.products[0].id;

        catalog.set_stock(&id, 0).unwrap();
        assert!(!catalog.product(&id).unwrap().is_available());
        assert!(catalog.set_stock(&Uuid::new_v4(), 3).is_err());
    }

    #[test]
    fn test_category_counts_cover_all_products() {
        let catalog = Catalog::mock();
        let total: usize = catalog.category_counts().iter().map(|(_, n)| n).sum();
        assert_eq!(total, catalog.products.len());
    }
}
