use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::product::{Catalog, Gender, Pet, PetKind, Product, ProductCategory};

const PRODUCT_NAMESPACE: u128 = 0x5041_574d_0000_4000_8000_0000_0000_0000;
const PET_NAMESPACE: u128 = 0x5041_574d_0000_4000_8000_0001_0000_0000;

/// Stable id for the n-th mock product, so saved carts survive restarts
pub fn product_id(n: u32) -> Uuid {
    Uuid::from_u128(PRODUCT_NAMESPACE | n as u128)
}

pub fn pet_id(n: u32) -> Uuid {
    Uuid::from_u128(PET_NAMESPACE | n as u128)
}

fn catalog_epoch() -> DateTime<Utc> {
    // 2025-01-01T00:00:00Z
    DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}

struct ProductSeed {
    sku: &'static str,
    name: &'static str,
    description: &'static str,
    category: ProductCategory,
    pet_kind: PetKind,
    brand: &'static str,
    price_cents: i64,
    mrp_cents: Option<i64>,
    rating: f32,
    review_count: u32,
    stock: u32,
    is_featured: bool,
    tags: &'static [&'static str],
}

const PRODUCTS: &[ProductSeed] = &[
    ProductSeed {
        sku: "DOG-FOOD-CHK-10",
        name: "Grain-Free Chicken Kibble 10lb",
        description: "High-protein dry food with real chicken as the first ingredient.",
        category: ProductCategory::Food,
        pet_kind: PetKind::Dog,
        brand: "Wholesome Paws",
        price_cents: 3499,
        mrp_cents: Some(4299),
        rating: 4.7,
        review_count: 1284,
        stock: 40,
        is_featured: true,
        tags: &["grain-free", "adult", "chicken"],
    },
    ProductSeed {
        sku: "DOG-FOOD-PUP-5",
        name: "Puppy Starter Lamb & Rice 5lb",
        description: "Gentle formula with DHA for growing puppies.",
        category: ProductCategory::Food,
        pet_kind: PetKind::Dog,
        brand: "Wholesome Paws",
        price_cents: 1999,
        mrp_cents: None,
        rating: 4.5,
        review_count: 412,
        stock: 25,
        is_featured: false,
        tags: &["puppy", "lamb"],
    },
    ProductSeed {
        sku: "CAT-FOOD-SAL-6",
        name: "Wild Salmon Pâté 12-Pack",
        description: "Wet food pâté made with wild-caught salmon.",
        category: ProductCategory::Food,
        pet_kind: PetKind::Cat,
        brand: "Feline Fine",
        price_cents: 2199,
        mrp_cents: Some(2599),
        rating: 4.6,
        review_count: 903,
        stock: 30,
        is_featured: true,
        tags: &["wet food", "salmon"],
    },
    ProductSeed {
        sku: "DOG-TRT-JERKY",
        name: "Beef Jerky Training Treats",
        description: "Soft, bite-sized jerky treats for training sessions.",
        category: ProductCategory::Treats,
        pet_kind: PetKind::Dog,
        brand: "Good Boy Co",
        price_cents: 899,
        mrp_cents: Some(1099),
        rating: 4.8,
        review_count: 2210,
        stock: 60,
        is_featured: true,
        tags: &["training", "beef"],
    },
    ProductSeed {
        sku: "CAT-TRT-TUNA",
        name: "Crunchy Tuna Cat Treats",
        description: "Crunchy outside, soft inside tuna treats.",
        category: ProductCategory::Treats,
        pet_kind: PetKind::Cat,
        brand: "Feline Fine",
        price_cents: 499,
        mrp_cents: None,
        rating: 4.4,
        review_count: 655,
        stock: 80,
        is_featured: false,
        tags: &["tuna", "crunchy"],
    },
    ProductSeed {
        sku: "DOG-TOY-ROPE",
        name: "Tug-of-War Rope Toy",
        description: "Braided cotton rope for tugging and dental health.",
        category: ProductCategory::Toys,
        pet_kind: PetKind::Dog,
        brand: "PlayPup",
        price_cents: 1299,
        mrp_cents: None,
        rating: 4.3,
        review_count: 388,
        stock: 35,
        is_featured: false,
        tags: &["rope", "dental"],
    },
    ProductSeed {
        sku: "CAT-TOY-WAND",
        name: "Feather Wand Teaser",
        description: "Interactive wand with replaceable feather attachments.",
        category: ProductCategory::Toys,
        pet_kind: PetKind::Cat,
        brand: "Whisker Works",
        price_cents: 799,
        mrp_cents: Some(999),
        rating: 4.6,
        review_count: 742,
        stock: 50,
        is_featured: true,
        tags: &["interactive", "feather"],
    },
    ProductSeed {
        sku: "DOG-ACC-HARNESS",
        name: "No-Pull Padded Harness",
        description: "Adjustable harness with front and back leash clips.",
        category: ProductCategory::Accessories,
        pet_kind: PetKind::Dog,
        brand: "TrailTails",
        price_cents: 2899,
        mrp_cents: Some(3499),
        rating: 4.5,
        review_count: 519,
        stock: 18,
        is_featured: false,
        tags: &["walking", "harness"],
    },
    ProductSeed {
        sku: "CAT-ACC-LITTER",
        name: "Self-Cleaning Litter Box",
        description: "Automatic rake system with odor-sealed waste drawer.",
        category: ProductCategory::Accessories,
        pet_kind: PetKind::Cat,
        brand: "Whisker Works",
        price_cents: 14999,
        mrp_cents: Some(17999),
        rating: 4.1,
        review_count: 233,
        stock: 6,
        is_featured: true,
        tags: &["litter", "automatic"],
    },
    ProductSeed {
        sku: "DOG-HLT-FLEA",
        name: "Flea & Tick Chewables (3 Month)",
        description: "Vet-formulated monthly chewables for dogs 20-40lb.",
        category: ProductCategory::Health,
        pet_kind: PetKind::Dog,
        brand: "VetShield",
        price_cents: 4599,
        mrp_cents: None,
        rating: 4.7,
        review_count: 1006,
        stock: 22,
        is_featured: false,
        tags: &["flea", "tick", "chewable"],
    },
    ProductSeed {
        sku: "CAT-HLT-HAIRBALL",
        name: "Hairball Relief Gel",
        description: "Malt-flavored gel that helps pass hairballs.",
        category: ProductCategory::Health,
        pet_kind: PetKind::Cat,
        brand: "VetShield",
        price_cents: 1149,
        mrp_cents: None,
        rating: 4.2,
        review_count: 187,
        stock: 0,
        is_featured: false,
        tags: &["hairball"],
    },
    ProductSeed {
        sku: "DOG-GRM-SHAMPOO",
        name: "Oatmeal Sensitive Skin Shampoo",
        description: "Soap-free oatmeal shampoo for itchy skin.",
        category: ProductCategory::Grooming,
        pet_kind: PetKind::Dog,
        brand: "Fresh Coat",
        price_cents: 1399,
        mrp_cents: Some(1599),
        rating: 4.4,
        review_count: 301,
        stock: 28,
        is_featured: false,
        tags: &["shampoo", "oatmeal"],
    },
    ProductSeed {
        sku: "CAT-GRM-BRUSH",
        name: "Self-Cleaning Slicker Brush",
        description: "Retractable bristles release collected fur in one click.",
        category: ProductCategory::Grooming,
        pet_kind: PetKind::Cat,
        brand: "Fresh Coat",
        price_cents: 1599,
        mrp_cents: None,
        rating: 4.6,
        review_count: 452,
        stock: 20,
        is_featured: false,
        tags: &["brush", "shedding"],
    },
    ProductSeed {
        sku: "DOG-BED-ORTHO",
        name: "Orthopedic Memory Foam Bed (L)",
        description: "Memory foam bed with washable cover for large dogs.",
        category: ProductCategory::Bedding,
        pet_kind: PetKind::Dog,
        brand: "SnoozeDen",
        price_cents: 7999,
        mrp_cents: Some(9999),
        rating: 4.8,
        review_count: 667,
        stock: 9,
        is_featured: true,
        tags: &["orthopedic", "large"],
    },
    ProductSeed {
        sku: "BRD-FOOD-SEED",
        name: "Premium Parakeet Seed Mix",
        description: "Millet-based seed blend fortified with vitamins.",
        category: ProductCategory::Food,
        pet_kind: PetKind::Bird,
        brand: "SkyFeather",
        price_cents: 1049,
        mrp_cents: None,
        rating: 4.3,
        review_count: 98,
        stock: 45,
        is_featured: false,
        tags: &["seed", "parakeet"],
    },
    ProductSeed {
        sku: "FSH-AQU-FILTER",
        name: "Quiet Flow Aquarium Filter 20gal",
        description: "Three-stage filtration for tanks up to 20 gallons.",
        category: ProductCategory::Aquarium,
        pet_kind: PetKind::Fish,
        brand: "ClearWater",
        price_cents: 3299,
        mrp_cents: Some(3799),
        rating: 4.2,
        review_count: 164,
        stock: 12,
        is_featured: false,
        tags: &["filter", "freshwater"],
    },
    ProductSeed {
        sku: "SML-BED-HIDE",
        name: "Hamster Hideout Hut",
        description: "Chew-safe wooden hideout for hamsters and gerbils.",
        category: ProductCategory::Bedding,
        pet_kind: PetKind::SmallPet,
        brand: "TinyHaven",
        price_cents: 699,
        mrp_cents: None,
        rating: 4.5,
        review_count: 76,
        stock: 33,
        is_featured: false,
        tags: &["hamster", "wood"],
    },
];

struct PetSeed {
    name: &'static str,
    species: PetKind,
    breed: &'static str,
    age_months: u32,
    gender: Gender,
    price_cents: i64,
    vaccinated: bool,
    description: &'static str,
    location: &'static str,
}

const PETS: &[PetSeed] = &[
    PetSeed {
        name: "Bruno",
        species: PetKind::Dog,
        breed: "Golden Retriever",
        age_months: 3,
        gender: Gender::Male,
        price_cents: 85000,
        vaccinated: true,
        description: "Playful retriever puppy, great with kids.",
        location: "Austin, TX",
    },
    PetSeed {
        name: "Luna",
        species: PetKind::Cat,
        breed: "Siamese",
        age_months: 8,
        gender: Gender::Female,
        price_cents: 45000,
        vaccinated: true,
        description: "Vocal and affectionate, litter trained.",
        location: "Portland, OR",
    },
    PetSeed {
        name: "Max",
        species: PetKind::Dog,
        breed: "Beagle",
        age_months: 14,
        gender: Gender::Male,
        price_cents: 60000,
        vaccinated: true,
        description: "Curious beagle who loves long walks.",
        location: "Denver, CO",
    },
    PetSeed {
        name: "Mochi",
        species: PetKind::Cat,
        breed: "Scottish Fold",
        age_months: 4,
        gender: Gender::Female,
        price_cents: 120000,
        vaccinated: false,
        description: "Calm kitten, first vaccination scheduled.",
        location: "Seattle, WA",
    },
    PetSeed {
        name: "Kiwi",
        species: PetKind::Bird,
        breed: "Budgerigar",
        age_months: 6,
        gender: Gender::Male,
        price_cents: 4500,
        vaccinated: false,
        description: "Hand-tamed budgie that already whistles a tune.",
        location: "Phoenix, AZ",
    },
    PetSeed {
        name: "Nemo",
        species: PetKind::Fish,
        breed: "Ocellaris Clownfish",
        age_months: 5,
        gender: Gender::Male,
        price_cents: 3500,
        vaccinated: false,
        description: "Captive-bred clownfish, reef safe.",
        location: "San Diego, CA",
    },
    PetSeed {
        name: "Pebble",
        species: PetKind::SmallPet,
        breed: "Syrian Hamster",
        age_months: 2,
        gender: Gender::Female,
        price_cents: 2500,
        vaccinated: false,
        description: "Gentle and easy to handle.",
        location: "Columbus, OH",
    },
    PetSeed {
        name: "Rocky",
        species: PetKind::Reptile,
        breed: "Leopard Gecko",
        age_months: 10,
        gender: Gender::Male,
        price_cents: 9000,
        vaccinated: false,
        description: "Docile gecko, eats crickets and mealworms.",
        location: "Tampa, FL",
    },
];

impl Catalog {
    /// Statically defined storefront catalog
    pub fn mock() -> Self {
        let epoch = catalog_epoch();

        let products = PRODUCTS
            .iter()
            .enumerate()
            .map(|(i, seed)| Product {
                id: product_id(i as u32 + 1),
                sku: seed.sku.to_string(),
                name: seed.name.to_string(),
                description: seed.description.to_string(),
                category: seed.category,
                pet_kind: seed.pet_kind,
                brand: seed.brand.to_string(),
                price_cents: seed.price_cents,
                mrp_cents: seed.mrp_cents,
                rating: seed.rating,
                review_count: seed.review_count,
                stock: seed.stock,
                is_featured: seed.is_featured,
                tags: seed.tags.iter().map(|t| t.to_string()).collect(),
                attributes: json!({}),
                created_at: epoch + Duration::days(i as i64 * 7),
            })
            .collect();

        let pets = PETS
            .iter()
            .enumerate()
            .map(|(i, seed)| Pet {
                id: pet_id(i as u32 + 1),
                name: seed.name.to_string(),
                species: seed.species,
                breed: seed.breed.to_string(),
                age_months: seed.age_months,
                gender: seed.gender,
                price_cents: seed.price_cents,
                vaccinated: seed.vaccinated,
                description: seed.description.to_string(),
                location: seed.location.to_string(),
                is_available: true,
                listed_at: epoch + Duration::days(i as i64 * 3),
            })
            .collect();

        Catalog::new(products, pets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mock_ids_are_stable_and_unique() {
        let a = Catalog::mock();
        let b = Catalog::mock();
        assert_eq!(a.products[3].id, b.products[3].id);

        let ids: HashSet<Uuid> = a.products.iter().map(|p| p.id)
            .chain(a.pets.iter().map(|p| p.id))
            .collect();
        assert_eq!(ids.len(), a.products.len() + a.pets.len());
    }

    #[test]
    fn test_mock_sizes() {
        let catalog = Catalog::mock();
        assert!(catalog.products.len() >= 12);
        assert!(catalog.pets.len() >= 6);
        assert_eq!(catalog.products[0].id, product_id(1));
    }
}
