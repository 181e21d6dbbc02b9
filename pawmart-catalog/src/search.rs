use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::product::{Catalog, Gender, Pet, PetKind, Product, ProductCategory};

const DEFAULT_PER_PAGE: usize = 20;
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Featured,
    PriceLowToHigh,
    PriceHighToLow,
    Rating,
    Newest,
    NameAsc,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PetSort {
    #[default]
    Newest,
    PriceLowToHigh,
    PriceHighToLow,
    AgeYoungest,
}

/// Product listing filters; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<ProductCategory>,
    pub pet_kind: Option<PetKind>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub min_rating: Option<f32>,
    pub in_stock_only: bool,
    pub sort: ProductSort,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PetQuery {
    pub species: Option<PetKind>,
    pub breed: Option<String>,
    pub max_age_months: Option<u32>,
    pub gender: Option<Gender>,
    pub max_price_cents: Option<i64>,
    pub vaccinated_only: bool,
    pub available_only: bool,
    pub sort: PetSort,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl Default for PetQuery {
    fn default() -> Self {
        Self {
            species: None,
            breed: None,
            max_age_months: None,
            gender: None,
            max_price_cents: None,
            vaccinated_only: false,
            available_only: true,
            sort: PetSort::default(),
            page: None,
            per_page: None,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    fn paginate(all: Vec<T>, page: Option<usize>, per_page: Option<usize>) -> Self {
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page = page.unwrap_or(1).max(1);
        let total = all.len();
        let total_pages = total.div_ceil(per_page);
        let items = all
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Self { items, total, page, per_page, total_pages }
    }
}

fn matches_text(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.brand.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

impl Catalog {
    /// Filter, sort and paginate products
    pub fn search_products(&self, query: &ProductQuery) -> Page<Product> {
        let needle = query
            .q
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matched: Vec<Product> = self
            .products
            .iter()
            .filter(|p| needle.as_deref().map_or(true, |n| matches_text(p, n)))
            .filter(|p| query.category.map_or(true, |c| p.category == c))
            .filter(|p| query.pet_kind.map_or(true, |k| p.pet_kind == k))
            .filter(|p| query.min_price_cents.map_or(true, |min| p.price_cents >= min))
            .filter(|p| query.max_price_cents.map_or(true, |max| p.price_cents <= max))
            .filter(|p| query.min_rating.map_or(true, |r| p.rating >= r))
            .filter(|p| !query.in_stock_only || p.stock > 0)
            .cloned()
            .collect();

        match query.sort {
            ProductSort::Featured => matched.sort_by(|a, b| {
                b.is_featured
                    .cmp(&a.is_featured)
                    .then_with(|| cmp_f32_desc(a.rating, b.rating))
            }),
            ProductSort::PriceLowToHigh => matched.sort_by_key(|p| p.price_cents),
            ProductSort::PriceHighToLow => matched.sort_by(|a, b| b.price_cents.cmp(&a.price_cents)),
            ProductSort::Rating => matched.sort_by(|a, b| {
                cmp_f32_desc(a.rating, b.rating).then_with(|| b.review_count.cmp(&a.review_count))
            }),
            ProductSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::NameAsc => matched.sort_by_key(|p| p.name.to_lowercase()),
        }

        Page::paginate(matched, query.page, query.per_page)
    }

    /// Filter, sort and paginate pets
    pub fn search_pets(&self, query: &PetQuery) -> Page<Pet> {
        let breed = query
            .breed
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matched: Vec<Pet> = self
            .pets
            .iter()
            .filter(|p| query.species.map_or(true, |s| p.species == s))
            .filter(|p| breed.as_deref().map_or(true, |b| p.breed.to_lowercase().contains(b)))
            .filter(|p| query.max_age_months.map_or(true, |max| p.age_months <= max))
            .filter(|p| query.gender.map_or(true, |g| p.gender == g))
            .filter(|p| query.max_price_cents.map_or(true, |max| p.price_cents <= max))
            .filter(|p| !query.vaccinated_only || p.vaccinated)
            .filter(|p| !query.available_only || p.is_available)
            .cloned()
            .collect();

        match query.sort {
            PetSort::Newest => matched.sort_by(|a, b| b.listed_at.cmp(&a.listed_at)),
            PetSort::PriceLowToHigh => matched.sort_by_key(|p| p.price_cents),
            PetSort::PriceHighToLow => matched.sort_by(|a, b| b.price_cents.cmp(&a.price_cents)),
            PetSort::AgeYoungest => matched.sort_by_key(|p| p.age_months),
        }

        Page::paginate(matched, query.page, query.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_search_is_case_insensitive() {
        let catalog = Catalog::mock();
        let page = catalog.search_products(&ProductQuery {
            q: Some("  SALMON ".to_string()),
            ..Default::default()
        });
        assert_eq!(page.total, 1);
        assert!(page.items[0].name.contains("Salmon"));
    }

    #[test]
    fn test_category_and_price_filters() {
        let catalog = Catalog::mock();
        let page = catalog.search_products(&ProductQuery {
            category: Some(ProductCategory::Food),
            pet_kind: Some(PetKind::Dog),
            max_price_cents: Some(3000),
            ..Default::default()
        });
        assert!(page.total >= 1);
        assert!(page.items.iter().all(|p| p.category == ProductCategory::Food
            && p.pet_kind == PetKind::Dog
            && p.price_cents <= 3000));
    }

    #[test]
    fn test_in_stock_only_hides_sold_out() {
        let catalog = Catalog::mock();
        let all = catalog.search_products(&ProductQuery::default());
        let in_stock = catalog.search_products(&ProductQuery {
            in_stock_only: true,
            ..Default::default()
        });
        assert!(in_stock.total < all.total);
        assert!(in_stock.items.iter().all(|p| p.stock > 0));
    }

    #[test]
    fn test_price_sorting() {
        let catalog = Catalog::mock();
        let page = catalog.search_products(&ProductQuery {
            sort: ProductSort::PriceLowToHigh,
            per_page: Some(100),
            ..Default::default()
        });
        let prices: Vec<i64> = page.items.iter().map(|p| p.price_cents).collect();
        let mut sorted = prices.clone();
        sorted.sort();
        assert_eq!(prices, sorted);
    }

    #[test]
    fn test_featured_first() {
        let catalog = Catalog::mock();
        let page = catalog.search_products(&ProductQuery::default());
        let first_non_featured = page.items.iter().position(|p| !p.is_featured).unwrap();
        assert!(page.items[first_non_featured..].iter().all(|p| !p.is_featured));
    }

    #[test]
    fn test_pagination_clamps() {
        let catalog = Catalog::mock();
        let page = catalog.search_products(&ProductQuery {
            page: Some(2),
            per_page: Some(5),
            ..Default::default()
        });
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, catalog.products.len().div_ceil(5));

        let page = catalog.search_products(&ProductQuery {
            page: Some(0),
            per_page: Some(0),
            ..Default::default()
        });
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
    }

    #[test]
    fn test_pet_filters() {
        let mut catalog = Catalog::mock();
        let page = catalog.search_pets(&PetQuery {
            species: Some(PetKind::Dog),
            vaccinated_only: true,
            sort: PetSort::AgeYoungest,
            ..Default::default()
        });
        assert_eq!(page.total, 2);
        assert!(page.items[0].age_months <= page.items[1].age_months);

        let bruno = catalog.pets[0].id;
        catalog.set_pet_available(&bruno, false).unwrap();
        let page = catalog.search_pets(&PetQuery {
            breed: Some("retriever".to_string()),
            ..Default::default()
        });
        assert_eq!(page.total, 0);
    }
}
