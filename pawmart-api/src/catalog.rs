use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use pawmart_catalog::{
    discount_percentage, format_cents, Page, Pet, PetQuery, Product, ProductCategory, ProductQuery,
};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: Product,
    price_display: String,
    discount_percentage: u8,
}

#[derive(Debug, Serialize)]
struct CategorySummary {
    category: ProductCategory,
    product_count: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", get(list_products))
        .route("/v1/products/{id}", get(get_product))
        .route("/v1/pets", get(list_pets))
        .route("/v1/pets/{id}", get(get_pet))
        .route("/v1/categories", get(list_categories))
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<Page<Product>> {
    let store = state.store.read().await;
    Json(store.catalog().search_products(&query))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDetail>, AppError> {
    let store = state.store.read().await;
    let product = store.catalog().product(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFoundError(format!("Product not found: {}", id)))?;

    Ok(Json(ProductDetail {
        price_display: format_cents(product.price_cents),
        discount_percentage: discount_percentage(product.price_cents, product.mrp_cents),
        product,
    }))
}

async fn list_pets(
    State(state): State<AppState>,
    Query(query): Query<PetQuery>,
) -> Json<Page<Pet>> {
    let store = state.store.read().await;
    Json(store.catalog().search_pets(&query))
}

async fn get_pet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pet>, AppError> {
    let store = state.store.read().await;
    store.catalog().pet(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Pet not found: {}", id)))
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    let counts = state.store.read().await.catalog().category_counts();
    Json(
        counts
            .into_iter()
            .map(|(category, product_count)| CategorySummary { category, product_count })
            .collect(),
    )
}
