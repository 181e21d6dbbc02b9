use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use pawmart_store::CartView;

use crate::error::AppError;
use crate::middleware::auth::{shopper_auth_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    listing_id: Uuid,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 { 1 }

#[derive(Debug, Deserialize)]
struct UpdateItemRequest {
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct PromoRequest {
    code: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/cart", get(get_cart).delete(clear_cart))
        .route("/v1/cart/items", post(add_item))
        .route("/v1/cart/items/{id}", put(update_item).delete(remove_item))
        .route("/v1/cart/promo", post(apply_promo).delete(remove_promo))
        .route_layer(middleware::from_fn_with_state(state, shopper_auth_middleware))
}

async fn get_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<CartView> {
    let store = state.store.read().await;
    Json(store.cart(&claims.sub))
}

async fn clear_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<CartView> {
    let view = state.store.write().await.clear_cart(&claims.sub);
    state.persist().await;
    Json(view)
}

async fn add_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>, AppError> {
    let view = state.store.write().await.add_to_cart(&claims.sub, &req.listing_id, req.quantity)?;
    state.persist().await;
    Ok(Json(view))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>, AppError> {
    let view = state.store.write().await.update_cart_item(&claims.sub, &listing_id, req.quantity)?;
    state.persist().await;
    Ok(Json(view))
}

async fn remove_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<CartView>, AppError> {
    let view = state.store.write().await.remove_cart_item(&claims.sub, &listing_id)?;
    state.persist().await;
    Ok(Json(view))
}

async fn apply_promo(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<PromoRequest>,
) -> Result<Json<CartView>, AppError> {
    let view = state.store.write().await.apply_promo(&claims.sub, &req.code)?;
    state.persist().await;
    Ok(Json(view))
}

async fn remove_promo(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<CartView> {
    let view = state.store.write().await.remove_promo(&claims.sub);
    state.persist().await;
    Json(view)
}
