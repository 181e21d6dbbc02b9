use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use pawmart_order::Order;

use crate::error::AppError;
use crate::middleware::auth::{admin_auth_middleware, seller_auth_middleware};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct StockResponse {
    pub product_id: Uuid,
    pub stock: u32,
}

/// Seller routes (sellers and admins)
pub fn seller_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/seller/products/{id}/stock", put(set_stock))
        .route_layer(middleware::from_fn_with_state(state, seller_auth_middleware))
}

pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/orders", get(list_all_orders))
        .route("/v1/admin/orders/{id}/advance", post(advance_order))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

async fn set_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<StockRequest>,
) -> Result<Json<StockResponse>, AppError> {
    let stock = state.store.write().await.set_stock(&product_id, req.quantity)?;
    state.persist().await;
    Ok(Json(StockResponse { product_id, stock }))
}

async fn list_all_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    let store = state.store.read().await;
    Json(store.all_orders())
}

async fn advance_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.write().await.advance_order(&order_id)?;
    state.persist().await;
    Ok(Json(order))
}
