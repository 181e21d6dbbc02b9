use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use pawmart_core::payment::PaymentMethod;
use pawmart_order::{Order, ShippingAddress};
use pawmart_store::settle_order;

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, SessionClaims};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/checkout", post(checkout))
        .route("/v1/orders", get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/cancel", post(cancel_order))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

/// Place a pending order; payment is simulated in the background and the
/// order moves to confirmed (or cancelled) once it settles
async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.store.write().await.begin_checkout(&claims.sub, &req.shipping_address, req.payment_method)?;
    state.persist().await;
    info!("Checkout started for order {}", order.order_number);

    let task_state = state.clone();
    let order_id = order.id;
    tokio::spawn(async move {
        match settle_order(&task_state.store, &task_state.checkout, order_id).await {
            Ok(order) => info!("Order {} settled as {}", order.order_number, order.status),
            Err(e) => warn!("Settlement failed for order {}: {}", order_id, e),
        }
        task_state.persist().await;
    });

    Ok((StatusCode::ACCEPTED, Json(order)))
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<Vec<Order>> {
    let store = state.store.read().await;
    Json(store.orders_for(&claims.sub))
}

async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.read().await.order_for(&claims.sub, &order_id)?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state.store.write().await.cancel_order(
        &claims.sub,
        &order_id,
        Some("Cancelled by customer".to_string()),
    )?;
    state.persist().await;
    Ok(Json(order))
}
