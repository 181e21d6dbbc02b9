use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use pawmart_cart::Wishlist;
use pawmart_store::CartView;

use crate::error::AppError;
use crate::middleware::auth::{shopper_auth_middleware, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SaveRequest {
    listing_id: Uuid,
    /// Remove the listing if it is already saved
    #[serde(default)]
    toggle: bool,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    saved: bool,
    wishlist: Wishlist,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/wishlist", get(get_wishlist).post(save))
        .route("/v1/wishlist/{id}", delete(remove))
        .route("/v1/wishlist/{id}/move-to-cart", post(move_to_cart))
        .route_layer(middleware::from_fn_with_state(state, shopper_auth_middleware))
}

async fn get_wishlist(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<Wishlist> {
    let store = state.store.read().await;
    Json(store.wishlist(&claims.sub))
}

async fn save(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let (saved, wishlist) = {
        let mut store = state.store.write().await;
        let saved = if req.toggle {
            store.toggle_wishlist(&claims.sub, &req.listing_id)?
        } else {
            store.add_to_wishlist(&claims.sub, &req.listing_id)?;
            true
        };
        (saved, store.wishlist(&claims.sub))
    };
    state.persist().await;
    Ok(Json(SaveResponse { saved, wishlist }))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Wishlist>, AppError> {
    let wishlist = {
        let mut store = state.store.write().await;
        store.remove_from_wishlist(&claims.sub, &listing_id)?;
        store.wishlist(&claims.sub)
    };
    state.persist().await;
    Ok(Json(wishlist))
}

async fn move_to_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<CartView>, AppError> {
    let view = state.store.write().await.move_to_cart(&claims.sub, &listing_id)?;
    state.persist().await;
    Ok(Json(view))
}
