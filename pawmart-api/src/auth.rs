use axum::{
    extract::State,
    http::HeaderMap,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use pawmart_core::identity::{NewProfile, OtpChallenge, Role, User};

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, optional_claims, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct GuestResponse {
    token: String,
    shopper_id: String,
}

#[derive(Debug, Deserialize)]
struct OtpRequest {
    phone: String,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    phone: String,
    code: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    token: String,
    user: User,
    is_new: bool,
}

#[derive(Debug, Deserialize)]
struct SwitchRoleRequest {
    role: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/v1/auth/switch-role", post(switch_role))
        .route("/v1/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware));

    Router::new()
        .route("/v1/auth/guest", post(login_guest))
        .route("/v1/auth/otp/request", post(request_otp))
        .route("/v1/auth/otp/verify", post(verify_otp))
        .merge(protected)
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<GuestResponse>, AppError> {
    let claims = SessionClaims::guest(&state.auth);
    let token = claims.encode(&state.auth)?;

    Ok(Json(GuestResponse { token, shopper_id: claims.sub }))
}

async fn request_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<OtpChallenge>, AppError> {
    let challenge = state.store.write().await.request_otp(&req.phone)?;
    Ok(Json(challenge))
}

/// Sign in or register. A guest token in the Authorization header carries
/// that guest's cart and wishlist over to the account.
async fn verify_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let guest = optional_claims(&state.auth, &headers)
        .filter(|c| c.is_guest())
        .map(|c| c.sub)
        .unwrap_or_default();
    let profile = req.name.map(|name| NewProfile { name, email: req.email });

    let sign_in = state.store.write().await.verify_otp(&guest, &req.phone, &req.code, profile)?;
    state.persist().await;

    let user = sign_in.user;
    info!("User {} signed in (new: {})", user.id, sign_in.is_new);
    let token = SessionClaims::new(&state.auth, user.id.to_string(), user.active_role.as_str(), Some(user.name.clone()))
        .encode(&state.auth)?;

    Ok(Json(SessionResponse { token, user, is_new: sign_in.is_new }))
}

async fn switch_role(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(req): Json<SwitchRoleRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let role = Role::parse(&req.role)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown role: {}", req.role)))?;
    let user_id = claims.user_id()
        .ok_or_else(|| AppError::AuthenticationError("Sign in to continue".to_string()))?;

    let user = state.store.write().await.switch_role(&user_id, role)?;
    state.persist().await;

    let token = SessionClaims::new(&state.auth, claims.sub, user.active_role.as_str(), Some(user.name.clone()))
        .encode(&state.auth)?;

    Ok(Json(SessionResponse { token, user, is_new: false }))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<User>, AppError> {
    let user_id = claims.user_id()
        .ok_or_else(|| AppError::AuthenticationError("Sign in to continue".to_string()))?;

    let store = state.store.read().await;
    let user = store.user(&user_id)
        .cloned()
        .ok_or_else(|| AppError::NotFoundError(format!("User not found: {}", user_id)))?;

    Ok(Json(user))
}
