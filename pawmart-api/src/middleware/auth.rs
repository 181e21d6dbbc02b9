use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::{HeaderMap, StatusCode},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use pawmart_core::identity::Role;
use pawmart_store::{guest_shopper_id, user_id_of};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

pub const GUEST_ROLE: &str = "GUEST";

// ============================================================================
// JWT Claims
// ============================================================================

/// Session token for guests and signed-in users.
///
/// `sub` is the shopper id and `role` the role the session acts as.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub role: String,
    pub name: Option<String>,
    pub exp: usize,
}

impl SessionClaims {
    pub fn guest(auth: &AuthConfig) -> Self {
        Self::new(auth, guest_shopper_id(), GUEST_ROLE, None)
    }

    pub fn new(auth: &AuthConfig, sub: String, role: &str, name: Option<String>) -> Self {
        Self {
            sub,
            role: role.to_owned(),
            name,
            exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.role == GUEST_ROLE
    }

    pub fn acts_as(&self, role: Role) -> bool {
        self.role == role.as_str()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        user_id_of(&self.sub)
    }

    pub fn encode(&self, auth: &AuthConfig) -> Result<String, AppError> {
        encode(&Header::default(), self, &EncodingKey::from_secret(auth.secret.as_bytes()))
            .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
    }
}

fn bearer_claims(auth: &AuthConfig, headers: &HeaderMap) -> Result<SessionClaims, StatusCode> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Claims from an Authorization header if one is present and valid
pub fn optional_claims(auth: &AuthConfig, headers: &HeaderMap) -> Option<SessionClaims> {
    bearer_claims(auth, headers).ok()
}

async fn authorize(
    state: &AppState,
    mut req: Request,
    next: Next,
    allowed: impl Fn(&SessionClaims) -> bool,
) -> Result<Response, StatusCode> {
    let claims = bearer_claims(&state.auth, req.headers())?;

    if !allowed(&claims) {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Middleware
// ============================================================================

/// Any session, guest included
pub async fn shopper_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    authorize(&state, req, next, |_| true).await
}

/// Signed-in users only
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    authorize(&state, req, next, |c| !c.is_guest() && c.user_id().is_some()).await
}

pub async fn seller_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    authorize(&state, req, next, |c| c.acts_as(Role::Seller) || c.acts_as(Role::Admin)).await
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    authorize(&state, req, next, |c| c.acts_as(Role::Admin)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 60,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let auth = config();
        let claims = SessionClaims::guest(&auth);
        let token = claims.encode(&auth).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());

        let decoded = optional_claims(&auth, &headers).unwrap();
        assert!(decoded.is_guest());
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.user_id(), None);
    }

    #[test]
    fn test_role_checks_use_role_names() {
        let auth = config();
        let seller = SessionClaims::new(&auth, Uuid::new_v4().to_string(), Role::Seller.as_str(), None);
        assert!(seller.acts_as(Role::Seller));
        assert!(!seller.acts_as(Role::Admin));
        assert!(!seller.is_guest());
        assert!(!SessionClaims::guest(&auth).acts_as(Role::Customer));
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = SessionClaims::guest(&config()).encode(&config()).unwrap();
        let other = AuthConfig {
            secret: "another-secret".to_string(),
            expiration: 60,
        };

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        assert!(optional_claims(&other, &headers).is_none());
    }
}
