use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use pawmart_cart::CartError;
use pawmart_catalog::InventoryError;
use pawmart_core::identity::AuthError;
use pawmart_order::{FulfillmentError, OrderError};
use pawmart_store::StoreError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    /// Request was understood but needs more input (e.g. a profile to register)
    Unprocessable(String),
    NotFoundError(String),
    ConflictError(String),
    RateLimited(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let msg = err.to_string();
        match err {
            StoreError::ListingNotFound(_) | StoreError::NotInWishlist(_) => AppError::NotFoundError(msg),
            StoreError::AuthenticationRequired => AppError::AuthenticationError(msg),
            StoreError::Catalog(_) => AppError::NotFoundError(msg),
            StoreError::Inventory(e) => match e {
                InventoryError::NotFound(_) => AppError::NotFoundError(msg),
                _ => AppError::ConflictError(msg),
            },
            StoreError::Cart(e) => match e {
                CartError::LineNotFound(_) => AppError::NotFoundError(msg),
                CartError::InvalidQuantity(_) | CartError::Empty => AppError::ValidationError(msg),
                CartError::Unavailable(_) | CartError::AlreadyInCart(_) | CartError::QuantityExceeded { .. } => {
                    AppError::ConflictError(msg)
                }
            },
            StoreError::Promo(_) | StoreError::Chat(_) => AppError::ValidationError(msg),
            StoreError::Order(e) => match e {
                OrderError::NotFound(_) => AppError::NotFoundError(msg),
                OrderError::EmptyOrder => AppError::ValidationError(msg),
                OrderError::InvalidTransition { .. }
                | OrderError::AlreadyFinal(_)
                | OrderError::Fulfillment(FulfillmentError::AlreadyShipped(_))
                | OrderError::Fulfillment(FulfillmentError::AlreadyDelivered(_)) => AppError::ConflictError(msg),
                OrderError::Fulfillment(FulfillmentError::NotFound(_)) => AppError::InternalServerError(msg),
            },
            StoreError::Auth(e) => match e {
                AuthError::Invalid(_) => AppError::ValidationError(msg),
                AuthError::CooldownActive { .. } => AppError::RateLimited(msg),
                AuthError::NoActiveChallenge
                | AuthError::ChallengeExpired
                | AuthError::InvalidCode { .. }
                | AuthError::TooManyAttempts => AppError::AuthenticationError(msg),
                AuthError::ProfileRequired => AppError::Unprocessable(msg),
                AuthError::UserNotFound(_) => AppError::NotFoundError(msg),
                AuthError::RoleNotGranted(_) => AppError::AuthorizationError(msg),
            },
            StoreError::Invalid(_) => AppError::ValidationError(msg),
            StoreError::Persistence(_) => AppError::InternalServerError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawmart_catalog::ProductError;
    use pawmart_core::validation::FieldError;
    use pawmart_core::CoreError;
    use pawmart_order::OrderStatus;
    use uuid::Uuid;

    fn status_of(err: StoreError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_store_errors_map_to_statuses() {
        assert_eq!(status_of(StoreError::Catalog(ProductError::PetNotFound(Uuid::nil()))), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(StoreError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(StoreError::Invalid(CoreError::InvalidFields(vec![FieldError::new("phone", "is required")]))),
            StatusCode::BAD_REQUEST
        );
    }
}
