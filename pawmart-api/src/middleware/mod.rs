pub mod auth;

pub use auth::{
    admin_auth_middleware, customer_auth_middleware, seller_auth_middleware, shopper_auth_middleware,
    SessionClaims,
};
