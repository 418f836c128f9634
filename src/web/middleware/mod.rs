//! Middleware for Web API.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{bearer_token, jwt_auth, AuthUser, JwtClaims, JwtState, TOKEN_SUBJECT};
pub use cors::create_cors_layer;
pub use rate_limit::{login_rate_limit, LoginRateLimiter};
