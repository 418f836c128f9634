//! Web API module for Filebox.
//!
//! REST endpoints for file storage, password login, the OpenAPI document
//! and the static browser client.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use middleware::{JwtState, LoginRateLimiter};
pub use router::create_router;
pub use server::WebServer;
