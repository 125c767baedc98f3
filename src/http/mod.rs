//! HTTP surface of the server.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum setup, middleware, dispatch)
//!     → handlers.rs (resolve config by id, apply query overrides,
//!                    run the route behavior)
//!     → error.rs (map failures to HTTP responses)
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use request::{RequestId, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
