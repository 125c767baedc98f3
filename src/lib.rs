//! Compilation coordination server library.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;

pub use cache::ResultCache;
pub use compiler::{Compilation, Compiler};
pub use config::schema::{Config, ServerSettings};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::ConfigRegistry;
