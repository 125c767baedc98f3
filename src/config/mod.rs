//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerSettings (validated, immutable)
//!
//! compilation config files (JSON, one per CLI argument)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config → registered in ConfigRegistry before the server listens
//!
//! per-request query parameters
//!     → overrides.rs (derive a transient copy, never registered)
//! ```
//!
//! # Design Decisions
//! - Registered configs are immutable; a request can only derive a
//!   transient copy
//! - All server settings have defaults so the settings file is optional
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every problem, not just the first

pub mod loader;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use schema::{CompileMode, Config, ServerSettings};
