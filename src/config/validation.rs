//! Configuration validation.
//!
//! Serde handles the syntactic half; these checks are semantic. Each
//! function is pure and collects every problem it finds rather than
//! stopping at the first, so an operator can fix a config file in one
//! round trip.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{Config, ServerSettings};

/// A single semantic problem in a config or settings file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("config id must not be empty")]
    EmptyId,

    #[error("config id {0:?} contains characters outside [A-Za-z0-9_-]")]
    InvalidId(String),

    #[error("config {0:?} declares no inputs")]
    NoInputs(String),

    #[error("config {id:?} declares input {input:?} more than once")]
    DuplicateInput { id: String, input: String },

    #[error("compile.command must not be empty")]
    EmptyCompileCommand,

    #[error("compile.max_concurrent must be at least 1")]
    ZeroConcurrency,

    #[error("compile.timeout_secs must be at least 1")]
    ZeroCompileTimeout,

    #[error("timeouts.request_secs must be at least 1")]
    ZeroRequestTimeout,

    #[error("listener.tls requires both cert_path and key_path to be non-empty")]
    IncompleteTls,

    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    BadMetricsAddress(String),
}

/// Validate one compilation config.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.id.is_empty() {
        errors.push(ValidationError::EmptyId);
    } else if !config
        .id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::InvalidId(config.id.clone()));
    }

    if config.inputs.is_empty() {
        errors.push(ValidationError::NoInputs(config.id.clone()));
    }

    let mut seen = HashSet::new();
    for input in &config.inputs {
        if !seen.insert(input) {
            errors.push(ValidationError::DuplicateInput {
                id: config.id.clone(),
                input: input.display().to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the server settings.
pub fn validate_settings(settings: &ServerSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.compile.command.is_empty() {
        errors.push(ValidationError::EmptyCompileCommand);
    }
    if settings.compile.max_concurrent == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    if settings.compile.timeout_secs == 0 {
        errors.push(ValidationError::ZeroCompileTimeout);
    }
    if settings.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if let Some(tls) = &settings.listener.tls {
        if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }

    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            settings.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
