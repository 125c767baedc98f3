//! Configuration loading from disk.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Config, ServerSettings};
use crate::config::validation::{validate_config, validate_settings, ValidationError};

/// Error type for loading the server settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

/// Error type for loading a compilation config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    let mut out = String::new();
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{err}");
    }
    out
}

/// Load and validate server settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<ServerSettings, SettingsError> {
    let content = fs::read_to_string(path)?;
    let settings: ServerSettings = toml::from_str(&content)?;
    validate_settings(&settings).map_err(SettingsError::Validation)?;
    Ok(settings)
}

/// Load and validate one compilation config from a JSON file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigFileError> {
    let content = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config).map_err(ConfigFileError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"id": "app", "inputs": ["main.js"], "mode": "whitespace"}}"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.id, "app");
        assert_eq!(
            config.mode,
            crate::config::schema::CompileMode::Whitespace
        );
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse(_)));
    }

    #[test]
    fn test_invalid_config_lists_every_problem() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"id": ""}}"#).unwrap();

        let err = load_config_file(file.path()).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("id must not be empty"));
        assert!(rendered.contains("declares no inputs"));
    }

    #[test]
    fn test_missing_settings_file_is_io_error() {
        let err = load_settings(Path::new("/nonexistent/settings.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
