//! Configuration schema definitions.
//!
//! Two kinds of configuration live here: `Config`, describing one
//! compilation unit (one JSON file per CLI argument), and `ServerSettings`,
//! the server's own tunables (optional TOML file). All types derive Serde
//! traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A named, immutable description of one compilation unit.
///
/// The `id` is the sole key used by the registry and the result caches.
/// Fields beyond the ones the server interprets are collected into
/// `options` and passed through to the compiler untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Stable identifier, unique across all registered configs.
    pub id: String,

    /// Source files handed to the compiler, in order.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,

    /// Extern declaration files describing symbols defined elsewhere.
    #[serde(default)]
    pub externs: Vec<PathBuf>,

    /// Output mode for the compilation.
    #[serde(default)]
    pub mode: CompileMode,

    /// Format the compiled output for human readers.
    #[serde(default)]
    pub pretty_print: bool,

    /// Keep debug-friendly renaming in the output.
    #[serde(default)]
    pub debug: bool,

    /// Compiler-specific fields the server does not interpret.
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// How much work the compiler does on the way from inputs to output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Concatenate inputs without compiling.
    Raw,
    /// Strip whitespace and comments only.
    Whitespace,
    /// Standard optimizations, no symbol renaming across files.
    #[default]
    Simple,
    /// Aggressive whole-program optimization.
    Advanced,
}

impl FromStr for CompileMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(CompileMode::Raw),
            "whitespace" => Ok(CompileMode::Whitespace),
            "simple" => Ok(CompileMode::Simple),
            "advanced" => Ok(CompileMode::Advanced),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompileMode::Raw => "raw",
            CompileMode::Whitespace => "whitespace",
            CompileMode::Simple => "simple",
            CompileMode::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

/// Root settings for the server itself.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listener settings (bind address, port, TLS).
    pub listener: ListenerSettings,

    /// Compilation execution settings.
    pub compile: CompileSettings,

    /// Timeout settings for whole requests.
    pub timeouts: TimeoutSettings,

    /// Observability settings.
    pub observability: ObservabilitySettings,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerSettings {
    /// Address to listen on.
    pub listen: String,

    /// Port to listen on.
    pub port: u16,

    /// Optional TLS material; plain HTTP when absent.
    pub tls: Option<TlsSettings>,
}

impl ListenerSettings {
    /// The `address:port` string handed to the socket bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1".to_string(),
            port: 9810,
            tls: None,
        }
    }
}

/// TLS material for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsSettings {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Settings governing compiler invocations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileSettings {
    /// Program invoked to perform compilations.
    pub command: String,

    /// Arguments passed to the program before the config is written to
    /// its stdin.
    pub args: Vec<String>,

    /// Maximum compilations running at once; further requests wait.
    pub max_concurrent: usize,

    /// Hard limit on a single compiler run, in seconds.
    pub timeout_secs: u64,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            command: "closure-compiler".to_string(),
            args: Vec::new(),
            max_concurrent: 4,
            timeout_secs: 300,
        }
    }
}

/// Timeout settings for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Request timeout (total time for request/response) in seconds.
    /// Sized to outlast a full compiler run.
    pub request_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { request_secs: 330 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9811".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_json_collects_unknown_fields() {
        let raw = r#"{
            "id": "app",
            "inputs": ["src/main.js", "src/util.js"],
            "externs": ["externs/dom.js"],
            "mode": "advanced",
            "define": {"goog.DEBUG": false}
        }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.id, "app");
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.mode, CompileMode::Advanced);
        assert!(!config.pretty_print);
        assert!(config.options.contains_key("define"));
    }

    #[test]
    fn test_mode_parsing_is_case_insensitive() {
        assert_eq!("RAW".parse::<CompileMode>().unwrap(), CompileMode::Raw);
        assert_eq!("simple".parse::<CompileMode>().unwrap(), CompileMode::Simple);
        assert!("fastest".parse::<CompileMode>().is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.listener.bind_address(), "127.0.0.1:9810");
        assert!(settings.listener.tls.is_none());
        assert_eq!(settings.compile.max_concurrent, 4);
    }

    #[test]
    fn test_settings_from_partial_toml() {
        let raw = r#"
            [listener]
            port = 8000

            [compile]
            command = "/usr/local/bin/jsc"
            max_concurrent = 2
        "#;
        let settings: ServerSettings = toml::from_str(raw).unwrap();
        assert_eq!(settings.listener.port, 8000);
        assert_eq!(settings.listener.listen, "127.0.0.1");
        assert_eq!(settings.compile.command, "/usr/local/bin/jsc");
        assert_eq!(settings.compile.timeout_secs, 300);
    }
}
