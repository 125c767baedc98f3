//! Compiler collaborator seam.
//!
//! The server never compiles anything itself. It hands a resolved
//! [`Config`](crate::config::schema::Config) to a [`Compiler`] and files the
//! byproducts of a successful run into the result cache. The production
//! implementation ([`command::CommandCompiler`]) shells out to a configured
//! external program; tests substitute their own.

pub mod command;
pub mod pool;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::Config;

pub use command::CommandCompiler;
pub use pool::{CompilePermit, CompilePool};

/// Everything a successful compilation produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compilation {
    /// The compiled output served to the caller.
    pub output: String,

    /// Source map for the output.
    #[serde(default)]
    pub source_map: String,

    /// Externs text describing the output's exported surface.
    #[serde(default)]
    pub externs: String,
}

/// One problem reported by the compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Input file the problem was found in, when known.
    #[serde(default)]
    pub input: Option<String>,

    /// Line number within the input, when known.
    #[serde(default)]
    pub line: Option<u32>,

    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// A diagnostic carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            input: None,
            line: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.input, self.line) {
            (Some(input), Some(line)) => write!(f, "{input}:{line}: {}", self.message),
            (Some(input), None) => write!(f, "{input}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Error type for compiler invocations.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler ran and rejected the inputs.
    #[error("compilation failed:\n{}", render(.0))]
    Failed(Vec<Diagnostic>),

    /// The compiler ran past its deadline and was stopped.
    #[error("compilation timed out after {0:?}")]
    Timeout(Duration),

    /// The compiler process could not be run.
    #[error("compiler process error: {0}")]
    Process(#[from] std::io::Error),

    /// The compiler exited cleanly but its results could not be understood.
    #[error("compiler produced malformed results: {0}")]
    Protocol(String),
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A source-to-output compiler.
///
/// `compile` may be slow and CPU-bound; callers run it on a blocking
/// worker and must not hold async resources across the call.
pub trait Compiler: Send + Sync + 'static {
    fn compile(&self, config: &Config) -> Result<Compilation, CompileError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_error_renders_diagnostics() {
        let err = CompileError::Failed(vec![
            Diagnostic {
                input: Some("main.js".to_string()),
                line: Some(12),
                message: "missing semicolon".to_string(),
            },
            Diagnostic::message("2 warnings suppressed"),
        ]);
        let rendered = err.to_string();
        assert!(rendered.contains("main.js:12: missing semicolon"));
        assert!(rendered.contains("2 warnings suppressed"));
    }
}
