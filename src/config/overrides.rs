//! Per-request config overrides.
//!
//! A request may redefine parts of a registered config through query
//! parameters. The derived copy shares the base config's id, which is why
//! the registry and caches key on ids rather than config values. The copy
//! is handed to the compiler for that one request and then dropped; it is
//! never registered and the base config is never touched.

use std::collections::HashMap;

use crate::config::schema::{CompileMode, Config};

/// Query parameters a request may use to redefine a config.
pub const OVERRIDE_PARAMS: &[&str] = &["mode", "pretty_print", "debug"];

/// Derive a transient config from `base` with query-driven fields replaced.
///
/// Pure: `base` is cloned, never mutated. Parameters outside
/// [`OVERRIDE_PARAMS`] and values that fail to parse are ignored.
pub fn derive_override(base: &Config, params: &HashMap<String, String>) -> Config {
    let mut derived = base.clone();

    if let Some(mode) = params.get("mode") {
        match mode.parse::<CompileMode>() {
            Ok(mode) => derived.mode = mode,
            Err(()) => {
                tracing::debug!(config_id = %base.id, value = %mode, "Ignoring unparseable mode override")
            }
        }
    }
    if let Some(value) = params.get("pretty_print") {
        if let Some(flag) = parse_flag(value) {
            derived.pretty_print = flag;
        }
    }
    if let Some(value) = params.get("debug") {
        if let Some(flag) = parse_flag(value) {
            derived.debug = flag;
        }
    }

    derived
}

/// True if any override parameter is present in the query.
pub fn has_overrides(params: &HashMap<String, String>) -> bool {
    OVERRIDE_PARAMS.iter().any(|p| params.contains_key(*p))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            id: "app".to_string(),
            inputs: vec!["main.js".into()],
            ..Config::default()
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_override_replaces_fields_and_keeps_id() {
        let base = base();
        let derived = derive_override(
            &base,
            &params(&[("mode", "advanced"), ("pretty_print", "1")]),
        );

        assert_eq!(derived.id, base.id);
        assert_eq!(derived.mode, CompileMode::Advanced);
        assert!(derived.pretty_print);
        assert_eq!(derived.inputs, base.inputs);
    }

    #[test]
    fn test_base_is_never_mutated() {
        let base = base();
        let before = base.clone();
        let _ = derive_override(&base, &params(&[("mode", "raw"), ("debug", "true")]));
        assert_eq!(base, before);
    }

    #[test]
    fn test_unknown_and_unparseable_params_ignored() {
        let base = base();
        let derived = derive_override(
            &base,
            &params(&[("mode", "warp-speed"), ("pretty_print", "maybe"), ("color", "red")]),
        );
        assert_eq!(derived, base);
    }

    #[test]
    fn test_has_overrides() {
        assert!(has_overrides(&params(&[("mode", "raw"), ("id", "app")])));
        assert!(!has_overrides(&params(&[("id", "app")])));
    }
}
