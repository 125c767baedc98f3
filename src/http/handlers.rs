//! Route handlers.
//!
//! Every route resolves its config the same way: look up the base config
//! by the `id` query parameter, then derive a transient copy if override
//! parameters are present. Only `/compile` touches the compiler and the
//! result cache; the introspection routes read straight from the resolved
//! config.

use axum::extract::{Extension, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;

use crate::compiler::CompileError;
use crate::config::overrides;
use crate::config::schema::Config;
use crate::http::error::ApiError;
use crate::http::request::RequestId;
use crate::http::server::AppState;
use crate::observability::metrics;

const JS_CONTENT_TYPE: &str = "application/javascript";

fn resolve_config(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<Config, ApiError> {
    let id = params.get("id").ok_or(ApiError::MissingParam("id"))?;
    let base = state
        .registry
        .get(id)
        .ok_or_else(|| ApiError::UnknownConfig(id.clone()))?;

    if overrides::has_overrides(params) {
        Ok(overrides::derive_override(&base, params))
    } else {
        Ok(base)
    }
}

/// `/compile`: run the compiler for the resolved config, file the
/// byproducts into the cache and return the compiled output.
pub async fn compile(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let config = resolve_config(&state, &params)?;
    let id = config.id.clone();

    tracing::info!(
        request_id = %request_id,
        config_id = %id,
        mode = %config.mode,
        "Compilation requested"
    );

    // The permit travels into the blocking task: the slot frees when the
    // compiler actually finishes, not when this handler returns.
    let slot = state.pool.acquire().await;
    let compiler = state.compiler.clone();
    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        let _slot = slot;
        compiler.compile(&config)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("compile task aborted: {e}")))?;

    match result {
        Ok(compilation) => {
            state.cache.record_source_map(&id, compilation.source_map);
            state.cache.record_externs(&id, compilation.externs);
            metrics::record_compilation(&id, "success", started);
            tracing::info!(
                request_id = %request_id,
                config_id = %id,
                output_bytes = compilation.output.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Compilation succeeded"
            );
            Ok(([(header::CONTENT_TYPE, JS_CONTENT_TYPE)], compilation.output).into_response())
        }
        Err(e) => {
            let outcome = match &e {
                CompileError::Failed(_) => "failed",
                CompileError::Timeout(_) => "timeout",
                _ => "error",
            };
            metrics::record_compilation(&id, outcome, started);
            tracing::warn!(
                request_id = %request_id,
                config_id = %id,
                error = %e,
                "Compilation failed; cache left untouched"
            );
            Err(e.into())
        }
    }
}

/// `/externs`: last recorded externs for the id. A cold cache is not an
/// error, externs simply do not exist until the first successful compile.
pub async fn externs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let config = resolve_config(&state, &params)?;
    let body = state.cache.externs(&config.id).unwrap_or_else(|| {
        format!("// no externs recorded for {}; compile it first\n", config.id)
    });
    Ok(([(header::CONTENT_TYPE, JS_CONTENT_TYPE)], body).into_response())
}

/// `/sourcemap`: last recorded source map for the id.
pub async fn source_map(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let config = resolve_config(&state, &params)?;
    let map = state
        .cache
        .source_map(&config.id)
        .ok_or_else(|| ApiError::SourceMapAbsent(config.id.clone()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], map).into_response())
}

/// `/input`: contents of one declared input file.
pub async fn input(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let config = resolve_config(&state, &params)?;
    let name = params.get("name").ok_or(ApiError::MissingParam("name"))?;

    let declared = config
        .inputs
        .iter()
        .find(|p| p.to_string_lossy() == name.as_str())
        .ok_or_else(|| ApiError::UnknownInput {
            id: config.id.clone(),
            name: name.clone(),
        })?;

    let contents = tokio::fs::read_to_string(declared).await.map_err(|e| {
        ApiError::Internal(format!("declared input {name:?} unreadable: {e}"))
    })?;
    Ok(([(header::CONTENT_TYPE, JS_CONTENT_TYPE)], contents).into_response())
}

/// `/size`: byte counts for the declared inputs plus any cached
/// byproducts. Inputs that cannot be stat'ed report `null`.
pub async fn size(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let config = resolve_config(&state, &params)?;

    let mut inputs = Vec::with_capacity(config.inputs.len());
    let mut total: u64 = 0;
    for path in &config.inputs {
        let bytes = tokio::fs::metadata(path).await.map(|m| m.len()).ok();
        if let Some(bytes) = bytes {
            total += bytes;
        }
        inputs.push(json!({
            "name": path.display().to_string(),
            "bytes": bytes,
        }));
    }

    Ok(Json(json!({
        "id": config.id,
        "inputs": inputs,
        "total_bytes": total,
        "source_map_bytes": state.cache.source_map(&config.id).map(|m| m.len()),
        "externs_bytes": state.cache.externs(&config.id).map(|e| e.len()),
    }))
    .into_response())
}

/// `/view`: human-viewable listing of a config's inputs and externs.
pub async fn view(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let config = resolve_config(&state, &params)?;

    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html><head><title>");
    page.push_str(&escape(&config.id));
    page.push_str("</title></head><body>\n");
    page.push_str(&format!(
        "<h1>{} <small>({} mode)</small></h1>\n",
        escape(&config.id),
        config.mode
    ));

    page.push_str("<h2>Inputs</h2>\n<ul>\n");
    for path in &config.inputs {
        let name = path.display().to_string();
        page.push_str(&format!(
            "<li><a href=\"/input?id={}&name={}\">{}</a></li>\n",
            escape(&config.id),
            escape(&name),
            escape(&name)
        ));
    }
    page.push_str("</ul>\n");

    if !config.externs.is_empty() {
        page.push_str("<h2>Externs</h2>\n<ul>\n");
        for path in &config.externs {
            page.push_str(&format!("<li>{}</li>\n", escape(&path.display().to_string())));
        }
        page.push_str("</ul>\n");
    }

    page.push_str("</body></html>\n");
    Ok(Html(page).into_response())
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Record request metrics once the response is known.
pub async fn track_requests(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = req.method().to_string();
    let route = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    metrics::record_request(&method, response.status().as_u16(), &route, start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
