//! Request-metadata extraction.

use std::collections::HashMap;

use axum::http::HeaderMap;
use tracing::Span;

/// Collects request headers into the opaque metadata map, generating a
/// `request_id` when the client sent none.
pub fn metadata_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    for (name, value) in headers {
        if let Ok(text) = value.to_str() {
            metadata.insert(name.as_str().to_lowercase(), text.to_string());
        }
    }
    metadata
        .entry("request_id".to_string())
        .or_insert_with(|| uuid::Uuid::new_v4().to_string());
    metadata
}

/// Records the well-known keys plus any configured extra env vars on the
/// current tracing span.
pub fn record_tracing_metadata(
    metadata: &HashMap<String, String>,
    tracing_metadata_env_vars: &[String],
) {
    let span = Span::current();
    if let Some(request_id) = metadata.get("request_id") {
        span.record("request_id", request_id.as_str());
    }
    if let Some(user_id) = metadata.get("user_id") {
        span.record("user_id", user_id.as_str());
    }
    for var in tracing_metadata_env_vars {
        if let Ok(value) = std::env::var(var) {
            tracing::debug!(env_var = %var, value = %value, "tracing metadata");
        }
    }
}
