//! Concierge endpoints: list, connectivity, health.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use trellis::report_network_connectivity;

use super::app::AppState;
use super::metadata::metadata_from_headers;

/// `GET /api/v1/list`: the agents this request may see.
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let metadata = metadata_from_headers(&headers);
    let allowed = state.policy.list_agents(&metadata).await;
    let agents: Vec<_> = allowed
        .into_iter()
        .map(|agent_name| json!({"agent_name": agent_name}))
        .collect();
    Json(json!({ "agents": agents }))
}

/// `GET /api/v1/:agent/connectivity`: the reachable graph of one network.
pub async fn connectivity_handler(
    State(state): State<Arc<AppState>>,
    Path(agent): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let metadata = metadata_from_headers(&headers);
    if !state.policy.allow_agent(&agent, &metadata).await {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "not authorized for this agent"})),
        );
    }
    let Some(network) = state.deps.store.get(&agent) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("unknown agent network: {agent}")})),
        );
    };
    let report = report_network_connectivity(&network);
    (
        StatusCode::OK,
        Json(json!({ "connectivity_info": report })),
    )
}

/// `GET /healthz`
pub async fn healthz_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "time": chrono::Utc::now().to_rfc3339(),
        "networks": state.deps.store.list().len(),
    }))
}
