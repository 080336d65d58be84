//! The streaming-chat handler.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use chat_event::ChatRequest;
use futures_util::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use trellis::{AsyncAgentSession, DirectStreamingSession};

use super::app::AppState;
use super::metadata::{metadata_from_headers, record_tracing_metadata};

/// `POST /api/v1/:agent/streaming_chat`
///
/// One request, one turn: the response body is newline-delimited JSON, one
/// `{"response": …}` object per line, ending with the terminal framework
/// message. The umbrella timeout closes the stream with a timeout note; a
/// disconnected client just tears the turn down.
pub async fn streaming_chat_handler(
    State(state): State<Arc<AppState>>,
    Path(agent): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    let metadata = metadata_from_headers(&headers);
    record_tracing_metadata(&metadata, &state.agent_env.tracing_metadata_env_vars);

    if !state.policy.allow_agent(&agent, &metadata).await {
        return error_response(StatusCode::FORBIDDEN, "not authorized for this agent");
    }

    let provider = state.deps.store.get_provider(agent.clone());
    let session =
        DirectStreamingSession::new(Arc::clone(&state.deps), provider).with_metadata(metadata);
    let mut responses = match session.streaming_chat(request).await {
        Ok(responses) => responses,
        Err(e) => {
            warn!(agent = %agent, error = %e, "could not start streaming chat");
            return error_response(StatusCode::NOT_FOUND, &e.to_string());
        }
    };

    let timeout = state.config.chat_request_timeout;
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let deadline = (!timeout.is_zero()).then(|| tokio::time::Instant::now() + timeout);
        loop {
            let next = match deadline {
                Some(deadline) => {
                    tokio::select! {
                        next = responses.next() => next,
                        _ = tokio::time::sleep_until(deadline) => {
                            info!(seconds = timeout.as_secs(), "chat request timeout, closing stream");
                            let note = serde_json::json!({"error": "Request timeout"});
                            let _ = sender.send(format!("{note}\n"));
                            break;
                        }
                    }
                }
                None => responses.next().await,
            };
            let Some(response) = next else {
                break; // turn complete
            };
            let Ok(line) = serde_json::to_string(&response) else {
                continue;
            };
            if sender.send(format!("{line}\n")).is_err() {
                // Client went away; dropping the stream cancels the turn.
                break;
            }
        }
    });

    let body = Body::from_stream(
        UnboundedReceiverStream::new(receiver).map(Ok::<_, Infallible>),
    );
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json-lines");
    if let Some(cors) = &state.agent_env.allow_cors_headers {
        builder = builder.header(header::ACCESS_CONTROL_ALLOW_HEADERS, cors);
    }
    builder.body(body).unwrap_or_else(|_| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "response build failed")
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({"error": message}).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_default()
}
