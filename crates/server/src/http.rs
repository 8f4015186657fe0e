// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport: accept loop, router, body limits, compression, SSE.
//!
//! The accept loop is hand-rolled (exponential backoff on transient accept
//! errors, clean cancellation); each accepted socket is served by the axum
//! router through hyper-util on its own task.

use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, VARY};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use masc_core::Clock;
use masc_engine::SseHub;

use crate::env::{SERVER_NAME, SERVER_VERSION};
use crate::mcp::McpServer;
use crate::metrics::Metrics;

const ACCEPT_BACKOFF_INITIAL: Duration = Duration::from_millis(50);
const ACCEPT_BACKOFF_CAP: Duration = Duration::from_secs(1);

/// Shared state for all HTTP handlers.
pub struct HttpState<C: Clock + 'static> {
    pub server: Arc<McpServer<C>>,
    pub metrics: Arc<Metrics>,
    pub max_body_bytes: usize,
    /// Parent token; each request works under a child of it.
    pub cancel: CancellationToken,
}

/// Build the axum router with all routes and the CORS layer.
pub fn build_router<C: Clock + 'static>(state: Arc<HttpState<C>>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics_text))
        .route("/mcp", post(mcp_post).options(mcp_options))
        .route("/events", get(sse_events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "masc MCP server"
}

async fn health() -> impl IntoResponse {
    let mut body = json!({
        "status": "ok",
        "server": SERVER_NAME,
        "version": SERVER_VERSION,
    });
    if let Some(cluster) = crate::env::cluster_name() {
        body["cluster"] = json!(cluster);
    }
    Json(body)
}

async fn ready() -> impl IntoResponse {
    Json(json!({ "status": "ready" }))
}

async fn metrics_text<C: Clock + 'static>(
    State(state): State<Arc<HttpState<C>>>,
) -> impl IntoResponse {
    state.metrics.http_requests.fetch_add(1, Ordering::Relaxed);
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], state.metrics.render())
}

async fn mcp_options() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `POST /mcp` — one JSON-RPC exchange per request.
async fn mcp_post<C: Clock + 'static>(
    State(state): State<Arc<HttpState<C>>>,
    request: Request,
) -> Response {
    state.metrics.http_requests.fetch_add(1, Ordering::Relaxed);
    let (parts, body) = request.into_parts();

    // Declared-oversize bodies are refused before reading anything.
    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > state.max_body_bytes) {
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }

    // The streaming read enforces the limit mid-body as well.
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let session_id = parts
        .headers
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or("http");

    let cancel = state.cancel.child_token();
    match state.server.handle(&bytes, session_id, &cancel).await {
        Some(response) => json_response(&parts.headers, &response),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    /// Restrict the stream to one event type.
    channel: Option<String>,
}

/// Unsubscribes (and decrements the gauge) when the connection drops.
struct SseGuard {
    hub: Arc<SseHub>,
    id: u64,
    metrics: Arc<Metrics>,
}

impl Drop for SseGuard {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
        self.metrics.sse_clients.fetch_sub(1, Ordering::Relaxed);
    }
}

/// `GET /events` — `event: <name>\ndata: <json>\n\n` frames from the hub.
async fn sse_events<C: Clock + 'static>(
    State(state): State<Arc<HttpState<C>>>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>>> {
    let hub = Arc::clone(state.server.dispatcher().coordinator().events.hub());
    let (id, rx) = hub.subscribe(query.channel);
    state.metrics.sse_clients.fetch_add(1, Ordering::Relaxed);
    debug!(subscriber = id, "SSE subscriber connected");

    let guard = SseGuard { hub, id, metrics: Arc::clone(&state.metrics) };
    let stream = ReceiverStream::new(rx).map(move |(name, payload)| {
        let _held = &guard;
        Ok(Event::default().event(name).data(payload.to_string()))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// JSON response with negotiated zstd compression.
fn json_response(request_headers: &HeaderMap, value: &Value) -> Response {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .header(VARY, "Accept-Encoding");

    let result = if accepts_zstd(request_headers) {
        match zstd::encode_all(body.as_slice(), 0) {
            Ok(compressed) => builder
                .header(CONTENT_ENCODING, "zstd")
                .body(Body::from(compressed)),
            Err(_) => Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "application/json")
                .header(VARY, "Accept-Encoding")
                .body(Body::from(body)),
        }
    } else {
        builder.body(Body::from(body))
    };
    result.unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Does `Accept-Encoding` advertise zstd (or the dictionary variant)?
fn accepts_zstd(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',').any(|token| {
                let name = token.trim().split(';').next().unwrap_or("").trim();
                name.eq_ignore_ascii_case("zstd") || name.eq_ignore_ascii_case("zstd-dict")
            })
        })
        .unwrap_or(false)
}

/// Accept loop with exponential backoff on transient errors. Cancellation
/// ends it cleanly; in-flight connection tasks drain on their own.
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) {
    let mut make_svc = router.into_make_service();
    let mut backoff = ACCEPT_BACKOFF_INITIAL;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    backoff = ACCEPT_BACKOFF_INITIAL;
                    debug!(%addr, "connection accepted");
                    let svc_future = <_ as tower::Service<_>>::call(&mut make_svc, ());
                    tokio::spawn(async move {
                        let Ok(svc) = svc_future.await;
                        let io = hyper_util::rt::TokioIo::new(stream);
                        let hyper_svc = hyper_util::service::TowerToHyperService::new(svc);
                        if let Err(e) = hyper_util::server::conn::auto::Builder::new(
                            hyper_util::rt::TokioExecutor::new(),
                        )
                        .serve_connection(io, hyper_svc)
                        .await
                        {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept error; backing off {}ms", backoff.as_millis());
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(ACCEPT_BACKOFF_CAP);
                }
            },
        }
    }
    info!("HTTP listener stopped");
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
