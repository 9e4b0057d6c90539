//! Streamable-HTTP front door: `POST /mcp` and `GET /mcp`, per `spec.md` §6.
//!
//! `GatewayServer` itself only understands sessions and `JsonRpcMessage`s;
//! this module is the transport that turns that surface into the wire
//! contract clients actually speak. A `POST` with an unknown `mcp-session-id`
//! becomes HTTP 404 with a JSON-RPC `-32000` body; over capacity becomes 429
//! the same way, so a client that only reads the JSON-RPC `error` field
//! behaves correctly without ever inspecting the status code.

// Layer 1: Standard library imports
use std::convert::Infallible;

// Layer 2: Third-party crate imports
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::warn;
use uuid::Uuid;

// Layer 3: Internal module imports
use crate::state::AppState;
use goblin_core::protocol::{JsonRpcMessage, JsonRpcRequest, RequestId};
use goblin_core::session::SessionError;

const SESSION_HEADER: &str = "mcp-session-id";
const TRANSPORT_KIND: &str = "streamable-http";

pub fn routes() -> Router<AppState> {
    Router::new().route("/mcp", post(post_mcp).get(get_mcp))
}

fn session_id_header(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn session_header_value(id: Uuid) -> HeaderValue {
    HeaderValue::from_str(&id.to_string()).expect("uuid is always a valid header value")
}

/// JSON-RPC `-32000` per `spec.md` §6: the reserved "server error" range,
/// used here for the two transport-level conditions that aren't really
/// about any particular request (unknown session, too many sessions).
fn transport_error_body(message: &str, id: Option<RequestId>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": { "code": -32000, "message": message },
        "id": id,
    })
}

async fn post_mcp(State(state): State<AppState>, headers: HeaderMap, Json(body): Json<JsonRpcMessage>) -> Response {
    let existing = session_id_header(&headers);

    let handle = match existing {
        Some(id) => match state.gateway.session(&id) {
            Some(handle) => handle,
            None => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(transport_error_body("Session not found", request_id_of(&body))),
                )
                    .into_response();
            }
        },
        None => match state
            .gateway
            .open_session(TRANSPORT_KIND, state.current_snapshot().policies.compatibility_mode_default)
            .await
        {
            Ok(handle) => handle,
            Err(SessionError::OverCapacity { max }) => {
                warn!(max, "rejecting new session: over capacity");
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(transport_error_body("Too many concurrent sessions", request_id_of(&body))),
                )
                    .into_response();
            }
            Err(e) => {
                warn!(error = %e, "failed to open session");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(transport_error_body(&e.to_string(), None)))
                    .into_response();
            }
        },
    };

    let session_id = handle.session.lock().await.id;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SESSION_HEADER, session_header_value(session_id));

    match body {
        JsonRpcMessage::Request(request) => {
            let response = state.gateway.handle_request(&handle, request).await;
            (StatusCode::OK, response_headers, Json(response)).into_response()
        }
        JsonRpcMessage::Notification(notification) => {
            state.gateway.handle_notification(&handle, notification).await;
            (StatusCode::ACCEPTED, response_headers).into_response()
        }
        JsonRpcMessage::Response(_) => {
            (StatusCode::BAD_REQUEST, Json(transport_error_body("POST /mcp does not accept responses", None)))
                .into_response()
        }
    }
}

fn request_id_of(message: &JsonRpcMessage) -> Option<RequestId> {
    match message {
        JsonRpcMessage::Request(JsonRpcRequest { id, .. }) => Some(id.clone()),
        _ => None,
    }
}

/// `GET /mcp`: the notification-push half of the contract. The spec only
/// requires the `POST` response to be able to carry SSE, not that a `GET`
/// stream exist at all, but every session already has an outbound broadcast
/// queue (`spec.md` §5) and SSE is the natural way to drain it continuously.
async fn get_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    let id = session_id_header(&headers).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(transport_error_body("Session not found", None)),
        )
            .into_response()
    })?;

    let handle = state.gateway.session(&id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(transport_error_body("Session not found", None)),
        )
            .into_response()
    })?;

    let rx = handle.subscribe_outbound();
    let stream = BroadcastStream::new(rx).filter_map(|item| match item {
        Ok(message) => serde_json::to_string(&message)
            .ok()
            .map(|data| Ok(Event::default().data(data))),
        Err(_) => None,
    });
    Ok(Sse::new(stream))
}
