//! Streamable HTTP client transport
//!
//! Single `/mcp` endpoint. The first POST may return either a plain JSON
//! response or an SSE stream; the server issues an opaque session id in the
//! `mcp-session-id` response header, echoed by the client on every
//! subsequent POST. If the server invalidates the session (HTTP 404), the
//! client re-initializes from scratch. Header name and status-code handling
//! (`202 Accepted` with no body, `405 Method Not Allowed` falling back to
//! POST-only) are grounded in the `agentgateway` reference's
//! `ClientWrapper`/`StreamableHttpClient` adapter.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};

// Layer 2: Third-party crate imports
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::sync::mpsc;
use tracing::debug;

// Layer 3: Internal module imports
use crate::protocol::JsonRpcMessage;
use crate::transport::client::{ClientTransport, TransportState};
use crate::transport::error::{ClientTransportError, ClientTransportResult};

/// Response header carrying the server-issued session id.
pub const HEADER_SESSION_ID: &str = "mcp-session-id";

/// Streamable HTTP client transport, see module docs.
pub struct StreamableHttpTransport {
    client: Client,
    url: String,
    headers: HashMap<String, String>,
    state: TransportState,
    session_id: Option<String>,
    events_rx: Option<mpsc::UnboundedReceiver<JsonRpcMessage>>,
    inbox: VecDeque<JsonRpcMessage>,
}

impl StreamableHttpTransport {
    pub fn new(url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            headers,
            state: TransportState::Disconnected,
            session_id: None,
            events_rx: None,
            inbox: VecDeque::new(),
        }
    }

    /// The session id captured from the server, if any request has completed.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Adopt a previously-issued session id, for reconnect-with-replay.
    pub fn resume(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    fn build_request(&self, body: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .body(body.to_string());

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        if let Some(session_id) = &self.session_id {
            builder = builder.header(HEADER_SESSION_ID, session_id);
        }
        builder
    }

    async fn consume_sse_body(
        response: reqwest::Response,
        tx: mpsc::UnboundedSender<JsonRpcMessage>,
    ) {
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let Ok(chunk) = chunk else { break };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find("\n\n") {
                let event_block: String = buffer.drain(..pos + 2).collect();
                let data: String = event_block
                    .lines()
                    .filter_map(|l| l.strip_prefix("data:"))
                    .map(|l| l.trim_start())
                    .collect::<Vec<_>>()
                    .join("\n");
                if !data.is_empty() {
                    if let Ok(message) = JsonRpcMessage::from_json_bytes(data.as_bytes()) {
                        if tx.send(message).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ClientTransport for StreamableHttpTransport {
    async fn connect(&mut self) -> ClientTransportResult<()> {
        self.state = TransportState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> ClientTransportResult<()> {
        // Best-effort session teardown; do not fail disconnect on a DELETE error.
        if let Some(session_id) = &self.session_id {
            let _ = self
                .client
                .delete(&self.url)
                .header(HEADER_SESSION_ID, session_id)
                .send()
                .await;
        }
        self.session_id = None;
        self.events_rx = None;
        self.inbox.clear();
        self.state = TransportState::Disconnected;
        Ok(())
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn send(&mut self, message: &JsonRpcMessage) -> ClientTransportResult<()> {
        if self.state != TransportState::Connected {
            return Err(ClientTransportError::NotConnected);
        }

        let body = message
            .to_json()
            .map_err(|e| ClientTransportError::Protocol(e.to_string()))?;

        let response = self
            .build_request(&body)
            .send()
            .await
            .map_err(|e| ClientTransportError::Fatal(format!("streamable-http POST failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND && self.session_id.is_some() {
            debug!("streamable-http session invalidated by server, will re-initialize");
            self.session_id = None;
            return Err(ClientTransportError::Protocol(
                "session not found, re-initialize required".to_string(),
            ));
        }

        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            return Err(ClientTransportError::Fatal(
                "backend does not support streamable HTTP POST".to_string(),
            ));
        }

        if let Some(session_id) = response.headers().get(HEADER_SESSION_ID) {
            if let Ok(session_id) = session_id.to_str() {
                self.session_id = Some(session_id.to_string());
            }
        }

        match response.status() {
            StatusCode::ACCEPTED => Ok(()), // no body, response(s) arrive via the stream
            status if status.is_success() => {
                let content_type = response
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                if content_type.starts_with("text/event-stream") {
                    let (tx, rx) = mpsc::unbounded_channel();
                    self.events_rx = Some(rx);
                    tokio::spawn(Self::consume_sse_body(response, tx));
                } else {
                    let text = response.text().await.map_err(|e| {
                        ClientTransportError::Fatal(format!("failed to read response body: {e}"))
                    })?;
                    if !text.trim().is_empty() {
                        let reply = JsonRpcMessage::from_json_bytes(text.as_bytes())
                            .map_err(|e| ClientTransportError::Protocol(e.to_string()))?;
                        self.inbox.push_back(reply);
                    }
                }
                Ok(())
            }
            status => Err(ClientTransportError::Fatal(format!(
                "backend returned HTTP {status}"
            ))),
        }
    }

    async fn receive(&mut self) -> ClientTransportResult<Option<JsonRpcMessage>> {
        if let Some(message) = self.inbox.pop_front() {
            return Ok(Some(message));
        }
        match &mut self.events_rx {
            Some(rx) => Ok(rx.recv().await),
            None => Ok(None),
        }
    }

    fn kind(&self) -> &'static str {
        "streamablehttp"
    }
}
