//! HTTP (POST-only) client transport
//!
//! No intrinsic session: every call is one standalone request-response.
//! Reconnection is meaningless here — `connect`/`disconnect` only flip the
//! logical state, since there is no persistent socket for the pool to own.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::collections::VecDeque;

// Layer 2: Third-party crate imports
use reqwest::Client;

// Layer 3: Internal module imports
use crate::protocol::JsonRpcMessage;
use crate::transport::client::{ClientTransport, TransportState};
use crate::transport::error::{ClientTransportError, ClientTransportResult};

/// A single-request-per-call HTTP transport. `receive()` drains a small
/// in-memory queue populated by the most recent `send()`'s response, since
/// HTTP POST is inherently request/response rather than a persistent stream.
pub struct HttpTransport {
    client: Client,
    url: String,
    headers: HashMap<String, String>,
    state: TransportState,
    inbox: VecDeque<JsonRpcMessage>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            headers,
            state: TransportState::Disconnected,
            inbox: VecDeque::new(),
        }
    }

    fn build_request(&self, body: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .body(body.to_string());
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

#[async_trait::async_trait]
impl ClientTransport for HttpTransport {
    async fn connect(&mut self) -> ClientTransportResult<()> {
        // No persistent connection to establish; mark ready for calls.
        self.state = TransportState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> ClientTransportResult<()> {
        self.state = TransportState::Disconnected;
        self.inbox.clear();
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
            .map_err(|e| ClientTransportError::Fatal(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientTransportError::Fatal(format!(
                "backend returned HTTP {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientTransportError::Fatal(format!("failed to read response body: {e}")))?;

        if !text.trim().is_empty() {
            let reply = JsonRpcMessage::from_json_bytes(text.as_bytes())
                .map_err(|e| ClientTransportError::Protocol(e.to_string()))?;
            self.inbox.push_back(reply);
        }

        Ok(())
    }

    async fn receive(&mut self) -> ClientTransportResult<Option<JsonRpcMessage>> {
        Ok(self.inbox.pop_front())
    }

    fn kind(&self) -> &'static str {
        "http"
    }
}
