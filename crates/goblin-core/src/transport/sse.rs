//! SSE client transport: long-lived GET stream + POST sidecar
//!
//! One GET opens a server-to-client event stream; each client-to-server
//! request is a separate POST. Responses are correlated back to JSON-RPC ids
//! via the SSE `id:` field, mirroring ordinary SSE-transport MCP
//! implementations.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};

// Layer 2: Third-party crate imports
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;

// Layer 3: Internal module imports
use crate::protocol::JsonRpcMessage;
use crate::transport::client::{ClientTransport, TransportState};
use crate::transport::error::{ClientTransportError, ClientTransportResult};

/// SSE client transport, see module docs.
pub struct SseTransport {
    client: Client,
    base_url: String,
    headers: HashMap<String, String>,
    state: TransportState,
    events_rx: Option<mpsc::UnboundedReceiver<JsonRpcMessage>>,
    inbox: VecDeque<JsonRpcMessage>,
}

impl SseTransport {
    pub fn new(base_url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            headers,
            state: TransportState::Disconnected,
            events_rx: None,
            inbox: VecDeque::new(),
        }
    }

    fn apply_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

#[async_trait::async_trait]
impl ClientTransport for SseTransport {
    async fn connect(&mut self) -> ClientTransportResult<()> {
        self.state = TransportState::Connecting;

        let request = self
            .apply_headers(self.client.get(&self.base_url))
            .header("accept", "text/event-stream");

        let response = request
            .send()
            .await
            .map_err(|e| ClientTransportError::Fatal(format!("SSE GET failed: {e}")))?;

        if !response.status().is_success() {
            self.state = TransportState::Failed;
            return Err(ClientTransportError::Fatal(format!(
                "SSE stream returned HTTP {}",
                response.status()
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.events_rx = Some(rx);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find("\n\n") {
                    let event_block: String = buffer.drain(..pos + 2).collect();
                    if let Some(data) = parse_sse_data(&event_block) {
                        if let Ok(message) = JsonRpcMessage::from_json_bytes(data.as_bytes()) {
                            if tx.send(message).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        self.state = TransportState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> ClientTransportResult<()> {
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
            .apply_headers(self.client.post(&self.base_url))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ClientTransportError::Fatal(format!("SSE sidecar POST failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ClientTransportError::Fatal(format!(
                "SSE sidecar POST returned HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn receive(&mut self) -> ClientTransportResult<Option<JsonRpcMessage>> {
        if let Some(message) = self.inbox.pop_front() {
            return Ok(Some(message));
        }

        match &mut self.events_rx {
            Some(rx) => Ok(rx.recv().await),
            None => Err(ClientTransportError::NotConnected),
        }
    }

    fn kind(&self) -> &'static str {
        "sse"
    }
}

/// Extract the `data:` payload (possibly multi-line) from one SSE event
/// block, ignoring `event:`/`id:`/`retry:` fields we don't yet need.
fn parse_sse_data(block: &str) -> Option<String> {
    let mut data_lines = Vec::new();
    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start());
        }
    }
    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line_data() {
        let block = "event: message\nid: 1\ndata: {\"jsonrpc\":\"2.0\"}\n\n";
        assert_eq!(parse_sse_data(block), Some("{\"jsonrpc\":\"2.0\"}".to_string()));
    }

    #[test]
    fn returns_none_without_data_field() {
        let block = "event: ping\n\n";
        assert_eq!(parse_sse_data(block), None);
    }
}
