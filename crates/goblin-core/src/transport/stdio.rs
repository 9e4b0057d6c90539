//! STDIO client transport: child-process backend over length-prefixed frames
//!
//! Frames are `Content-Length: N\r\n\r\n{...}`, the same framing MCP uses
//! over stdio elsewhere in the ecosystem. Stderr lines are merged into
//! `tracing` at `warn` rather than discarded, so a misbehaving backend still
//! shows up in gateway logs. Shutdown is cooperative: close stdin, wait up
//! to [`GRACE_PERIOD`], then `SIGKILL` via `Child::start_kill`.

// Layer 1: Standard library imports
use std::process::Stdio as StdStdio;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::warn;

// Layer 3: Internal module imports
use crate::protocol::JsonRpcMessage;
use crate::transport::client::{ClientTransport, TransportState};
use crate::transport::error::{ClientTransportError, ClientTransportResult};

/// Grace period between cooperative shutdown (closing stdin) and `SIGKILL`.
pub const GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Spawns and owns a backend child process, speaking length-prefixed JSON-RPC
/// frames over its stdin/stdout.
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    child: Option<Child>,
    stdin: Option<tokio::process::ChildStdin>,
    stdout: Option<BufReader<tokio::process::ChildStdout>>,
    state: TransportState,
}

impl StdioTransport {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            env: env.into_iter().collect(),
            child: None,
            stdin: None,
            stdout: None,
            state: TransportState::Disconnected,
        }
    }

    fn spawn_stderr_forwarder(child: &mut Child) {
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "goblin::backend::stderr", "{line}");
                }
            });
        }
    }
}

#[async_trait::async_trait]
impl ClientTransport for StdioTransport {
    async fn connect(&mut self) -> ClientTransportResult<()> {
        self.state = TransportState::Connecting;

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .envs(self.env.iter().cloned())
            .stdin(StdStdio::piped())
            .stdout(StdStdio::piped())
            .stderr(StdStdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            self.state = TransportState::Failed;
            ClientTransportError::Fatal(format!("failed to spawn {}: {e}", self.command))
        })?;

        Self::spawn_stderr_forwarder(&mut child);

        self.stdin = child.stdin.take();
        self.stdout = child.stdout.take().map(BufReader::new);
        self.child = Some(child);
        self.state = TransportState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> ClientTransportResult<()> {
        self.stdin = None; // closes stdin, signaling EOF cooperatively

        if let Some(mut child) = self.child.take() {
            let waited = tokio::time::timeout(GRACE_PERIOD, child.wait()).await;
            if waited.is_err() {
                let _ = child.start_kill();
                let _ = child.wait().await;
            }
        }

        self.stdout = None;
        self.state = TransportState::Disconnected;
        Ok(())
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn send(&mut self, message: &JsonRpcMessage) -> ClientTransportResult<()> {
        let stdin = self.stdin.as_mut().ok_or(ClientTransportError::NotConnected)?;

        let body = message
            .to_json()
            .map_err(|e| ClientTransportError::Protocol(e.to_string()))?;
        let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);

        stdin.write_all(frame.as_bytes()).await.map_err(|e| {
            self.state = TransportState::Failed;
            ClientTransportError::Fatal(format!("write to child stdin failed: {e}"))
        })?;
        stdin.flush().await.map_err(|e| {
            self.state = TransportState::Failed;
            ClientTransportError::Fatal(format!("flush to child stdin failed: {e}"))
        })
    }

    async fn receive(&mut self) -> ClientTransportResult<Option<JsonRpcMessage>> {
        let stdout = self.stdout.as_mut().ok_or(ClientTransportError::NotConnected)?;

        let content_length = match read_content_length(stdout).await {
            Ok(Some(len)) => len,
            Ok(None) => {
                self.state = TransportState::Failed;
                return Ok(None); // child closed stdout: transport failed
            }
            Err(e) => {
                self.state = TransportState::Failed;
                return Err(ClientTransportError::Fatal(format!("framing error: {e}")));
            }
        };

        let mut buf = vec![0u8; content_length];
        stdout.read_exact(&mut buf).await.map_err(|e| {
            self.state = TransportState::Failed;
            ClientTransportError::Fatal(format!("short read from child stdout: {e}"))
        })?;

        let message = JsonRpcMessage::from_json_bytes(&buf)
            .map_err(|e| ClientTransportError::Protocol(e.to_string()))?;
        Ok(Some(message))
    }

    fn kind(&self) -> &'static str {
        "stdio"
    }
}

/// Reads a `Content-Length: N\r\n\r\n` header, returning the declared body
/// length, or `None` on clean EOF before any header bytes arrive.
async fn read_content_length(
    stdout: &mut BufReader<tokio::process::ChildStdout>,
) -> std::io::Result<Option<usize>> {
    let mut header = String::new();
    loop {
        let mut line = String::new();
        let n = stdout.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
        header.push_str(&line);
    }

    let length = header
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "missing Content-Length header")
        })?;

    Ok(Some(length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_to_missing_binary_fails_fatal() {
        let mut transport = StdioTransport::new("/nonexistent/goblin-test-binary", vec![], vec![]);
        let result = transport.connect().await;
        assert!(matches!(result, Err(ClientTransportError::Fatal(_))));
        assert_eq!(transport.state(), TransportState::Failed);
    }

    #[tokio::test]
    async fn echoes_via_cat() {
        let mut transport = StdioTransport::new("cat", vec![], vec![]);
        transport.connect().await.unwrap();
        assert_eq!(transport.state(), TransportState::Connected);

        let request = JsonRpcMessage::Request(crate::protocol::JsonRpcRequest::new(
            "ping",
            None,
            crate::protocol::RequestId::new_number(1),
        ));
        transport.send(&request).await.unwrap();

        let received = transport.receive().await.unwrap();
        assert_eq!(received, Some(request));

        transport.disconnect().await.unwrap();
    }
}
