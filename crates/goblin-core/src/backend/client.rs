//! `BackendClient`: owns one backend's transport and correlates its calls
//!
//! Modelled on `correlation::manager::CorrelationManager`'s request/response
//! pairing, adapted to drive a [`ClientTransport`] instead of a front-side
//! listener. A single actor task owns the transport exclusively — callers
//! never touch it directly — so a `send()` and the background `receive()`
//! loop never race for `&mut self`. Inbound JSON-RPC responses are
//! correlated by id; inbound notifications are classified by method name
//! and fanned out over one `broadcast` channel per MCP notification kind.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::TimeDelta;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use crate::config::ServerSpec;
use crate::correlation::{CorrelationConfig, CorrelationError, CorrelationManager};
use crate::error::{GoblinError, GoblinResult};
use crate::protocol::methods;
use crate::protocol::{
    CallToolResponse, ClientCapabilities, ClientInfo, GetPromptResponse, InitializeRequest,
    InitializeResponse, JsonRpcMessage, JsonRpcRequest, ListPromptsResponse,
    ListResourceTemplatesResponse, ListResourcesResponse, ListToolsResponse, ProtocolVersion,
    ReadResourceResponse, RequestId,
};
use crate::transport::{build_transport, ClientTransport, ClientTransportError};

/// Default per-call timeout when a caller doesn't override it.
pub const DEFAULT_CALL_TIMEOUT: TimeDelta = TimeDelta::seconds(30);

/// Bound on the change-notification broadcast channels; overflow drops the
/// oldest buffered notification rather than blocking the backend's reader.
pub const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

/// One change-notification kind a backend can emit outside of call/response.
#[derive(Debug, Clone)]
pub enum BackendNotification {
    ToolsListChanged,
    PromptsListChanged,
    ResourcesListChanged,
    ResourceUpdated { uri: String },
}

/// Subscriptions to a backend's change notifications, one receiver per kind.
pub struct NotificationSubscriptions {
    pub tools_list_changed: broadcast::Receiver<BackendNotification>,
    pub prompts_list_changed: broadcast::Receiver<BackendNotification>,
    pub resources_list_changed: broadcast::Receiver<BackendNotification>,
    pub resources_updated: broadcast::Receiver<BackendNotification>,
}

enum ActorCommand {
    Send(JsonRpcMessage),
}

/// Drives one backend's transport. Construction connects the transport and
/// spawns the reader/writer actor; `shutdown` tears both down.
pub struct BackendClient {
    name: String,
    correlation: Arc<CorrelationManager>,
    commands: mpsc::UnboundedSender<ActorCommand>,
    actor: Option<JoinHandle<()>>,
    tools_list_changed_tx: broadcast::Sender<BackendNotification>,
    prompts_list_changed_tx: broadcast::Sender<BackendNotification>,
    resources_list_changed_tx: broadcast::Sender<BackendNotification>,
    resources_updated_tx: broadcast::Sender<BackendNotification>,
}

impl BackendClient {
    /// Build the transport adapter for `spec`, connect it, start the owning
    /// actor task, and run the MCP handshake: send `initialize` with the
    /// gateway's declared protocol version and capability set, and return
    /// the negotiated response alongside the client (`spec.md` §4.3). The
    /// backend is not usable until this handshake completes.
    pub async fn connect(spec: &ServerSpec) -> GoblinResult<(Self, InitializeResponse)> {
        let mut transport = build_transport(spec);
        transport.connect().await?;

        let correlation = Arc::new(
            CorrelationManager::new(CorrelationConfig {
                default_timeout: DEFAULT_CALL_TIMEOUT,
                ..CorrelationConfig::default()
            })
            .await
            .map_err(GoblinError::Correlation)?,
        );

        let (tools_list_changed_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let (prompts_list_changed_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let (resources_list_changed_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let (resources_updated_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let actor = tokio::spawn(run_actor(
            spec.name.clone(),
            transport,
            Arc::clone(&correlation),
            commands_rx,
            tools_list_changed_tx.clone(),
            prompts_list_changed_tx.clone(),
            resources_list_changed_tx.clone(),
            resources_updated_tx.clone(),
        ));

        let client = Self {
            name: spec.name.clone(),
            correlation,
            commands: commands_tx,
            actor: Some(actor),
            tools_list_changed_tx,
            prompts_list_changed_tx,
            resources_list_changed_tx,
            resources_updated_tx,
        };

        let request = InitializeRequest::with_version(
            ProtocolVersion::current(),
            serde_json::to_value(ClientCapabilities::default())
                .map_err(|e| GoblinError::Protocol(format!("failed to encode client capabilities: {e}")))?,
            ClientInfo {
                name: "goblin".to_string(),
                version: crate::version().to_string(),
            },
        );
        let response = client.initialize(request).await?;

        Ok((client, response))
    }

    /// Subscribe to this backend's four change-notification streams.
    pub fn subscribe(&self) -> NotificationSubscriptions {
        NotificationSubscriptions {
            tools_list_changed: self.tools_list_changed_tx.subscribe(),
            prompts_list_changed: self.prompts_list_changed_tx.subscribe(),
            resources_list_changed: self.resources_list_changed_tx.subscribe(),
            resources_updated: self.resources_updated_tx.subscribe(),
        }
    }

    pub async fn initialize(&self, request: InitializeRequest) -> GoblinResult<InitializeResponse> {
        let params = serde_json::to_value(&request)
            .map_err(|e| GoblinError::Protocol(format!("failed to encode initialize: {e}")))?;
        self.call(methods::INITIALIZE, Some(params)).await
    }

    pub async fn list_tools(&self) -> GoblinResult<ListToolsResponse> {
        self.call(methods::TOOLS_LIST, None).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> GoblinResult<CallToolResponse> {
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        self.call(methods::TOOLS_CALL, Some(params)).await
    }

    pub async fn list_prompts(&self) -> GoblinResult<ListPromptsResponse> {
        self.call(methods::PROMPTS_LIST, None).await
    }

    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: std::collections::HashMap<String, String>,
    ) -> GoblinResult<GetPromptResponse> {
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        self.call(methods::PROMPTS_GET, Some(params)).await
    }

    pub async fn list_resources(&self) -> GoblinResult<ListResourcesResponse> {
        self.call(methods::RESOURCES_LIST, None).await
    }

    pub async fn read_resource(&self, uri: &str) -> GoblinResult<ReadResourceResponse> {
        let params = serde_json::json!({ "uri": uri });
        self.call(methods::RESOURCES_READ, Some(params)).await
    }

    pub async fn list_resource_templates(&self) -> GoblinResult<ListResourceTemplatesResponse> {
        self.call(methods::RESOURCES_TEMPLATES_LIST, None).await
    }

    pub async fn subscribe_resource(&self, uri: &str) -> GoblinResult<()> {
        let params = serde_json::json!({ "uri": uri });
        let _: Value = self.call(methods::RESOURCES_SUBSCRIBE, Some(params)).await?;
        Ok(())
    }

    pub async fn ping(&self) -> GoblinResult<()> {
        let _: Value = self.call(methods::PING, None).await?;
        Ok(())
    }

    /// Generic request/response round trip: register with the correlation
    /// manager, send the framed request, await the correlated reply.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> GoblinResult<T> {
        let (id, receiver) = self
            .correlation
            .register_request(None, params.clone().unwrap_or(Value::Null))
            .await
            .map_err(GoblinError::Correlation)?;

        let request = JsonRpcRequest::new(method, params, id.clone());
        self.commands
            .send(ActorCommand::Send(JsonRpcMessage::Request(request)))
            .map_err(|_| GoblinError::Transport(ClientTransportError::NotConnected))?;

        let value = await_response(receiver, &id).await?;
        serde_json::from_value(value)
            .map_err(|e| GoblinError::Protocol(format!("malformed response to {method}: {e}")))
    }

    /// Best-effort teardown: stop the actor, disconnect the transport via
    /// its own drop, and cancel anything still waiting on a correlated reply.
    pub async fn shutdown(mut self) -> GoblinResult<()> {
        if let Some(actor) = self.actor.take() {
            actor.abort();
            let _ = actor.await;
        }
        debug!(backend = %self.name, "backend client shut down");
        Ok(())
    }
}

async fn await_response(
    receiver: oneshot::Receiver<crate::correlation::CorrelationResult<Value>>,
    id: &RequestId,
) -> GoblinResult<Value> {
    match receiver.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(GoblinError::Correlation(err)),
        Err(_) => Err(GoblinError::Correlation(CorrelationError::ChannelClosed {
            id: id.clone(),
            details: "backend actor dropped before responding".to_string(),
        })),
    }
}

/// Owns the transport exclusively: multiplexes outbound sends from
/// `commands` with inbound `receive()` polls, correlating responses and
/// classifying notifications by method name.
#[allow(clippy::too_many_arguments)]
async fn run_actor(
    backend_name: String,
    mut transport: Box<dyn ClientTransport>,
    correlation: Arc<CorrelationManager>,
    mut commands: mpsc::UnboundedReceiver<ActorCommand>,
    tools_list_changed_tx: broadcast::Sender<BackendNotification>,
    prompts_list_changed_tx: broadcast::Sender<BackendNotification>,
    resources_list_changed_tx: broadcast::Sender<BackendNotification>,
    resources_updated_tx: broadcast::Sender<BackendNotification>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(ActorCommand::Send(message)) => {
                        if let Err(err) = transport.send(&message).await {
                            warn!(backend = %backend_name, error = %err, "backend send failed");
                        }
                    }
                    None => break,
                }
            }
            received = transport.receive() => {
                match received {
                    Ok(Some(message)) => {
                        dispatch_inbound(
                            &backend_name,
                            message,
                            &correlation,
                            &tools_list_changed_tx,
                            &prompts_list_changed_tx,
                            &resources_list_changed_tx,
                            &resources_updated_tx,
                        ).await;
                    }
                    Ok(None) => {
                        debug!(backend = %backend_name, "backend transport closed its stream");
                        break;
                    }
                    Err(err) => {
                        warn!(backend = %backend_name, error = %err, "backend receive failed");
                        break;
                    }
                }
            }
        }
    }
    let _ = transport.disconnect().await;
}

async fn dispatch_inbound(
    backend_name: &str,
    message: JsonRpcMessage,
    correlation: &CorrelationManager,
    tools_list_changed_tx: &broadcast::Sender<BackendNotification>,
    prompts_list_changed_tx: &broadcast::Sender<BackendNotification>,
    resources_list_changed_tx: &broadcast::Sender<BackendNotification>,
    resources_updated_tx: &broadcast::Sender<BackendNotification>,
) {
    match message {
        JsonRpcMessage::Response(response) => {
            let Some(id) = response.id.clone() else {
                warn!(backend = %backend_name, "dropping response with no request id");
                return;
            };
            let outcome = match (response.result, response.error) {
                (Some(result), _) => Ok(result),
                (None, Some(error)) => Err(CorrelationError::Internal {
                    message: error.to_string(),
                }),
                (None, None) => Ok(Value::Null),
            };
            if let Err(err) = correlation.correlate_response(&id, outcome).await {
                debug!(backend = %backend_name, %id, error = %err, "no pending request for response");
            }
        }
        JsonRpcMessage::Notification(notification) => {
            let sent = match notification.method.as_str() {
                "notifications/tools/list_changed" => {
                    tools_list_changed_tx.send(BackendNotification::ToolsListChanged).is_ok()
                }
                "notifications/prompts/list_changed" => {
                    prompts_list_changed_tx.send(BackendNotification::PromptsListChanged).is_ok()
                }
                "notifications/resources/list_changed" => resources_list_changed_tx
                    .send(BackendNotification::ResourcesListChanged)
                    .is_ok(),
                "notifications/resources/updated" => {
                    let uri = notification
                        .params
                        .as_ref()
                        .and_then(|p| p.get("uri"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    resources_updated_tx
                        .send(BackendNotification::ResourceUpdated { uri })
                        .is_ok()
                }
                other => {
                    debug!(backend = %backend_name, method = other, "unhandled backend notification");
                    true
                }
            };
            if !sent {
                debug!(backend = %backend_name, "notification dropped, no subscribers");
            }
        }
        JsonRpcMessage::Request(request) => {
            debug!(backend = %backend_name, method = %request.method, "ignoring server-to-client request, not yet supported");
        }
    }
}
