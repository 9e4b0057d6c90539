//! `GatewayServer`: the front-side MCP protocol surface
//!
//! Transport-agnostic: it knows nothing about stdio/HTTP/SSE framing, only
//! `JsonRpcMessage`s tied
//! to a session id. A listening transport (not part of this crate's scope)
//! decodes bytes into messages, resolves or creates a session through
//! [`GatewayServer::open_session`]/[`GatewayServer::resume_session`], and
//! calls [`GatewayServer::handle_request`]/[`handle_notification`]; replies
//! and backend-originated notifications both flow back out through the
//! session's own outbound broadcast queue, so the serving transport only
//! ever drains one channel per session regardless of message kind.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

// Layer 3: Internal module imports
use crate::backend::BackendClient;
use crate::error::{GoblinError, GoblinResult};
use crate::gateway::error::GatewayError;
use crate::protocol::{
    methods, CallToolRequest, CallToolResponse, GetPromptRequest, InitializeRequest,
    InitializeResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListPromptsResponse, ListResourceTemplatesResponse, ListResourcesResponse, ListToolsResponse,
    LoggingCapabilities, Prompt, PromptCapabilities, ReadResourceRequest, Resource,
    ResourceCapabilities, ResourceTemplate, ServerCapabilities, ServerInfo,
    SubscribeResourceRequest, Tool, ToolCapabilities,
};
use crate::registry::card::{CapabilityCard, CapabilityKind};
use crate::registry::virtual_tools::{not_implemented_response, VIRTUAL_SERVER_NAME};
use crate::registry::{Registry, RegistryError, RegistryEvent, RegistrySnapshot};
use crate::router::error::RouterError;
use crate::router::{CallContext, Router};
use crate::session::{SessionHandle, SessionManager, SessionResult, SessionState};

const NOTIF_TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";
const NOTIF_PROMPTS_LIST_CHANGED: &str = "notifications/prompts/list_changed";
const NOTIF_RESOURCES_LIST_CHANGED: &str = "notifications/resources/list_changed";
const NOTIF_RESOURCES_UPDATED: &str = "notifications/resources/updated";

pub struct GatewayServer {
    sessions: Arc<SessionManager>,
    registry: Arc<Registry>,
    router: Arc<Router>,
    server_info: ServerInfo,
}

impl GatewayServer {
    pub fn new(
        sessions: Arc<SessionManager>,
        registry: Arc<Registry>,
        router: Arc<Router>,
        server_info: ServerInfo,
    ) -> Arc<Self> {
        let this = Arc::new(Self {
            sessions,
            registry,
            router,
            server_info,
        });
        this.clone().spawn_registry_bridge();
        this
    }

    /// Every registry change event is turned into the notification the
    /// affected (non-compatibility-mode) sessions are waiting for
    /// (`spec.md` §4.7). Centralizing this here means backend-side wiring
    /// only has to call `Registry::sync_backend`/`evict_backend`; fan-out is
    /// automatic.
    fn spawn_registry_bridge(self: Arc<Self>) {
        let mut events = self.registry.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(RegistryEvent::ToolsChanged) => self.forward_list_changed(NOTIF_TOOLS_LIST_CHANGED).await,
                    Ok(RegistryEvent::PromptsChanged) => self.forward_list_changed(NOTIF_PROMPTS_LIST_CHANGED).await,
                    Ok(RegistryEvent::ResourcesChanged) => self.forward_list_changed(NOTIF_RESOURCES_LIST_CHANGED).await,
                    Ok(RegistryEvent::BackendSynced { server }) => debug!(server, "registry bridge: backend synced"),
                    Ok(RegistryEvent::BackendEvicting { server }) => debug!(server, "registry bridge: backend evicting"),
                    Ok(RegistryEvent::BackendEvicted { server }) => debug!(server, "registry bridge: backend evicted"),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "registry bridge lagged behind events");
                    }
                }
            }
        });
    }

    /// Watch one backend's change-notification streams: list-changed kinds
    /// re-sync the registry (whose own event then reaches sessions via the
    /// registry bridge); `resources/updated` goes straight to subscribed
    /// sessions, since no registry state needs to change for it.
    pub fn spawn_backend_notification_bridge(self: &Arc<Self>, server_name: String, client: Arc<BackendClient>) {
        let this = Arc::clone(self);
        let mut subs = client.subscribe();
        tokio::spawn(async move {
            loop {
                let closed = tokio::select! {
                    res = subs.tools_list_changed.recv() => {
                        if res.is_ok() { this.resync_backend(&server_name, &client).await; }
                        matches!(res, Err(tokio::sync::broadcast::error::RecvError::Closed))
                    }
                    res = subs.prompts_list_changed.recv() => {
                        if res.is_ok() { this.resync_backend(&server_name, &client).await; }
                        matches!(res, Err(tokio::sync::broadcast::error::RecvError::Closed))
                    }
                    res = subs.resources_list_changed.recv() => {
                        if res.is_ok() { this.resync_backend(&server_name, &client).await; }
                        matches!(res, Err(tokio::sync::broadcast::error::RecvError::Closed))
                    }
                    res = subs.resources_updated.recv() => {
                        match res {
                            Ok(crate::backend::BackendNotification::ResourceUpdated { uri }) => {
                                this.forward_resource_updated(&uri).await;
                                false
                            }
                            Ok(_) => false,
                            Err(e) => matches!(e, tokio::sync::broadcast::error::RecvError::Closed),
                        }
                    }
                };
                if closed {
                    break;
                }
            }
        });
    }

    /// Re-fetch the backend's negotiated capabilities before re-syncing its
    /// cards, so a list-changed notification mid-session still respects
    /// whatever capability set `initialize` negotiated.
    async fn resync_backend(&self, server_name: &str, client: &BackendClient) {
        if let Some(backend) = self.router.pool().backend_snapshot(server_name).await {
            self.registry.sync_backend(server_name, client, &backend).await;
        }
    }

    pub async fn open_session(&self, transport_kind: impl Into<String>, compatibility_mode: bool) -> SessionResult<Arc<SessionHandle>> {
        self.sessions.create(transport_kind, compatibility_mode)
    }

    pub async fn resume_session(
        &self,
        id: Uuid,
        transport_kind: impl Into<String>,
        compatibility_mode: bool,
    ) -> SessionResult<Arc<SessionHandle>> {
        self.sessions.attach_or_create(Some(id), transport_kind, compatibility_mode).await
    }

    pub fn session(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id)
    }

    /// Close a session (transport disconnect or an explicit `shutdown` call).
    pub async fn close_session(&self, id: &Uuid) {
        if let Some(handle) = self.sessions.remove(id) {
            let mut session = handle.session.lock().await;
            session.state = SessionState::Closed;
        }
    }

    pub async fn handle_request(&self, handle: &Arc<SessionHandle>, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest { method, params, id, .. } = request;
        match self.dispatch(handle, &method, params, id.clone()).await {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(err) => JsonRpcResponse::error(error_object(&err), Some(id)),
        }
    }

    /// Client-originated notifications. Currently only `initialized` is
    /// meaningful: it moves a session from `Initialized` to `Active`.
    pub async fn handle_notification(&self, handle: &Arc<SessionHandle>, notification: JsonRpcNotification) {
        if notification.method == methods::INITIALIZED {
            let mut session = handle.session.lock().await;
            if session.state == SessionState::Initialized {
                session.state = SessionState::Active;
            }
        } else {
            debug!(method = %notification.method, "ignoring unrecognized client notification");
        }
    }

    async fn dispatch(
        &self,
        handle: &Arc<SessionHandle>,
        method: &str,
        params: Option<Value>,
        request_id: crate::protocol::RequestId,
    ) -> GoblinResult<Value> {
        if method == methods::INITIALIZE {
            return self.handle_initialize(handle, params).await;
        }

        {
            let session = handle.session.lock().await;
            if !matches!(session.state, SessionState::Initialized | SessionState::Active) {
                return Err(GoblinError::Gateway(GatewayError::NotInitialized));
            }
        }

        match method {
            methods::PING => Ok(Value::Null),
            methods::TOOLS_LIST => self.handle_list_tools(handle).await,
            methods::TOOLS_CALL => self.handle_call_tool(handle, params, request_id).await,
            methods::PROMPTS_LIST => self.handle_list_prompts(handle).await,
            methods::PROMPTS_GET => self.handle_get_prompt(handle, params, request_id).await,
            methods::RESOURCES_LIST => self.handle_list_resources(handle).await,
            methods::RESOURCES_READ => self.handle_read_resource(handle, params, request_id).await,
            methods::RESOURCES_TEMPLATES_LIST => self.handle_list_resource_templates(handle).await,
            methods::RESOURCES_SUBSCRIBE => self.handle_subscribe_resource(handle, params).await,
            "shutdown" => self.handle_shutdown(handle).await,
            other => Err(GoblinError::Gateway(GatewayError::UnknownMethod(other.to_string()))),
        }
    }

    async fn handle_initialize(&self, handle: &Arc<SessionHandle>, params: Option<Value>) -> GoblinResult<Value> {
        let req: InitializeRequest = parse_params(params, methods::INITIALIZE)?;

        let capabilities = self.server_capabilities().await;
        let snapshot = self.registry.snapshot().await;

        let mut session = handle.session.lock().await;
        session.protocol_version = Some(req.protocol_version);
        session.client_info = Some(req.client_info);
        session.state = SessionState::Initialized;
        if let Some(hint) = req.compatibility_mode {
            session.compatibility_mode = hint;
        }
        if session.compatibility_mode {
            session.frozen_registry = Some(snapshot);
        }
        drop(session);

        let response = InitializeResponse::new(
            serde_json::to_value(&capabilities)
                .map_err(|e| GoblinError::Protocol(format!("failed to encode server capabilities: {e}")))?,
            self.server_info.clone(),
            None,
        );
        serde_json::to_value(&response)
            .map_err(|e| GoblinError::Protocol(format!("failed to encode initialize response: {e}")))
    }

    async fn server_capabilities(&self) -> ServerCapabilities {
        let tools = self.registry.has_kind(CapabilityKind::Tool).await;
        let prompts = self.registry.has_kind(CapabilityKind::Prompt).await;
        let resources = self.registry.has_kind(CapabilityKind::Resource).await;
        ServerCapabilities {
            experimental: None,
            logging: Some(LoggingCapabilities {}),
            tools: tools.then(ToolCapabilities::default),
            prompts: prompts.then(PromptCapabilities::default),
            resources: resources.then(|| ResourceCapabilities {
                subscribe: Some(true),
                list_changed: Some(true),
            }),
        }
    }

    async fn capability_view(&self, handle: &Arc<SessionHandle>) -> RegistrySnapshot {
        let session = handle.session.lock().await;
        if session.compatibility_mode {
            if let Some(frozen) = &session.frozen_registry {
                return frozen.clone();
            }
        }
        drop(session);
        self.registry.snapshot().await
    }

    async fn handle_list_tools(&self, handle: &Arc<SessionHandle>) -> GoblinResult<Value> {
        let snapshot = self.capability_view(handle).await;
        let tools: Vec<Tool> = snapshot.tools.iter().map(card_to_tool).collect();
        serde_json::to_value(ListToolsResponse { tools, next_cursor: None })
            .map_err(|e| GoblinError::Protocol(format!("failed to encode tools/list: {e}")))
    }

    async fn handle_list_prompts(&self, handle: &Arc<SessionHandle>) -> GoblinResult<Value> {
        let snapshot = self.capability_view(handle).await;
        let prompts: Vec<Prompt> = snapshot.prompts.iter().map(card_to_prompt).collect();
        serde_json::to_value(ListPromptsResponse { prompts, next_cursor: None })
            .map_err(|e| GoblinError::Protocol(format!("failed to encode prompts/list: {e}")))
    }

    async fn handle_list_resources(&self, handle: &Arc<SessionHandle>) -> GoblinResult<Value> {
        let snapshot = self.capability_view(handle).await;
        let resources: Vec<Resource> = snapshot.resources.iter().map(card_to_resource).collect();
        serde_json::to_value(ListResourcesResponse { resources, next_cursor: None })
            .map_err(|e| GoblinError::Protocol(format!("failed to encode resources/list: {e}")))
    }

    async fn handle_list_resource_templates(&self, handle: &Arc<SessionHandle>) -> GoblinResult<Value> {
        let snapshot = self.capability_view(handle).await;
        let resource_templates: Vec<ResourceTemplate> =
            snapshot.resource_templates.iter().map(card_to_resource_template).collect();
        serde_json::to_value(ListResourceTemplatesResponse { resource_templates, next_cursor: None })
            .map_err(|e| GoblinError::Protocol(format!("failed to encode resources/templates/list: {e}")))
    }

    async fn handle_call_tool(
        &self,
        handle: &Arc<SessionHandle>,
        params: Option<Value>,
        request_id: crate::protocol::RequestId,
    ) -> GoblinResult<Value> {
        let req: CallToolRequest = parse_params(params, methods::TOOLS_CALL)?;

        let (server_name, local_name) = self
            .registry
            .resolve(&req.name)
            .await
            .ok_or_else(|| GoblinError::Registry(RegistryError::UnknownCapability {
                name: req.name.clone(),
            }))?;

        if server_name == VIRTUAL_SERVER_NAME {
            let response = CallToolResponse::success(not_implemented_response(&local_name));
            return serde_json::to_value(response)
                .map_err(|e| GoblinError::Protocol(format!("failed to encode tools/call: {e}")));
        }

        let session_id = handle.session.lock().await.id;
        let ctx = CallContext {
            request_id,
            session_id,
            deadline: std::time::Duration::ZERO,
        };
        let response = self
            .router
            .call_tool(&ctx, &req.name, req.arguments)
            .await
            .map_err(GoblinError::Router)?;
        serde_json::to_value(response).map_err(|e| GoblinError::Protocol(format!("failed to encode tools/call: {e}")))
    }

    async fn handle_get_prompt(
        &self,
        handle: &Arc<SessionHandle>,
        params: Option<Value>,
        request_id: crate::protocol::RequestId,
    ) -> GoblinResult<Value> {
        let req: GetPromptRequest = parse_params(params, methods::PROMPTS_GET)?;
        let session_id = handle.session.lock().await.id;
        let ctx = CallContext {
            request_id,
            session_id,
            deadline: std::time::Duration::ZERO,
        };
        let response = self
            .router
            .get_prompt(&ctx, &req.name, req.arguments)
            .await
            .map_err(GoblinError::Router)?;
        serde_json::to_value(response).map_err(|e| GoblinError::Protocol(format!("failed to encode prompts/get: {e}")))
    }

    async fn handle_read_resource(
        &self,
        handle: &Arc<SessionHandle>,
        params: Option<Value>,
        request_id: crate::protocol::RequestId,
    ) -> GoblinResult<Value> {
        let req: ReadResourceRequest = parse_params(params, methods::RESOURCES_READ)?;
        let session_id = handle.session.lock().await.id;
        let ctx = CallContext {
            request_id,
            session_id,
            deadline: std::time::Duration::ZERO,
        };
        let response = self
            .router
            .read_resource(&ctx, req.uri.as_str())
            .await
            .map_err(GoblinError::Router)?;
        serde_json::to_value(response)
            .map_err(|e| GoblinError::Protocol(format!("failed to encode resources/read: {e}")))
    }

    /// Forwards the subscription to the owning backend and tracks the URI on
    /// the session so `resources/updated` fan-out only reaches subscribers
    /// (an explicit resolution of `spec.md`'s open question on who a
    /// subscription binds: the gateway forwards it, then multiplexes
    /// `updated` notifications by session subscription set).
    async fn handle_subscribe_resource(&self, handle: &Arc<SessionHandle>, params: Option<Value>) -> GoblinResult<Value> {
        let req: SubscribeResourceRequest = parse_params(params, methods::RESOURCES_SUBSCRIBE)?;
        let uri = req.uri.as_str().to_string();

        let (server_name, _) = self
            .registry
            .resolve(&uri)
            .await
            .ok_or_else(|| GoblinError::Registry(RegistryError::UnknownCapability { name: uri.clone() }))?;

        if server_name != VIRTUAL_SERVER_NAME {
            let client = self.router_pool_acquire(&server_name).await?;
            client.subscribe_resource(&uri).await.map_err(|e| {
                warn!(server = server_name, uri, error = %e, "backend rejected resource subscription");
                e
            })?;
        }

        handle.session.lock().await.subscriptions.insert(uri);
        Ok(serde_json::json!({}))
    }

    async fn handle_shutdown(&self, handle: &Arc<SessionHandle>) -> GoblinResult<Value> {
        handle.session.lock().await.state = SessionState::Closing;
        Ok(Value::Null)
    }

    async fn router_pool_acquire(&self, server_name: &str) -> GoblinResult<Arc<BackendClient>> {
        self.router.pool().acquire(server_name).await.map_err(GoblinError::Pool)
    }

    async fn forward_list_changed(&self, method: &str) {
        for id in self.sessions.ids() {
            let Some(handle) = self.sessions.get(&id) else { continue };
            let session = handle.session.lock().await;
            if session.compatibility_mode {
                continue;
            }
            drop(session);
            handle.notify(JsonRpcMessage::from_notification(method, None));
        }
    }

    async fn forward_resource_updated(&self, uri: &str) {
        for id in self.sessions.ids() {
            let Some(handle) = self.sessions.get(&id) else { continue };
            let session = handle.session.lock().await;
            if session.compatibility_mode || !session.subscriptions.contains(uri) {
                continue;
            }
            drop(session);
            handle.notify(JsonRpcMessage::from_notification(
                NOTIF_RESOURCES_UPDATED,
                Some(serde_json::json!({ "uri": uri })),
            ));
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, method: &str) -> GoblinResult<T> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| {
        GoblinError::Gateway(GatewayError::InvalidParams {
            method: method.to_string(),
            reason: e.to_string(),
        })
    })
}

fn card_to_tool(card: &CapabilityCard) -> Tool {
    Tool {
        name: card.qualified_name.clone(),
        description: Some(card.summary.clone()),
        input_schema: card
            .full_schema
            .clone()
            .unwrap_or_else(|| serde_json::json!({ "type": "object", "properties": {} })),
    }
}

fn card_to_prompt(card: &CapabilityCard) -> Prompt {
    Prompt {
        name: card.qualified_name.clone(),
        title: None,
        description: Some(card.summary.clone()),
        arguments: Vec::new(),
    }
}

fn card_to_resource(card: &CapabilityCard) -> Resource {
    Resource {
        uri: crate::protocol::Uri::new_unchecked(card.qualified_name.clone()),
        name: card.local_name.clone(),
        description: Some(card.summary.clone()),
        mime_type: None,
    }
}

fn card_to_resource_template(card: &CapabilityCard) -> ResourceTemplate {
    ResourceTemplate {
        uri_template: card.qualified_name.clone(),
        name: card.local_name.clone(),
        description: Some(card.summary.clone()),
        mime_type: None,
    }
}

/// Compose the JSON-RPC `error` object, attaching `{limit, preview}` as
/// `data` for a truncated tool result so the client can show partial output.
fn error_object(err: &GoblinError) -> Value {
    let mut obj = serde_json::json!({
        "code": err.json_rpc_code(),
        "message": err.json_rpc_message(),
    });
    if let GoblinError::Router(RouterError::OutputTooLarge { limit, preview, .. }) = err {
        obj["data"] = serde_json::json!({ "limit": limit, "preview": preview });
    }
    obj
}
