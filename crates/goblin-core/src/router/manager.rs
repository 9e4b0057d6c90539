//! Router: translates a qualified capability name into a backend call
//!
//! Dispatch steps per `spec.md` §4.6: (1) alias resolution via the
//! registry, (2) route-cache lookup, (3) on miss, re-resolve and populate
//! the cache, (4) acquire the backend from the pool, (5) forward with a
//! deadline, (6) enforce the output size limit, (7) return. Every call is
//! wrapped in one `tracing::info_span!` and emits a single structured log
//! line on completion, carrying request id, session id, server, tool,
//! latency and outcome.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use serde_json::Value;
use tracing::{info, info_span, Instrument};

// Layer 3: Internal module imports
use crate::pool::Pool;
use crate::protocol::{CallToolResponse, Content, GetPromptResponse, ReadResourceResponse, RequestId};
use crate::registry::Registry;
use crate::router::cache::{RouteCache, RouteEntry};
use crate::router::error::{RouterError, RouterResult};

/// Everything identifying one in-flight call, for logging and cancellation.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub request_id: RequestId,
    pub session_id: uuid::Uuid,
    pub deadline: Duration,
}

pub struct Router {
    registry: Arc<Registry>,
    pool: Arc<Pool>,
    cache: RouteCache,
    output_size_limit: usize,
    default_timeout: Duration,
}

impl Router {
    pub fn new(
        registry: Arc<Registry>,
        pool: Arc<Pool>,
        output_size_limit: usize,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            pool,
            cache: RouteCache::new(),
            output_size_limit,
            default_timeout,
        }
    }

    /// Access to the underlying pool, for gateway operations (e.g.
    /// `resources/subscribe`) that forward directly to a backend rather than
    /// going through `call_tool`/`get_prompt`/`read_resource`.
    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn invalidate_server(&self, server_name: &str) {
        self.cache.invalidate_server(server_name);
    }

    async fn resolve(&self, qualified_name: &str) -> RouterResult<RouteEntry> {
        if let Some(entry) = self.cache.get(qualified_name) {
            return Ok(entry);
        }
        let (server_name, local_name) = self
            .registry
            .resolve(qualified_name)
            .await
            .ok_or_else(|| RouterError::UnknownCapability {
                name: qualified_name.to_string(),
            })?;
        let entry = RouteEntry { server_name, local_name };
        self.cache.insert(qualified_name.to_string(), entry.clone());
        Ok(entry)
    }

    pub async fn call_tool(
        &self,
        ctx: &CallContext,
        qualified_name: &str,
        arguments: Value,
    ) -> RouterResult<CallToolResponse> {
        let span = info_span!(
            "router.call_tool",
            request_id = %ctx.request_id,
            session_id = %ctx.session_id,
            tool = qualified_name,
        );
        async move {
            let started = Instant::now();
            let route = self.resolve(qualified_name).await?;
            let outcome = self.dispatch_call_tool(ctx, &route, arguments).await;
            let latency = started.elapsed();
            match &outcome {
                Ok(_) => info!(server = %route.server_name, local = %route.local_name, ?latency, "call succeeded"),
                Err(err) => info!(server = %route.server_name, local = %route.local_name, ?latency, error = %err, "call failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn dispatch_call_tool(
        &self,
        ctx: &CallContext,
        route: &RouteEntry,
        arguments: Value,
    ) -> RouterResult<CallToolResponse> {
        let client = self
            .pool
            .acquire(&route.server_name)
            .await
            .map_err(|e| RouterError::BackendUnavailable(e.to_string()))?;

        let timeout = if ctx.deadline.is_zero() {
            self.default_timeout
        } else {
            ctx.deadline
        };

        let result = match tokio::time::timeout(timeout, client.call_tool(&route.local_name, arguments)).await {
            Err(_) => {
                return Err(RouterError::Timeout {
                    name: route.local_name.clone(),
                    deadline: timeout,
                })
            }
            Ok(Err(e)) => {
                self.pool.mark_call_failed(&route.server_name).await;
                return Err(RouterError::BackendUnavailable(e.to_string()));
            }
            Ok(Ok(result)) => result,
        };

        self.enforce_output_limit(&route.local_name, result)
    }

    pub async fn get_prompt(
        &self,
        ctx: &CallContext,
        qualified_name: &str,
        arguments: std::collections::HashMap<String, String>,
    ) -> RouterResult<GetPromptResponse> {
        let route = self.resolve(qualified_name).await?;
        let client = self
            .pool
            .acquire(&route.server_name)
            .await
            .map_err(|e| RouterError::BackendUnavailable(e.to_string()))?;
        let timeout = if ctx.deadline.is_zero() { self.default_timeout } else { ctx.deadline };
        match tokio::time::timeout(timeout, client.get_prompt(&route.local_name, arguments)).await {
            Err(_) => Err(RouterError::Timeout { name: route.local_name.clone(), deadline: timeout }),
            Ok(Err(e)) => {
                self.pool.mark_call_failed(&route.server_name).await;
                Err(RouterError::BackendUnavailable(e.to_string()))
            }
            Ok(Ok(result)) => Ok(result),
        }
    }

    pub async fn read_resource(
        &self,
        ctx: &CallContext,
        uri: &str,
    ) -> RouterResult<ReadResourceResponse> {
        let route = self.resolve(uri).await?;
        let client = self
            .pool
            .acquire(&route.server_name)
            .await
            .map_err(|e| RouterError::BackendUnavailable(e.to_string()))?;
        let timeout = if ctx.deadline.is_zero() { self.default_timeout } else { ctx.deadline };
        match tokio::time::timeout(timeout, client.read_resource(uri)).await {
            Err(_) => Err(RouterError::Timeout { name: uri.to_string(), deadline: timeout }),
            Ok(Err(e)) => {
                self.pool.mark_call_failed(&route.server_name).await;
                Err(RouterError::BackendUnavailable(e.to_string()))
            }
            Ok(Ok(result)) => Ok(result),
        }
    }

    /// Truncate an over-limit result into an `OutputTooLarge` error carrying
    /// a preview, rather than silently dropping content (`spec.md` §4.6).
    fn enforce_output_limit(
        &self,
        name: &str,
        response: CallToolResponse,
    ) -> RouterResult<CallToolResponse> {
        let encoded = serde_json::to_string(&response.content).unwrap_or_default();
        if encoded.len() <= self.output_size_limit {
            return Ok(response);
        }
        let preview: String = encoded.chars().take(256).collect();
        Err(RouterError::OutputTooLarge {
            name: name.to_string(),
            limit: self.output_size_limit,
            preview,
        })
    }
}

/// Text content shown to a caller whose result was truncated, used by the
/// gateway layer when surfacing `OutputTooLarge` back over JSON-RPC.
pub fn truncated_preview_content(preview: &str) -> Vec<Content> {
    vec![Content::text(preview.to_string())]
}
