//! Capability registry: the union of capabilities across Ready backends
//!
//! One `tokio::sync::RwLock<RegistryState>` guards the card maps (§5: "many
//! readers ... may proceed concurrently; writers ... take an exclusive
//! section"). Writers hold the lock only long enough to replace the cards
//! for one backend; the backend I/O that produced those cards (`list*`
//! calls against a `BackendClient`) happens before the lock is taken.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use crate::backend::{Backend, BackendClient};
use crate::config::Alias;
use crate::registry::card::{CapabilityCard, CapabilityKind};
use crate::registry::error::{RegistryError, RegistryResult};

/// Default grace period unavailable cards are retained for after their
/// backend leaves Ready, before being dropped outright.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Change events the gateway server subscribes to for client notification.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    BackendSynced { server: String },
    BackendEvicting { server: String },
    BackendEvicted { server: String },
    ToolsChanged,
    PromptsChanged,
    ResourcesChanged,
}

#[derive(Default)]
struct RegistryState {
    tools: HashMap<String, CapabilityCard>,
    prompts: HashMap<String, CapabilityCard>,
    resources: HashMap<String, CapabilityCard>,
    resource_templates: HashMap<String, CapabilityCard>,
    aliases: HashMap<String, (String, String)>,
}

/// A consistent point-in-time view, used to freeze a session's capability
/// set in compatibility mode (`spec.md` §4.5).
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub tools: Vec<CapabilityCard>,
    pub prompts: Vec<CapabilityCard>,
    pub resources: Vec<CapabilityCard>,
    pub resource_templates: Vec<CapabilityCard>,
}

pub struct Registry {
    state: RwLock<RegistryState>,
    events: broadcast::Sender<RegistryEvent>,
    grace_period: Duration,
    eviction_tasks: tokio::sync::Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Self::with_grace_period(DEFAULT_GRACE_PERIOD)
    }

    pub fn with_grace_period(grace_period: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            state: RwLock::new(RegistryState::default()),
            events,
            grace_period,
            eviction_tasks: tokio::sync::Mutex::new(HashMap::new()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub async fn set_aliases(&self, aliases: &HashMap<String, Alias>) {
        let mut state = self.state.write().await;
        state.aliases = aliases
            .iter()
            .map(|(alias, a)| (alias.clone(), (a.server_name.clone(), a.local_name.clone())))
            .collect();
    }

    /// Resolve an external name (alias or qualified name) to the backend
    /// call it targets. Step 1 of the router's dispatch per `spec.md` §4.6.
    /// Refuses to resolve a card marked unavailable (mid-eviction grace
    /// period), so the router never dispatches to a backend that just left
    /// Ready, even though its card is still present for the grace window.
    pub async fn resolve(&self, name: &str) -> Option<(String, String)> {
        let state = self.state.read().await;
        if let Some((server, local)) = state.aliases.get(name) {
            for map in [&state.tools, &state.prompts, &state.resources, &state.resource_templates] {
                if let Some(card) = map
                    .values()
                    .find(|c| &c.server_name == server && &c.local_name == local)
                {
                    return card.available.then(|| (server.clone(), local.clone()));
                }
            }
            return None;
        }
        for map in [&state.tools, &state.prompts, &state.resources, &state.resource_templates] {
            if let Some(card) = map.get(name) {
                return card
                    .available
                    .then(|| (card.server_name.clone(), card.local_name.clone()));
            }
        }
        None
    }

    pub async fn describe(&self, qualified_name: &str) -> RegistryResult<CapabilityCard> {
        let state = self.state.read().await;
        for map in [&state.tools, &state.prompts, &state.resources, &state.resource_templates] {
            if let Some(card) = map.get(qualified_name) {
                return Ok(card.clone());
            }
        }
        Err(RegistryError::UnknownCapability {
            name: qualified_name.to_string(),
        })
    }

    /// Replace the whole virtual tool set in one step: drop every card
    /// currently owned by the virtual pseudo-server, then install `cards`.
    /// Used by the reconciler on reload, when the declared set may have
    /// shrunk as well as grown.
    pub async fn replace_virtual_tools(&self, cards: Vec<CapabilityCard>) {
        let mut state = self.state.write().await;
        state
            .tools
            .retain(|_, card| card.server_name != crate::registry::virtual_tools::VIRTUAL_SERVER_NAME);
        for card in cards {
            state.tools.insert(card.qualified_name.clone(), card);
        }
        drop(state);
        let _ = self.events.send(RegistryEvent::ToolsChanged);
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read().await;
        RegistrySnapshot {
            tools: state.tools.values().cloned().collect(),
            prompts: state.prompts.values().cloned().collect(),
            resources: state.resources.values().cloned().collect(),
            resource_templates: state.resource_templates.values().cloned().collect(),
        }
    }

    /// Whether any registered card declares a given capability kind, used
    /// by the gateway server to compute its union capability set.
    pub async fn has_kind(&self, kind: CapabilityKind) -> bool {
        let state = self.state.read().await;
        match kind {
            CapabilityKind::Tool => !state.tools.is_empty(),
            CapabilityKind::Prompt => !state.prompts.is_empty(),
            CapabilityKind::Resource => !state.resources.is_empty() || !state.resource_templates.is_empty(),
            CapabilityKind::ResourceTemplate => !state.resource_templates.is_empty(),
        }
    }

    /// Query a just-Ready (or just-changed) backend and replace its cards.
    /// Cancels any pending eviction for this backend. Only queries `list_*`
    /// methods for capabilities the backend actually negotiated at
    /// `initialize` (`spec.md` §4.3): a backend that never advertised a
    /// capability is never asked to list it, and never gets cards for it.
    pub async fn sync_backend(&self, server_name: &str, client: &BackendClient, backend: &Backend) {
        if let Some(handle) = self.eviction_tasks.lock().await.remove(server_name) {
            handle.abort();
        }

        let tools = if backend.supports(CapabilityKind::Tool) {
            client.list_tools().await.map(|r| r.tools).unwrap_or_default()
        } else {
            Vec::new()
        };
        let prompts = if backend.supports(CapabilityKind::Prompt) {
            client.list_prompts().await.map(|r| r.prompts).unwrap_or_default()
        } else {
            Vec::new()
        };
        let resources = if backend.supports(CapabilityKind::Resource) {
            client.list_resources().await.map(|r| r.resources).unwrap_or_default()
        } else {
            Vec::new()
        };
        let templates = if backend.supports(CapabilityKind::ResourceTemplate) {
            client
                .list_resource_templates()
                .await
                .map(|r| r.resource_templates)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut state = self.state.write().await;

        state.tools.retain(|_, card| card.server_name != server_name);
        for tool in tools {
            let qualified = format!("{server_name}_{}", tool.name);
            state.tools.insert(
                qualified.clone(),
                CapabilityCard::new(
                    CapabilityKind::Tool,
                    server_name,
                    &tool.name,
                    qualified,
                    tool.description.unwrap_or_default(),
                    Some(tool.input_schema),
                ),
            );
        }

        state.prompts.retain(|_, card| card.server_name != server_name);
        for prompt in prompts {
            let qualified = format!("{server_name}_{}", prompt.name);
            state.prompts.insert(
                qualified.clone(),
                CapabilityCard::new(
                    CapabilityKind::Prompt,
                    server_name,
                    &prompt.name,
                    qualified,
                    prompt.description.unwrap_or_default(),
                    None,
                ),
            );
        }

        state.resources.retain(|_, card| card.server_name != server_name);
        for resource in resources {
            let uri = resource.uri.as_str().to_string();
            if let Some(existing) = state.resources.get(&uri) {
                warn!(
                    uri,
                    existing_server = %existing.server_name,
                    losing_server = server_name,
                    "resource URI collision, first writer wins"
                );
                continue;
            }
            state.resources.insert(
                uri.clone(),
                CapabilityCard::new(
                    CapabilityKind::Resource,
                    server_name,
                    &resource.name,
                    uri,
                    resource.description.unwrap_or_default(),
                    None,
                ),
            );
        }

        state
            .resource_templates
            .retain(|_, card| card.server_name != server_name);
        for template in templates {
            let uri = template.uri_template.clone();
            state.resource_templates.insert(
                uri.clone(),
                CapabilityCard::new(
                    CapabilityKind::ResourceTemplate,
                    server_name,
                    &template.uri_template,
                    uri,
                    template.description.clone().unwrap_or_default(),
                    None,
                ),
            );
        }

        drop(state);
        debug!(server = server_name, "registry synced");
        let _ = self.events.send(RegistryEvent::BackendSynced {
            server: server_name.to_string(),
        });
        let _ = self.events.send(RegistryEvent::ToolsChanged);
        let _ = self.events.send(RegistryEvent::PromptsChanged);
        let _ = self.events.send(RegistryEvent::ResourcesChanged);
    }

    /// Mark a backend's cards unavailable and schedule their removal after
    /// the grace period, unless `sync_backend` cancels it first.
    pub async fn evict_backend(self: &Arc<Self>, server_name: String) {
        let registry = Arc::clone(self);
        let grace = self.grace_period;
        let task_name = server_name.clone();

        let task = tokio::spawn(async move {
            {
                let mut state = registry.state.write().await;
                for map in [
                    &mut state.tools,
                    &mut state.prompts,
                    &mut state.resources,
                    &mut state.resource_templates,
                ] {
                    for card in map.values_mut() {
                        if card.server_name == task_name {
                            card.available = false;
                        }
                    }
                }
            }
            let _ = registry.events.send(RegistryEvent::BackendEvicting {
                server: task_name.clone(),
            });

            tokio::time::sleep(grace).await;

            let mut state = registry.state.write().await;
            state.tools.retain(|_, c| c.server_name != task_name);
            state.prompts.retain(|_, c| c.server_name != task_name);
            state.resources.retain(|_, c| c.server_name != task_name);
            state.resource_templates.retain(|_, c| c.server_name != task_name);
            drop(state);
            let _ = registry.events.send(RegistryEvent::BackendEvicted {
                server: task_name,
            });
        });

        self.eviction_tasks.lock().await.insert(server_name, task);
    }
}
