//! File watcher driving config hot-reload
//!
//! Grounded in the `mcp-gateway` reference implementation's own
//! `ConfigWatcher`: a `notify` filesystem watcher feeding a channel, debounced
//! by a `tokio::time::interval` tick racing that channel and an explicit
//! shutdown signal, so a burst of writes (editors that write-then-rename)
//! collapses into a single reload attempt.

// Layer 1: Standard library imports
use std::path::{Path, PathBuf};
use std::time::Duration;

// Layer 2: Third-party crate imports
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, warn};

// Layer 3: Internal module imports
use crate::config::error::ConfigError;
use crate::config::model::ConfigDocument;
use crate::config::validate::{apply_env_overrides, parse, validate};
use crate::config::ConfigSnapshot;

/// Debounce window for collapsing bursts of filesystem events into one
/// reload attempt.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Outcome of one watch-triggered reload attempt, delivered to whoever is
/// driving the reconciler loop.
pub enum ReloadOutcome {
    /// Parsed and validated successfully.
    Applied(ConfigSnapshot),
    /// Parse or validation failed; the caller should keep its current snapshot.
    Rejected(ConfigError),
}

/// Watches a config file and emits debounced, parsed-and-validated reload
/// attempts.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    events_rx: mpsc::UnboundedReceiver<()>,
}

impl ConfigWatcher {
    /// Start watching `path`. Errors if the underlying OS watch cannot be
    /// established (missing parent directory, permission denied, etc.).
    pub fn start(path: impl AsRef<Path>) -> notify::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if res.is_ok() {
                let _ = events_tx.send(());
            }
        })?;

        // Watch the parent directory, not the file itself: editors commonly
        // replace the file via rename, which would otherwise orphan a
        // file-level watch.
        let watch_dir = path.parent().unwrap_or_else(|| Path::new("."));
        watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path,
            _watcher: watcher,
            events_rx,
        })
    }

    /// Run the debounce loop, calling `on_reload` with the parsed-and-validated
    /// outcome each time a burst of filesystem activity settles. Returns when
    /// `shutdown` fires.
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
        mut on_reload: impl FnMut(ReloadOutcome) + Send,
    ) {
        let mut pending = false;
        let mut debounce = tokio::time::interval(DEBOUNCE);
        debounce.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!(path = %self.path.display(), "config watcher shutting down");
                    return;
                }
                event = self.events_rx.recv() => {
                    match event {
                        Some(()) => pending = true,
                        None => return,
                    }
                }
                _ = debounce.tick(), if pending => {
                    pending = false;
                    on_reload(self.reload_once());
                }
            }
        }
    }

    fn reload_once(&self) -> ReloadOutcome {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read config file during reload");
                return ReloadOutcome::Rejected(ConfigError::Io {
                    path: self.path.display().to_string(),
                    source: std::sync::Arc::new(e),
                });
            }
        };

        match reload_from_str(&raw) {
            Ok(snapshot) => ReloadOutcome::Applied(snapshot),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "config reload rejected");
                ReloadOutcome::Rejected(e)
            }
        }
    }
}

/// Parse, env-overlay, and validate a config document from raw text. Shared
/// by the file watcher and SIGHUP reload path so both exercise identical
/// logic.
pub fn reload_from_str(raw: &str) -> Result<ConfigSnapshot, ConfigError> {
    let mut doc: ConfigDocument = parse(raw)?;
    apply_env_overrides(&mut doc);
    validate(&doc)
}
