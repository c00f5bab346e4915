//! Application state and composition.
//!
//! The host constructs one `App` per server instance, hands it the port
//! implementations, and drives it through the lifecycle callbacks. The core
//! never reaches into the host beyond the injected ports.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use beacon_domain::CallGroupRegistry;

use crate::infrastructure::ports::{
    ChatPort, FactionPort, GroupStorePort, MarkerPort, RosterPort,
};
use crate::infrastructure::PluginConfig;
use crate::use_cases::{DistressOps, GroupOps};

/// Main application state.
///
/// Holds the shared registry, the configuration, and the use cases. Passed to
/// the host's command dispatcher.
pub struct App {
    config: RwLock<PluginConfig>,
    config_path: PathBuf,
    registry: Arc<RwLock<CallGroupRegistry>>,
    store: Arc<dyn GroupStorePort>,
    pub groups: GroupOps,
    pub distress: DistressOps,
    server_online: AtomicBool,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// State starts empty; `start` loads it from storage.
    pub fn new(
        roster: Arc<dyn RosterPort>,
        factions: Arc<dyn FactionPort>,
        chat: Arc<dyn ChatPort>,
        markers: Arc<dyn MarkerPort>,
        store: Arc<dyn GroupStorePort>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        let registry = Arc::new(RwLock::new(CallGroupRegistry::new()));
        let groups = GroupOps::new(
            registry.clone(),
            store.clone(),
            roster.clone(),
            factions.clone(),
        );
        let distress = DistressOps::new(registry.clone(), roster, factions, chat, markers);
        Self {
            config: RwLock::new(PluginConfig::default()),
            config_path: config_path.into(),
            registry,
            store,
            groups,
            distress,
            server_online: AtomicBool::new(false),
        }
    }

    /// Load configuration and registry state. Called once by the host before
    /// any command is dispatched.
    pub async fn start(&self) -> anyhow::Result<()> {
        let mut config = PluginConfig::load_or_create(&self.config_path).await?;
        config.apply_env_overrides();
        *self.config.write().await = config;

        match self.store.load().await? {
            Some(loaded) => {
                let mut registry = self.registry.write().await;
                *registry = loaded;
                tracing::info!(
                    players = registry.players().len(),
                    "Call group registry loaded"
                );
            }
            None => {
                // First run: write the empty snapshot so the file exists and
                // later saves are plain replacements.
                let registry = self.registry.read().await;
                self.store.save(&registry).await?;
                tracing::info!("Initialized empty call group registry");
            }
        }
        Ok(())
    }

    /// Host callback: the game session finished loading.
    pub fn session_loaded(&self) {
        self.server_online.store(true, Ordering::SeqCst);
        tracing::info!("Session loaded");
    }

    /// Host callback: the game session is shutting down.
    pub fn session_unloading(&self) {
        self.server_online.store(false, Ordering::SeqCst);
        tracing::info!("Session unloading");
    }

    pub fn is_server_online(&self) -> bool {
        self.server_online.load(Ordering::SeqCst)
    }

    /// Current state of the global feature toggle.
    pub async fn is_enabled(&self) -> bool {
        self.config.read().await.enabled
    }

    /// Flip the feature toggle and persist the configuration. A failed config
    /// save is logged, not propagated; the toggle still applies.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut config = self.config.write().await;
        if config.enabled == enabled {
            return;
        }
        config.enabled = enabled;
        if let Err(e) = config.save(&self.config_path).await {
            tracing::warn!(error = %e, "Configuration failed to save");
        }
        tracing::info!(enabled, "Feature toggle changed");
    }

    pub async fn protect_builtin_groups(&self) -> bool {
        self.config.read().await.protect_builtin_groups
    }
}
