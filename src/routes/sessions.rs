use moka::future::Cache;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::Settings;
use crate::core::{Collaborators, EngineError, MatchLedger, SwipeEngine};
use crate::models::Profile;
use crate::services::{BackendSync, HttpBackend, KeyValueStore, LogNotifier, NoopHaptics};

/// Live per-user engines sharing one process-wide ledger.
///
/// Engines are created on first use and restored from storage. An evicted
/// engine loses nothing: its state is persisted after every swipe.
pub struct SessionRegistry {
    settings: Arc<Settings>,
    ledger: Arc<MatchLedger>,
    store: Arc<dyn KeyValueStore>,
    backend: Option<HttpBackend>,
    /// Candidate source for engines without a backend
    seeded: RwLock<Vec<Profile>>,
    engines: Cache<String, Arc<SwipeEngine>>,
}

impl SessionRegistry {
    pub fn new(
        settings: Arc<Settings>,
        ledger: Arc<MatchLedger>,
        store: Arc<dyn KeyValueStore>,
        backend: Option<HttpBackend>,
        max_sessions: u64,
    ) -> Self {
        Self {
            settings,
            ledger,
            store,
            backend,
            seeded: RwLock::new(Vec::new()),
            engines: Cache::builder().max_capacity(max_sessions).build(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ledger(&self) -> &Arc<MatchLedger> {
        &self.ledger
    }

    /// Engine for `user_id`, creating and restoring it if needed
    pub async fn engine(&self, user_id: &str) -> Result<Arc<SwipeEngine>, Arc<EngineError>> {
        self.engines
            .try_get_with(user_id.to_string(), self.create(user_id))
            .await
    }

    async fn create(&self, user_id: &str) -> Result<Arc<SwipeEngine>, EngineError> {
        let backend = self
            .backend
            .as_ref()
            .map(|b| Arc::new(b.for_user(user_id)) as Arc<dyn BackendSync>);
        let has_backend = backend.is_some();

        let collaborators = Collaborators {
            ledger: self.ledger.clone(),
            store: self.store.clone(),
            backend,
            notifier: Arc::new(LogNotifier),
            haptics: Arc::new(NoopHaptics),
        };
        let engine = SwipeEngine::new(self.settings.engine_config(user_id), collaborators);
        engine.load_profiles(self.seeded.read().clone());
        engine.restore().await?;

        if has_backend {
            engine.refresh_feed().await?;
        }

        tracing::info!("Started swipe session for {}", user_id);
        Ok(Arc::new(engine))
    }

    /// Replace the seeded candidates for every current and future session
    pub fn seed_profiles(&self, profiles: Vec<Profile>) -> usize {
        let count = profiles.len();
        *self.seeded.write() = profiles.clone();
        for (_, engine) in self.engines.iter() {
            engine.load_profiles(profiles.clone());
        }
        tracing::info!("Seeded {} candidate profiles", count);
        count
    }

    pub fn session_count(&self) -> u64 {
        self.engines.entry_count()
    }
}
