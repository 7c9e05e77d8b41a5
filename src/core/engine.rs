use chrono::Duration;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::error::EngineError;
use crate::core::feed::{FeedManager, FeedView};
use crate::core::ledger::{LedgerSnapshot, MatchLedger};
use crate::core::notify::NotificationTrigger;
use crate::core::processor::{SwipeOutcome, SwipeProcessor};
use crate::models::{
    Match, PendingLike, Profile, SavedListing, SearchFilter, SwipeDirection, SwipeRecord,
};
use crate::services::{
    load_json, save_json, BackendSync, Haptics, KeyValueStore, LogNotifier, MemoryStore,
    NoopHaptics, Notifier, StorageKey,
};

#[cfg(any(test, feature = "testkit"))]
use crate::core::processor::ReciprocationOracle;

/// Per-user engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub user_id: String,
    pub filter: SearchFilter,
    /// Show profiles again even after they were swiped
    pub ignore_swipe_history: bool,
    pub duplicate_window_ms: u64,
    /// Storage key the ledger snapshot lives under
    pub ledger_key: String,
    /// Load the ledger snapshot on `restore`; off when the ledger is shared
    /// and restored by its owner
    pub restore_ledger: bool,
}

impl EngineConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            ledger_key: StorageKey::ledger(&user_id),
            user_id,
            filter: SearchFilter::default(),
            ignore_swipe_history: false,
            duplicate_window_ms: 500,
            restore_ledger: true,
        }
    }
}

/// Everything the engine talks to outside its own state
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<MatchLedger>,
    pub store: Arc<dyn KeyValueStore>,
    pub backend: Option<Arc<dyn BackendSync>>,
    pub notifier: Arc<dyn Notifier>,
    pub haptics: Arc<dyn Haptics>,
}

impl Collaborators {
    /// Offline collaborators: private ledger, in-memory storage, log-only feedback
    pub fn local() -> Self {
        Self {
            ledger: Arc::new(MatchLedger::new()),
            store: Arc::new(MemoryStore::new()),
            backend: None,
            notifier: Arc::new(LogNotifier),
            haptics: Arc::new(NoopHaptics),
        }
    }
}

/// Swipe engine for one signed-in user.
///
/// Every swipe is applied locally first; persistence and backend sync are
/// best-effort and never block the next swipe.
pub struct SwipeEngine {
    config: EngineConfig,
    ledger: Arc<MatchLedger>,
    feed: Arc<FeedManager>,
    processor: SwipeProcessor,
    store: Arc<dyn KeyValueStore>,
    backend: Option<Arc<dyn BackendSync>>,
    sync_queue: Mutex<Vec<SwipeRecord>>,
}

impl SwipeEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let feed = Arc::new(FeedManager::new(
            config.user_id.clone(),
            config.filter.clone(),
            config.ignore_swipe_history,
        ));
        let processor = SwipeProcessor::new(
            config.user_id.clone(),
            collaborators.ledger.clone(),
            feed.clone(),
            collaborators.haptics,
            NotificationTrigger::new(collaborators.notifier),
            Duration::milliseconds(config.duplicate_window_ms as i64),
        );

        Self {
            config,
            ledger: collaborators.ledger,
            feed,
            processor,
            store: collaborators.store,
            backend: collaborators.backend,
            sync_queue: Mutex::new(Vec::new()),
        }
    }

    #[cfg(any(test, feature = "testkit"))]
    pub fn with_oracle(mut self, oracle: Arc<dyn ReciprocationOracle>) -> Self {
        self.processor = self.processor.with_oracle(oracle);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn ledger(&self) -> &Arc<MatchLedger> {
        &self.ledger
    }

    /// Commit a swipe on a profile from the current source list
    pub async fn swipe(
        &self,
        profile_id: &str,
        direction: SwipeDirection,
    ) -> Result<SwipeOutcome, EngineError> {
        let profile = self
            .feed
            .profile(profile_id)
            .ok_or_else(|| EngineError::UnknownProfile(profile_id.to_string()))?;

        let outcome = self.processor.process(&profile, direction);
        let action = match outcome.action() {
            Some(action) => action,
            None => return Ok(outcome),
        };

        if let Some(backend) = &self.backend {
            match backend.submit_swipe(profile_id, action).await {
                Ok(record) => tracing::debug!("Backend acknowledged swipe {}", record.id),
                Err(e) => {
                    tracing::warn!("Swipe sync failed for {}, queued for retry: {}", profile_id, e);
                    self.sync_queue
                        .lock()
                        .push(SwipeRecord::new(&self.config.user_id, profile_id, action));
                }
            }
        }

        if let Err(e) = self.persist().await {
            tracing::warn!("Failed to persist state for {}: {}", self.config.user_id, e);
        }

        Ok(outcome)
    }

    /// Commit a swipe whose direction arrived as text
    pub async fn swipe_named(
        &self,
        profile_id: &str,
        direction: &str,
    ) -> Result<SwipeOutcome, EngineError> {
        let direction: SwipeDirection = direction.parse().map_err(|e| {
            tracing::error!("Rejected swipe on {}: {}", profile_id, e);
            e
        })?;
        self.swipe(profile_id, direction).await
    }

    /// Retry queued swipes, pull candidates and matches, and restart the feed.
    ///
    /// Backend failures keep the current source and matches.
    pub async fn refresh_feed(&self) -> Result<FeedView, EngineError> {
        if let Some(backend) = &self.backend {
            self.flush_sync_queue(backend.as_ref()).await;

            match backend.fetch_candidate_profiles(&self.feed.filter()).await {
                Ok(profiles) => self.feed.replace_source(profiles),
                Err(e) => tracing::warn!("Keeping current candidates, fetch failed: {}", e),
            }

            match backend.fetch_matches().await {
                Ok(matches) => {
                    let merged = matches
                        .into_iter()
                        .filter(|m| m.involves(&self.config.user_id))
                        .filter_map(|m| self.ledger.merge_remote(m))
                        .count();
                    tracing::debug!("Merged {} remote matches for {}", merged, self.config.user_id);
                }
                Err(e) => tracing::warn!("Keeping local matches, fetch failed: {}", e),
            }

            self.persist().await?;
        }

        Ok(self.feed.refresh(&self.matched_ids()))
    }

    async fn flush_sync_queue(&self, backend: &dyn BackendSync) {
        let queued = std::mem::take(&mut *self.sync_queue.lock());
        if queued.is_empty() {
            return;
        }

        let mut remaining = Vec::new();
        for record in queued {
            if let Err(e) = backend.submit_swipe(&record.target_user_id, record.action).await {
                tracing::warn!("Retry of swipe on {} failed: {}", record.target_user_id, e);
                remaining.push(record);
            }
        }

        if !remaining.is_empty() {
            tracing::info!("{} swipes still waiting for sync", remaining.len());
        }
        // Swipes queued while flushing go after the ones that failed again
        let mut queue = self.sync_queue.lock();
        remaining.append(&mut queue);
        *queue = remaining;
    }

    /// Load persisted ledger, history, saved listings and sync queue
    pub async fn restore(&self) -> Result<(), EngineError> {
        let store = self.store.as_ref();
        let user_id = &self.config.user_id;

        if self.config.restore_ledger {
            if let Some(snapshot) =
                load_json::<LedgerSnapshot>(store, &self.config.ledger_key).await?
            {
                self.ledger.restore(snapshot);
            }
        }
        if let Some(swiped) = load_json::<Vec<String>>(store, &StorageKey::swiped(user_id)).await? {
            self.feed.restore_history(swiped);
        }
        if let Some(saved) =
            load_json::<Vec<SavedListing>>(store, &StorageKey::saved(user_id)).await?
        {
            self.processor.restore_saved(saved);
        }
        if let Some(queue) =
            load_json::<Vec<SwipeRecord>>(store, &StorageKey::sync_queue(user_id)).await?
        {
            *self.sync_queue.lock() = queue;
        }

        tracing::info!("Restored swipe state for {}", user_id);
        Ok(())
    }

    pub async fn persist(&self) -> Result<(), EngineError> {
        let store = self.store.as_ref();
        let user_id = &self.config.user_id;

        self.ledger.save_to(store, &self.config.ledger_key).await?;
        save_json(store, &StorageKey::swiped(user_id), &self.feed.swiped_ids()).await?;
        save_json(store, &StorageKey::saved(user_id), &self.processor.saved_listings()).await?;
        let queue = self.sync_queue.lock().clone();
        save_json(store, &StorageKey::sync_queue(user_id), &queue).await?;
        Ok(())
    }

    /// Forget every swipe locally and, best-effort, on the backend
    pub async fn reset_history(&self) -> Result<FeedView, EngineError> {
        self.feed.clear_history();
        self.sync_queue.lock().clear();

        if let Some(backend) = &self.backend {
            if let Err(e) = backend.clear_all_swipes().await {
                tracing::warn!("Remote swipe history not cleared: {}", e);
            }
        }

        let user_id = &self.config.user_id;
        self.store.remove(&StorageKey::swiped(user_id)).await?;
        self.store.remove(&StorageKey::sync_queue(user_id)).await?;

        Ok(self.feed.refresh(&self.matched_ids()))
    }

    pub fn set_filter(&self, filter: SearchFilter) -> FeedView {
        self.feed.set_filter(filter);
        self.feed.refresh(&self.matched_ids())
    }

    /// Replace the candidate source without touching the backend
    pub fn load_profiles(&self, profiles: Vec<Profile>) {
        self.feed.replace_source(profiles);
    }

    pub fn feed(&self) -> FeedView {
        self.feed.get_feed(&self.matched_ids())
    }

    /// Profile from the current candidate source
    pub fn feed_profile(&self, profile_id: &str) -> Option<Profile> {
        self.feed.profile(profile_id)
    }

    pub fn current_profile(&self) -> Option<Profile> {
        self.feed.current_profile(&self.matched_ids())
    }

    pub fn matches(&self) -> Vec<Match> {
        self.ledger.get_matches(&self.config.user_id)
    }

    /// People who liked this user and are still waiting
    pub fn pending_likes(&self) -> Vec<PendingLike> {
        self.ledger.get_pending_likes(&self.config.user_id)
    }

    pub fn sent_likes(&self) -> Vec<PendingLike> {
        self.ledger.get_sent_likes(&self.config.user_id)
    }

    pub fn saved_listings(&self) -> Vec<SavedListing> {
        self.processor.saved_listings()
    }

    pub fn queued_swipes(&self) -> Vec<SwipeRecord> {
        self.sync_queue.lock().clone()
    }

    pub async fn mark_read(&self, match_id: &str) -> Result<Match, EngineError> {
        self.own_match(match_id)?;
        let m = self.ledger.mark_read(match_id)?;
        self.persist_ledger().await;
        Ok(m)
    }

    pub async fn delete_match(&self, match_id: &str) -> Result<Match, EngineError> {
        self.own_match(match_id)?;
        let m = self.ledger.delete_match(match_id)?;
        self.persist_ledger().await;
        Ok(m)
    }

    pub async fn attach_conversation(
        &self,
        match_id: &str,
        conversation_id: &str,
    ) -> Result<Match, EngineError> {
        self.own_match(match_id)?;
        let m = self.ledger.attach_conversation(match_id, conversation_id)?;
        self.persist_ledger().await;
        Ok(m)
    }

    /// Matches of other users are reported as missing
    fn own_match(&self, match_id: &str) -> Result<Match, EngineError> {
        self.ledger
            .get_match(match_id)
            .filter(|m| m.involves(&self.config.user_id))
            .ok_or_else(|| EngineError::MatchNotFound(match_id.to_string()))
    }

    async fn persist_ledger(&self) {
        if let Err(e) = self.ledger.save_to(self.store.as_ref(), &self.config.ledger_key).await {
            tracing::warn!("Failed to persist ledger: {}", e);
        }
    }

    fn matched_ids(&self) -> HashSet<String> {
        self.ledger.matched_ids(&self.config.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, SwipeAction};
    use crate::services::StorageError;
    use crate::testkit::{sample_profiles, seeker, StubBackend};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose first ledger write takes 100ms
    #[derive(Default)]
    struct StallingStore {
        inner: MemoryStore,
        stalled: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for StallingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
            if key.starts_with("ledger:") && !self.stalled.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }
    }

    fn engine_with(backend: Option<Arc<StubBackend>>, store: Arc<MemoryStore>) -> SwipeEngine {
        let collaborators = Collaborators {
            store,
            backend: backend.map(|b| b as Arc<dyn BackendSync>),
            ..Collaborators::local()
        };
        let engine = SwipeEngine::new(EngineConfig::new("me"), collaborators);
        engine.load_profiles(sample_profiles());
        engine
    }

    #[tokio::test]
    async fn test_unknown_profile_is_rejected() {
        let engine = engine_with(None, Arc::new(MemoryStore::new()));

        let result = engine.swipe("nobody", SwipeDirection::Right).await;

        assert!(matches!(result, Err(EngineError::UnknownProfile(id)) if id == "nobody"));
    }

    #[tokio::test]
    async fn test_invalid_direction_string() {
        let engine = engine_with(None, Arc::new(MemoryStore::new()));

        let result = engine.swipe_named("p1", "down").await;

        assert!(matches!(result, Err(EngineError::InvalidDirection(_))));
        assert!(engine.sent_likes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_sync_is_queued_and_retried() {
        let backend = Arc::new(StubBackend::default());
        backend.set_online(false);
        let engine = engine_with(Some(backend.clone()), Arc::new(MemoryStore::new()));

        let outcome = engine.swipe("p1", SwipeDirection::Right).await.unwrap();

        assert_eq!(outcome.action(), Some(SwipeAction::Like));
        assert_eq!(engine.sent_likes().len(), 1);
        assert_eq!(engine.queued_swipes().len(), 1);

        backend.set_online(true);
        backend.set_candidates(sample_profiles());
        engine.refresh_feed().await.unwrap();

        assert!(engine.queued_swipes().is_empty());
        assert_eq!(backend.submitted(), vec![("p1".to_string(), SwipeAction::Like)]);
    }

    #[tokio::test]
    async fn test_refresh_merges_remote_matches() {
        let backend = Arc::new(StubBackend::default());
        let engine = engine_with(Some(backend.clone()), Arc::new(MemoryStore::new()));
        engine.swipe("p1", SwipeDirection::Right).await.unwrap();

        let now = chrono::Utc::now();
        backend.set_matches(vec![Match {
            id: "remote-1".to_string(),
            user1_id: "me".to_string(),
            user2_id: "p1".to_string(),
            user1_action: SwipeAction::Like,
            user2_action: SwipeAction::Like,
            status: MatchStatus::Matched,
            created_at: now,
            updated_at: now,
            has_read: false,
            conversation_id: None,
        }]);
        backend.set_candidates(sample_profiles());

        let view = engine.refresh_feed().await.unwrap();

        assert_eq!(engine.matches().len(), 1);
        assert!(engine.sent_likes().is_empty());
        assert!(!view.profile_ids.contains(&"p1".to_string()));
    }

    #[tokio::test]
    async fn test_offline_refresh_keeps_source() {
        let backend = Arc::new(StubBackend::default());
        backend.set_online(false);
        let engine = engine_with(Some(backend), Arc::new(MemoryStore::new()));

        let view = engine.refresh_feed().await.unwrap();

        assert_eq!(view.profile_ids, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_restore_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(None, store.clone());
        engine.swipe("p1", SwipeDirection::Right).await.unwrap();
        engine.swipe("p2", SwipeDirection::Up).await.unwrap();

        let restored = engine_with(None, store);
        restored.restore().await.unwrap();

        assert_eq!(restored.sent_likes().len(), 1);
        assert_eq!(restored.saved_listings().len(), 1);
        assert_eq!(restored.feed().profile_ids, vec!["p3"]);
    }

    #[tokio::test]
    async fn test_reset_history_clears_remote_best_effort() {
        let backend = Arc::new(StubBackend::default());
        let engine = engine_with(Some(backend.clone()), Arc::new(MemoryStore::new()));
        engine.swipe("p1", SwipeDirection::Left).await.unwrap();
        engine.swipe("p3", SwipeDirection::Left).await.unwrap();

        let view = engine.reset_history().await.unwrap();

        assert_eq!(backend.clears(), 1);
        assert_eq!(view.profile_ids.len(), 3);
        assert_eq!(view.current_index, 0);
    }

    #[tokio::test]
    async fn test_cannot_touch_other_users_match() {
        let engine = engine_with(None, Arc::new(MemoryStore::new()));
        engine.ledger().record_action("x", "y", SwipeAction::Like);
        let other = engine.ledger().record_action("y", "x", SwipeAction::Like).unwrap();

        let result = engine.mark_read(&other.id).await;

        assert!(matches!(result, Err(EngineError::MatchNotFound(_))));
        assert!(!engine.ledger().get_match(&other.id).unwrap().has_read);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_swipes_persist_newest_shared_ledger() {
        let store = Arc::new(StallingStore::default());
        let ledger = Arc::new(MatchLedger::new());
        let key = StorageKey::ledger("global");
        let engine_for = |user: &str| {
            let config = EngineConfig {
                ledger_key: key.clone(),
                restore_ledger: false,
                ..EngineConfig::new(user)
            };
            let collaborators = Collaborators {
                ledger: ledger.clone(),
                store: store.clone(),
                ..Collaborators::local()
            };
            let engine = SwipeEngine::new(config, collaborators);
            engine.load_profiles(vec![seeker("c")]);
            engine
        };
        let a = engine_for("a");
        let b = engine_for("b");

        let (first, second) = tokio::join!(a.swipe("c", SwipeDirection::Right), async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            b.swipe("c", SwipeDirection::Right).await
        });
        first.unwrap();
        second.unwrap();

        let persisted = load_json::<LedgerSnapshot>(store.as_ref(), &key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.snapshot().pending_likes.len(), 2);
        assert_eq!(persisted.pending_likes.len(), 2);
    }

    #[tokio::test]
    async fn test_swipe_on_later_card_keeps_current() {
        let engine = engine_with(None, Arc::new(MemoryStore::new()));
        assert_eq!(engine.feed().current_id(), Some("p1"));

        engine.swipe("p3", SwipeDirection::Right).await.unwrap();

        let view = engine.feed();
        assert_eq!(view.current_id(), Some("p1"));
        assert_eq!(view.profile_ids, vec!["p1", "p2"]);

        engine.swipe("p1", SwipeDirection::Left).await.unwrap();
        assert_eq!(engine.feed().current_id(), Some("p2"));
    }

    #[tokio::test]
    async fn test_set_filter_rederives() {
        let engine = engine_with(None, Arc::new(MemoryStore::new()));
        engine.load_profiles(vec![seeker("p1"), seeker("p3")]);

        let view = engine.set_filter(SearchFilter {
            verified_only: true,
            ..SearchFilter::default()
        });

        // Nobody is verified, so the partition fallback applies
        assert!(view.used_fallback);
        assert_eq!(view.profile_ids.len(), 2);
    }
}
