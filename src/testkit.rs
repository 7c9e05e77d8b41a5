//! Test doubles and fixtures shared by unit and integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::core::processor::ReciprocationOracle;
use crate::models::{FeedbackKind, Match, Profile, SearchFilter, SwipeAction, SwipeRecord};
use crate::services::{BackendError, BackendSync, Haptics, Notifier};

/// Notifier that remembers what it was asked to show
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    matches: Mutex<Vec<String>>,
    saved: Mutex<Vec<(String, bool)>>,
}

impl RecordingNotifier {
    /// Ids of announced matches, in order
    pub fn matches(&self) -> Vec<String> {
        self.matches.lock().clone()
    }

    /// (profile id, prioritized) for every saved listing
    pub fn saved(&self) -> Vec<(String, bool)> {
        self.saved.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn match_resolved(&self, matched: &Match, _profile: &Profile) {
        self.matches.lock().push(matched.id.clone());
    }

    fn listing_saved(&self, profile: &Profile, prioritized: bool) {
        self.saved.lock().push((profile.id.clone(), prioritized));
    }
}

#[derive(Debug, Default)]
pub struct RecordingHaptics {
    kinds: Mutex<Vec<FeedbackKind>>,
}

impl RecordingHaptics {
    pub fn kinds(&self) -> Vec<FeedbackKind> {
        self.kinds.lock().clone()
    }
}

impl Haptics for RecordingHaptics {
    fn trigger(&self, kind: FeedbackKind) {
        self.kinds.lock().push(kind);
    }
}

/// Reciprocates with a fixed action per profile id
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: HashMap<String, SwipeAction>,
}

impl ScriptedOracle {
    pub fn respond(mut self, profile_id: &str, action: SwipeAction) -> Self {
        self.replies.insert(profile_id.to_string(), action);
        self
    }
}

impl ReciprocationOracle for ScriptedOracle {
    fn reciprocate(
        &self,
        _user_id: &str,
        profile: &Profile,
        _action: SwipeAction,
    ) -> Option<SwipeAction> {
        self.replies.get(&profile.id).copied()
    }
}

/// In-memory backend that can be switched offline
#[derive(Debug)]
pub struct StubBackend {
    user_id: String,
    online: AtomicBool,
    submitted: Mutex<Vec<(String, SwipeAction)>>,
    candidates: Mutex<Vec<Profile>>,
    matches: Mutex<Vec<Match>>,
    clears: AtomicUsize,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self {
            user_id: "me".to_string(),
            online: AtomicBool::new(true),
            submitted: Mutex::new(Vec::new()),
            candidates: Mutex::new(Vec::new()),
            matches: Mutex::new(Vec::new()),
            clears: AtomicUsize::new(0),
        }
    }
}

impl StubBackend {
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_candidates(&self, profiles: Vec<Profile>) {
        *self.candidates.lock() = profiles;
    }

    pub fn set_matches(&self, matches: Vec<Match>) {
        *self.matches.lock() = matches;
    }

    /// Swipes the backend accepted, in order
    pub fn submitted(&self) -> Vec<(String, SwipeAction)> {
        self.submitted.lock().clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), BackendError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::ApiError("backend offline".to_string()))
        }
    }
}

#[async_trait]
impl BackendSync for StubBackend {
    async fn submit_swipe(
        &self,
        target_id: &str,
        action: SwipeAction,
    ) -> Result<SwipeRecord, BackendError> {
        self.ensure_online()?;
        self.submitted.lock().push((target_id.to_string(), action));
        Ok(SwipeRecord::new(&self.user_id, target_id, action))
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>, BackendError> {
        self.ensure_online()?;
        Ok(self.matches.lock().clone())
    }

    async fn fetch_candidate_profiles(
        &self,
        _filter: &SearchFilter,
    ) -> Result<Vec<Profile>, BackendError> {
        self.ensure_online()?;
        Ok(self.candidates.lock().clone())
    }

    async fn clear_all_swipes(&self) -> Result<(), BackendError> {
        self.ensure_online()?;
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().clear();
        Ok(())
    }
}

pub fn seeker(id: &str) -> Profile {
    Profile {
        name: format!("Seeker {}", id),
        age: Some(27),
        gender: Some("female".to_string()),
        monthly_budget: Some(900),
        ..Profile::new(id, false)
    }
}

pub fn listing(id: &str) -> Profile {
    Profile {
        name: format!("Room {}", id),
        monthly_budget: Some(1100),
        furnished: Some(true),
        private_bathroom: Some(false),
        pets_allowed: Some(true),
        ..Profile::new(id, true)
    }
}

/// Two seekers (`p1`, `p3`) and one listing (`p2`)
pub fn sample_profiles() -> Vec<Profile> {
    vec![seeker("p1"), listing("p2"), seeker("p3")]
}
