use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::core::error::EngineError;
use crate::core::status::determine_status;
use crate::models::{Match, PendingLike, SwipeAction};
use crate::services::{save_json, KeyValueStore, StorageError};

/// Serializable copy of the ledger, used for persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub matches: Vec<Match>,
    pub pending_likes: Vec<PendingLike>,
}

/// (from, to)
type Directed = (String, String);

#[derive(Debug, Default)]
struct LedgerState {
    pending: HashMap<Directed, PendingLike>,
    matches: HashMap<String, Match>,
    /// Unordered pair → match id
    pairs: HashMap<Directed, String>,
}

impl LedgerState {
    fn pair_match_mut(&mut self, a: &str, b: &str) -> Option<&mut Match> {
        let id = self.pairs.get(&pair_key(a, b))?;
        self.matches.get_mut(id)
    }

    fn insert_match(&mut self, m: Match) {
        self.pairs.insert(pair_key(&m.user1_id, &m.user2_id), m.id.clone());
        self.matches.insert(m.id.clone(), m);
    }
}

fn pair_key(a: &str, b: &str) -> Directed {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn directed(from: &str, to: &str) -> Directed {
    (from.to_string(), to.to_string())
}

/// Set `user_id`'s action on a match. Returns false if the action was already set.
fn apply_action(m: &mut Match, user_id: &str, action: SwipeAction) -> bool {
    let slot = if m.user1_id == user_id {
        &mut m.user1_action
    } else {
        &mut m.user2_action
    };
    if *slot == action {
        return false;
    }
    *slot = action;
    m.status = determine_status(m.user1_action, m.user2_action);
    m.updated_at = Utc::now();
    m.has_read = false;
    true
}

/// Mutual-like reconciliation store.
///
/// All mutations go through a single lock, so each call is one atomic step:
/// two reciprocal swipes racing each other always end in exactly one match.
#[derive(Debug, Default)]
pub struct MatchLedger {
    state: Mutex<LedgerState>,
    /// Held across snapshot and store write
    writes: tokio::sync::Mutex<()>,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let ledger = Self::new();
        ledger.restore(snapshot);
        ledger
    }

    /// Replace the ledger contents with a persisted snapshot
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        let mut state = self.state.lock();
        *state = LedgerState::default();
        for like in snapshot.pending_likes {
            state
                .pending
                .insert(directed(&like.user_id, &like.target_user_id), like);
        }
        for m in snapshot.matches {
            state.insert_match(m);
        }
    }

    /// Persist the ledger under `key`.
    ///
    /// Writers queue up and snapshot only once it is their turn, so the last
    /// write to land always holds the newest state.
    pub async fn save_to(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
        let _turn = self.writes.lock().await;
        save_json(store, key, &self.snapshot()).await
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock();
        let mut matches: Vec<Match> = state.matches.values().cloned().collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let mut pending_likes: Vec<PendingLike> = state.pending.values().cloned().collect();
        pending_likes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        LedgerSnapshot {
            matches,
            pending_likes,
        }
    }

    /// Record `actor`'s action on `target` and reconcile it with whatever the
    /// target has already done.
    ///
    /// Returns the resulting match when the pair is (or already was) matched.
    pub fn record_action(&self, actor: &str, target: &str, action: SwipeAction) -> Option<Match> {
        if actor == target {
            debug_assert!(actor != target, "self-swipe recorded for {actor}");
            tracing::error!("Ignoring self-swipe recorded for {}", actor);
            return None;
        }

        let mut state = self.state.lock();
        let now = Utc::now();

        // The target already liked the actor: this action resolves it
        if let Some(incoming) = state.pending.remove(&directed(target, actor)) {
            if !action.is_positive() {
                tracing::debug!("{} declined pending like from {}", actor, target);
                return None;
            }
            state.pending.remove(&directed(actor, target));

            if let Some(existing) = state.pair_match_mut(actor, target) {
                apply_action(existing, target, incoming.action);
                apply_action(existing, actor, action);
                return Some(existing.clone());
            }

            let status = determine_status(incoming.action, action);
            debug_assert!(status.is_real());
            let m = Match {
                id: uuid::Uuid::new_v4().to_string(),
                user1_id: target.to_string(),
                user2_id: actor.to_string(),
                user1_action: incoming.action,
                user2_action: action,
                status,
                created_at: now,
                updated_at: now,
                has_read: false,
                conversation_id: None,
            };
            tracing::info!("Match formed: {} <-> {} ({:?})", target, actor, status);
            state.insert_match(m.clone());
            return Some(m);
        }

        if !action.is_positive() {
            return None;
        }

        // Both sides recorded independently before either saw the other
        if let Some(existing) = state.pair_match_mut(actor, target) {
            if apply_action(existing, actor, action) {
                tracing::debug!("Updated match {} with {} from {}", existing.id, action, actor);
            }
            return Some(existing.clone());
        }

        match state.pending.entry(directed(actor, target)) {
            Entry::Occupied(mut entry) => {
                let like = entry.get_mut();
                if like.action != action {
                    like.action = action;
                    like.timestamp = now;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(PendingLike {
                    user_id: actor.to_string(),
                    target_user_id: target.to_string(),
                    action,
                    timestamp: now,
                });
            }
        }
        None
    }

    /// Fold a match reported by the backend into the local ledger.
    ///
    /// An existing local match for the same pair is updated in place instead
    /// of being duplicated. Non-real statuses are never materialized.
    pub fn merge_remote(&self, remote: Match) -> Option<Match> {
        let status = determine_status(remote.user1_action, remote.user2_action);
        if !status.is_real() {
            return None;
        }

        let mut state = self.state.lock();
        state
            .pending
            .remove(&directed(&remote.user1_id, &remote.user2_id));
        state
            .pending
            .remove(&directed(&remote.user2_id, &remote.user1_id));

        if let Some(existing) = state.pair_match_mut(&remote.user1_id, &remote.user2_id) {
            let mut changed = apply_action(existing, &remote.user1_id, remote.user1_action);
            changed |= apply_action(existing, &remote.user2_id, remote.user2_action);
            if existing.conversation_id.is_none() && remote.conversation_id.is_some() {
                existing.conversation_id = remote.conversation_id.clone();
            }
            if changed {
                tracing::debug!("Merged remote match into {}", existing.id);
            }
            return Some(existing.clone());
        }

        let m = Match { status, ..remote };
        state.insert_match(m.clone());
        Some(m)
    }

    /// Real matches involving `user_id`, most recently updated first
    pub fn get_matches(&self, user_id: &str) -> Vec<Match> {
        let state = self.state.lock();
        let mut matches: Vec<Match> = state
            .matches
            .values()
            .filter(|m| m.involves(user_id) && m.status.is_real())
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matches
    }

    /// Likes directed at `user_id` that have not been reciprocated yet
    pub fn get_pending_likes(&self, user_id: &str) -> Vec<PendingLike> {
        let state = self.state.lock();
        let mut likes: Vec<PendingLike> = state
            .pending
            .values()
            .filter(|like| like.target_user_id == user_id)
            .cloned()
            .collect();
        // Super likes first, then newest
        likes.sort_by(|a, b| {
            (b.action == SwipeAction::SuperLike)
                .cmp(&(a.action == SwipeAction::SuperLike))
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        likes
    }

    /// Likes sent by `user_id` that are still waiting on the other side
    pub fn get_sent_likes(&self, user_id: &str) -> Vec<PendingLike> {
        let state = self.state.lock();
        state
            .pending
            .values()
            .filter(|like| like.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn match_between(&self, a: &str, b: &str) -> Option<Match> {
        let state = self.state.lock();
        let id = state.pairs.get(&pair_key(a, b))?;
        state.matches.get(id).cloned()
    }

    pub fn get_match(&self, match_id: &str) -> Option<Match> {
        self.state.lock().matches.get(match_id).cloned()
    }

    /// Ids of everyone `user_id` has a real match with
    pub fn matched_ids(&self, user_id: &str) -> HashSet<String> {
        let state = self.state.lock();
        state
            .matches
            .values()
            .filter(|m| m.status.is_real())
            .filter_map(|m| m.other_user(user_id).map(str::to_string))
            .collect()
    }

    pub fn mark_read(&self, match_id: &str) -> Result<Match, EngineError> {
        let mut state = self.state.lock();
        let m = state
            .matches
            .get_mut(match_id)
            .ok_or_else(|| EngineError::MatchNotFound(match_id.to_string()))?;
        m.has_read = true;
        Ok(m.clone())
    }

    /// Remove a match entirely (unmatch). There is no undo.
    pub fn delete_match(&self, match_id: &str) -> Result<Match, EngineError> {
        let mut state = self.state.lock();
        let m = state
            .matches
            .remove(match_id)
            .ok_or_else(|| EngineError::MatchNotFound(match_id.to_string()))?;
        state.pairs.remove(&pair_key(&m.user1_id, &m.user2_id));
        tracing::info!("Deleted match {} ({} <-> {})", m.id, m.user1_id, m.user2_id);
        Ok(m)
    }

    pub fn attach_conversation(
        &self,
        match_id: &str,
        conversation_id: &str,
    ) -> Result<Match, EngineError> {
        let mut state = self.state.lock();
        let m = state
            .matches
            .get_mut(match_id)
            .ok_or_else(|| EngineError::MatchNotFound(match_id.to_string()))?;
        m.conversation_id = Some(conversation_id.to_string());
        m.updated_at = Utc::now();
        Ok(m.clone())
    }
}
