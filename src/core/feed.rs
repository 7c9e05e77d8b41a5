use parking_lot::Mutex;
use std::collections::HashSet;

use crate::core::filters::{matches_attributes, matches_partition};
use crate::models::{Profile, SearchFilter};

/// Ordered ids the user swipes through, plus the current pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub profile_ids: Vec<String>,
    pub current_index: usize,
    /// Swipe history (and possibly attribute filters) were ignored because the
    /// fully filtered list was empty
    pub used_fallback: bool,
}

impl FeedView {
    pub fn current_id(&self) -> Option<&str> {
        self.profile_ids.get(self.current_index).map(String::as_str)
    }
}

/// Derive the ordered feed from the source list.
///
/// 1. partition by `looking_for`, dropping matched profiles
/// 2. apply attribute filters
/// 3. drop swiped profiles unless `ignore_history`
/// 4. if that leaves nothing, fall back to step 2's list, then step 1's
///
/// Returns the ids in source order and whether a fallback was used.
pub fn derive_feed(
    source: &[Profile],
    filter: &SearchFilter,
    history: &HashSet<String>,
    matched: &HashSet<String>,
    ignore_history: bool,
) -> (Vec<String>, bool) {
    let partitioned: Vec<&Profile> = source
        .iter()
        .filter(|p| matches_partition(p, filter.looking_for))
        .filter(|p| !matched.contains(&p.id))
        .collect();

    let attributed: Vec<&Profile> = partitioned
        .iter()
        .copied()
        .filter(|p| matches_attributes(p, filter))
        .collect();

    let primary: Vec<String> = attributed
        .iter()
        .filter(|p| ignore_history || !history.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();

    if !primary.is_empty() {
        return (primary, false);
    }

    if !attributed.is_empty() {
        return (attributed.iter().map(|p| p.id.clone()).collect(), true);
    }

    let fallback: Vec<String> = partitioned.iter().map(|p| p.id.clone()).collect();
    let used_fallback = !fallback.is_empty();
    (fallback, used_fallback)
}

#[derive(Debug, Default)]
struct FeedState {
    source: Vec<Profile>,
    filter: SearchFilter,
    /// Ids the user has swiped on
    history: HashSet<String>,
    ordered: Vec<String>,
    current_index: usize,
    used_fallback: bool,
    derived: bool,
}

impl FeedState {
    fn derive(&mut self, matched: &HashSet<String>, ignore_history: bool) {
        let (ordered, used_fallback) =
            derive_feed(&self.source, &self.filter, &self.history, matched, ignore_history);
        self.ordered = ordered;
        self.used_fallback = used_fallback;
        self.current_index = 0;
        self.derived = true;
    }

    fn view(&self) -> FeedView {
        FeedView {
            profile_ids: self.ordered.clone(),
            current_index: self.current_index,
            used_fallback: self.used_fallback,
        }
    }
}

/// Maintains the filtered, ordered queue of candidate profiles for one user
#[derive(Debug)]
pub struct FeedManager {
    owner_id: String,
    /// Debug override: show profiles regardless of swipe history
    ignore_history: bool,
    state: Mutex<FeedState>,
}

impl FeedManager {
    pub fn new(owner_id: impl Into<String>, filter: SearchFilter, ignore_history: bool) -> Self {
        Self {
            owner_id: owner_id.into(),
            ignore_history,
            state: Mutex::new(FeedState {
                filter,
                ..FeedState::default()
            }),
        }
    }

    /// Replace the candidate source. Duplicate ids and the owner are dropped.
    ///
    /// The current list is kept until the next wraparound or refresh.
    pub fn replace_source(&self, profiles: Vec<Profile>) {
        let mut seen = HashSet::new();
        let source: Vec<Profile> = profiles
            .into_iter()
            .filter(|p| p.id != self.owner_id && seen.insert(p.id.clone()))
            .collect();

        let mut state = self.state.lock();
        tracing::debug!("Feed source for {} now has {} profiles", self.owner_id, source.len());
        state.source = source;
    }

    pub fn set_filter(&self, filter: SearchFilter) {
        let mut state = self.state.lock();
        state.filter = filter;
        state.derived = false;
    }

    pub fn filter(&self) -> SearchFilter {
        self.state.lock().filter.clone()
    }

    /// Re-derive the list now and point at its start
    pub fn refresh(&self, matched: &HashSet<String>) -> FeedView {
        let mut state = self.state.lock();
        state.derive(matched, self.ignore_history);
        state.view()
    }

    /// Current list and pointer; wraps to a freshly derived list once the
    /// pointer has run off the end
    pub fn get_feed(&self, matched: &HashSet<String>) -> FeedView {
        let mut state = self.state.lock();
        if !state.derived || state.current_index >= state.ordered.len() {
            state.derive(matched, self.ignore_history);
        }
        state.view()
    }

    pub fn current_profile(&self, matched: &HashSet<String>) -> Option<Profile> {
        let view = self.get_feed(matched);
        let id = view.current_id()?;
        self.profile(id)
    }

    /// Move past the current card
    pub fn advance(&self) -> usize {
        let mut state = self.state.lock();
        if state.current_index < state.ordered.len() {
            state.current_index += 1;
        }
        state.current_index
    }

    /// Take a swiped profile out of the current pass.
    ///
    /// Only a swipe on the current card moves the cursor. A card further down
    /// the list is removed from it and the current card stays put. Returns the
    /// resulting index.
    pub fn consume(&self, profile_id: &str) -> usize {
        let mut state = self.state.lock();
        state.history.insert(profile_id.to_string());

        match state.ordered.iter().position(|id| id == profile_id) {
            Some(pos) if pos == state.current_index => state.current_index += 1,
            Some(pos) if pos > state.current_index => {
                state.ordered.remove(pos);
            }
            _ => {}
        }
        state.current_index
    }

    /// Remember a swipe so the profile is excluded on the next derivation
    pub fn record_swipe(&self, profile_id: &str) {
        self.state.lock().history.insert(profile_id.to_string());
    }

    pub fn has_swiped(&self, profile_id: &str) -> bool {
        self.state.lock().history.contains(profile_id)
    }

    pub fn swiped_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().history.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn restore_history(&self, ids: impl IntoIterator<Item = String>) {
        let mut state = self.state.lock();
        state.history.extend(ids);
        state.derived = false;
    }

    /// Forget swipe history and start from the top
    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.history.clear();
        state.current_index = 0;
        state.derived = false;
        tracing::info!("Cleared swipe history for {}", self.owner_id);
    }

    pub fn profile(&self, profile_id: &str) -> Option<Profile> {
        self.state
            .lock()
            .source
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
    }

    pub fn source_len(&self) -> usize {
        self.state.lock().source.len()
    }
}
