use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::feed::FeedManager;
use crate::core::ledger::MatchLedger;
use crate::core::notify::NotificationTrigger;
use crate::models::{Match, Profile, SavedListing, SwipeAction, SwipeDirection};
use crate::services::Haptics;

/// Decides how the other side answers a swipe.
///
/// Lets tests force a deterministic reciprocation instead of waiting for a
/// second real user.
#[cfg(any(test, feature = "testkit"))]
pub trait ReciprocationOracle: Send + Sync {
    /// The action `profile` takes back on `user_id`, if any
    fn reciprocate(&self, user_id: &str, profile: &Profile, action: SwipeAction)
        -> Option<SwipeAction>;
}

/// Result of processing one committed swipe
#[derive(Debug, Clone, PartialEq)]
pub enum SwipeOutcome {
    /// Action recorded in the ledger; `matched` is set when it resolved a match
    Recorded {
        action: SwipeAction,
        matched: Option<Match>,
    },
    /// Positive swipe on a listing, saved instead of matched
    ListingSaved {
        action: SwipeAction,
        listing: SavedListing,
    },
    /// Same profile swiped again inside the duplicate window; nothing recorded
    Duplicate,
}

impl SwipeOutcome {
    pub fn action(&self) -> Option<SwipeAction> {
        match self {
            SwipeOutcome::Recorded { action, .. } | SwipeOutcome::ListingSaved { action, .. } => {
                Some(*action)
            }
            SwipeOutcome::Duplicate => None,
        }
    }

    pub fn matched(&self) -> Option<&Match> {
        match self {
            SwipeOutcome::Recorded { matched, .. } => matched.as_ref(),
            _ => None,
        }
    }

    pub fn saved_listing(&self) -> Option<&SavedListing> {
        match self {
            SwipeOutcome::ListingSaved { listing, .. } => Some(listing),
            _ => None,
        }
    }
}

/// Maps committed directions to actions and applies them
pub struct SwipeProcessor {
    user_id: String,
    ledger: Arc<MatchLedger>,
    feed: Arc<FeedManager>,
    haptics: Arc<dyn Haptics>,
    notifications: NotificationTrigger,
    saved: Mutex<Vec<SavedListing>>,
    recent: Mutex<HashMap<String, DateTime<Utc>>>,
    duplicate_window: Duration,
    #[cfg(any(test, feature = "testkit"))]
    oracle: Option<Arc<dyn ReciprocationOracle>>,
}

impl SwipeProcessor {
    pub fn new(
        user_id: impl Into<String>,
        ledger: Arc<MatchLedger>,
        feed: Arc<FeedManager>,
        haptics: Arc<dyn Haptics>,
        notifications: NotificationTrigger,
        duplicate_window: Duration,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            ledger,
            feed,
            haptics,
            notifications,
            saved: Mutex::new(Vec::new()),
            recent: Mutex::new(HashMap::new()),
            duplicate_window,
            #[cfg(any(test, feature = "testkit"))]
            oracle: None,
        }
    }

    #[cfg(any(test, feature = "testkit"))]
    pub fn with_oracle(mut self, oracle: Arc<dyn ReciprocationOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Apply a committed swipe on `profile`.
    ///
    /// Records the action (or saves the listing), fires feedback, excludes the
    /// profile from future feeds and advances the feed cursor when it was the
    /// current card.
    pub fn process(&self, profile: &Profile, direction: SwipeDirection) -> SwipeOutcome {
        if self.is_duplicate(&profile.id) {
            tracing::warn!("Dropping duplicate swipe on {} by {}", profile.id, self.user_id);
            return SwipeOutcome::Duplicate;
        }

        let action = direction.action();
        self.haptics.trigger(action.into());

        let outcome = if profile.is_listing() && action.is_positive() {
            let listing = self.save_listing(&profile.id, action == SwipeAction::SuperLike);
            self.notifications.listing_saved(profile, listing.prioritized);
            SwipeOutcome::ListingSaved { action, listing }
        } else {
            let matched = self.reconcile(profile, action);
            if let Some(m) = &matched {
                self.notifications.match_resolved(m, profile);
            }
            SwipeOutcome::Recorded { action, matched }
        };

        self.feed.consume(&profile.id);

        tracing::debug!("{} swiped {} on {}", self.user_id, direction, profile.id);
        outcome
    }

    fn reconcile(&self, profile: &Profile, action: SwipeAction) -> Option<Match> {
        let matched = self.ledger.record_action(&self.user_id, &profile.id, action);

        #[cfg(any(test, feature = "testkit"))]
        if matched.is_none() && action.is_positive() {
            if let Some(reply) = self
                .oracle
                .as_ref()
                .and_then(|oracle| oracle.reciprocate(&self.user_id, profile, action))
            {
                return self.ledger.record_action(&profile.id, &self.user_id, reply);
            }
        }

        matched
    }

    /// True if the profile was already processed inside the duplicate window
    fn is_duplicate(&self, profile_id: &str) -> bool {
        let now = Utc::now();
        let mut recent = self.recent.lock();
        recent.retain(|_, at| now - *at < self.duplicate_window);

        if recent.contains_key(profile_id) {
            return true;
        }
        recent.insert(profile_id.to_string(), now);
        false
    }

    fn save_listing(&self, profile_id: &str, prioritized: bool) -> SavedListing {
        let mut saved = self.saved.lock();
        let now = Utc::now();

        if let Some(existing) = saved.iter_mut().find(|l| l.profile_id == profile_id) {
            existing.prioritized |= prioritized;
            existing.saved_at = now;
            return existing.clone();
        }

        let listing = SavedListing {
            profile_id: profile_id.to_string(),
            prioritized,
            saved_at: now,
        };
        saved.push(listing.clone());
        listing
    }

    /// Saved listings, prioritized first, then most recent
    pub fn saved_listings(&self) -> Vec<SavedListing> {
        let mut saved = self.saved.lock().clone();
        saved.sort_by(|a, b| {
            b.prioritized
                .cmp(&a.prioritized)
                .then_with(|| b.saved_at.cmp(&a.saved_at))
        });
        saved
    }

    pub fn restore_saved(&self, listings: Vec<SavedListing>) {
        *self.saved.lock() = listings;
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedbackKind, MatchStatus, SearchFilter};
    use crate::testkit::{RecordingHaptics, RecordingNotifier, ScriptedOracle};
    use std::collections::HashSet;

    struct Fixture {
        ledger: Arc<MatchLedger>,
        feed: Arc<FeedManager>,
        haptics: Arc<RecordingHaptics>,
        notifier: Arc<RecordingNotifier>,
        processor: SwipeProcessor,
    }

    fn fixture(window_ms: i64) -> Fixture {
        let ledger = Arc::new(MatchLedger::new());
        let feed = Arc::new(FeedManager::new("me", SearchFilter::default(), false));
        feed.replace_source(vec![
            Profile::new("p1", false),
            Profile::new("p2", true),
            Profile::new("p3", false),
        ]);
        feed.get_feed(&HashSet::new());
        let haptics = Arc::new(RecordingHaptics::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = SwipeProcessor::new(
            "me",
            ledger.clone(),
            feed.clone(),
            haptics.clone(),
            NotificationTrigger::new(notifier.clone()),
            Duration::milliseconds(window_ms),
        );
        Fixture {
            ledger,
            feed,
            haptics,
            notifier,
            processor,
        }
    }

    #[test]
    fn test_right_swipe_records_pending_like() {
        let f = fixture(500);

        let outcome = f.processor.process(&Profile::new("p1", false), SwipeDirection::Right);

        assert_eq!(
            outcome,
            SwipeOutcome::Recorded {
                action: SwipeAction::Like,
                matched: None
            }
        );
        assert_eq!(f.ledger.get_pending_likes("p1").len(), 1);
        assert_eq!(f.haptics.kinds(), vec![FeedbackKind::Like]);
        assert!(f.feed.has_swiped("p1"));
        assert_eq!(f.feed.get_feed(&HashSet::new()).current_index, 1);
    }

    #[test]
    fn test_reciprocated_like_notifies() {
        let f = fixture(500);
        f.ledger.record_action("p1", "me", SwipeAction::SuperLike);

        let outcome = f.processor.process(&Profile::new("p1", false), SwipeDirection::Right);

        let matched = outcome.matched().unwrap();
        assert_eq!(matched.status, MatchStatus::MixedMatched);
        assert_eq!(f.notifier.matches(), vec![matched.id.clone()]);
    }

    #[test]
    fn test_listing_super_like_is_saved_not_matched() {
        let f = fixture(500);
        let listing = Profile::new("p2", true);

        let outcome = f.processor.process(&listing, SwipeDirection::Up);

        let saved = outcome.saved_listing().unwrap();
        assert!(saved.prioritized);
        assert!(f.ledger.match_between("me", "p2").is_none());
        assert!(f.ledger.get_pending_likes("p2").is_empty());
        assert_eq!(f.notifier.saved(), vec![("p2".to_string(), true)]);
        assert_eq!(f.haptics.kinds(), vec![FeedbackKind::Superlike]);
    }

    #[test]
    fn test_listing_dislike_is_only_excluded() {
        let f = fixture(500);

        let outcome = f.processor.process(&Profile::new("p2", true), SwipeDirection::Left);

        assert_eq!(outcome.action(), Some(SwipeAction::Pass));
        assert!(f.processor.saved_listings().is_empty());
        assert!(f.feed.has_swiped("p2"));
    }

    #[test]
    fn test_duplicate_within_window_is_rejected() {
        let f = fixture(60_000);
        let profile = Profile::new("p1", false);

        f.processor.process(&profile, SwipeDirection::Right);
        let second = f.processor.process(&profile, SwipeDirection::Right);

        assert_eq!(second, SwipeOutcome::Duplicate);
        assert_eq!(f.haptics.kinds().len(), 1);
        assert_eq!(f.feed.get_feed(&HashSet::new()).current_index, 1);
    }

    #[test]
    fn test_zero_window_allows_repeat() {
        let f = fixture(0);
        let profile = Profile::new("p1", false);

        f.processor.process(&profile, SwipeDirection::Right);
        let second = f.processor.process(&profile, SwipeDirection::Up);

        assert_eq!(second.action(), Some(SwipeAction::SuperLike));
        assert_eq!(f.ledger.get_sent_likes("me")[0].action, SwipeAction::SuperLike);
    }

    #[test]
    fn test_oracle_reciprocates() {
        let f = fixture(500);
        let oracle = ScriptedOracle::default().respond("p3", SwipeAction::SuperLike);
        let processor = SwipeProcessor::new(
            "me",
            f.ledger.clone(),
            f.feed.clone(),
            f.haptics.clone(),
            NotificationTrigger::new(f.notifier.clone()),
            Duration::milliseconds(500),
        )
        .with_oracle(Arc::new(oracle));

        let outcome = processor.process(&Profile::new("p3", false), SwipeDirection::Up);

        assert_eq!(outcome.matched().unwrap().status, MatchStatus::SuperMatched);
        let unanswered = processor.process(&Profile::new("p1", false), SwipeDirection::Right);
        assert!(unanswered.matched().is_none());
    }

    #[test]
    fn test_saved_listings_order() {
        let f = fixture(0);
        f.processor.process(&Profile::new("a", true), SwipeDirection::Right);
        f.processor.process(&Profile::new("b", true), SwipeDirection::Up);
        f.processor.process(&Profile::new("c", true), SwipeDirection::Right);

        let ids: Vec<String> = f
            .processor
            .saved_listings()
            .into_iter()
            .map(|l| l.profile_id)
            .collect();
        assert_eq!(ids[0], "b");
        assert_eq!(ids.len(), 3);
    }
}
