//! Presentation-side collaborators: match/save notifications and haptics.
//!
//! Both are one-way signals. Implementations must return quickly and never
//! fail back into the engine.

use crate::models::{FeedbackKind, Match, Profile};

/// Displays match and saved-listing notifications
pub trait Notifier: Send + Sync {
    /// A new match resolved with `profile`
    fn match_resolved(&self, matched: &Match, profile: &Profile);

    /// A listing was saved; prioritized listings came from a super like
    fn listing_saved(&self, profile: &Profile, prioritized: bool);
}

/// Plays haptic feedback for a committed swipe
pub trait Haptics: Send + Sync {
    fn trigger(&self, kind: FeedbackKind);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn match_resolved(&self, matched: &Match, profile: &Profile) {
        tracing::info!(
            match_id = %matched.id,
            status = ?matched.status,
            "New match with {}",
            profile.id
        );
    }

    fn listing_saved(&self, profile: &Profile, prioritized: bool) {
        tracing::info!(prioritized, "Saved listing {}", profile.id);
    }
}

/// Haptics that do nothing beyond a trace line; used where no device exists
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHaptics;

impl Haptics for NoopHaptics {
    fn trigger(&self, kind: FeedbackKind) {
        tracing::trace!("Haptic feedback: {:?}", kind);
    }
}
