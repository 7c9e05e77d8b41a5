use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Match, MatchStatus, Profile};
use crate::services::Notifier;

/// Turns ledger resolutions into presentation signals.
///
/// A match is announced once per status it reaches, so replays of the same
/// reciprocation stay silent while an upgrade (e.g. to super match) is shown.
pub struct NotificationTrigger {
    notifier: Arc<dyn Notifier>,
    announced: Mutex<HashMap<String, MatchStatus>>,
}

impl NotificationTrigger {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            announced: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the notifier was signalled
    pub fn match_resolved(&self, matched: &Match, profile: &Profile) -> bool {
        if !matched.status.is_real() {
            return false;
        }

        let is_new = {
            let mut announced = self.announced.lock();
            announced.insert(matched.id.clone(), matched.status) != Some(matched.status)
        };

        if is_new {
            self.notifier.match_resolved(matched, profile);
        }
        is_new
    }

    pub fn listing_saved(&self, profile: &Profile, prioritized: bool) {
        self.notifier.listing_saved(profile, prioritized);
    }
}
