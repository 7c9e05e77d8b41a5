use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;

/// Candidate profile shown on a swipe card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Listing profiles offer a place to live; seekers are looking for one
    #[serde(rename = "hasPlace", default)]
    pub has_place: bool,
    #[serde(rename = "isVerified", default)]
    pub is_verified: bool,
    /// Monthly budget for seekers, monthly rent for listings
    #[serde(rename = "monthlyBudget", default)]
    pub monthly_budget: Option<u32>,
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(rename = "privateBathroom", default)]
    pub private_bathroom: Option<bool>,
    #[serde(rename = "petsAllowed", default)]
    pub pets_allowed: Option<bool>,
    #[serde(rename = "imageFileIds", default)]
    pub image_file_ids: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Profile {
    /// Bare profile with only identity and kind set
    pub fn new(id: impl Into<String>, has_place: bool) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            age: None,
            gender: None,
            has_place,
            is_verified: false,
            monthly_budget: None,
            furnished: None,
            private_bathroom: None,
            pets_allowed: None,
            image_file_ids: vec![],
            bio: None,
        }
    }

    pub fn is_listing(&self) -> bool {
        self.has_place
    }
}

/// Direction a card was flung in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
}

impl SwipeDirection {
    /// Semantic action for a committed direction
    pub fn action(self) -> SwipeAction {
        match self {
            SwipeDirection::Left => SwipeAction::Pass,
            SwipeDirection::Right => SwipeAction::Like,
            SwipeDirection::Up => SwipeAction::SuperLike,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Up => "up",
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeDirection {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(SwipeDirection::Left),
            "right" => Ok(SwipeDirection::Right),
            "up" => Ok(SwipeDirection::Up),
            other => Err(EngineError::InvalidDirection(other.to_string())),
        }
    }
}

/// Action recorded against a profile.
///
/// A left swipe (dislike) is recorded as `Pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwipeAction {
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "superLike")]
    SuperLike,
    #[serde(rename = "pass", alias = "dislike")]
    Pass,
}

impl SwipeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SwipeAction::Like => "like",
            SwipeAction::SuperLike => "superLike",
            SwipeAction::Pass => "pass",
        }
    }

    /// Likes and super likes can form matches; passes never do
    pub fn is_positive(self) -> bool {
        !matches!(self, SwipeAction::Pass)
    }
}

impl fmt::Display for SwipeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Haptic pattern played when a swipe commits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
    Superlike,
}

impl From<SwipeAction> for FeedbackKind {
    fn from(action: SwipeAction) -> Self {
        match action {
            SwipeAction::Like => FeedbackKind::Like,
            SwipeAction::SuperLike => FeedbackKind::Superlike,
            SwipeAction::Pass => FeedbackKind::Dislike,
        }
    }
}

/// Classified drag, alive only for the duration of one gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeIntent {
    pub direction: SwipeDirection,
    pub magnitude: f64,
}

/// Match status derived from both sides' actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Pending,
    Matched,
    SuperMatched,
    MixedMatched,
}

impl MatchStatus {
    /// Everything except `Pending` is a real, surfaced match
    pub fn is_real(self) -> bool {
        !matches!(self, MatchStatus::Pending)
    }
}

/// One-sided like waiting for the other side to reciprocate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLike {
    pub user_id: String,
    pub target_user_id: String,
    pub action: SwipeAction,
    pub timestamp: DateTime<Utc>,
}

/// Mutually confirmed pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub user1_action: SwipeAction,
    pub user2_action: SwipeAction,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub has_read: bool,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl Match {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The other participant, if `user_id` is part of this match
    pub fn other_user(&self, user_id: &str) -> Option<&str> {
        if self.user1_id == user_id {
            Some(&self.user2_id)
        } else if self.user2_id == user_id {
            Some(&self.user1_id)
        } else {
            None
        }
    }

    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.user1_id == a && self.user2_id == b) || (self.user1_id == b && self.user2_id == a)
    }
}

/// What the user is searching for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookingFor {
    /// People to share a place with; listings are hidden
    Roommate,
    /// Places to live; seekers are hidden
    Place,
    #[default]
    Both,
}

/// Search preferences applied to the candidate source list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilter {
    pub looking_for: LookingFor,
    pub min_budget: Option<u32>,
    pub max_budget: Option<u32>,
    pub genders: Vec<String>,
    pub verified_only: bool,
    pub furnished: Option<bool>,
    pub private_bathroom: Option<bool>,
    pub pets_allowed: Option<bool>,
}

/// Swipe as acknowledged by (or queued for) the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRecord {
    pub id: String,
    pub user_id: String,
    pub target_user_id: String,
    pub action: SwipeAction,
    pub created_at: DateTime<Utc>,
}

impl SwipeRecord {
    pub fn new(user_id: &str, target_user_id: &str, action: SwipeAction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            target_user_id: target_user_id.to_string(),
            action,
            created_at: Utc::now(),
        }
    }
}

/// Listing the user liked, kept instead of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedListing {
    pub profile_id: String,
    /// Super-liked listings are shown first
    pub prioritized: bool,
    pub saved_at: DateTime<Utc>,
}
