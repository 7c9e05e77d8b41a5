use serde::{Deserialize, Serialize};

use crate::models::domain::{Match, PendingLike, Profile, SavedListing, SwipeAction};

/// Response for the swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub action: Option<SwipeAction>,
    #[serde(rename = "match")]
    pub matched: Option<Match>,
    pub saved_listing: Option<SavedListing>,
    /// True when the swipe was dropped as a repeat of one just processed
    pub duplicate: bool,
}

/// Current feed for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub profile_ids: Vec<String>,
    pub current_index: usize,
    pub current: Option<Profile>,
    /// Swipe history was ignored to avoid an empty feed
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLikesResponse {
    pub pending_likes: Vec<PendingLike>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
