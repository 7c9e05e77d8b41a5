use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::Profile;

/// Request to record a committed swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: String,
    /// One of `left`, `right`, `up`
    #[validate(length(min = 1))]
    pub direction: String,
}

/// Query parameters identifying the acting user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Attach a conversation to an existing match
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachConversationRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "conversation_id", rename = "conversationId")]
    pub conversation_id: String,
}

/// Replace the candidate source used by engines without a backend
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeedProfilesRequest {
    #[validate(length(min = 1))]
    pub profiles: Vec<Profile>,
}
