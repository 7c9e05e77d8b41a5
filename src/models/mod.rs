// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    FeedbackKind, LookingFor, Match, MatchStatus, PendingLike, Profile, SavedListing,
    SearchFilter, SwipeAction, SwipeDirection, SwipeIntent, SwipeRecord,
};
pub use requests::{AttachConversationRequest, SeedProfilesRequest, SwipeRequest, UserQuery};
pub use responses::{
    ErrorResponse, FeedResponse, HealthResponse, MatchesResponse, PendingLikesResponse,
    SwipeResponse,
};
