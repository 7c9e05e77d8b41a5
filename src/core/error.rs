use thiserror::Error;

use crate::services::{BackendError, StorageError};

/// Why a drag start was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GestureRejection {
    #[error("a card transition is still in flight")]
    InTransition,

    #[error("the card is showing its expanded detail view")]
    Expanded,

    #[error("a drag is already active on this card")]
    AlreadyDragging,

    #[error("there is no card to swipe")]
    NoCard,
}

/// Errors surfaced by the swipe engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid swipe direction: {0}")]
    InvalidDirection(String),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Gesture rejected: {0}")]
    GestureRejected(#[from] GestureRejection),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Sync failure: {0}")]
    Sync(#[from] BackendError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
