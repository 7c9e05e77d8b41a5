//! Swipe Engine - swipe-and-match engine for the roommate matching app
//!
//! This library turns drag gestures on a card stack into like, super like
//! and pass actions, reconciles them into mutual matches and keeps the
//! filtered candidate feed each user swipes through.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

// Re-export commonly used types
pub use crate::core::{CardDeck, EngineError, MatchLedger, SwipeEngine, SwipeOutcome};
pub use models::{Match, MatchStatus, PendingLike, Profile, SearchFilter, SwipeAction, SwipeDirection};
