// Core swipe engine exports
pub mod animation;
pub mod deck;
pub mod engine;
pub mod error;
pub mod feed;
pub mod filters;
pub mod gesture;
pub mod ledger;
pub mod notify;
pub mod processor;
pub mod status;

pub use animation::{spawn_animator, AnimationCommand, AnimationReport, AnimationTiming};
pub use deck::{CardDeck, DeckEvent, TouchEvent};
pub use engine::{Collaborators, EngineConfig, SwipeEngine};
pub use error::{EngineError, GestureRejection};
pub use feed::{derive_feed, FeedManager, FeedView};
pub use filters::{matches_attributes, matches_partition};
pub use gesture::{classify_release, AnimatedValues, CardGesture, GestureConfig, GesturePhase, Release};
pub use ledger::{LedgerSnapshot, MatchLedger};
pub use notify::NotificationTrigger;
pub use processor::{SwipeOutcome, SwipeProcessor};
pub use status::determine_status;

#[cfg(any(test, feature = "testkit"))]
pub use processor::ReciprocationOracle;
