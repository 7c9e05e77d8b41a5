use crate::models::{MatchStatus, SwipeAction};

/// Derive the status of a pairing from both sides' actions.
///
/// The result does not depend on argument order:
/// - any `pass` → `Pending`
/// - two super likes → `SuperMatched`
/// - one super like and one like → `MixedMatched`
/// - two likes → `Matched`
pub fn determine_status(first: SwipeAction, second: SwipeAction) -> MatchStatus {
    use SwipeAction::*;

    match (first, second) {
        (Pass, _) | (_, Pass) => MatchStatus::Pending,
        (SuperLike, SuperLike) => MatchStatus::SuperMatched,
        (SuperLike, Like) | (Like, SuperLike) => MatchStatus::MixedMatched,
        (Like, Like) => MatchStatus::Matched,
    }
}
