// Unit tests for the swipe engine's pure building blocks

use std::collections::HashSet;

use swipe_engine::core::{
    classify_release, derive_feed, determine_status, matches_attributes, matches_partition,
    GestureConfig, MatchLedger,
};
use swipe_engine::models::{LookingFor, MatchStatus, Profile, SearchFilter, SwipeAction, SwipeDirection};
use swipe_engine::testkit::{listing, seeker};

const ACTIONS: [SwipeAction; 3] = [SwipeAction::Like, SwipeAction::SuperLike, SwipeAction::Pass];

#[test]
fn test_status_table() {
    use MatchStatus::*;
    use SwipeAction::*;

    let expected = [
        (Like, Like, Matched),
        (Like, SuperLike, MixedMatched),
        (Like, Pass, Pending),
        (SuperLike, Like, MixedMatched),
        (SuperLike, SuperLike, SuperMatched),
        (SuperLike, Pass, Pending),
        (Pass, Like, Pending),
        (Pass, SuperLike, Pending),
        (Pass, Pass, Pending),
    ];

    for (a, b, status) in expected {
        assert_eq!(determine_status(a, b), status, "{:?} x {:?}", a, b);
    }
}

#[test]
fn test_status_is_symmetric() {
    for a in ACTIONS {
        for b in ACTIONS {
            assert_eq!(determine_status(a, b), determine_status(b, a));
        }
    }
}

#[test]
fn test_pending_status_is_never_materialized() {
    for a in ACTIONS {
        for b in ACTIONS {
            let ledger = MatchLedger::new();
            ledger.record_action("x", "y", a);
            let result = ledger.record_action("y", "x", b);

            for m in ledger.snapshot().matches {
                assert!(m.status.is_real());
            }
            assert_eq!(result.is_some(), a.is_positive() && b.is_positive());
        }
    }
}

#[test]
fn test_partition() {
    assert!(matches_partition(&seeker("s"), LookingFor::Roommate));
    assert!(!matches_partition(&listing("l"), LookingFor::Roommate));
    assert!(matches_partition(&listing("l"), LookingFor::Place));
    assert!(!matches_partition(&seeker("s"), LookingFor::Place));
    assert!(matches_partition(&seeker("s"), LookingFor::Both));
    assert!(matches_partition(&listing("l"), LookingFor::Both));
}

#[test]
fn test_budget_range_filter() {
    let filter = SearchFilter {
        min_budget: Some(1000),
        max_budget: Some(1500),
        ..SearchFilter::default()
    };

    // listing rent 1100, seeker budget 900
    assert!(matches_attributes(&listing("l"), &filter));
    assert!(!matches_attributes(&seeker("s"), &filter));
    assert!(matches_attributes(&Profile::new("unknown", false), &filter));
}

#[test]
fn test_room_attributes_only_apply_to_listings() {
    let filter = SearchFilter {
        private_bathroom: Some(true),
        ..SearchFilter::default()
    };

    assert!(!matches_attributes(&listing("l"), &filter));
    assert!(matches_attributes(&seeker("s"), &filter));
}

#[test]
fn test_derive_feed_never_empty_when_partition_has_profiles() {
    let source = vec![seeker("a"), seeker("b"), listing("c")];
    let history: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let filter = SearchFilter {
        looking_for: LookingFor::Roommate,
        verified_only: true,
        ..SearchFilter::default()
    };

    let (ids, used_fallback) = derive_feed(&source, &filter, &history, &HashSet::new(), false);

    assert_eq!(ids, vec!["a", "b"]);
    assert!(used_fallback);
}

#[test]
fn test_derive_feed_empty_when_everything_matched() {
    let source = vec![seeker("a")];
    let matched = HashSet::from(["a".to_string()]);

    let (ids, used_fallback) =
        derive_feed(&source, &SearchFilter::default(), &HashSet::new(), &matched, false);

    assert!(ids.is_empty());
    assert!(!used_fallback);
}

#[test]
fn test_release_thresholds() {
    let cfg = GestureConfig::default();

    assert_eq!(classify_release(150.0, 0.0, &cfg), Some(SwipeDirection::Right));
    assert_eq!(classify_release(-150.0, 0.0, &cfg), Some(SwipeDirection::Left));
    assert_eq!(classify_release(0.0, -200.0, &cfg), Some(SwipeDirection::Up));
    assert_eq!(classify_release(0.0, -100.0, &cfg), None);
    assert_eq!(classify_release(0.0, 200.0, &cfg), None);
}
