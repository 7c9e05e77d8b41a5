use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::animation::{spawn_animator, AnimationCommand, AnimationReport, AnimationTiming};
use crate::core::engine::SwipeEngine;
use crate::core::error::GestureRejection;
use crate::core::gesture::{AnimatedValues, CardGesture, GestureConfig, Release};
use crate::core::processor::SwipeOutcome;

/// Raw input for the top card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Start,
    /// Offset from where the touch started
    Move { dx: f64, dy: f64 },
    End,
    Expand,
    Collapse,
}

/// Something the deck finished
#[derive(Debug)]
pub enum DeckEvent {
    Swiped {
        profile_id: String,
        outcome: SwipeOutcome,
    },
    SwipeFailed {
        profile_id: String,
        error: String,
    },
    /// Card sprang back to center after a release below threshold
    Cancelled,
}

/// Top-of-stack card: turns touches into gestures, gestures into animations
/// and finished flings into engine swipes.
pub struct CardDeck {
    engine: Arc<SwipeEngine>,
    gesture: CardGesture,
    commands: mpsc::Sender<AnimationCommand>,
    reports: mpsc::Receiver<AnimationReport>,
    animator: JoinHandle<()>,
    /// Profile under the finger, captured when the drag started
    active_profile: Option<String>,
}

impl CardDeck {
    /// Must be called from within a tokio runtime
    pub fn new(engine: Arc<SwipeEngine>, gesture: GestureConfig, timing: AnimationTiming) -> Self {
        let animator = spawn_animator(timing);
        Self {
            engine,
            gesture: CardGesture::new(gesture),
            commands: animator.commands,
            reports: animator.reports,
            animator: animator.handle,
            active_profile: None,
        }
    }

    pub async fn handle_touch(&mut self, event: TouchEvent) -> Result<(), GestureRejection> {
        match event {
            TouchEvent::Start => {
                let current = match self.engine.current_profile() {
                    Some(profile) => profile.id,
                    None => return self.reject(GestureRejection::NoCard),
                };
                if let Err(rejection) = self.gesture.begin() {
                    return self.reject(rejection);
                }
                self.active_profile = Some(current);
            }
            TouchEvent::Move { dx, dy } => {
                self.gesture.update(dx, dy);
            }
            TouchEvent::End => match self.gesture.release() {
                Release::Commit(intent) => {
                    let to = AnimatedValues::flung(intent.direction, self.gesture.config());
                    self.animate(AnimationCommand::Fling {
                        direction: intent.direction,
                        to,
                    })
                    .await;
                }
                Release::Cancel => {
                    self.active_profile = None;
                    self.animate(AnimationCommand::SpringBack).await;
                }
                Release::Ignored => {}
            },
            TouchEvent::Expand => self.gesture.set_expanded(true),
            TouchEvent::Collapse => self.gesture.set_expanded(false),
        }
        Ok(())
    }

    fn reject(&self, rejection: GestureRejection) -> Result<(), GestureRejection> {
        tracing::debug!("Ignoring touch: {}", rejection);
        Err(rejection)
    }

    async fn animate(&self, command: AnimationCommand) {
        if self.commands.send(command).await.is_err() {
            tracing::error!("Animator stopped, dropping {:?}", command);
        }
    }

    /// Wait for the animator and finish whatever it reports.
    ///
    /// Returns None once the animator has stopped.
    pub async fn next_event(&mut self) -> Option<DeckEvent> {
        while let Some(report) = self.reports.recv().await {
            match report {
                AnimationReport::FlingFinished { direction } => {
                    let Some(direction) = self.gesture.complete_fling() else {
                        tracing::debug!("Stray fling report for {}", direction);
                        continue;
                    };
                    let Some(profile_id) = self.active_profile.take() else {
                        self.gesture.settle();
                        continue;
                    };

                    let event = match self.engine.swipe(&profile_id, direction).await {
                        Ok(outcome) => DeckEvent::Swiped {
                            profile_id,
                            outcome,
                        },
                        Err(e) => {
                            tracing::warn!("Swipe on {} failed: {}", profile_id, e);
                            DeckEvent::SwipeFailed {
                                profile_id,
                                error: e.to_string(),
                            }
                        }
                    };
                    self.gesture.settle();
                    return Some(event);
                }
                AnimationReport::SpringBackFinished => {
                    self.gesture.finish_spring_back();
                    return Some(DeckEvent::Cancelled);
                }
            }
        }
        None
    }

    pub fn gesture(&self) -> &CardGesture {
        &self.gesture
    }

    pub fn engine(&self) -> &Arc<SwipeEngine> {
        &self.engine
    }
}

impl Drop for CardDeck {
    fn drop(&mut self) {
        self.animator.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{Collaborators, EngineConfig};
    use crate::core::gesture::GesturePhase;
    use crate::models::{SwipeAction, SwipeDirection};
    use crate::testkit::sample_profiles;

    fn deck() -> CardDeck {
        let engine = SwipeEngine::new(EngineConfig::new("me"), Collaborators::local());
        engine.load_profiles(sample_profiles());
        CardDeck::new(
            Arc::new(engine),
            GestureConfig::default(),
            AnimationTiming::default(),
        )
    }

    async fn drag(deck: &mut CardDeck, dx: f64, dy: f64) {
        deck.handle_touch(TouchEvent::Start).await.unwrap();
        deck.handle_touch(TouchEvent::Move { dx, dy }).await.unwrap();
        deck.handle_touch(TouchEvent::End).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_right_fling_swipes_current_card() {
        let mut deck = deck();

        drag(&mut deck, 200.0, 0.0).await;
        let event = deck.next_event().await.unwrap();

        match event {
            DeckEvent::Swiped {
                profile_id,
                outcome,
            } => {
                assert_eq!(profile_id, "p1");
                assert_eq!(outcome.action(), Some(SwipeAction::Like));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(deck.gesture().phase(), GesturePhase::Idle);
        assert_eq!(deck.gesture().values(), AnimatedValues::REST);
        assert_eq!(deck.engine().feed().current_id(), Some("p2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_during_fling_is_rejected() {
        let mut deck = deck();
        drag(&mut deck, 0.0, -300.0).await;

        let rejected = deck.handle_touch(TouchEvent::Start).await;

        assert_eq!(rejected, Err(GestureRejection::InTransition));
        assert_eq!(deck.engine().feed().current_index, 0);
        assert!(deck.engine().sent_likes().is_empty());

        deck.next_event().await.unwrap();
        assert_eq!(deck.engine().feed().current_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_drag_springs_back() {
        let mut deck = deck();

        drag(&mut deck, 40.0, 0.0).await;

        assert_eq!(
            deck.handle_touch(TouchEvent::Start).await,
            Err(GestureRejection::InTransition)
        );
        assert_eq!(deck.gesture().phase(), GesturePhase::SpringingBack);

        assert!(matches!(deck.next_event().await, Some(DeckEvent::Cancelled)));
        assert_eq!(deck.gesture().phase(), GesturePhase::Idle);
        assert_eq!(deck.engine().feed().current_index, 0);
        assert!(deck.handle_touch(TouchEvent::Start).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expanded_card_ignores_drag() {
        let mut deck = deck();
        deck.handle_touch(TouchEvent::Expand).await.unwrap();

        assert_eq!(
            deck.handle_touch(TouchEvent::Start).await,
            Err(GestureRejection::Expanded)
        );

        deck.handle_touch(TouchEvent::Collapse).await.unwrap();
        drag(&mut deck, -200.0, 0.0).await;
        let event = deck.next_event().await.unwrap();
        assert!(matches!(
            event,
            DeckEvent::Swiped { outcome, .. } if outcome.action() == Some(SwipeDirection::Left.action())
        ));
    }

    #[tokio::test]
    async fn test_empty_stack_rejects_start() {
        let engine = SwipeEngine::new(EngineConfig::new("me"), Collaborators::local());
        let mut deck = CardDeck::new(
            Arc::new(engine),
            GestureConfig::default(),
            AnimationTiming::default(),
        );

        assert_eq!(
            deck.handle_touch(TouchEvent::Start).await,
            Err(GestureRejection::NoCard)
        );
    }
}
