//! Animator task driving card flings and spring-backs.
//!
//! The deck and the animator share nothing. Commands flow in on one bounded
//! channel and completion reports flow back on another.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::gesture::AnimatedValues;
use crate::models::SwipeDirection;

fn default_fling_ms() -> u64 {
    250
}

fn default_spring_back_ms() -> u64 {
    200
}

fn default_channel_capacity() -> usize {
    8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationTiming {
    #[serde(default = "default_fling_ms")]
    pub fling_ms: u64,
    #[serde(default = "default_spring_back_ms")]
    pub spring_back_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            fling_ms: default_fling_ms(),
            spring_back_ms: default_spring_back_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationCommand {
    Fling {
        direction: SwipeDirection,
        to: AnimatedValues,
    },
    SpringBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationReport {
    FlingFinished { direction: SwipeDirection },
    SpringBackFinished,
}

/// Handles to a running animator task
pub struct Animator {
    pub commands: mpsc::Sender<AnimationCommand>,
    pub reports: mpsc::Receiver<AnimationReport>,
    pub handle: JoinHandle<()>,
}

/// Spawn the animator on the current runtime.
///
/// The task exits when the command sender is dropped or nobody is left to
/// read reports.
pub fn spawn_animator(timing: AnimationTiming) -> Animator {
    let capacity = timing.channel_capacity.max(1);
    let (command_tx, mut command_rx) = mpsc::channel::<AnimationCommand>(capacity);
    let (report_tx, report_rx) = mpsc::channel::<AnimationReport>(capacity);

    let handle = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            let report = match command {
                AnimationCommand::Fling { direction, to } => {
                    tracing::trace!(
                        "Flinging card {} to ({}, {})",
                        direction,
                        to.translate_x,
                        to.translate_y
                    );
                    tokio::time::sleep(Duration::from_millis(timing.fling_ms)).await;
                    AnimationReport::FlingFinished { direction }
                }
                AnimationCommand::SpringBack => {
                    tokio::time::sleep(Duration::from_millis(timing.spring_back_ms)).await;
                    AnimationReport::SpringBackFinished
                }
            };

            if report_tx.send(report).await.is_err() {
                tracing::debug!("Animation report receiver dropped, stopping animator");
                break;
            }
        }
    });

    Animator {
        commands: command_tx,
        reports: report_rx,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture::GestureConfig;

    #[tokio::test(start_paused = true)]
    async fn test_fling_reports_after_duration() {
        let mut animator = spawn_animator(AnimationTiming::default());
        let start = tokio::time::Instant::now();

        animator
            .commands
            .send(AnimationCommand::Fling {
                direction: SwipeDirection::Up,
                to: AnimatedValues::flung(SwipeDirection::Up, &GestureConfig::default()),
            })
            .await
            .unwrap();

        let report = animator.reports.recv().await.unwrap();
        assert_eq!(
            report,
            AnimationReport::FlingFinished {
                direction: SwipeDirection::Up
            }
        );
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_in_command_order() {
        let mut animator = spawn_animator(AnimationTiming::default());

        animator.commands.send(AnimationCommand::SpringBack).await.unwrap();
        animator
            .commands
            .send(AnimationCommand::Fling {
                direction: SwipeDirection::Left,
                to: AnimatedValues::REST,
            })
            .await
            .unwrap();

        assert_eq!(
            animator.reports.recv().await,
            Some(AnimationReport::SpringBackFinished)
        );
        assert_eq!(
            animator.reports.recv().await,
            Some(AnimationReport::FlingFinished {
                direction: SwipeDirection::Left
            })
        );
    }

    #[tokio::test]
    async fn test_stops_when_commands_close() {
        let animator = spawn_animator(AnimationTiming::default());
        drop(animator.commands);

        animator.handle.await.unwrap();
    }
}
