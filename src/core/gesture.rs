use serde::{Deserialize, Serialize};

use crate::core::error::GestureRejection;
use crate::models::{SwipeDirection, SwipeIntent};

fn default_swipe_threshold() -> f64 {
    120.0
}

fn default_super_like_threshold() -> f64 {
    -150.0
}

fn default_max_rotation() -> f64 {
    15.0
}

fn default_min_scale() -> f64 {
    0.95
}

fn default_min_opacity() -> f64 {
    0.6
}

fn default_fling_distance() -> f64 {
    600.0
}

/// Drag thresholds and visual limits for one card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold_x: f64,
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold_y: f64,
    /// Negative vertical offset past which a release is a super like
    #[serde(default = "default_super_like_threshold")]
    pub super_like_threshold: f64,
    #[serde(default = "default_max_rotation")]
    pub max_rotation_deg: f64,
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_min_opacity")]
    pub min_opacity: f64,
    /// How far off-screen a committed card is thrown
    #[serde(default = "default_fling_distance")]
    pub fling_distance: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold_x: default_swipe_threshold(),
            swipe_threshold_y: default_swipe_threshold(),
            super_like_threshold: default_super_like_threshold(),
            max_rotation_deg: default_max_rotation(),
            min_scale: default_min_scale(),
            min_opacity: default_min_opacity(),
            fling_distance: default_fling_distance(),
        }
    }
}

/// Drag progress in [0, 1]
pub fn drag_magnitude(dx: f64, dy: f64, cfg: &GestureConfig) -> f64 {
    let m = (dx.abs() / cfg.swipe_threshold_x).max(dy.abs() / cfg.swipe_threshold_y);
    if m.is_nan() {
        0.0
    } else {
        m.clamp(0.0, 1.0)
    }
}

/// Direction a release at `(dx, dy)` commits to, if any.
///
/// Horizontal wins over vertical: right, then left, then up.
pub fn classify_release(dx: f64, dy: f64, cfg: &GestureConfig) -> Option<SwipeDirection> {
    if dx > cfg.swipe_threshold_x {
        Some(SwipeDirection::Right)
    } else if dx < -cfg.swipe_threshold_x {
        Some(SwipeDirection::Left)
    } else if dy < cfg.super_like_threshold {
        Some(SwipeDirection::Up)
    } else {
        None
    }
}

/// Values the renderer applies to the card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatedValues {
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotation_deg: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl AnimatedValues {
    pub const REST: AnimatedValues = AnimatedValues {
        translate_x: 0.0,
        translate_y: 0.0,
        rotation_deg: 0.0,
        scale: 1.0,
        opacity: 1.0,
    };

    fn for_drag(dx: f64, dy: f64, magnitude: f64, cfg: &GestureConfig) -> Self {
        let tilt = (dx / cfg.swipe_threshold_x).clamp(-1.0, 1.0);
        Self {
            translate_x: dx,
            translate_y: dy,
            rotation_deg: tilt * cfg.max_rotation_deg,
            scale: 1.0 - (1.0 - cfg.min_scale) * magnitude,
            opacity: 1.0 - (1.0 - cfg.min_opacity) * magnitude,
        }
    }

    /// Off-screen target for a committed fling
    pub fn flung(direction: SwipeDirection, cfg: &GestureConfig) -> Self {
        let (x, y) = match direction {
            SwipeDirection::Right => (cfg.fling_distance, 0.0),
            SwipeDirection::Left => (-cfg.fling_distance, 0.0),
            SwipeDirection::Up => (0.0, -cfg.fling_distance),
        };
        Self {
            translate_x: x,
            translate_y: y,
            rotation_deg: (x / cfg.fling_distance) * cfg.max_rotation_deg,
            scale: cfg.min_scale,
            opacity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    /// Released below threshold; the card is animating back to center
    SpringingBack,
    /// Fling in flight; waiting for the animator to report completion
    Resolving(SwipeDirection),
    /// Swipe processed; values reset before the next card is interactive
    Settling,
}

/// What a release turned into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    Commit(SwipeIntent),
    Cancel,
    /// Release without an active drag
    Ignored,
}

/// Drag-to-swipe state machine for the top card
#[derive(Debug, Clone)]
pub struct CardGesture {
    config: GestureConfig,
    phase: GesturePhase,
    offset: (f64, f64),
    magnitude: f64,
    values: AnimatedValues,
    expanded: bool,
}

impl CardGesture {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            offset: (0.0, 0.0),
            magnitude: 0.0,
            values: AnimatedValues::REST,
            expanded: false,
        }
    }

    /// Start a drag. Rejected without any state change while a swipe is in
    /// flight or the card is expanded.
    pub fn begin(&mut self) -> Result<(), GestureRejection> {
        if self.in_transition() {
            return Err(GestureRejection::InTransition);
        }
        if self.expanded {
            return Err(GestureRejection::Expanded);
        }
        if self.phase == GesturePhase::Dragging {
            return Err(GestureRejection::AlreadyDragging);
        }
        self.phase = GesturePhase::Dragging;
        self.offset = (0.0, 0.0);
        self.magnitude = 0.0;
        Ok(())
    }

    /// Track the finger. Returns the new magnitude, or None if not dragging.
    pub fn update(&mut self, dx: f64, dy: f64) -> Option<f64> {
        if self.phase != GesturePhase::Dragging {
            return None;
        }
        self.offset = (dx, dy);
        self.magnitude = drag_magnitude(dx, dy, &self.config);
        self.values = AnimatedValues::for_drag(dx, dy, self.magnitude, &self.config);
        Some(self.magnitude)
    }

    /// Direction the current drag would commit to if released now
    pub fn intent(&self) -> Option<SwipeIntent> {
        if self.phase != GesturePhase::Dragging {
            return None;
        }
        classify_release(self.offset.0, self.offset.1, &self.config).map(|direction| SwipeIntent {
            direction,
            magnitude: self.magnitude,
        })
    }

    pub fn release(&mut self) -> Release {
        if self.phase != GesturePhase::Dragging {
            return Release::Ignored;
        }

        match self.intent() {
            Some(intent) => {
                self.phase = GesturePhase::Resolving(intent.direction);
                Release::Commit(intent)
            }
            None => {
                self.reset();
                self.phase = GesturePhase::SpringingBack;
                Release::Cancel
            }
        }
    }

    /// Fling animation finished; returns the direction to process exactly
    /// once. Later calls return None until the next commit.
    pub fn complete_fling(&mut self) -> Option<SwipeDirection> {
        match self.phase {
            GesturePhase::Resolving(direction) => {
                self.phase = GesturePhase::Settling;
                self.values = AnimatedValues::flung(direction, &self.config);
                Some(direction)
            }
            _ => None,
        }
    }

    /// Snap values back for the next card and accept gestures again
    pub fn settle(&mut self) {
        if self.phase == GesturePhase::Settling {
            self.reset();
        }
    }

    /// Spring-back animation finished; the card is interactive again
    pub fn finish_spring_back(&mut self) {
        if self.phase == GesturePhase::SpringingBack {
            self.phase = GesturePhase::Idle;
        }
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.offset = (0.0, 0.0);
        self.magnitude = 0.0;
        self.values = AnimatedValues::REST;
    }

    pub fn in_transition(&self) -> bool {
        matches!(
            self.phase,
            GesturePhase::SpringingBack | GesturePhase::Resolving(_) | GesturePhase::Settling
        )
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn values(&self) -> AnimatedValues {
        self.values
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }
}
