//! Tunable thresholds and timing defaults
//!
//! All of the empirically calibrated constants live here so the classifier
//! and state machines never carry inline magic numbers.

use std::time::Duration;

/// Fallback frame dimensions used for the blank Off-state frame before any
/// frame has been read from the camera.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Geometric tolerances for the gesture classifiers, in normalized
/// image-space coordinates.
#[derive(Clone, Copy, Debug)]
pub struct GestureThresholds {
    /// Max horizontal distance between thumb/index tip and wrist for the
    /// hand to count as vertically aligned.
    pub vertical_align_tolerance: f32,
    /// Min vertical offset between the thumb tip and the index/middle tips
    /// to read as a deliberate thumbs up or down.
    pub thumb_offset_min: f32,
    /// Max horizontal distance between thumb tip and wrist for an open palm
    /// facing the camera.
    pub palm_thumb_tolerance: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            vertical_align_tolerance: 0.15,
            thumb_offset_min: 0.1,
            palm_thumb_tolerance: 0.2,
        }
    }
}

/// Timing for the debounce gates and the Off-state polling policy.
#[derive(Clone, Copy, Debug)]
pub struct ControlTiming {
    /// Minimum interval between two accepted power-toggle triggers.
    pub gesture_cooldown: Duration,
    /// Continuous open-palm duration required before a screenshot fires.
    pub min_hold: Duration,
    /// How often the camera is briefly reacquired while Off to check for a
    /// re-enable gesture.
    pub off_poll_interval: Duration,
    /// How many render ticks the screenshot acknowledgment stays on screen.
    pub ack_ticks: u32,
}

impl Default for ControlTiming {
    fn default() -> Self {
        Self {
            gesture_cooldown: Duration::from_millis(1500),
            min_hold: Duration::from_secs(3),
            off_poll_interval: Duration::from_secs(2),
            ack_ticks: 30,
        }
    }
}
