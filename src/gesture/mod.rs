//! Gesture classification
//!
//! Pure geometry over a single frame's hand landmarks. Two independent
//! families: thumbs up/down (vertical orientation, used for power control)
//! and open palm (forward facing, used for the screenshot trigger). Each
//! deployment picks exactly one family; the classifiers carry no state.

use crate::config::GestureThresholds;

/// Number of landmarks per detected hand (MediaPipe hand topology).
pub const LANDMARK_COUNT: usize = 21;

const WRIST: usize = 0;
const THUMB_TIP: usize = 4;
const INDEX_TIP: usize = 8;
const MIDDLE_TIP: usize = 12;
const RING_TIP: usize = 16;
const PINKY_TIP: usize = 20;

/// A single hand landmark in normalized [0, 1] image coordinates.
///
/// Image y grows downward, so smaller y means higher in the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One detected hand: 21 landmarks, produced once per detection cycle and
/// consumed by a single classifier invocation.
#[derive(Clone, Debug)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn wrist(&self) -> Landmark {
        self.points[WRIST]
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Landmark {
        self.points[INDEX_TIP]
    }

    pub fn middle_tip(&self) -> Landmark {
        self.points[MIDDLE_TIP]
    }

    pub fn ring_tip(&self) -> Landmark {
        self.points[RING_TIP]
    }

    pub fn pinky_tip(&self) -> Landmark {
        self.points[PINKY_TIP]
    }
}

/// Classification of a single frame's hand geometry. Carries no history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureLabel {
    None,
    ThumbsUp,
    ThumbsDown,
    OpenPalm,
}

/// Thumbs up/down detection.
///
/// Requires clear vertical hand orientation (thumb and index tips
/// horizontally close to the wrist) plus a significant thumb position
/// relative to the index and middle tips. The thumb above both reads as
/// up, below both as down.
pub fn classify_vertical(hand: &LandmarkSet, thresholds: &GestureThresholds) -> GestureLabel {
    let wrist = hand.wrist();
    let thumb = hand.thumb_tip();
    let index = hand.index_tip();
    let middle = hand.middle_tip();

    let vertical_alignment = (thumb.x - wrist.x).abs() < thresholds.vertical_align_tolerance
        && (index.x - wrist.x).abs() < thresholds.vertical_align_tolerance;
    if !vertical_alignment {
        return GestureLabel::None;
    }

    let thumb_index_diff = thumb.y - index.y;
    let thumb_middle_diff = thumb.y - middle.y;

    if thumb_index_diff < -thresholds.thumb_offset_min
        && thumb_middle_diff < -thresholds.thumb_offset_min
    {
        GestureLabel::ThumbsUp
    } else if thumb_index_diff > thresholds.thumb_offset_min
        && thumb_middle_diff > thresholds.thumb_offset_min
    {
        GestureLabel::ThumbsDown
    } else {
        GestureLabel::None
    }
}

/// Open-palm detection: all four non-thumb fingertips above the wrist with
/// the thumb horizontally near it approximates a flat hand facing the
/// camera.
pub fn classify_palm(hand: &LandmarkSet, thresholds: &GestureThresholds) -> GestureLabel {
    let wrist = hand.wrist();
    let thumb = hand.thumb_tip();

    let finger_tips = [
        hand.index_tip(),
        hand.middle_tip(),
        hand.ring_tip(),
        hand.pinky_tip(),
    ];

    let forward = (wrist.x - thumb.x).abs() < thresholds.palm_thumb_tolerance
        && finger_tips.iter().all(|tip| tip.y < wrist.y);

    if forward {
        GestureLabel::OpenPalm
    } else {
        GestureLabel::None
    }
}
