//! Camera power control
//!
//! State machine over the camera's power state. Thumbs up turns the camera
//! on, thumbs down turns it off, both behind a shared cooldown gate. While
//! off, the camera is briefly reacquired on a fixed interval to check for a
//! re-enable gesture, then released again. Transitions live here so the
//! render loop stays free of state-machine logic.

use std::time::{Duration, Instant};

use crate::config::{ControlTiming, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use crate::debounce::CooldownGate;
use crate::error::ControlError;
use crate::gesture::GestureLabel;
use crate::source::{Frame, FrameSource};

/// Power state of the controlled camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

/// Owns the frame source and its binary power state.
pub struct PowerController<S: FrameSource> {
    source: S,
    state: PowerState,
    last_transition: Instant,
    gate: CooldownGate,
    poll_interval: Duration,
    last_poll: Instant,
    /// Dimensions observed at the last successful read, kept so the
    /// Off-state blank frame matches the live feed.
    dimensions: (u32, u32),
}

impl<S: FrameSource> PowerController<S> {
    /// Open the source and start On. Startup failure is fatal.
    pub fn new(mut source: S, timing: &ControlTiming, now: Instant) -> Result<Self, ControlError> {
        source.open()?;
        let dimensions = source
            .dimensions()
            .unwrap_or((DEFAULT_FRAME_WIDTH, DEFAULT_FRAME_HEIGHT));

        Ok(Self {
            source,
            state: PowerState::On,
            last_transition: now,
            gate: CooldownGate::new(timing.gesture_cooldown),
            poll_interval: timing.off_poll_interval,
            last_poll: now,
            dimensions,
        })
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == PowerState::On
    }

    pub fn last_transition(&self) -> Instant {
        self.last_transition
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Read one frame while On. A failed read is a per-tick error: the
    /// caller logs it and continues.
    pub fn read_frame(&mut self) -> Result<Frame, ControlError> {
        if self.state == PowerState::Off {
            return Err(ControlError::ReadFailed("camera is off".to_string()));
        }
        let frame = self.source.read_frame()?;
        self.dimensions = (frame.width, frame.height);
        Ok(frame)
    }

    /// Apply a debounced gesture label. Returns true when a power
    /// transition actually fired. The cooldown window is only consumed by a
    /// real transition; labels that do not match the direction needed to
    /// leave the current state are dropped.
    pub fn apply(&mut self, label: GestureLabel, now: Instant) -> bool {
        let wants_transition = matches!(
            (self.state, label),
            (PowerState::Off, GestureLabel::ThumbsUp) | (PowerState::On, GestureLabel::ThumbsDown)
        );
        if !wants_transition || !self.gate.ready(now) {
            return false;
        }

        match self.state {
            PowerState::Off => {
                if let Err(e) = self.source.open() {
                    log::warn!("Failed to power camera back on: {}", e);
                    return false;
                }
                if let Some(dims) = self.source.dimensions() {
                    self.dimensions = dims;
                }
                self.state = PowerState::On;
                log::info!("Camera turned ON");
            }
            PowerState::On => {
                self.source.close();
                self.state = PowerState::Off;
                self.last_poll = now;
                log::info!("Camera turned OFF");
            }
        }

        self.gate.mark_fired(now);
        self.last_transition = now;
        true
    }

    /// Off-state peek: every poll interval, briefly reacquire the camera,
    /// sample one frame, and run it through the supplied classifier. The
    /// label goes through the same cooldown gate as the main loop. The
    /// camera is released again unless the peek turned it back on. Returns
    /// true when the peek reactivated the camera.
    pub fn poll_off<F>(&mut self, now: Instant, classify: F) -> bool
    where
        F: FnOnce(&Frame) -> GestureLabel,
    {
        if self.state == PowerState::On {
            return false;
        }
        if now.duration_since(self.last_poll) < self.poll_interval {
            return false;
        }
        self.last_poll = now;

        // A failed reacquire is non-fatal; retry at the next poll.
        if let Err(e) = self.source.open() {
            log::warn!("Off-state poll could not reach camera: {}", e);
            return false;
        }

        match self.source.read_frame() {
            Ok(frame) => {
                self.dimensions = (frame.width, frame.height);
                let label = classify(&frame);
                self.apply(label, now);
            }
            Err(e) => log::warn!("Off-state poll read failed: {}", e),
        }

        if self.state == PowerState::Off {
            self.source.close();
            false
        } else {
            true
        }
    }

    /// Release the camera unconditionally. Called exactly once at loop
    /// exit regardless of the current state.
    pub fn shutdown(&mut self) {
        self.source.close();
        log::info!("Power controller shut down");
    }
}
