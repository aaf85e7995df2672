//! Debounce state machines
//!
//! Converts the raw per-frame gesture signal into stable triggers. Two
//! modes: a cooldown gate that accepts at most one trigger per window, and
//! a hold gate that fires exactly once per unbroken sustained-pose episode.
//! Both take an explicit `now` so tests can drive a synthetic clock.

use std::time::{Duration, Instant};

use crate::gesture::GestureLabel;

/// At most one accepted trigger per cooldown window.
#[derive(Debug)]
pub struct CooldownGate {
    cooldown: Duration,
    last_fired: Option<Instant>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: None,
        }
    }

    /// Whether the cooldown window has elapsed since the last accepted
    /// trigger.
    pub fn ready(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(fired) => now.duration_since(fired) > self.cooldown,
        }
    }

    /// Consume the window. Call only when a trigger actually fires, so a
    /// direction-mismatched label does not block a later valid one.
    pub fn mark_fired(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }

    /// Accept a label: true iff it is a real gesture and the window has
    /// elapsed. Consumes the window on acceptance.
    pub fn accept(&mut self, label: GestureLabel, now: Instant) -> bool {
        if label == GestureLabel::None || !self.ready(now) {
            return false;
        }
        self.mark_fired(now);
        true
    }
}

/// Fires exactly once per unbroken hold episode of at least `min_hold`.
///
/// Breaking the pose resets the episode entirely; a hold that breaks and
/// resumes restarts the duration count from zero.
#[derive(Debug)]
pub struct HoldGate {
    min_hold: Duration,
    hold_started: Option<Instant>,
    fired: bool,
}

impl HoldGate {
    pub fn new(min_hold: Duration) -> Self {
        Self {
            min_hold,
            hold_started: None,
            fired: false,
        }
    }

    /// Feed one tick's pose condition. Returns true exactly once per
    /// episode, at the tick where the hold duration first reaches
    /// `min_hold`.
    pub fn update(&mut self, held: bool, now: Instant) -> bool {
        if !held {
            self.hold_started = None;
            self.fired = false;
            return false;
        }
        let started = *self.hold_started.get_or_insert(now);
        if !self.fired && now.duration_since(started) >= self.min_hold {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn is_holding(&self) -> bool {
        self.hold_started.is_some()
    }
}
