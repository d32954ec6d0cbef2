//! Activation state shared by the wake-word and vision loops.
//!
//! State flow: Idle -> (wake word) -> Active -> (acknowledged) -> Cooldown -> (expiry) -> Idle
//!
//! The phase tag and the cooldown expiry are packed into a single `AtomicU64`
//! so a reader always sees a consistent pair from one load, and every
//! transition is a single compare-and-swap. Cooldown expiry is evaluated
//! lazily: a reader that finds an expired cooldown treats it as `Idle` for
//! that read, so no timer thread is needed.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Bits above this hold the phase tag
const TAG_SHIFT: u32 = 62;
/// Low bits hold the cooldown expiry in microseconds since the state epoch
const EXPIRY_MASK: u64 = (1 << TAG_SHIFT) - 1;

const TAG_IDLE: u64 = 0;
const TAG_ACTIVE: u64 = 1;
const TAG_COOLDOWN: u64 = 2;

/// Observable activation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivationPhase {
    /// Waiting for the wake word; camera and emotion model stay off
    Idle,
    /// Wake word heard, acknowledgment in progress
    Active,
    /// Acknowledged; repeated triggers are ignored until expiry
    Cooldown,
}

impl ActivationPhase {
    /// Whether the vision loop may use the camera and emotion model
    pub fn is_gate_open(self) -> bool {
        !matches!(self, ActivationPhase::Idle)
    }
}

impl std::fmt::Display for ActivationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationPhase::Idle => write!(f, "idle"),
            ActivationPhase::Active => write!(f, "active"),
            ActivationPhase::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// Lock-free activation state machine
///
/// Written only by the wake-word loop, read by both loops.
#[derive(Debug)]
pub struct ActivationState {
    epoch: Instant,
    word: AtomicU64,
}

impl ActivationState {
    /// Create a new state in `Idle`
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            word: AtomicU64::new(encode(TAG_IDLE, 0)),
        }
    }

    /// Instant the state was created; expiry times are measured from here
    pub fn created_at(&self) -> Instant {
        self.epoch
    }

    /// Current phase, with an expired cooldown reported as `Idle`
    pub fn observe(&self) -> ActivationPhase {
        self.observe_at(Instant::now())
    }

    pub fn observe_at(&self, now: Instant) -> ActivationPhase {
        phase_of(self.word.load(Ordering::SeqCst), self.micros_at(now))
    }

    /// Shorthand for `observe().is_gate_open()`
    pub fn is_gate_open(&self) -> bool {
        self.observe().is_gate_open()
    }

    /// Time left in the current cooldown, if one is running
    pub fn cooldown_remaining_at(&self, now: Instant) -> Option<Duration> {
        let word = self.word.load(Ordering::SeqCst);
        let now_us = self.micros_at(now);
        match phase_of(word, now_us) {
            ActivationPhase::Cooldown => {
                Some(Duration::from_micros((word & EXPIRY_MASK) - now_us))
            }
            _ => None,
        }
    }

    /// Idle -> Active
    ///
    /// Returns `true` only for the call that performed the transition.
    /// Fails (returns `false`) while `Active` or in an unexpired `Cooldown`,
    /// which is what suppresses repeated acknowledgments.
    pub fn try_activate(&self) -> bool {
        self.try_activate_at(Instant::now())
    }

    pub fn try_activate_at(&self, now: Instant) -> bool {
        let now_us = self.micros_at(now);
        self.word
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
                (phase_of(word, now_us) == ActivationPhase::Idle).then(|| encode(TAG_ACTIVE, 0))
            })
            .is_ok()
    }

    /// Active -> Cooldown, expiring `duration` after `now`
    ///
    /// Returns `false` if the state was not `Active`.
    pub fn enter_cooldown(&self, duration: Duration) -> bool {
        self.enter_cooldown_at(Instant::now(), duration)
    }

    pub fn enter_cooldown_at(&self, now: Instant, duration: Duration) -> bool {
        let expiry = self
            .micros_at(now)
            .saturating_add(duration.as_micros().min(EXPIRY_MASK as u128) as u64)
            .min(EXPIRY_MASK);
        self.word
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |word| {
                (word >> TAG_SHIFT == TAG_ACTIVE).then(|| encode(TAG_COOLDOWN, expiry))
            })
            .is_ok()
    }

    fn micros_at(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.epoch)
            .as_micros()
            .min(EXPIRY_MASK as u128) as u64
    }
}

impl Default for ActivationState {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(tag: u64, expiry_us: u64) -> u64 {
    (tag << TAG_SHIFT) | (expiry_us & EXPIRY_MASK)
}

fn phase_of(word: u64, now_us: u64) -> ActivationPhase {
    match word >> TAG_SHIFT {
        TAG_ACTIVE => ActivationPhase::Active,
        TAG_COOLDOWN if now_us < (word & EXPIRY_MASK) => ActivationPhase::Cooldown,
        _ => ActivationPhase::Idle,
    }
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
