use super::*;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::thread;

fn at(state: &ActivationState, ms: u64) -> Instant {
    state.created_at() + Duration::from_millis(ms)
}

#[test]
fn test_starts_idle_with_gate_closed() {
    let state = ActivationState::new();
    assert_eq!(state.observe(), ActivationPhase::Idle);
    assert!(!state.is_gate_open());
}

/// Test complete flow: Idle -> Active -> Cooldown -> Idle
#[test]
fn test_complete_activation_flow() {
    let state = ActivationState::new();

    assert!(state.try_activate_at(at(&state, 10)));
    assert_eq!(state.observe_at(at(&state, 10)), ActivationPhase::Active);

    assert!(state.enter_cooldown_at(at(&state, 50), Duration::from_millis(200)));
    assert_eq!(state.observe_at(at(&state, 51)), ActivationPhase::Cooldown);
    assert_eq!(state.observe_at(at(&state, 249)), ActivationPhase::Cooldown);

    // Lazily expired; no writer involved
    assert_eq!(state.observe_at(at(&state, 250)), ActivationPhase::Idle);
    assert_eq!(state.observe_at(at(&state, 900)), ActivationPhase::Idle);
}

#[test]
fn test_repeated_triggers_ignored_until_expiry() {
    let state = ActivationState::new();
    assert!(state.try_activate_at(at(&state, 0)));

    // Consecutive detections while Active
    assert!(!state.try_activate_at(at(&state, 100)));
    assert!(!state.try_activate_at(at(&state, 200)));

    assert!(state.enter_cooldown_at(at(&state, 300), Duration::from_millis(2000)));

    // Consecutive detections while cooling down
    assert!(!state.try_activate_at(at(&state, 400)));
    assert!(!state.try_activate_at(at(&state, 2299)));

    // A detection after expiry is a fresh trigger
    assert!(state.try_activate_at(at(&state, 2300)));
    assert_eq!(state.observe_at(at(&state, 2300)), ActivationPhase::Active);
}

#[test]
fn test_enter_cooldown_requires_active() {
    let state = ActivationState::new();
    assert!(!state.enter_cooldown_at(at(&state, 0), Duration::from_millis(100)));
    assert_eq!(state.observe_at(at(&state, 1)), ActivationPhase::Idle);

    state.try_activate_at(at(&state, 0));
    assert!(state.enter_cooldown_at(at(&state, 0), Duration::from_millis(100)));
    // Already cooling down
    assert!(!state.enter_cooldown_at(at(&state, 10), Duration::from_millis(100)));
}

#[test]
fn test_cooldown_remaining() {
    let state = ActivationState::new();
    assert_eq!(state.cooldown_remaining_at(at(&state, 0)), None);

    state.try_activate_at(at(&state, 0));
    assert_eq!(state.cooldown_remaining_at(at(&state, 0)), None);

    state.enter_cooldown_at(at(&state, 100), Duration::from_millis(500));
    assert_eq!(
        state.cooldown_remaining_at(at(&state, 350)),
        Some(Duration::from_millis(250))
    );
    assert_eq!(state.cooldown_remaining_at(at(&state, 600)), None);
}

#[test]
fn test_gate_open_only_while_active_or_cooling_down() {
    assert!(!ActivationPhase::Idle.is_gate_open());
    assert!(ActivationPhase::Active.is_gate_open());
    assert!(ActivationPhase::Cooldown.is_gate_open());
}

#[test]
fn test_zero_cooldown_expires_immediately() {
    let state = ActivationState::new();
    state.try_activate_at(at(&state, 5));
    state.enter_cooldown_at(at(&state, 5), Duration::ZERO);
    assert_eq!(state.observe_at(at(&state, 5)), ActivationPhase::Idle);
}

#[test]
fn test_concurrent_activation_has_single_winner() {
    let state = Arc::new(ActivationState::new());
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            let winners = winners.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    if state.try_activate() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(state.observe(), ActivationPhase::Active);
}

#[test]
fn test_phase_display() {
    assert_eq!(ActivationPhase::Idle.to_string(), "idle");
    assert_eq!(ActivationPhase::Cooldown.to_string(), "cooldown");
}

#[test]
fn test_phase_serializes_camel_case() {
    let json = serde_json::to_string(&ActivationPhase::Cooldown).unwrap();
    assert_eq!(json, "\"cooldown\"");
}
