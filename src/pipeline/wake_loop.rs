// Wake word loop: capture -> detect -> activate -> acknowledge -> cooldown
// Sole writer of the activation state

use super::{LoopKind, PipelineConfig, PipelineError, StopSignal};
use crate::activation::{ActivationPhase, ActivationState};
use crate::events::{EventSink, PipelineEvent};
use crate::hardware::{HardwareAdapter, HardwareError};
use crate::listening::WakeWordDetector;
use std::sync::Arc;
use std::time::Instant;

/// Everything the wake word thread owns or shares
pub(super) struct WakeLoopState {
    pub hardware: Arc<dyn HardwareAdapter>,
    pub detector: WakeWordDetector,
    pub activation: Arc<ActivationState>,
    pub stop: Arc<StopSignal>,
    pub events: EventSink,
    /// Phase last reported through `ActivationChanged`
    pub reported_phase: ActivationPhase,
}

impl WakeLoopState {
    /// Emit `ActivationChanged` if the phase moved since the last report
    fn report_phase(&mut self) {
        self.report_phase_at(Instant::now());
    }

    fn report_phase_at(&mut self, now: Instant) {
        let phase = self.activation.observe_at(now);
        if phase != self.reported_phase {
            crate::info!("[wake-loop] Activation {} -> {}", self.reported_phase, phase);
            self.events
                .send(PipelineEvent::activation_changed(self.reported_phase, phase));
            self.reported_phase = phase;
        }
    }
}

/// Main loop for the wake word thread
///
/// Returns `Ok` when stopped, or the contract violation that ended it.
pub(super) fn wake_loop_main(
    mut state: WakeLoopState,
    config: PipelineConfig,
) -> Result<(), PipelineError> {
    crate::debug!(
        "[wake-loop] Thread started, chunk={}ms interval={}ms threshold={:.2}",
        config.chunk_duration_ms,
        config.wake_interval.as_millis(),
        config.detector.threshold
    );

    loop {
        if state.stop.is_triggered() {
            crate::debug!("[wake-loop] Stop signal received, exiting");
            break;
        }

        if let Err(e) = run_iteration(&mut state, &config) {
            if e.is_fatal() {
                crate::error!("[wake-loop] Fatal error, loop exiting: {}", e);
                state
                    .events
                    .send(PipelineEvent::loop_error(LoopKind::WakeWord, e.to_string(), true));
                return Err(e);
            }
            crate::warn!("[wake-loop] Iteration failed: {}", e);
            state
                .events
                .send(PipelineEvent::loop_error(LoopKind::WakeWord, e.to_string(), false));
        }

        // Picks up lazy cooldown expiry
        state.report_phase();

        if state.stop.wait_timeout(config.wake_interval) {
            crate::debug!("[wake-loop] Stop signal received during wait, exiting");
            break;
        }
    }

    Ok(())
}

fn run_iteration(state: &mut WakeLoopState, config: &PipelineConfig) -> Result<(), PipelineError> {
    let chunk = state.hardware.capture_audio(config.chunk_duration_ms)?;

    let expected_rate = state.detector.config().sample_rate;
    if chunk.sample_rate() != expected_rate {
        return Err(HardwareError::AudioCapture(format!(
            "chunk sampled at {} Hz, expected {} Hz",
            chunk.sample_rate(),
            expected_rate
        ))
        .into());
    }

    // Oversized chunks are left to the buffer, which rejects them as a contract violation
    let expected = config.chunk_samples();
    if chunk.len() != expected && chunk.len() <= state.detector.buffer().capacity() {
        return Err(HardwareError::Malformed {
            kind: "audio chunk",
            expected,
            actual: chunk.len(),
        }
        .into());
    }

    if !state.detector.process(&chunk)? {
        return Ok(());
    }

    if state.stop.is_triggered() {
        crate::debug!("[wake-loop] Wake word detected but stop requested, skipping");
        return Ok(());
    }

    // Cooldown -> Idle must be reported before Idle -> Active
    let now = Instant::now();
    state.report_phase_at(now);
    if !state.activation.try_activate_at(now) {
        match state.activation.cooldown_remaining_at(now) {
            Some(remaining) => crate::trace!(
                "[wake-loop] Wake word ignored, cooldown ends in {}ms",
                remaining.as_millis()
            ),
            None => crate::trace!("[wake-loop] Wake word ignored, pipeline already activated"),
        }
        return Ok(());
    }

    let probability = state.detector.last_probability().unwrap_or(1.0);
    crate::info!("[wake-loop] WAKE_WORD_DETECTED probability={:.2}", probability);
    state
        .events
        .send(PipelineEvent::wake_word_detected(probability));
    state.report_phase();

    let spoken = state.hardware.speak(&config.acknowledgment);

    // Cooldown starts even if speech failed so the gate always closes again
    state.activation.enter_cooldown(config.cooldown);
    state.report_phase();

    spoken?;
    state.events.send(PipelineEvent::acknowledged());
    Ok(())
}
