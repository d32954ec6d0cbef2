// Vision loop: gated frame capture, emotion classification and spoken reaction
// Reads the activation state but never writes it

use super::{LoopKind, PipelineConfig, PipelineError, StopSignal};
use crate::activation::ActivationState;
use crate::events::{EventSink, PipelineEvent};
use crate::hardware::HardwareAdapter;
use crate::vision::{EmotionClassifier, EmotionLabel};
use std::sync::Arc;

/// Placeholder substituted with the emotion label in reaction templates
const EMOTION_PLACEHOLDER: &str = "{emotion}";

pub(super) struct VisionLoopState {
    pub hardware: Arc<dyn HardwareAdapter>,
    pub classifier: EmotionClassifier,
    pub activation: Arc<ActivationState>,
    pub stop: Arc<StopSignal>,
    pub events: EventSink,
}

/// Reaction phrase for `label`, or `None` when nothing should be said
///
/// Neutral faces get no reaction.
pub fn reaction_text(template: &str, label: EmotionLabel) -> Option<String> {
    match label {
        EmotionLabel::Neutral => None,
        other => Some(template.replace(EMOTION_PLACEHOLDER, other.as_str())),
    }
}

/// Main loop for the vision thread
///
/// The camera and emotion model are touched only while the gate is open.
pub(super) fn vision_loop_main(
    state: VisionLoopState,
    config: PipelineConfig,
) -> Result<(), PipelineError> {
    crate::debug!(
        "[vision-loop] Thread started, interval={}ms",
        config.vision_interval.as_millis()
    );

    loop {
        if state.stop.is_triggered() {
            crate::debug!("[vision-loop] Stop signal received, exiting");
            break;
        }

        let gate_open = state.activation.is_gate_open();
        state.events.send(PipelineEvent::vision_tick(gate_open));

        if gate_open {
            if let Err(e) = run_iteration(&state, &config) {
                if e.is_fatal() {
                    crate::error!("[vision-loop] Fatal error, loop exiting: {}", e);
                    state
                        .events
                        .send(PipelineEvent::loop_error(LoopKind::Vision, e.to_string(), true));
                    return Err(e);
                }
                crate::warn!("[vision-loop] Iteration failed: {}", e);
                state
                    .events
                    .send(PipelineEvent::loop_error(LoopKind::Vision, e.to_string(), false));
            }
        } else {
            crate::trace!("[vision-loop] Gate closed, skipping capture");
        }

        if state.stop.wait_timeout(config.vision_interval) {
            crate::debug!("[vision-loop] Stop signal received during wait, exiting");
            break;
        }
    }

    Ok(())
}

fn run_iteration(state: &VisionLoopState, config: &PipelineConfig) -> Result<(), PipelineError> {
    let frame = state.hardware.capture_frame()?;

    if state.stop.is_triggered() {
        crate::debug!("[vision-loop] Frame captured but stop requested, skipping");
        return Ok(());
    }

    let label = state.classifier.classify(&frame)?;
    crate::debug!("[vision-loop] Classified emotion: {}", label);

    match reaction_text(&config.reaction_template, label) {
        Some(text) => {
            state.hardware.speak(&text)?;
            state
                .events
                .send(PipelineEvent::emotion_classified(label, true));
        }
        None => {
            state
                .events
                .send(PipelineEvent::emotion_classified(label, false));
        }
    }
    Ok(())
}
