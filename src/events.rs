// Pipeline events for external observers
// Loops publish through a bounded channel with try_send so observers can never stall capture

use crate::activation::ActivationPhase;
use crate::pipeline::LoopKind;
use crate::vision::EmotionLabel;
use serde::Serialize;
use tokio::sync::mpsc;

/// Events emitted by the pipeline loops
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PipelineEvent {
    /// The wake-word loop observed a phase change (including lazy cooldown expiry)
    ActivationChanged {
        from: ActivationPhase,
        to: ActivationPhase,
        timestamp: String,
    },
    /// The detector fired while the pipeline was idle
    WakeWordDetected { probability: f32, timestamp: String },
    /// The acknowledgment phrase was handed to the speaker
    Acknowledged { timestamp: String },
    /// One vision loop iteration started
    VisionTick { gate_open: bool, timestamp: String },
    /// A frame was classified; `spoken` is false for suppressed reactions
    EmotionClassified {
        label: EmotionLabel,
        spoken: bool,
        timestamp: String,
    },
    /// A loop iteration failed
    LoopError {
        source: LoopKind,
        message: String,
        fatal: bool,
        timestamp: String,
    },
}

impl PipelineEvent {
    pub fn activation_changed(from: ActivationPhase, to: ActivationPhase) -> Self {
        Self::ActivationChanged {
            from,
            to,
            timestamp: current_timestamp(),
        }
    }

    pub fn wake_word_detected(probability: f32) -> Self {
        Self::WakeWordDetected {
            probability,
            timestamp: current_timestamp(),
        }
    }

    pub fn acknowledged() -> Self {
        Self::Acknowledged {
            timestamp: current_timestamp(),
        }
    }

    pub fn vision_tick(gate_open: bool) -> Self {
        Self::VisionTick {
            gate_open,
            timestamp: current_timestamp(),
        }
    }

    pub fn emotion_classified(label: EmotionLabel, spoken: bool) -> Self {
        Self::EmotionClassified {
            label,
            spoken,
            timestamp: current_timestamp(),
        }
    }

    pub fn loop_error(source: LoopKind, message: impl Into<String>, fatal: bool) -> Self {
        Self::LoopError {
            source,
            message: message.into(),
            fatal,
            timestamp: current_timestamp(),
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Self::Acknowledged { .. })
    }
}

/// Sending half handed to each loop
///
/// A sink without a subscriber silently discards events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Publish without blocking; drops the event if the channel is full or closed
    pub fn send(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.try_send(event) {
                crate::trace!("[events] Dropped pipeline event: {}", e);
            }
        }
    }
}

/// RFC 3339 timestamp for event payloads
pub fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_sink_discards() {
        // Must not panic or block
        EventSink::disabled().send(PipelineEvent::acknowledged());
    }

    #[test]
    fn test_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = EventSink::new(tx);
        sink.send(PipelineEvent::vision_tick(true));
        sink.send(PipelineEvent::vision_tick(false));

        assert!(matches!(
            rx.try_recv(),
            Ok(PipelineEvent::VisionTick { gate_open: true, .. })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        EventSink::new(tx).send(PipelineEvent::acknowledged());
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sink = EventSink::new(tx);
        sink.send(PipelineEvent::wake_word_detected(0.95));
        sink.send(PipelineEvent::acknowledged());
        sink.send(PipelineEvent::loop_error(LoopKind::Vision, "camera busy", false));

        assert!(matches!(
            rx.recv().await,
            Some(PipelineEvent::WakeWordDetected { .. })
        ));
        assert!(rx.recv().await.unwrap().is_acknowledged());
        match rx.recv().await.unwrap() {
            PipelineEvent::LoopError {
                source,
                message,
                fatal,
                ..
            } => {
                assert_eq!(source, LoopKind::Vision);
                assert_eq!(message, "camera busy");
                assert!(!fatal);
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = PipelineEvent::emotion_classified(EmotionLabel::Happy, true);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "emotionClassified");
        assert_eq!(json["label"], "happy");
        assert_eq!(json["spoken"], true);
        assert!(json["timestamp"].as_str().is_some());
    }

    #[test]
    fn test_current_timestamp_is_rfc3339() {
        let ts = current_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
