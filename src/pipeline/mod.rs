// Pipeline supervision for the wake word and vision loops
// Two dedicated threads share only the activation state and the hardware handle

mod error;
mod signal;
mod supervisor;
mod vision_loop;
mod wake_loop;

pub use error::PipelineError;
pub use signal::StopSignal;
pub use supervisor::PipelineSupervisor;
pub use vision_loop::reaction_text;

use crate::constants::{
    chunk_len_for, DEFAULT_ACKNOWLEDGMENT, DEFAULT_CHUNK_DURATION_MS, DEFAULT_COOLDOWN_MS,
    DEFAULT_REACTION_TEMPLATE, EMOTION_MODEL_INPUT_SIZE, VISION_LOOP_INTERVAL_MS,
    WAKE_LOOP_INTERVAL_MS, WAKE_WORD_WINDOW_SAMPLES,
};
use crate::listening::WakeWordDetectorConfig;
use serde::Serialize;
use std::time::Duration;

/// Identifies one of the two pipeline loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopKind {
    WakeWord,
    Vision,
}

impl LoopKind {
    pub fn thread_name(self) -> &'static str {
        match self {
            LoopKind::WakeWord => "wake-word-loop",
            LoopKind::Vision => "vision-loop",
        }
    }
}

impl std::fmt::Display for LoopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopKind::WakeWord => write!(f, "wake-word"),
            LoopKind::Vision => write!(f, "vision"),
        }
    }
}

/// Configuration for the pipeline loops
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Duration of each audio capture (milliseconds)
    pub chunk_duration_ms: u32,
    /// Wait after every wake-word iteration
    pub wake_interval: Duration,
    /// Wait after every vision iteration, whether or not the gate was open
    pub vision_interval: Duration,
    /// How long repeated wake words are ignored after an acknowledgment
    pub cooldown: Duration,
    /// Phrase spoken once per activation
    pub acknowledgment: String,
    /// Reaction template; `{emotion}` is replaced by the label
    pub reaction_template: String,
    /// Square edge of the emotion model input
    pub model_input_size: u32,
    /// Wake word detector settings
    pub detector: WakeWordDetectorConfig,
    /// Window length the wake word model accepts, in samples
    pub wake_input_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_duration_ms: DEFAULT_CHUNK_DURATION_MS,
            wake_interval: Duration::from_millis(WAKE_LOOP_INTERVAL_MS),
            vision_interval: Duration::from_millis(VISION_LOOP_INTERVAL_MS),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
            acknowledgment: DEFAULT_ACKNOWLEDGMENT.to_string(),
            reaction_template: DEFAULT_REACTION_TEMPLATE.to_string(),
            model_input_size: EMOTION_MODEL_INPUT_SIZE,
            detector: WakeWordDetectorConfig::default(),
            wake_input_samples: WAKE_WORD_WINDOW_SAMPLES,
        }
    }
}

impl PipelineConfig {
    /// Samples expected in every captured chunk
    pub fn chunk_samples(&self) -> usize {
        chunk_len_for(self.detector.sample_rate, self.chunk_duration_ms)
    }

    /// Reject configurations the loops cannot honour
    ///
    /// # Errors
    /// `ContractViolation` describing the first problem found
    pub fn validate(&self) -> Result<(), PipelineError> {
        let violation = |msg: String| Err(PipelineError::ContractViolation(msg));

        let window = self.detector.window_samples();
        let chunk = self.chunk_samples();
        if window == 0 {
            return violation("wake word window is empty".to_string());
        }
        if chunk == 0 {
            return violation("audio chunk duration yields no samples".to_string());
        }
        if chunk > window {
            return violation(format!(
                "audio chunk of {} samples exceeds wake word window of {} samples",
                chunk, window
            ));
        }
        if window != self.wake_input_samples {
            return violation(format!(
                "wake word window of {} samples does not match model input of {} samples",
                window, self.wake_input_samples
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.threshold) {
            return violation(format!(
                "wake word threshold {} is outside [0, 1]",
                self.detector.threshold
            ));
        }
        if self.wake_interval.is_zero() || self.vision_interval.is_zero() {
            return violation("loop intervals must be non-zero".to_string());
        }
        if self.model_input_size == 0 {
            return violation("emotion model input size must be non-zero".to_string());
        }
        if self.acknowledgment.trim().is_empty() {
            return violation("acknowledgment phrase is empty".to_string());
        }
        Ok(())
    }
}
