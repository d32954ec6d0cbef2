// Wake word detector backed by an opaque probability model
// Feeds each captured chunk into the rolling window and scores the whole window

use super::RollingAudioBuffer;
use crate::constants::{DEFAULT_SAMPLE_RATE, DEFAULT_WAKE_THRESHOLD, WAKE_WORD_WINDOW_SECS};
use crate::hardware::AudioChunk;
use crate::model::{InferenceModel, ModelError, Tensor};
use crate::pipeline::PipelineError;
use std::sync::Arc;

/// Output shape of the wake word model: one probability for one window
const WAKE_OUTPUT_SHAPE: [usize; 2] = [1, 1];

/// Configuration for wake word detection
#[derive(Debug, Clone, PartialEq)]
pub struct WakeWordDetectorConfig {
    /// Detection requires a probability strictly above this (0.0 - 1.0)
    pub threshold: f32,
    /// Rolling window duration in seconds
    pub window_duration_secs: f32,
    /// Sample rate in Hz (must match audio input)
    pub sample_rate: u32,
}

impl Default for WakeWordDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_WAKE_THRESHOLD,
            window_duration_secs: WAKE_WORD_WINDOW_SECS,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl WakeWordDetectorConfig {
    /// Samples in one rolling window
    pub fn window_samples(&self) -> usize {
        (self.window_duration_secs * self.sample_rate as f32).round() as usize
    }
}

/// Wake word detector
///
/// Owns the rolling window outright. The only state change per call is the
/// buffer push; the decision is a pure function of window contents and the
/// model.
pub struct WakeWordDetector {
    config: WakeWordDetectorConfig,
    model: Arc<dyn InferenceModel>,
    buffer: RollingAudioBuffer,
    last_probability: Option<f32>,
}

impl WakeWordDetector {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self::with_config(model, WakeWordDetectorConfig::default())
    }

    pub fn with_config(model: Arc<dyn InferenceModel>, config: WakeWordDetectorConfig) -> Self {
        let buffer = RollingAudioBuffer::new(config.window_samples());
        Self {
            config,
            model,
            buffer,
            last_probability: None,
        }
    }

    /// Push `chunk` and decide whether the window contains the wake word
    ///
    /// The model output is clamped to [0, 1] before comparison; a
    /// non-finite probability is reported as a model failure.
    ///
    /// # Errors
    /// - `ContractViolation` if the chunk is longer than the window
    /// - `Model` if inference fails or returns the wrong shape
    pub fn process(&mut self, chunk: &AudioChunk) -> Result<bool, PipelineError> {
        self.buffer.push(chunk)?;

        let window = self.buffer.snapshot();
        let input = Tensor::new(vec![1, window.len(), 1], window)?;
        let output = self.model.infer(&input)?;
        output.expect_shape(&WAKE_OUTPUT_SHAPE)?;

        let raw = output.data()[0];
        if !raw.is_finite() {
            return Err(ModelError::InvalidOutput(format!("wake probability {}", raw)).into());
        }
        let probability = raw.clamp(0.0, 1.0);
        if probability != raw {
            crate::debug!(
                "[detector] Model returned out-of-range probability {}, clamped to {}",
                raw,
                probability
            );
        }
        self.last_probability = Some(probability);

        let detected = probability > self.config.threshold;
        crate::trace!(
            "[detector] probability={:.3} threshold={:.3} detected={}",
            probability,
            self.config.threshold,
            detected
        );
        Ok(detected)
    }

    /// Probability from the most recent successful `process` call
    pub fn last_probability(&self) -> Option<f32> {
        self.last_probability
    }

    pub fn config(&self) -> &WakeWordDetectorConfig {
        &self.config
    }

    pub fn buffer(&self) -> &RollingAudioBuffer {
        &self.buffer
    }
}
