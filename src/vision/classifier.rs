// Facial expression classifier
// Resizes a captured frame to the model's square input and picks the top-scoring label

use crate::constants::{EMOTION_CLASS_COUNT, EMOTION_MODEL_INPUT_SIZE, FRAME_CHANNELS};
use crate::hardware::{HardwareError, VideoFrame};
use crate::model::{InferenceModel, ModelError, Tensor};
use crate::pipeline::PipelineError;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgb};
use serde::Serialize;
use std::sync::Arc;

const U16_SCALE: f32 = u16::MAX as f32;

/// Expression labels in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    /// All labels, indexed by model output position
    pub const ALL: [EmotionLabel; EMOTION_CLASS_COUNT] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotion classifier
///
/// Stateless apart from the model handle. Resizing to the model input is
/// done here, not by the hardware adapter.
pub struct EmotionClassifier {
    model: Arc<dyn InferenceModel>,
    input_size: u32,
}

impl EmotionClassifier {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self::with_input_size(model, EMOTION_MODEL_INPUT_SIZE)
    }

    pub fn with_input_size(model: Arc<dyn InferenceModel>, input_size: u32) -> Self {
        Self { model, input_size }
    }

    /// Classify one frame
    ///
    /// # Errors
    /// - `Hardware` if the frame data cannot be interpreted as an RGB image
    /// - `Model` if inference fails, the output is not `(1, 7)`, or a score is NaN
    pub fn classify(&self, frame: &VideoFrame) -> Result<EmotionLabel, PipelineError> {
        let input = self.preprocess(frame)?;
        let output = self.model.infer(&input)?;
        output.expect_shape(&[1, EMOTION_CLASS_COUNT])?;

        let index = argmax(output.data())?;
        let label = EmotionLabel::from_index(index)
            .ok_or_else(|| ModelError::InvalidOutput(format!("emotion index {}", index)))?;
        crate::trace!("[classifier] scores={:?} label={}", output.data(), label);
        Ok(label)
    }

    /// Frame -> `(1, size, size, 3)` tensor with values in [0, 1]
    fn preprocess(&self, frame: &VideoFrame) -> Result<Tensor, PipelineError> {
        let size = self.input_size;
        let sanitized: Vec<f32> = frame
            .data()
            .iter()
            .map(|&v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
            .collect();

        let data = if (frame.width(), frame.height()) == (size, size) {
            sanitized
        } else {
            // Resampled at 16-bit precision
            let quantized = sanitized
                .iter()
                .map(|&v| (v * U16_SCALE).round() as u16)
                .collect();
            let image =
                ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(frame.width(), frame.height(), quantized)
                    .ok_or(HardwareError::Malformed {
                        kind: "video frame",
                        expected: frame.width() as usize
                            * frame.height() as usize
                            * FRAME_CHANNELS,
                        actual: frame.data().len(),
                    })?;
            image::imageops::resize(&image, size, size, FilterType::Triangle)
                .into_raw()
                .into_iter()
                .map(|v| v as f32 / U16_SCALE)
                .collect()
        };

        Ok(Tensor::new(
            vec![1, size as usize, size as usize, FRAME_CHANNELS],
            data,
        )?)
    }
}

/// Index of the highest score; ties resolve to the lowest index
fn argmax(scores: &[f32]) -> Result<usize, ModelError> {
    if let Some(bad) = scores.iter().find(|s| s.is_nan()) {
        return Err(ModelError::InvalidOutput(format!("emotion score {}", bad)));
    }
    let mut best = 0;
    for (index, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = index;
        }
    }
    Ok(best)
}
