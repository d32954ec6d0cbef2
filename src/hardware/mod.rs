// Hardware capability boundary consumed by the pipeline
// Audio capture, camera capture and speech output are provided by the host platform

use crate::constants::{
    CAPTURE_FRAME_RATE, CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE,
    DEFAULT_SPEECH_LANGUAGE, DEFAULT_SPEECH_PITCH, DEFAULT_SPEECH_RATE, FRAME_CHANNELS,
    PCM_I16_SCALE,
};

pub mod replay;
pub mod speech;

pub use replay::ReplayHardware;
pub use speech::{FlushingSpeaker, LogSpeechEngine, SpeechEngine};

/// Errors reported by a hardware adapter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HardwareError {
    /// Microphone capture failed
    #[error("Audio capture failed: {0}")]
    AudioCapture(String),
    /// Camera capture failed
    #[error("Frame capture failed: {0}")]
    FrameCapture(String),
    /// Speech output failed
    #[error("Speech output failed: {0}")]
    Speech(String),
    /// A capture returned data of the wrong size
    #[error("Malformed {kind}: expected {expected} values, got {actual}")]
    Malformed {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// A chunk of signed 16-bit mono samples captured in one call
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration covered by the chunk in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Samples converted to floats in [-1.0, 1.0)
    pub fn normalized(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().map(|&s| s as f32 / PCM_I16_SCALE)
    }
}

/// An RGB frame with channel values normalized to [0, 1]
///
/// Data is row-major, interleaved `[r, g, b, r, g, b, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl VideoFrame {
    /// Build a frame, rejecting data whose length does not match the dimensions
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, HardwareError> {
        let expected = width as usize * height as usize * FRAME_CHANNELS;
        if data.len() != expected {
            return Err(HardwareError::Malformed {
                kind: "video frame",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with a single colour
    pub fn filled(width: u32, height: u32, rgb: [f32; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * FRAME_CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Fixed hardware configuration, negotiated once at adapter construction
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareConfig {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Audio channel count
    pub channels: u16,
    /// Camera capture width in pixels
    pub capture_width: u32,
    /// Camera capture height in pixels
    pub capture_height: u32,
    /// Camera frame rate
    pub frame_rate: u32,
    /// Speech language tag (e.g. "en-US")
    pub speech_language: String,
    /// Speech pitch multiplier
    pub speech_pitch: f32,
    /// Speech rate multiplier
    pub speech_rate: f32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            capture_width: CAPTURE_WIDTH,
            capture_height: CAPTURE_HEIGHT,
            frame_rate: CAPTURE_FRAME_RATE,
            speech_language: DEFAULT_SPEECH_LANGUAGE.to_string(),
            speech_pitch: DEFAULT_SPEECH_PITCH,
            speech_rate: DEFAULT_SPEECH_RATE,
        }
    }
}

/// Capture and speech capability shared by both pipeline loops
///
/// Implementations must be safe to call from two threads at once: captures
/// are independent per call, and `speak` must serialize utterances so that
/// a new one replaces any in-progress one instead of interleaving
/// (see [`FlushingSpeaker`]). Every call blocks the calling loop for its
/// duration.
pub trait HardwareAdapter: Send + Sync {
    /// Capture `duration_ms` of mono audio at the configured sample rate
    fn capture_audio(&self, duration_ms: u32) -> Result<AudioChunk, HardwareError>;

    /// Capture one camera frame at the configured resolution
    fn capture_frame(&self) -> Result<VideoFrame, HardwareError>;

    /// Speak `text`, interrupting any utterance still playing
    fn speak(&self, text: &str) -> Result<(), HardwareError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_chunk_duration() {
        let chunk = AudioChunk::new(vec![0; 8000], 16000);
        assert_eq!(chunk.len(), 8000);
        assert_eq!(chunk.duration_ms(), 500);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn test_audio_chunk_zero_rate_has_zero_duration() {
        let chunk = AudioChunk::new(vec![1, 2, 3], 0);
        assert_eq!(chunk.duration_ms(), 0);
    }

    #[test]
    fn test_audio_chunk_normalized_range() {
        let chunk = AudioChunk::new(vec![i16::MIN, 0, i16::MAX], 16000);
        let values: Vec<f32> = chunk.normalized().collect();
        assert_eq!(values[0], -1.0);
        assert_eq!(values[1], 0.0);
        assert!(values[2] < 1.0 && values[2] > 0.99);
    }

    #[test]
    fn test_video_frame_rejects_wrong_length() {
        let result = VideoFrame::new(4, 2, vec![0.0; 10]);
        assert_eq!(
            result,
            Err(HardwareError::Malformed {
                kind: "video frame",
                expected: 24,
                actual: 10
            })
        );
    }

    #[test]
    fn test_video_frame_filled() {
        let frame = VideoFrame::filled(2, 2, [0.1, 0.2, 0.3]);
        assert_eq!(frame.data().len(), 12);
        assert_eq!(&frame.data()[3..6], &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_hardware_config_default() {
        let config = HardwareConfig::default();
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.channels, 1);
        assert_eq!((config.capture_width, config.capture_height), (320, 240));
    }

    #[test]
    fn test_hardware_error_display() {
        let err = HardwareError::Malformed {
            kind: "audio chunk",
            expected: 8000,
            actual: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("audio chunk"));
        assert!(msg.contains("8000"));
        assert!(HardwareError::Speech("busy".into()).to_string().contains("busy"));
    }
}
