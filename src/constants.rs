//! Centralized constants for the sensing pipeline.
//!
//! All audio, vision and timing defaults live here with documentation
//! explaining their purpose and constraints. Runtime settings start from
//! these values and may override most of them.

// =============================================================================
// AUDIO
// =============================================================================

/// Sample rate of captured audio and of the wake-word model input (Hz).
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Number of capture channels. The wake-word model expects mono audio.
pub const DEFAULT_CHANNELS: u16 = 1;

/// Duration of one audio capture call (milliseconds).
///
/// At 16kHz: 0.5 * 16000 = 8000 samples per chunk.
pub const DEFAULT_CHUNK_DURATION_MS: u32 = 500;

/// Rolling wake-word window duration (seconds).
///
/// The wake-word model consumes exactly one window per inference:
/// 1.0 * 16000 = 16000 samples.
pub const WAKE_WORD_WINDOW_SECS: f32 = 1.0;

/// Rolling wake-word window length in samples at the default rate.
pub const WAKE_WORD_WINDOW_SAMPLES: usize = 16000;

/// Scale used to convert signed 16-bit PCM to floats in [-1.0, 1.0).
pub const PCM_I16_SCALE: f32 = 32768.0;

// =============================================================================
// WAKE WORD
// =============================================================================

/// Wake-word probability threshold (0.0 - 1.0).
///
/// Detection requires `probability > threshold`; a probability exactly at
/// the threshold does not trigger.
pub const DEFAULT_WAKE_THRESHOLD: f32 = 0.85;

/// Phrase spoken once per activation.
pub const DEFAULT_ACKNOWLEDGMENT: &str = "Yes? How can I help?";

/// How long repeated triggers are suppressed after an acknowledgment (ms).
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;

/// Wait between wake-word loop iterations (ms).
///
/// Bounds both wake-word latency and CPU usage of the listening loop.
pub const WAKE_LOOP_INTERVAL_MS: u64 = 100;

// =============================================================================
// VISION
// =============================================================================

/// Camera capture width in pixels.
pub const CAPTURE_WIDTH: u32 = 320;

/// Camera capture height in pixels.
pub const CAPTURE_HEIGHT: u32 = 240;

/// Camera frame rate requested from the adapter.
pub const CAPTURE_FRAME_RATE: u32 = 30;

/// Colour channels per pixel (RGB).
pub const FRAME_CHANNELS: usize = 3;

/// Square input edge expected by the emotion model (128x128).
pub const EMOTION_MODEL_INPUT_SIZE: u32 = 128;

/// Number of scores produced by the emotion model.
pub const EMOTION_CLASS_COUNT: usize = 7;

/// Wait between vision loop iterations (ms).
///
/// Applied whether or not the gate is open, bounding camera and model
/// invocation rate to one per interval.
pub const VISION_LOOP_INTERVAL_MS: u64 = 1000;

/// Spoken reaction template; `{emotion}` is replaced with the label.
pub const DEFAULT_REACTION_TEMPLATE: &str = "You look {emotion}.";

// =============================================================================
// SPEECH
// =============================================================================

/// Default speech output language tag.
pub const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";

/// Default speech pitch multiplier (1.0 = engine default).
pub const DEFAULT_SPEECH_PITCH: f32 = 1.0;

/// Default speech rate multiplier (1.0 = engine default).
pub const DEFAULT_SPEECH_RATE: f32 = 1.0;

// =============================================================================
// EVENTS
// =============================================================================

/// Capacity of the pipeline event channel.
///
/// Loops use `try_send`, so a slow subscriber loses events instead of
/// stalling capture.
pub const EVENT_CHANNEL_BUFFER_SIZE: usize = 256;

/// Number of samples in one capture chunk of `duration_ms` at `sample_rate`.
pub const fn chunk_len_for(sample_rate: u32, duration_ms: u32) -> usize {
    (sample_rate as u64 * duration_ms as u64 / 1000) as usize
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod tests;
