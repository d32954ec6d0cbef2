//! Persistent settings for the host binary.
//!
//! Settings live in `settings.json` under the user's config directory, or at
//! the path named by `MOODWATCH_SETTINGS`. Every field has a default, so a
//! missing file or a partial file is fine.

use crate::constants::{
    CAPTURE_FRAME_RATE, CAPTURE_HEIGHT, CAPTURE_WIDTH, DEFAULT_ACKNOWLEDGMENT, DEFAULT_CHANNELS,
    DEFAULT_CHUNK_DURATION_MS, DEFAULT_COOLDOWN_MS, DEFAULT_REACTION_TEMPLATE,
    DEFAULT_SAMPLE_RATE, DEFAULT_SPEECH_LANGUAGE, DEFAULT_SPEECH_PITCH, DEFAULT_SPEECH_RATE,
    DEFAULT_WAKE_THRESHOLD, EMOTION_MODEL_INPUT_SIZE, VISION_LOOP_INTERVAL_MS,
    WAKE_LOOP_INTERVAL_MS, WAKE_WORD_WINDOW_SAMPLES, WAKE_WORD_WINDOW_SECS,
};
use crate::hardware::HardwareConfig;
use crate::listening::WakeWordDetectorConfig;
use crate::pipeline::{PipelineConfig, PipelineError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the settings file location
pub const SETTINGS_PATH_ENV: &str = "MOODWATCH_SETTINGS";

const SETTINGS_DIR_NAME: &str = "moodwatch";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Errors that can occur while loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("No config directory available on this platform")]
    ConfigDirNotFound,
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub channels: u16,
    pub chunk_duration_ms: u32,
    pub window_secs: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            chunk_duration_ms: DEFAULT_CHUNK_DURATION_MS,
            window_secs: WAKE_WORD_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WakeWordSettings {
    pub threshold: f32,
    pub acknowledgment: String,
    pub loop_interval_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for WakeWordSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_WAKE_THRESHOLD,
            acknowledgment: DEFAULT_ACKNOWLEDGMENT.to_string(),
            loop_interval_ms: WAKE_LOOP_INTERVAL_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisionSettings {
    pub capture_width: u32,
    pub capture_height: u32,
    pub frame_rate: u32,
    pub model_input_size: u32,
    pub loop_interval_ms: u64,
    /// `{emotion}` is replaced by the detected label
    pub reaction_template: String,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            capture_width: CAPTURE_WIDTH,
            capture_height: CAPTURE_HEIGHT,
            frame_rate: CAPTURE_FRAME_RATE,
            model_input_size: EMOTION_MODEL_INPUT_SIZE,
            loop_interval_ms: VISION_LOOP_INTERVAL_MS,
            reaction_template: DEFAULT_REACTION_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechSettings {
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_SPEECH_LANGUAGE.to_string(),
            pitch: DEFAULT_SPEECH_PITCH,
            rate: DEFAULT_SPEECH_RATE,
        }
    }
}

/// Media replayed by the host binary in place of live devices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplaySettings {
    pub wav_path: Option<PathBuf>,
    pub image_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub audio: AudioSettings,
    pub wake_word: WakeWordSettings,
    pub vision: VisionSettings,
    pub speech: SpeechSettings,
    pub replay: ReplaySettings,
}

impl Settings {
    /// Default settings file path, honouring `MOODWATCH_SETTINGS`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
            .ok_or(SettingsError::ConfigDirNotFound)
    }

    /// Load from the default path
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_or_create(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there on first run
    ///
    /// Failing to write the defaults is logged, not returned.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            return Self::load_from(path);
        }
        let settings = Self::default();
        match settings.save_to(path) {
            Ok(()) => crate::info!("[settings] Wrote default settings to {}", path.display()),
            Err(e) => crate::warn!("[settings] Could not write default settings: {}", e),
        }
        Ok(settings)
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::debug!("[settings] {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        crate::debug!("[settings] Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }

    pub fn hardware_config(&self) -> HardwareConfig {
        HardwareConfig {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            capture_width: self.vision.capture_width,
            capture_height: self.vision.capture_height,
            frame_rate: self.vision.frame_rate,
            speech_language: self.speech.language.clone(),
            speech_pitch: self.speech.pitch,
            speech_rate: self.speech.rate,
        }
    }

    pub fn detector_config(&self) -> WakeWordDetectorConfig {
        WakeWordDetectorConfig {
            threshold: self.wake_word.threshold,
            window_duration_secs: self.audio.window_secs,
            sample_rate: self.audio.sample_rate,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chunk_duration_ms: self.audio.chunk_duration_ms,
            wake_interval: Duration::from_millis(self.wake_word.loop_interval_ms),
            vision_interval: Duration::from_millis(self.vision.loop_interval_ms),
            cooldown: Duration::from_millis(self.wake_word.cooldown_ms),
            acknowledgment: self.wake_word.acknowledgment.clone(),
            reaction_template: self.vision.reaction_template.clone(),
            model_input_size: self.vision.model_input_size,
            detector: self.detector_config(),
            wake_input_samples: WAKE_WORD_WINDOW_SAMPLES,
        }
    }

    /// Check the settings describe hardware and loops that can work together
    ///
    /// # Errors
    /// `ContractViolation` describing the first problem found
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(PipelineError::ContractViolation(
                "audio sample rate and channel count must be non-zero".to_string(),
            ));
        }
        if self.vision.capture_width == 0 || self.vision.capture_height == 0 {
            return Err(PipelineError::ContractViolation(
                "capture resolution must be non-zero".to_string(),
            ));
        }
        self.pipeline_config().validate()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
