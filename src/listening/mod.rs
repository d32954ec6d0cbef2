// Listening module for wake word detection
// Rolling audio window plus the model-backed detector that consumes it

mod buffer;
mod detector;

pub use buffer::RollingAudioBuffer;
pub use detector::{WakeWordDetector, WakeWordDetectorConfig};
