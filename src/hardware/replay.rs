// File-backed hardware adapter
// Replays a WAV recording as microphone input and a directory of stills as camera frames

use super::speech::{FlushingSpeaker, LogSpeechEngine};
use super::{AudioChunk, HardwareAdapter, HardwareConfig, HardwareError, VideoFrame};
use crate::constants::chunk_len_for;
use image::imageops::FilterType;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Image extensions picked up from the frame directory
const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Looping read position over the replayed audio
struct AudioCursor {
    samples: Vec<i16>,
    position: usize,
}

impl AudioCursor {
    fn take(&mut self, count: usize) -> Vec<i16> {
        if self.samples.is_empty() {
            return vec![0; count];
        }
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let remaining = count - out.len();
            let end = (self.position + remaining).min(self.samples.len());
            out.extend_from_slice(&self.samples[self.position..end]);
            self.position = end % self.samples.len();
        }
        out
    }
}

/// Hardware adapter that replays recorded media
///
/// Audio loops over the loaded samples (silence when none were loaded),
/// frames rotate round-robin, and speech goes to the log through a
/// [`FlushingSpeaker`]. With `realtime` enabled each audio capture blocks
/// for the requested duration, like a live microphone would.
pub struct ReplayHardware {
    config: HardwareConfig,
    audio: Mutex<AudioCursor>,
    frames: Vec<VideoFrame>,
    next_frame: AtomicUsize,
    speaker: FlushingSpeaker<LogSpeechEngine>,
    realtime: bool,
}

impl ReplayHardware {
    /// Build from in-memory media without real-time pacing
    pub fn from_parts(config: HardwareConfig, audio: Vec<i16>, frames: Vec<VideoFrame>) -> Self {
        Self {
            config,
            audio: Mutex::new(AudioCursor {
                samples: audio,
                position: 0,
            }),
            frames,
            next_frame: AtomicUsize::new(0),
            speaker: FlushingSpeaker::new(LogSpeechEngine::new()),
            realtime: false,
        }
    }

    /// Build from a WAV file and a directory of images, paced in real time
    ///
    /// Either source may be omitted: missing audio replays silence, missing
    /// frames make every frame capture fail.
    pub fn from_files(
        config: HardwareConfig,
        wav_path: Option<&Path>,
        frame_dir: Option<&Path>,
    ) -> Result<Self, HardwareError> {
        let audio = match wav_path {
            Some(path) => load_wav(path, config.sample_rate)?,
            None => Vec::new(),
        };
        let frames = match frame_dir {
            Some(dir) => load_frames(dir, config.capture_width, config.capture_height)?,
            None => Vec::new(),
        };
        crate::info!(
            "[replay] Loaded {} audio samples and {} frames",
            audio.len(),
            frames.len()
        );

        let mut hardware = Self::from_parts(config, audio, frames);
        hardware.realtime = true;
        Ok(hardware)
    }

    pub fn config(&self) -> &HardwareConfig {
        &self.config
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl HardwareAdapter for ReplayHardware {
    fn capture_audio(&self, duration_ms: u32) -> Result<AudioChunk, HardwareError> {
        let count = chunk_len_for(self.config.sample_rate, duration_ms);
        let samples = self.audio.lock().take(count);
        if self.realtime {
            thread::sleep(Duration::from_millis(duration_ms as u64));
        }
        Ok(AudioChunk::new(samples, self.config.sample_rate))
    }

    fn capture_frame(&self) -> Result<VideoFrame, HardwareError> {
        if self.frames.is_empty() {
            return Err(HardwareError::FrameCapture(
                "No frames available to replay".to_string(),
            ));
        }
        let index = self.next_frame.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        Ok(self.frames[index].clone())
    }

    fn speak(&self, text: &str) -> Result<(), HardwareError> {
        self.speaker.speak(text)
    }
}

/// Read a mono stream of 16-bit samples from a WAV file
///
/// Multi-channel files are reduced to their first channel. The file's rate
/// must match `sample_rate`; resampling is not attempted.
pub fn load_wav(path: &Path, sample_rate: u32) -> Result<Vec<i16>, HardwareError> {
    let wav_error = |e: hound::Error| HardwareError::AudioCapture(format!("{}: {}", path.display(), e));

    let mut reader = hound::WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    if spec.sample_rate != sample_rate {
        return Err(HardwareError::AudioCapture(format!(
            "{} is {} Hz, expected {} Hz",
            path.display(),
            spec.sample_rate,
            sample_rate
        )));
    }

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
        (format, bits) => {
            return Err(HardwareError::AudioCapture(format!(
                "{}: unsupported sample format {:?}/{} bits",
                path.display(),
                format,
                bits
            )))
        }
    };

    let channels = spec.channels.max(1) as usize;
    Ok(interleaved.into_iter().step_by(channels).collect())
}

/// Load every image in `dir` (sorted by name) as a frame of the given size
pub fn load_frames(dir: &Path, width: u32, height: u32) -> Result<Vec<VideoFrame>, HardwareError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| HardwareError::FrameCapture(format!("{}: {}", dir.display(), e)))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| load_frame(path, width, height))
        .collect()
}

fn load_frame(path: &Path, width: u32, height: u32) -> Result<VideoFrame, HardwareError> {
    let mut rgb = image::open(path)
        .map_err(|e| HardwareError::FrameCapture(format!("{}: {}", path.display(), e)))?
        .to_rgb8();
    if rgb.dimensions() != (width, height) {
        rgb = image::imageops::resize(&rgb, width, height, FilterType::Triangle);
    }
    let data = rgb.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();
    VideoFrame::new(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_audio_loops_over_samples() {
        let hardware =
            ReplayHardware::from_parts(HardwareConfig::default(), vec![1, 2, 3], Vec::new());
        // 1ms at 16kHz = 16 samples
        let chunk = hardware.capture_audio(1).unwrap();
        assert_eq!(chunk.len(), 16);
        assert_eq!(&chunk.samples()[..7], &[1, 2, 3, 1, 2, 3, 1]);

        let next = hardware.capture_audio(1).unwrap();
        // 16 % 3 = 1, so the next chunk continues at sample index 1
        assert_eq!(next.samples()[0], 2);
    }

    #[test]
    fn test_audio_without_source_is_silence() {
        let hardware = ReplayHardware::from_parts(HardwareConfig::default(), vec![], vec![]);
        let chunk = hardware.capture_audio(500).unwrap();
        assert_eq!(chunk.len(), 8000);
        assert!(chunk.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_frames_rotate_round_robin() {
        let frames = vec![
            VideoFrame::filled(2, 2, [0.0, 0.0, 0.0]),
            VideoFrame::filled(2, 2, [1.0, 1.0, 1.0]),
        ];
        let hardware = ReplayHardware::from_parts(HardwareConfig::default(), vec![], frames);
        assert_eq!(hardware.capture_frame().unwrap().data()[0], 0.0);
        assert_eq!(hardware.capture_frame().unwrap().data()[0], 1.0);
        assert_eq!(hardware.capture_frame().unwrap().data()[0], 0.0);
    }

    #[test]
    fn test_capture_frame_without_frames_fails() {
        let hardware = ReplayHardware::from_parts(HardwareConfig::default(), vec![], vec![]);
        assert!(matches!(
            hardware.capture_frame(),
            Err(HardwareError::FrameCapture(_))
        ));
    }

    #[test]
    fn test_load_wav_keeps_first_channel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 16000, 2, &[10, -10, 20, -20, 30, -30]);

        let samples = load_wav(&path, 16000).unwrap();
        assert_eq!(samples, vec![10, 20, 30]);
    }

    #[test]
    fn test_load_wav_rejects_rate_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("44k.wav");
        write_wav(&path, 44100, 1, &[0; 10]);

        let err = load_wav(&path, 16000).unwrap_err();
        assert!(err.to_string().contains("44100"));
    }

    #[test]
    fn test_load_wav_missing_file() {
        let result = load_wav(Path::new("/nonexistent/input.wav"), 16000);
        assert!(matches!(result, Err(HardwareError::AudioCapture(_))));
    }

    #[test]
    fn test_load_frames_resizes_and_normalizes() {
        let dir = TempDir::new().unwrap();
        image::RgbImage::from_pixel(8, 4, image::Rgb([255, 0, 0]))
            .save(dir.path().join("b.png"))
            .unwrap();
        image::RgbImage::from_pixel(2, 2, image::Rgb([0, 255, 0]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let frames = load_frames(dir.path(), 4, 4).unwrap();
        assert_eq!(frames.len(), 2);
        for frame in &frames {
            assert_eq!((frame.width(), frame.height()), (4, 4));
        }
        // Sorted by name: a.png (green) first
        assert_eq!(&frames[0].data()[..3], &[0.0, 1.0, 0.0]);
        assert_eq!(&frames[1].data()[..3], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_files_with_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mic.wav");
        write_wav(&path, 16000, 1, &[5; 100]);

        let hardware =
            ReplayHardware::from_files(HardwareConfig::default(), Some(&path), None).unwrap();
        assert_eq!(hardware.frame_count(), 0);
        assert!(hardware.realtime);
    }
}
