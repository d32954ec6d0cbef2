// Wake word gated emotion reactions: listen for a wake word, acknowledge it,
// then watch the camera and comment on facial expressions until cooldown ends

// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod activation;
pub mod constants;
pub mod events;
pub mod hardware;
pub mod listening;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod settings;
pub mod vision;

use events::PipelineEvent;
use hardware::{HardwareError, ReplayHardware};
use model::{EnergyWakeModel, FixedOutputModel};
use pipeline::{PipelineError, PipelineSupervisor};
use settings::{Settings, SettingsError};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

/// How often the host checks whether a loop ended on its own
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Scores returned by the stand-in emotion model (always "happy")
const STAND_IN_EMOTION_SCORES: [f32; constants::EMOTION_CLASS_COUNT] =
    [0.05, 0.0, 0.05, 0.7, 0.05, 0.1, 0.05];

/// Errors that end the host binary
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Hardware(#[from] HardwareError),
    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Application entry point - replays configured media through the pipeline
/// until Ctrl-C. Exits non-zero if the pipeline cannot start or a loop fails.
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn run() {
    logging::init();
    info!("Starting moodwatch...");

    if let Err(e) = run_pipeline() {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("moodwatch stopped");
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn run_pipeline() -> Result<(), RunError> {
    let settings = Settings::load()?;
    settings.validate()?;

    let hardware = Arc::new(ReplayHardware::from_files(
        settings.hardware_config(),
        settings.replay.wav_path.as_deref(),
        settings.replay.image_dir.as_deref(),
    )?);
    let hw = hardware.config();
    info!(
        "Replay hardware ready: {} Hz x{} audio, {}x{} frames at {} fps",
        hw.sample_rate, hw.channels, hw.capture_width, hw.capture_height, hw.frame_rate
    );
    if hardware.frame_count() == 0 {
        warn!("No replay frames configured, frame captures will fail");
    }

    let mut supervisor = PipelineSupervisor::new(
        settings.pipeline_config(),
        hardware,
        Arc::new(EnergyWakeModel::default()),
        Arc::new(FixedOutputModel::scores(&STAND_IN_EMOTION_SCORES)),
    );

    let mut events = supervisor.subscribe_events();
    let event_logger = thread::Builder::new()
        .name("event-log".to_string())
        .spawn(move || {
            while let Some(event) = events.blocking_recv() {
                log_event(&event);
            }
        })
        .map_err(|e| PipelineError::SpawnFailed(format!("event log: {}", e)))?;

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    supervisor.start()?;
    info!("Pipeline running, press Ctrl-C to stop");

    loop {
        match stop_rx.recv_timeout(HEALTH_CHECK_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("Stop requested");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                let finished = supervisor.finished_loops();
                if !finished.is_empty() {
                    warn!("Loop(s) exited early: {:?}, shutting down", finished);
                    break;
                }
            }
        }
    }

    let result = supervisor.stop();
    // Dropping the supervisor closes the event channel
    drop(supervisor);
    let _ = event_logger.join();
    result.map_err(RunError::from)
}

fn log_event(event: &PipelineEvent) {
    let payload = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("[event] Failed to serialize {:?}: {}", event, e);
            return;
        }
    };
    match event {
        PipelineEvent::VisionTick { .. } => trace!("[event] {}", payload),
        _ => info!("[event] {}", payload),
    }
}
