// Pipeline supervisor - owns the two loop threads and their shared state
// Start spawns both loops; stop signals them and joins both before returning

use super::vision_loop::{vision_loop_main, VisionLoopState};
use super::wake_loop::{wake_loop_main, WakeLoopState};
use super::{LoopKind, PipelineConfig, PipelineError, StopSignal};
use crate::activation::{ActivationPhase, ActivationState};
use crate::constants::EVENT_CHANNEL_BUFFER_SIZE;
use crate::events::{EventSink, PipelineEvent};
use crate::hardware::HardwareAdapter;
use crate::listening::WakeWordDetector;
use crate::model::InferenceModel;
use crate::vision::EmotionClassifier;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc as tokio_mpsc;

type LoopHandle = JoinHandle<Result<(), PipelineError>>;

/// Handles for one run of the pipeline
struct RunningLoops {
    stop: Arc<StopSignal>,
    activation: Arc<ActivationState>,
    wake: LoopHandle,
    vision: LoopHandle,
}

/// Supervises the wake word and vision loops
///
/// Every `start` builds a fresh activation state and detector window, so a
/// restarted pipeline begins `Idle` with a silent window.
pub struct PipelineSupervisor {
    config: PipelineConfig,
    hardware: Arc<dyn HardwareAdapter>,
    wake_model: Arc<dyn InferenceModel>,
    emotion_model: Arc<dyn InferenceModel>,
    event_tx: Option<tokio_mpsc::Sender<PipelineEvent>>,
    running: Option<RunningLoops>,
}

impl PipelineSupervisor {
    pub fn new(
        config: PipelineConfig,
        hardware: Arc<dyn HardwareAdapter>,
        wake_model: Arc<dyn InferenceModel>,
        emotion_model: Arc<dyn InferenceModel>,
    ) -> Self {
        Self {
            config,
            hardware,
            wake_model,
            emotion_model,
            event_tx: None,
            running: None,
        }
    }

    /// Subscribe to pipeline events
    ///
    /// Takes effect on the next `start`. Each call creates a new channel;
    /// only the most recent receiver gets events. Events are dropped when
    /// the receiver falls behind.
    pub fn subscribe_events(&mut self) -> tokio_mpsc::Receiver<PipelineEvent> {
        let (tx, rx) = tokio_mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);
        self.event_tx = Some(tx);
        rx
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check if the loops have been started and not yet stopped
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Current activation phase, or `None` when not running
    pub fn activation_phase(&self) -> Option<ActivationPhase> {
        self.running.as_ref().map(|r| r.activation.observe())
    }

    /// Loops that have already exited while the pipeline is still running
    ///
    /// A loop only exits early after a contract violation or a panic.
    pub fn finished_loops(&self) -> Vec<LoopKind> {
        let Some(running) = &self.running else {
            return Vec::new();
        };
        let mut finished = Vec::new();
        if running.wake.is_finished() {
            finished.push(LoopKind::WakeWord);
        }
        if running.vision.is_finished() {
            finished.push(LoopKind::Vision);
        }
        finished
    }

    /// Start both loops
    ///
    /// Returns once both threads are running.
    ///
    /// # Errors
    /// - `AlreadyRunning` if the pipeline is already running
    /// - `ContractViolation` if the configuration is inconsistent
    /// - `SpawnFailed` if a loop thread cannot be created
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.is_running() {
            crate::debug!("[supervisor] Start called but already running");
            return Err(PipelineError::AlreadyRunning);
        }

        self.config.validate()?;

        crate::info!("[supervisor] Starting pipeline...");

        let stop = Arc::new(StopSignal::new());
        let activation = Arc::new(ActivationState::new());
        let events = self
            .event_tx
            .clone()
            .map(EventSink::new)
            .unwrap_or_else(EventSink::disabled);
        let (ready_tx, ready_rx) = mpsc::channel();

        let wake_state = WakeLoopState {
            hardware: self.hardware.clone(),
            detector: WakeWordDetector::with_config(
                self.wake_model.clone(),
                self.config.detector.clone(),
            ),
            activation: activation.clone(),
            stop: stop.clone(),
            events: events.clone(),
            reported_phase: ActivationPhase::Idle,
        };
        let wake = spawn_loop(LoopKind::WakeWord, ready_tx.clone(), {
            let config = self.config.clone();
            move || wake_loop_main(wake_state, config)
        })?;

        let vision_state = VisionLoopState {
            hardware: self.hardware.clone(),
            classifier: EmotionClassifier::with_input_size(
                self.emotion_model.clone(),
                self.config.model_input_size,
            ),
            activation: activation.clone(),
            stop: stop.clone(),
            events,
        };
        let vision = match spawn_loop(LoopKind::Vision, ready_tx, {
            let config = self.config.clone();
            move || vision_loop_main(vision_state, config)
        }) {
            Ok(handle) => handle,
            Err(e) => {
                stop.trigger();
                let _ = join_loop(LoopKind::WakeWord, wake);
                return Err(e);
            }
        };

        // Both senders are gone once each loop has reported in
        for kind in ready_rx.iter() {
            crate::debug!("[supervisor] {} loop running", kind);
        }

        self.running = Some(RunningLoops {
            stop,
            activation,
            wake,
            vision,
        });

        crate::info!(
            "[supervisor] Pipeline started, wake_interval={}ms vision_interval={}ms",
            self.config.wake_interval.as_millis(),
            self.config.vision_interval.as_millis()
        );
        Ok(())
    }

    /// Stop both loops and wait for them to exit
    ///
    /// Each loop observes the stop request within one iteration interval
    /// plus any capture, inference or speech call already in progress.
    ///
    /// # Errors
    /// - `NotRunning` if the pipeline was not started
    /// - The fatal error or panic that ended a loop early, wake word loop first
    pub fn stop(&mut self) -> Result<(), PipelineError> {
        let Some(running) = self.running.take() else {
            crate::debug!("[supervisor] Stop called but not running");
            return Err(PipelineError::NotRunning);
        };

        crate::info!("[supervisor] Stopping pipeline...");
        running.stop.trigger();

        let wake = join_loop(LoopKind::WakeWord, running.wake);
        let vision = join_loop(LoopKind::Vision, running.vision);

        crate::debug!("[supervisor] Pipeline stopped");
        wake.and(vision)
    }
}

impl Drop for PipelineSupervisor {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                crate::warn!("[supervisor] Pipeline ended with error on drop: {}", e);
            }
        }
    }
}

fn spawn_loop<F>(
    kind: LoopKind,
    ready_tx: mpsc::Sender<LoopKind>,
    body: F,
) -> Result<LoopHandle, PipelineError>
where
    F: FnOnce() -> Result<(), PipelineError> + Send + 'static,
{
    thread::Builder::new()
        .name(kind.thread_name().to_string())
        .spawn(move || {
            let _ = ready_tx.send(kind);
            drop(ready_tx);
            body()
        })
        .map_err(|e| PipelineError::SpawnFailed(format!("{} loop: {}", kind, e)))
}

fn join_loop(kind: LoopKind, handle: LoopHandle) -> Result<(), PipelineError> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => {
            crate::error!("[supervisor] {} loop panicked", kind);
            Err(PipelineError::LoopPanicked(kind))
        }
    }
}

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod tests;
