// Speech output serialization
// Guarantees one utterance at a time, with new utterances replacing older ones

use super::HardwareError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Backend that actually renders an utterance
///
/// `utter` may block for the length of the utterance but must poll
/// `interrupt` and return early once it is set.
pub trait SpeechEngine: Send + Sync {
    fn utter(&self, text: &str, interrupt: &AtomicBool) -> Result<(), HardwareError>;
}

/// Queue-and-flush wrapper around a [`SpeechEngine`]
///
/// `speak` interrupts whatever is currently playing, then waits for the
/// playback slot. An utterance superseded while it was still waiting is
/// dropped without reaching the engine. Utterances therefore never overlap
/// and the newest request always wins.
pub struct FlushingSpeaker<E> {
    engine: E,
    /// Interrupt flag of the most recent request
    current: Mutex<Option<Arc<AtomicBool>>>,
    /// Held while the engine is rendering
    playback: Mutex<()>,
}

impl<E: SpeechEngine> FlushingSpeaker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            current: Mutex::new(None),
            playback: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Speak `text`, flushing any in-progress or pending utterance
    pub fn speak(&self, text: &str) -> Result<(), HardwareError> {
        let interrupt = Arc::new(AtomicBool::new(false));
        if let Some(previous) = self.current.lock().replace(interrupt.clone()) {
            previous.store(true, Ordering::SeqCst);
        }

        let _slot = self.playback.lock();
        if interrupt.load(Ordering::SeqCst) {
            crate::debug!("[speech] Utterance superseded before playback: '{}'", text);
            return Ok(());
        }

        let result = self.engine.utter(text, &interrupt);

        let mut current = self.current.lock();
        if current
            .as_ref()
            .is_some_and(|flag| Arc::ptr_eq(flag, &interrupt))
        {
            *current = None;
        }

        result
    }
}

/// Speech engine that writes utterances to the log
///
/// Optionally simulates playback time per word so interruption behaves like
/// a real synthesizer.
pub struct LogSpeechEngine {
    per_word: Duration,
}

impl LogSpeechEngine {
    pub fn new() -> Self {
        Self {
            per_word: Duration::ZERO,
        }
    }

    pub fn with_word_duration(per_word: Duration) -> Self {
        Self { per_word }
    }
}

impl Default for LogSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for LogSpeechEngine {
    fn utter(&self, text: &str, interrupt: &AtomicBool) -> Result<(), HardwareError> {
        crate::info!("[speech] {}", text);
        for _ in text.split_whitespace() {
            if interrupt.load(Ordering::SeqCst) {
                crate::debug!("[speech] Interrupted");
                break;
            }
            if !self.per_word.is_zero() {
                thread::sleep(self.per_word);
            }
        }
        Ok(())
    }
}
