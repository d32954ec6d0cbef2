// Rolling audio buffer for the wake word window
// Always holds exactly `capacity` samples; new audio evicts the oldest in FIFO order

use crate::hardware::AudioChunk;
use crate::pipeline::PipelineError;

/// A fixed-size ring of audio samples that is full from construction
///
/// Starts as `capacity` samples of silence. Every push writes the chunk at
/// the tail and evicts exactly as many samples from the head, so the
/// contents are always the most recent `capacity` samples in capture order.
/// Owned by the wake-word loop alone.
#[derive(Debug)]
pub struct RollingAudioBuffer {
    /// Internal storage for samples
    data: Vec<f32>,
    /// Index of the oldest sample (also the next write position)
    head: usize,
}

impl RollingAudioBuffer {
    /// Create a buffer of `capacity` samples, initially silent
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
            head: 0,
        }
    }

    /// Append a captured chunk, evicting the same number of oldest samples
    ///
    /// # Errors
    /// `ContractViolation` if the chunk is longer than the buffer. Chunk size
    /// is fixed by the capture configuration, so this is never retried.
    pub fn push(&mut self, chunk: &AudioChunk) -> Result<(), PipelineError> {
        self.check_fits(chunk.len())?;
        for sample in chunk.normalized() {
            self.write(sample);
        }
        Ok(())
    }

    /// Append already-normalized samples, with the same contract as [`push`](Self::push)
    #[cfg(test)]
    fn push_samples(&mut self, samples: &[f32]) -> Result<(), PipelineError> {
        self.check_fits(samples.len())?;
        for &sample in samples {
            self.write(sample);
        }
        Ok(())
    }

    /// Copy of the contents, oldest to newest
    ///
    /// The returned vector never aliases the ring, so later pushes cannot
    /// change a snapshot the caller is still holding.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.data.len());
        result.extend_from_slice(&self.data[self.head..]);
        result.extend_from_slice(&self.data[..self.head]);
        result
    }

    /// Number of samples held; always equal to the capacity
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    fn check_fits(&self, incoming: usize) -> Result<(), PipelineError> {
        if incoming > self.data.len() {
            return Err(PipelineError::ContractViolation(format!(
                "chunk of {} samples exceeds rolling buffer capacity {}",
                incoming,
                self.data.len()
            )));
        }
        Ok(())
    }

    fn write(&mut self, sample: f32) {
        self.data[self.head] = sample;
        self.head = (self.head + 1) % self.data.len();
    }
}
