// Deterministic model implementations
// Used in tests and by the host binary when no inference engine is linked

use super::{InferenceModel, ModelError, Tensor};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns the same output for every input
pub struct FixedOutputModel {
    output: Tensor,
    calls: AtomicUsize,
}

impl FixedOutputModel {
    pub fn new(output: Tensor) -> Self {
        Self {
            output,
            calls: AtomicUsize::new(0),
        }
    }

    /// A `(1, 1)` probability model
    pub fn probability(p: f32) -> Self {
        Self::new(Tensor { shape: vec![1, 1], data: vec![p] })
    }

    /// A `(1, n)` score-vector model
    pub fn scores(scores: &[f32]) -> Self {
        Self::new(Tensor {
            shape: vec![1, scores.len()],
            data: scores.to_vec(),
        })
    }

    /// Number of times `infer` has been called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceModel for FixedOutputModel {
    fn infer(&self, _input: &Tensor) -> Result<Tensor, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Plays back a script of outputs, repeating the last one when exhausted
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<Tensor, ModelError>>>,
    last: Mutex<Option<Result<Tensor, ModelError>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<Tensor, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// A script of `(1, 1)` probabilities
    pub fn probabilities(values: &[f32]) -> Self {
        Self::new(
            values
                .iter()
                .map(|&p| Ok(Tensor { shape: vec![1, 1], data: vec![p] }))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceModel for ScriptedModel {
    fn infer(&self, _input: &Tensor) -> Result<Tensor, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        match next {
            Some(output) => {
                *last = Some(output.clone());
                output
            }
            None => last.clone().unwrap_or_else(|| {
                Err(ModelError::InferenceFailed("Empty script".to_string()))
            }),
        }
    }
}

/// Wake-word stand-in that maps the window's RMS energy to a probability
///
/// Not a keyword spotter: any sufficiently loud sound "triggers". It keeps
/// the pipeline exercisable end to end when no trained model is available.
pub struct EnergyWakeModel {
    /// RMS level mapped to probability 1.0
    full_scale_rms: f32,
}

impl EnergyWakeModel {
    pub fn new(full_scale_rms: f32) -> Self {
        Self {
            full_scale_rms: full_scale_rms.max(f32::EPSILON),
        }
    }
}

impl Default for EnergyWakeModel {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl InferenceModel for EnergyWakeModel {
    fn infer(&self, input: &Tensor) -> Result<Tensor, ModelError> {
        let samples = input.data();
        if samples.is_empty() {
            return Err(ModelError::InvalidOutput("Empty audio window".to_string()));
        }
        let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
        let probability = (rms / self.full_scale_rms).min(1.0);
        Tensor::new(vec![1, 1], vec![probability])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Tensor {
        Tensor::new(vec![1, 4, 1], vec![0.0; 4]).unwrap()
    }

    #[test]
    fn test_fixed_output_counts_calls() {
        let model = FixedOutputModel::probability(0.4);
        assert_eq!(model.infer(&input()).unwrap().data(), &[0.4]);
        model.infer(&input()).unwrap();
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn test_scripted_model_repeats_last() {
        let model = ScriptedModel::probabilities(&[0.1, 0.9]);
        assert_eq!(model.infer(&input()).unwrap().data(), &[0.1]);
        assert_eq!(model.infer(&input()).unwrap().data(), &[0.9]);
        assert_eq!(model.infer(&input()).unwrap().data(), &[0.9]);
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn test_scripted_model_replays_errors() {
        let model = ScriptedModel::new(vec![Err(ModelError::InferenceFailed("boom".into()))]);
        assert!(model.infer(&input()).is_err());
        assert!(model.infer(&input()).is_err());
    }

    #[test]
    fn test_empty_script_fails() {
        let model = ScriptedModel::new(vec![]);
        assert!(matches!(
            model.infer(&input()),
            Err(ModelError::InferenceFailed(_))
        ));
    }

    #[test]
    fn test_energy_model_silence_and_loud() {
        let model = EnergyWakeModel::new(0.5);
        let silent = Tensor::new(vec![1, 4, 1], vec![0.0; 4]).unwrap();
        assert_eq!(model.infer(&silent).unwrap().data(), &[0.0]);

        let loud = Tensor::new(vec![1, 4, 1], vec![0.9, -0.9, 0.9, -0.9]).unwrap();
        let output = model.infer(&loud).unwrap();
        assert_eq!(output.shape(), &[1, 1]);
        assert_eq!(output.data(), &[1.0]);
    }
}
