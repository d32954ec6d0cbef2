// Inference model boundary
// The pipeline treats every model as an opaque fixed-shape tensor function

pub mod stub;

pub use stub::{EnergyWakeModel, FixedOutputModel, ScriptedModel};

/// Errors that can occur while running a model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The inference engine reported a failure
    InferenceFailed(String),
    /// A tensor did not have the expected shape
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// Output contained values the caller cannot interpret (e.g. NaN)
    InvalidOutput(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
            ModelError::ShapeMismatch { expected, actual } => {
                write!(f, "Shape mismatch: expected {:?}, got {:?}", expected, actual)
            }
            ModelError::InvalidOutput(msg) => write!(f, "Invalid model output: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// Dense row-major f32 tensor
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor, checking that `data` fills `shape` exactly
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ModelError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ModelError::ShapeMismatch {
                expected: shape,
                actual: vec![data.len()],
            });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Fail with `ShapeMismatch` unless the shape equals `expected`
    pub fn expect_shape(&self, expected: &[usize]) -> Result<(), ModelError> {
        if self.shape != expected {
            return Err(ModelError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: self.shape.clone(),
            });
        }
        Ok(())
    }
}

/// A loaded model that maps one fixed-shape tensor to another
///
/// Loading and deployment are the implementor's concern. Implementations
/// are shared behind `Arc` and must tolerate calls from any thread, though
/// the pipeline only ever calls each model from a single loop.
pub trait InferenceModel: Send + Sync {
    #[must_use = "this returns a Result that should be handled"]
    fn infer(&self, input: &Tensor) -> Result<Tensor, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_new_validates_length() {
        assert!(Tensor::new(vec![1, 2, 3], vec![0.0; 6]).is_ok());
        let err = Tensor::new(vec![1, 2, 3], vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_expect_shape() {
        let tensor = Tensor::new(vec![1, 7], vec![0.0; 7]).unwrap();
        assert!(tensor.expect_shape(&[1, 7]).is_ok());
        assert_eq!(
            tensor.expect_shape(&[7]),
            Err(ModelError::ShapeMismatch {
                expected: vec![7],
                actual: vec![1, 7]
            })
        );
    }

    #[test]
    fn test_model_error_display() {
        assert!(ModelError::InferenceFailed("oom".into())
            .to_string()
            .contains("oom"));
        let msg = ModelError::ShapeMismatch {
            expected: vec![1, 1],
            actual: vec![1, 2],
        }
        .to_string();
        assert!(msg.contains("[1, 1]"));
        assert!(msg.contains("[1, 2]"));
    }
}
