// Error taxonomy for the pipeline loops and supervisor

use super::LoopKind;
use crate::hardware::HardwareError;
use crate::model::ModelError;

/// Errors that can occur in the pipeline
///
/// Hardware and model failures are isolated to one loop iteration. A
/// contract violation means capture and model configuration disagree; it
/// ends the affected loop and is reported when the pipeline stops.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Capture or speech failed, or returned malformed data
    #[error("Hardware failure: {0}")]
    Hardware(#[from] HardwareError),
    /// Inference failed or returned an unexpected tensor
    #[error("Model failure: {0}")]
    Model(#[from] ModelError),
    /// Programming or configuration error
    #[error("Contract violation: {0}")]
    ContractViolation(String),
    /// Pipeline is already running
    #[error("Pipeline is already running")]
    AlreadyRunning,
    /// Pipeline is not running
    #[error("Pipeline is not running")]
    NotRunning,
    /// A loop thread could not be started
    #[error("Failed to start loop thread: {0}")]
    SpawnFailed(String),
    /// A loop thread panicked
    #[error("The {0} loop panicked")]
    LoopPanicked(LoopKind),
}

impl PipelineError {
    /// Whether the error must end the loop that hit it
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::ContractViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contract_violation_is_fatal() {
        assert!(PipelineError::ContractViolation("x".into()).is_fatal());
        assert!(!PipelineError::Hardware(HardwareError::Speech("x".into())).is_fatal());
        assert!(!PipelineError::Model(ModelError::InferenceFailed("x".into())).is_fatal());
        assert!(!PipelineError::NotRunning.is_fatal());
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::from(HardwareError::AudioCapture("mic gone".into()));
        assert!(err.to_string().contains("Hardware failure"));
        assert!(err.to_string().contains("mic gone"));

        let err = PipelineError::from(ModelError::InferenceFailed("oom".into()));
        assert!(err.to_string().contains("Model failure"));

        assert!(PipelineError::AlreadyRunning
            .to_string()
            .contains("already running"));
        assert_eq!(
            PipelineError::LoopPanicked(LoopKind::Vision).to_string(),
            "The vision loop panicked"
        );
    }
}
