use thiserror::Error;

use crate::facade_pipeline::stage::StageKind;

#[derive(Error, Debug)]
pub enum FacadeError {
    #[error("{stage} stage could not reach the image service: {reason}")]
    StageTransformFailed {
        stage: StageKind,
        reason: String,
        /// Network hiccups, throttling and 5xx answers. A fresh request may succeed.
        transient: bool,
    },

    #[error("{stage} stage returned an unusable image: {reason}")]
    StageOutputInvalid { stage: StageKind, reason: String },

    #[error("{stage} stage was refused by the image service: {reason}")]
    ContentRefused { stage: StageKind, reason: String },

    #[error("No facade detected: the mask contains no window or wall pixels")]
    NoFacadeDetected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),
}

impl FacadeError {
    /// Whether an operator could reasonably issue the same request again.
    ///
    /// Invalid outputs count as retryable because the service is generative:
    /// a fresh request can come back well formed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FacadeError::StageTransformFailed { transient, .. } => *transient,
            FacadeError::StageOutputInvalid { .. } => true,
            _ => false,
        }
    }

    /// The stage the error originated in, if it came from a stage call.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            FacadeError::StageTransformFailed { stage, .. }
            | FacadeError::StageOutputInvalid { stage, .. }
            | FacadeError::ContentRefused { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FacadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        let transient = FacadeError::StageTransformFailed {
            stage: StageKind::Clean,
            reason: "503".into(),
            transient: true,
        };
        let hard = FacadeError::StageTransformFailed {
            stage: StageKind::Clean,
            reason: "400".into(),
            transient: false,
        };
        let invalid = FacadeError::StageOutputInvalid {
            stage: StageKind::Mask,
            reason: "size".into(),
        };
        let refused = FacadeError::ContentRefused {
            stage: StageKind::Select,
            reason: "SAFETY".into(),
        };

        assert!(transient.is_retryable());
        assert!(!hard.is_retryable());
        assert!(invalid.is_retryable());
        assert!(!refused.is_retryable());
        assert!(!FacadeError::NoFacadeDetected.is_retryable());
    }

    #[test]
    fn test_stage_attribution() {
        let refused = FacadeError::ContentRefused {
            stage: StageKind::Select,
            reason: "SAFETY".into(),
        };
        assert_eq!(refused.stage(), Some(StageKind::Select));
        assert_eq!(FacadeError::NoFacadeDetected.stage(), None);
        assert!(refused.to_string().contains("select"));
    }
}
