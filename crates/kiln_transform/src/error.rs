//! Error types for transform execution.

use std::fmt;
use std::path::PathBuf;

use kiln_fingerprint::FingerprintError;

/// Boxed error returned by transform code and setters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The step of an execution in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    /// Constructing the transform from its parameters.
    Instantiate,
    /// Setting slot values on the instance.
    Inject,
    /// Running the transform action.
    Execute,
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStage::Instantiate => "instantiation",
            ExecutionStage::Inject => "injection",
            ExecutionStage::Execute => "execution",
        };
        f.write_str(name)
    }
}

/// Why a reported output was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidOutputReason {
    /// The path does not exist.
    Missing,
    /// The path is relative.
    NotAbsolute,
    /// The path is neither under the primary input nor under the workspace.
    OutsideAllowedRoots,
}

impl fmt::Display for InvalidOutputReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidOutputReason::Missing => "file does not exist",
            InvalidOutputReason::NotAbsolute => "path is not absolute",
            InvalidOutputReason::OutsideAllowedRoots => {
                "not a child of the primary input or the workspace directory"
            }
        };
        f.write_str(text)
    }
}

/// Errors raised while registering, executing, or fingerprinting a transform.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The transform reported an output it does not own.
    #[error("transform {transform} produced invalid output {path}: {reason}")]
    InvalidOutput {
        /// Display name of the transform.
        transform: String,
        /// The offending output path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: InvalidOutputReason,
    },

    /// Instantiation, injection, or the action itself failed.
    #[error("transform {transform} failed during {stage}: {source}")]
    ExecutionFailed {
        /// Display name of the transform.
        transform: String,
        /// The step that failed.
        stage: ExecutionStage,
        /// The original cause.
        #[source]
        source: BoxError,
    },

    /// Fingerprinting the configured instance's inputs failed.
    #[error("failed to fingerprint inputs of transform {transform}: {source}")]
    Fingerprint {
        /// Display name of the transform.
        transform: String,
        /// The fingerprinting failure.
        #[source]
        source: FingerprintError,
    },

    /// The registered parameters could not be digested.
    #[error("invalid parameters for transform {transform}: {reason}")]
    InvalidParameters {
        /// Display name of the transform.
        transform: String,
        /// Description of the encoding failure.
        reason: String,
    },
}

impl TransformError {
    /// Returns the failed stage for [`TransformError::ExecutionFailed`].
    pub fn stage(&self) -> Option<ExecutionStage> {
        match self {
            TransformError::ExecutionFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
