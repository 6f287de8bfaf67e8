use std::path::PathBuf;

use kinematics::ModelError;
use limits::LimitsError;

/// Errors that abort a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Limits(#[from] LimitsError),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid import configuration {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl ConvertError {
    /// Whether the error is a missing or inconsistent software-limit document.
    pub fn is_missing_limit_data(&self) -> bool {
        matches!(
            self,
            Self::Limits(
                LimitsError::MissingParameter { .. }
                    | LimitsError::WrongValueType { .. }
                    | LimitsError::LengthMismatch { .. }
            )
        )
    }
}

/// Errors raised while posing a rig.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("joint {0} is not part of the rig")]
    UnknownJoint(String),

    #[error("joint {0} is fixed and cannot be posed")]
    FixedJoint(String),

    #[error("joint {0} is not revolute")]
    NotRevolute(String),

    #[error("chain needs {expected} joints, got {found}")]
    ChainLength { expected: usize, found: usize },

    #[error("no inverse kinematics solution within the joint limits")]
    NoSolution,
}
