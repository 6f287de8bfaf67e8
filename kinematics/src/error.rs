//! Errors raised while loading or traversing a kinematic model.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("robot description parse error: {0}")]
    Parse(String),

    /// Same as [`ModelError::Parse`], once the offending document is known.
    #[error("malformed robot description {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("unsupported joint type {kind} on joint {joint}")]
    UnsupportedJointType { joint: String, kind: String },

    #[error("joint {joint} references undefined link {link}")]
    UndefinedLink { joint: String, link: String },

    #[error("duplicate link name: {0}")]
    DuplicateLink(String),

    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    #[error("missing link: {0}")]
    MissingLink(String),

    #[error("no root link found")]
    NoRootLink,

    #[error("root link {0} is not part of the model")]
    MissingRoot(String),

    #[error("kinematic cycle closed by joint {0}")]
    Cycle(String),

    #[error("links not reachable from {root}: {unreachable:?}")]
    Disconnected {
        root: String,
        unreachable: Vec<String>,
    },
}

impl ModelError {
    /// Attach the document path to a parse failure.
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Parse(message) => Self::Malformed {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        }
    }

    /// Whether the error means no rooted tree can be built from the model.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::NoRootLink | Self::MissingRoot(_) | Self::Cycle(_) | Self::Disconnected { .. }
        )
    }
}
