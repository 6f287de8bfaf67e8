use std::path::{Path, PathBuf};

/// Errors raised while resolving software position limits.
#[derive(Debug, thiserror::Error)]
pub enum LimitsError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("robot description XML error: {0}")]
    Xml(String),

    /// Same as [`LimitsError::Xml`], once the description's path is known.
    #[error("robot description XML error in {path}: {message}")]
    MalformedDescription { path: PathBuf, message: String },

    #[error("{path}: missing parameter {parameter}")]
    MissingParameter {
        path: PathBuf,
        parameter: &'static str,
    },

    #[error("{path}: parameter {parameter} is not a list of {expected}")]
    WrongValueType {
        path: PathBuf,
        parameter: &'static str,
        expected: &'static str,
    },

    #[error("{path}: {joints} joint names but {min} minimum and {max} maximum positions")]
    LengthMismatch {
        path: PathBuf,
        joints: usize,
        min: usize,
        max: usize,
    },
}

impl LimitsError {
    /// Attach the robot description path to an XML error.
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Xml(message) => Self::MalformedDescription {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_path_names_the_description() {
        let e = LimitsError::Xml("unexpected end".into()).with_path(Path::new("/robots/r1.urdf"));
        assert!(matches!(e, LimitsError::MalformedDescription { .. }));
        assert!(e.to_string().contains("/robots/r1.urdf"));

        let e = LimitsError::MissingParameter {
            path: PathBuf::from("conf/head.ini"),
            parameter: "jntPosMin",
        }
        .with_path(Path::new("/robots/r1.urdf"));
        assert!(e.to_string().starts_with("conf/head.ini"));
    }

    #[test]
    fn test_messages_name_the_document() {
        let e = LimitsError::MissingParameter {
            path: PathBuf::from("conf/left_arm.ini"),
            parameter: "jntPosMax",
        };
        assert_eq!(e.to_string(), "conf/left_arm.ini: missing parameter jntPosMax");

        let e = LimitsError::LengthMismatch {
            path: PathBuf::from("conf/head.ini"),
            joints: 3,
            min: 2,
            max: 3,
        };
        assert!(e.to_string().contains("3 joint names but 2 minimum"));
    }
}
