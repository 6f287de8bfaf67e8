use std::fmt;

use serde::Serialize;

/// Recoverable problem found during a conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The visual was skipped.
    UnsupportedShape {
        link: String,
        index: usize,
        shape: String,
    },
    /// The box was instantiated as a cube with the X extent.
    NonUniformBox {
        link: String,
        index: usize,
        size: [f64; 3],
    },
    /// A skip-list entry that names no joint of the model.
    UnknownSkippedJoint { joint: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedShape { link, index, shape } => {
                write!(f, "link {link} visual {index}: unsupported shape {shape}, skipped")
            }
            Self::NonUniformBox { link, index, size } => write!(
                f,
                "link {link} visual {index}: box {size:?} imported as a cube of size {}",
                size[0]
            ),
            Self::UnknownSkippedJoint { joint } => {
                write!(f, "skip-list joint {joint} is not part of the model")
            }
        }
    }
}
