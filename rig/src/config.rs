use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_root_link() -> String {
    "root_link".into()
}
const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// ImportConfig
// ---------------------------------------------------------------------------

/// Options controlling one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Link the rig is rooted at.
    #[serde(default = "default_root_link")]
    pub root_link: String,

    #[serde(default)]
    pub joints: JointsConfig,

    #[serde(default)]
    pub sw_limits: SoftwareLimitsConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            root_link: default_root_link(),
            joints: JointsConfig::default(),
            sw_limits: SoftwareLimitsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointsConfig {
    /// Joints removed from the model before traversal.
    #[serde(default)]
    pub skip_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareLimitsConfig {
    #[serde(default = "default_true")]
    pub use_sw_limits: bool,

    /// Plugin name fragments selecting the limit documents to read.
    #[serde(default)]
    pub body_parts: Vec<String>,

    /// Base directory for configuration-file references. Defaults to the
    /// robot description's directory.
    #[serde(default)]
    pub search_path: Option<PathBuf>,
}

impl Default for SoftwareLimitsConfig {
    fn default() -> Self {
        Self {
            use_sw_limits: default_true(),
            body_parts: Vec::new(),
            search_path: None,
        }
    }
}

impl ImportConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConvertError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text).map_err(|e| ConvertError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Body parts whose software limits apply, empty when they are disabled.
    pub fn active_body_parts(&self) -> &[String] {
        if self.sw_limits.use_sw_limits {
            &self.sw_limits.body_parts
        } else {
            &[]
        }
    }

    /// Directory configuration-file references are resolved against.
    pub fn search_path_for(&self, description: &Path) -> PathBuf {
        match &self.sw_limits.search_path {
            Some(path) => path.clone(),
            None => description
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}
