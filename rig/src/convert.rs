//! End-to-end conversion of a robot description into a rig.

use std::path::Path;

use kinematics::Traversal;
use limits::resolve_software_limits;
use log::{info, warn};
use serde::Serialize;

use crate::builder::RigBuilder;
use crate::config::ImportConfig;
use crate::error::ConvertError;
use crate::geometry::{GeometryPlacement, place_geometry};
use crate::limit::LimitTable;
use crate::skeleton::Rig;
use crate::warning::Warning;

/// Result of one conversion: the rig, where each visual goes, and the
/// recoverable problems met on the way.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub rig: Rig,
    pub geometry: Vec<GeometryPlacement>,
    pub warnings: Vec<Warning>,
}

/// Convert the robot description stored at `path`.
pub fn convert_file(path: impl AsRef<Path>, config: &ImportConfig) -> Result<Conversion, ConvertError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|e| ConvertError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let search_path = config.search_path_for(path);
    convert_str(&xml, config, &search_path).map_err(|e| match e {
        ConvertError::Model(e) => ConvertError::Model(e.with_path(path)),
        ConvertError::Limits(e) => ConvertError::Limits(e.with_path(path)),
        other => other,
    })
}

/// Convert robot-description XML. Configuration-file references are
/// resolved against `sw_limits.search_path` when set, else `search_path`.
pub fn convert_str(
    xml: &str,
    config: &ImportConfig,
    search_path: &Path,
) -> Result<Conversion, ConvertError> {
    let full = kinematics::parse_string(xml)?;
    let search_path = config.sw_limits.search_path.as_deref().unwrap_or(search_path);
    let software = resolve_software_limits(xml, config.active_body_parts(), search_path)?;

    let mut warnings = Vec::new();
    let (model, unknown) = full.reduced(&config.joints.skip_list)?;
    for joint in unknown {
        let warning = Warning::UnknownSkippedJoint { joint };
        warn!("{warning}");
        warnings.push(warning);
    }

    let traversal = Traversal::compute(&model, &config.root_link)?;
    let poses = model.link_poses(&traversal, &[]);
    let limits = LimitTable::resolve(&model, &software);
    let rig = RigBuilder::new(&model, &traversal, &poses, &limits).build();
    let geometry = place_geometry(&model, &poses, &rig, &mut warnings);

    info!(
        "rig {} has {} bones ({} posable) and {} geometry placements",
        rig.name(),
        rig.len(),
        rig.posable_bones().count(),
        geometry.len()
    );
    Ok(Conversion {
        rig,
        geometry,
        warnings,
    })
}
