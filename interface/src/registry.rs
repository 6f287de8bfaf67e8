//! Explicitly owned registry of connected control boards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kinematics::JointKind;
use log::{info, warn};
use rig::{Rig, RigPose};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid parts document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("part {0} is not listed in the parts document")]
    UnknownPart(String),

    #[error("part {0} is already connected")]
    AlreadyConnected(String),

    #[error("part {0} is not connected")]
    NotConnected(String),
}

/// One control board: the joints it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub joints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartsConfig {
    pub robot: String,
    pub parts: Vec<PartConfig>,
}

impl PartsConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text).map_err(|e| RegistryError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn part(&self, name: &str) -> Option<&PartConfig> {
        self.parts.iter().find(|p| p.name == name)
    }
}

/// A board joint with its range, degrees for revolute joints and metres for
/// prismatic ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardJoint {
    pub name: String,
    pub kind: JointKind,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointTarget {
    pub name: String,
    pub position: f64,
    pub within_limits: bool,
}

#[derive(Debug, Clone)]
pub struct ControlBoard {
    part: String,
    joints: Vec<BoardJoint>,
    /// Board joints with no posable bone in the rig.
    missing: Vec<String>,
}

impl ControlBoard {
    pub fn open(part: &PartConfig, rig: &Rig) -> Self {
        let mut joints = Vec::new();
        let mut missing = Vec::new();
        for name in &part.joints {
            match rig.bone(name).and_then(|b| b.constraint) {
                Some(c) => {
                    let (min, max) = match c.kind {
                        JointKind::Revolute => (c.min.to_degrees(), c.max.to_degrees()),
                        _ => (c.min, c.max),
                    };
                    joints.push(BoardJoint {
                        name: name.clone(),
                        kind: c.kind,
                        min,
                        max,
                    });
                }
                None => missing.push(name.clone()),
            }
        }
        info!(
            "opened board {} with {} joints ({} not in rig {})",
            part.name,
            joints.len(),
            missing.len(),
            rig.name()
        );
        Self {
            part: part.name.clone(),
            joints,
            missing,
        }
    }

    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn joints(&self) -> &[BoardJoint] {
        &self.joints
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Targets for every board joint present in the rig; joints absent from
    /// the pose are sent at zero. Out-of-range targets are reported and
    /// still sent.
    pub fn targets(&self, pose: &RigPose) -> Vec<JointTarget> {
        for name in &self.missing {
            warn!(
                "skipping joint {name} of board {}: it is not present in the rig",
                self.part
            );
        }
        self.joints
            .iter()
            .map(|joint| {
                let value = pose.get(&joint.name).unwrap_or(0.0);
                let position = match joint.kind {
                    JointKind::Revolute => value.to_degrees(),
                    _ => value,
                };
                let within_limits = position >= joint.min && position <= joint.max;
                if !within_limits {
                    warn!(
                        "target {position:.3} for joint {} is outside [{:.3}, {:.3}]",
                        joint.name, joint.min, joint.max
                    );
                }
                JointTarget {
                    name: joint.name.clone(),
                    position,
                    within_limits,
                }
            })
            .collect()
    }
}

/// Connected boards keyed by part name.
#[derive(Debug, Default)]
pub struct ControlRegistry {
    boards: BTreeMap<String, ControlBoard>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(
        &mut self,
        parts: &PartsConfig,
        part: &str,
        rig: &Rig,
    ) -> Result<&ControlBoard, RegistryError> {
        if self.boards.contains_key(part) {
            return Err(RegistryError::AlreadyConnected(part.to_string()));
        }
        let config = parts
            .part(part)
            .ok_or_else(|| RegistryError::UnknownPart(part.to_string()))?;
        let board = ControlBoard::open(config, rig);
        Ok(self.boards.entry(part.to_string()).or_insert(board))
    }

    pub fn disconnect(&mut self, part: &str) -> Result<ControlBoard, RegistryError> {
        let board = self
            .boards
            .remove(part)
            .ok_or_else(|| RegistryError::NotConnected(part.to_string()))?;
        info!("closed board {part}");
        Ok(board)
    }

    /// Disconnect every board, returning the closed part names.
    pub fn close_all(&mut self) -> Vec<String> {
        let parts: Vec<String> = self.boards.keys().cloned().collect();
        for part in &parts {
            info!("closed board {part}");
        }
        self.boards.clear();
        parts
    }

    pub fn is_connected(&self, part: &str) -> bool {
        self.boards.contains_key(part)
    }

    pub fn board(&self, part: &str) -> Option<&ControlBoard> {
        self.boards.get(part)
    }

    pub fn boards(&self) -> impl Iterator<Item = &ControlBoard> {
        self.boards.values()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig::{ImportConfig, convert_str};
    use std::f64::consts::FRAC_PI_2;

    const URDF: &str = r#"
        <robot name="r1">
            <link name="root_link"/>
            <link name="upper"/>
            <link name="lower"/>
            <link name="rail"/>
            <joint name="shoulder" type="revolute">
                <parent link="root_link"/>
                <child link="upper"/>
                <axis xyz="0 1 0"/>
                <limit lower="-1.0" upper="1.0" effort="1" velocity="1"/>
            </joint>
            <joint name="elbow" type="fixed">
                <parent link="upper"/>
                <child link="lower"/>
                <origin xyz="0.3 0 0" rpy="0 0 0"/>
            </joint>
            <joint name="lift" type="prismatic">
                <parent link="root_link"/>
                <child link="rail"/>
                <axis xyz="0 0 1"/>
                <limit lower="0.0" upper="0.4" effort="1" velocity="1"/>
            </joint>
        </robot>
    "#;

    const PARTS: &str = r#"{
        "robot": "r1",
        "parts": [
            { "name": "left_arm", "label": "Left arm", "joints": ["shoulder", "elbow", "wrist"] },
            { "name": "torso", "joints": ["lift"] }
        ]
    }"#;

    fn rig() -> Rig {
        convert_str(URDF, &ImportConfig::default(), Path::new("."))
            .unwrap()
            .rig
    }

    #[test]
    fn test_parts_document() {
        let parts = PartsConfig::from_json(PARTS).unwrap();
        assert_eq!(parts.robot, "r1");
        assert_eq!(parts.part("left_arm").unwrap().label, "Left arm");
        assert_eq!(parts.part("torso").unwrap().label, "");
        assert!(parts.part("head").is_none());
    }

    #[test]
    fn test_board_keeps_posable_rig_joints() {
        let parts = PartsConfig::from_json(PARTS).unwrap();
        let board = ControlBoard::open(parts.part("left_arm").unwrap(), &rig());
        assert_eq!(board.joints().len(), 1);
        assert_eq!(board.missing(), &["elbow".to_string(), "wrist".to_string()]);

        let shoulder = &board.joints()[0];
        assert!((shoulder.max - 1.0f64.to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_targets_in_degrees_and_out_of_range_still_sent() {
        let rig = rig();
        let parts = PartsConfig::from_json(PARTS).unwrap();
        let arm = ControlBoard::open(parts.part("left_arm").unwrap(), &rig);
        let torso = ControlBoard::open(parts.part("torso").unwrap(), &rig);

        let mut pose = RigPose::new();
        pose.set(&rig, "lift", 0.25).unwrap();
        let targets = torso.targets(&pose);
        assert_eq!(targets[0].position, 0.25);
        assert!(targets[0].within_limits);

        // A pose read from outside is not clamped by the board.
        let raw: RigPose = serde_json::from_str(&format!(r#"{{"shoulder": {FRAC_PI_2}}}"#)).unwrap();
        let targets = arm.targets(&raw);
        assert_eq!(targets.len(), 1);
        assert!((targets[0].position - 90.0).abs() < 1e-9);
        assert!(!targets[0].within_limits);
    }

    #[test]
    fn test_registry_lifecycle() {
        let rig = rig();
        let parts = PartsConfig::from_json(PARTS).unwrap();
        let mut registry = ControlRegistry::new();

        registry.connect(&parts, "left_arm", &rig).unwrap();
        registry.connect(&parts, "torso", &rig).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(matches!(
            registry.connect(&parts, "torso", &rig),
            Err(RegistryError::AlreadyConnected(_))
        ));
        assert!(matches!(
            registry.connect(&parts, "head", &rig),
            Err(RegistryError::UnknownPart(_))
        ));

        let board = registry.disconnect("torso").unwrap();
        assert_eq!(board.part(), "torso");
        assert!(!registry.is_connected("torso"));
        assert!(matches!(
            registry.disconnect("torso"),
            Err(RegistryError::NotConnected(_))
        ));

        assert_eq!(registry.close_all(), vec!["left_arm".to_string()]);
        assert!(registry.is_empty());
    }
}
