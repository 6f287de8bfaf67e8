//! Per-joint limit records: hardware limits from the model, optionally
//! overridden by software limits.

use std::collections::HashMap;

use kinematics::{JointKind, KinematicModel};
use limits::SoftwareLimits;
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimitSource {
    Hardware,
    Software,
}

/// `(min, max, kind)` of one joint, in radians (revolute) or metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimitRecord {
    pub min: f64,
    pub max: f64,
    pub kind: JointKind,
    pub source: LimitSource,
}

impl LimitRecord {
    pub fn hardware(min: f64, max: f64, kind: JointKind) -> Self {
        Self {
            min,
            max,
            kind,
            source: LimitSource::Hardware,
        }
    }

    /// Replace both bounds with a software range given in degrees. Only
    /// revolute ranges are converted; prismatic ranges are taken as they are.
    pub fn apply_override(&mut self, min: f64, max: f64) {
        let (min, max) = match self.kind {
            JointKind::Revolute => (min.to_radians(), max.to_radians()),
            JointKind::Prismatic | JointKind::Fixed => (min, max),
        };
        self.min = min;
        self.max = max;
        self.source = LimitSource::Software;
    }

    pub fn is_software(&self) -> bool {
        self.source == LimitSource::Software
    }

    /// Bounds in display units: degrees for revolute joints, metres otherwise.
    pub fn display_range(&self) -> (f64, f64, &'static str) {
        match self.kind {
            JointKind::Revolute => (self.min.to_degrees(), self.max.to_degrees(), "deg"),
            JointKind::Prismatic | JointKind::Fixed => (self.min, self.max, "m"),
        }
    }
}

/// Limit records of every joint of a model.
#[derive(Debug, Clone, Default)]
pub struct LimitTable {
    records: HashMap<String, LimitRecord>,
}

impl LimitTable {
    /// Start from the model's hardware limits and overwrite the joints that
    /// have a software range.
    pub fn resolve(model: &KinematicModel, software: &SoftwareLimits) -> Self {
        let mut records = HashMap::with_capacity(model.joints().len());
        for joint in model.joints() {
            let mut record = LimitRecord::hardware(joint.limits.min, joint.limits.max, joint.kind);
            let (min, max, unit) = record.display_range();
            info!("joint {} hardware limits [{min:.2}, {max:.2}] {unit}", joint.name);
            if let Some((min, max)) = software.get(&joint.name) {
                record.apply_override(min, max);
                let (min, max, unit) = record.display_range();
                info!("joint {} uses software limits [{min:.2}, {max:.2}] {unit}", joint.name);
            }
            records.insert(joint.name.clone(), record);
        }
        Self { records }
    }

    pub fn get(&self, joint: &str) -> Option<&LimitRecord> {
        self.records.get(joint)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
