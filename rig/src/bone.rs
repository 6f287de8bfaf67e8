use kinematics::JointKind;
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Axis of a bone's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocalAxis {
    X,
    Y,
    Z,
}

/// Single-axis range-of-motion limit attached to a bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimitConstraint {
    pub axis: LocalAxis,
    /// Radians for revolute bones, metres for prismatic ones.
    pub min: f64,
    pub max: f64,
    pub kind: JointKind,
    /// Whether the range came from a software-limit document.
    pub software: bool,
}

impl LimitConstraint {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// A node of the rig. Every joint has one, named after the joint, and the
/// root link has a synthetic one named after the link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoneNode {
    pub name: String,
    /// Head and tail in the root frame.
    pub head: Point3<f64>,
    pub tail: Point3<f64>,
    pub parent: Option<String>,
    /// Link this bone moves.
    pub link: String,
    /// `None` for the root bone.
    pub kind: Option<JointKind>,
    pub constraint: Option<LimitConstraint>,
}

impl BoneNode {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            head: Point3::origin(),
            tail: Point3::origin(),
            parent: None,
            link: link.into(),
            kind: None,
            constraint: None,
        }
    }

    pub fn length(&self) -> f64 {
        (self.tail - self.head).norm()
    }

    pub fn direction(&self) -> Vector3<f64> {
        self.tail - self.head
    }

    pub fn is_root(&self) -> bool {
        self.kind.is_none()
    }

    /// Bones that take part in posing.
    pub fn is_posable(&self) -> bool {
        self.constraint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_clamp() {
        let c = LimitConstraint {
            axis: LocalAxis::Y,
            min: -0.5,
            max: 0.5,
            kind: JointKind::Revolute,
            software: false,
        };
        assert!(c.contains(0.5));
        assert!(!c.contains(0.51));
        assert_eq!(c.clamp(2.0), 0.5);
        assert_eq!(c.clamp(-2.0), -0.5);
    }

    #[test]
    fn test_new_bone_is_root_like() {
        let mut bone = BoneNode::new("root_link", "root_link");
        bone.tail = Point3::new(0.0, 0.0, -0.01);
        assert!(bone.is_root());
        assert!(!bone.is_posable());
        assert!((bone.length() - 0.01).abs() < 1e-12);
    }
}
