//! Joint-space poses of a rig and the inverse-kinematics seam.

use std::collections::BTreeMap;

use kinematics::opw_kinematics::OpwKinematicsSolver;
use kinematics::{JointKind, KinematicModel, PositionLimits};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

use crate::bone::LimitConstraint;
use crate::error::PoseError;
use crate::skeleton::Rig;

/// Joint name to position, radians for revolute joints and metres for
/// prismatic ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RigPose {
    values: BTreeMap<String, f64>,
}

impl RigPose {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every posable bone at zero, or at the bound nearest to zero.
    pub fn rest(rig: &Rig) -> Self {
        let values = rig
            .posable_bones()
            .filter_map(|b| b.constraint.map(|c| (b.name.clone(), c.clamp(0.0))))
            .collect();
        Self { values }
    }

    /// Set `joint`, clamped into its constraint. Returns the stored value.
    pub fn set(&mut self, rig: &Rig, joint: &str, value: f64) -> Result<f64, PoseError> {
        let constraint = constraint_of(rig, joint)?;
        let value = constraint.clamp(value);
        self.values.insert(joint.to_string(), value);
        Ok(value)
    }

    pub fn get(&self, joint: &str) -> Option<f64> {
        self.values.get(joint).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, &value)| (name.as_str(), value))
    }

    /// Check a pose read from outside against the rig, clamping every value.
    pub fn validated(&self, rig: &Rig) -> Result<Self, PoseError> {
        let mut pose = Self::new();
        for (joint, value) in self.iter() {
            pose.set(rig, joint, value)?;
        }
        Ok(pose)
    }

    /// Positions indexed like the model's joints; joints absent from the
    /// pose stay at zero.
    pub fn joint_positions(&self, model: &KinematicModel) -> Vec<f64> {
        model
            .joints()
            .iter()
            .map(|j| self.get(&j.name).unwrap_or(0.0))
            .collect()
    }
}

fn constraint_of(rig: &Rig, joint: &str) -> Result<LimitConstraint, PoseError> {
    let bone = rig
        .bone(joint)
        .filter(|b| !b.is_root())
        .ok_or_else(|| PoseError::UnknownJoint(joint.to_string()))?;
    bone.constraint
        .ok_or_else(|| PoseError::FixedJoint(joint.to_string()))
}

/// Computes joint positions reaching a Cartesian goal.
pub trait IkSolver {
    fn solve(
        &self,
        rig: &Rig,
        current: &RigPose,
        target: &Isometry3<f64>,
    ) -> Result<RigPose, PoseError>;
}

/// Six revolute bones driven by the analytic OPW solver. Among the
/// solutions inside every bone constraint, the one closest to the current
/// pose is chosen.
pub struct OpwChain {
    joints: [String; 6],
    solver: OpwKinematicsSolver,
}

impl OpwChain {
    pub fn new(joints: &[&str], solver: OpwKinematicsSolver) -> Result<Self, PoseError> {
        let joints: [String; 6] = joints
            .iter()
            .map(|j| j.to_string())
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|v: Vec<String>| PoseError::ChainLength {
                expected: 6,
                found: v.len(),
            })?;
        Ok(Self { joints, solver })
    }

    pub fn joints(&self) -> &[String; 6] {
        &self.joints
    }
}

impl IkSolver for OpwChain {
    fn solve(
        &self,
        rig: &Rig,
        current: &RigPose,
        target: &Isometry3<f64>,
    ) -> Result<RigPose, PoseError> {
        let mut limits = [PositionLimits::default(); 6];
        let mut seed = [0.0; 6];
        for (i, joint) in self.joints.iter().enumerate() {
            let constraint = constraint_of(rig, joint)?;
            if constraint.kind != JointKind::Revolute {
                return Err(PoseError::NotRevolute(joint.clone()));
            }
            limits[i] = PositionLimits::new(constraint.min, constraint.max);
            seed[i] = current.get(joint).unwrap_or(0.0);
        }

        let solution = self
            .solver
            .closest_solution(target, &seed, &limits)
            .ok_or(PoseError::NoSolution)?;

        let mut pose = current.clone();
        for (joint, value) in self.joints.iter().zip(solution) {
            pose.set(rig, joint, value)?;
        }
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::LocalAxis;
    use std::f64::consts::PI;

    fn constrained(kind: JointKind, min: f64, max: f64) -> Option<LimitConstraint> {
        Some(LimitConstraint {
            axis: LocalAxis::Y,
            min,
            max,
            kind,
            software: false,
        })
    }

    fn arm_rig() -> Rig {
        let mut rig = Rig::new("arm", "root_link");
        rig.get_or_create("root_link", "root_link");
        let mut parent = "root_link".to_string();
        for i in 1..=6 {
            let name = format!("joint_{i}");
            let (bone, _) = rig.get_or_create(&name, &format!("link_{i}"));
            bone.parent = Some(parent.clone());
            bone.kind = Some(JointKind::Revolute);
            bone.constraint = constrained(JointKind::Revolute, -PI, PI);
            parent = name;
        }
        let (tool, _) = rig.get_or_create("tool", "flange");
        tool.parent = Some(parent);
        tool.kind = Some(JointKind::Fixed);
        let (slide, _) = rig.get_or_create("slide", "rail");
        slide.kind = Some(JointKind::Prismatic);
        slide.constraint = constrained(JointKind::Prismatic, 0.0, 0.5);
        rig
    }

    fn kr6() -> OpwKinematicsSolver {
        OpwKinematicsSolver::new(0.550, 0.550, 0.600, 0.110, 0.150, 0.0, 0.0)
    }

    const CHAIN: [&str; 6] = ["joint_1", "joint_2", "joint_3", "joint_4", "joint_5", "joint_6"];

    #[test]
    fn test_set_validates_and_clamps() {
        let rig = arm_rig();
        let mut pose = RigPose::new();
        assert_eq!(pose.set(&rig, "joint_1", 4.0).unwrap(), PI);
        assert_eq!(pose.set(&rig, "slide", 0.2).unwrap(), 0.2);
        assert_eq!(
            pose.set(&rig, "ghost", 0.0),
            Err(PoseError::UnknownJoint("ghost".into()))
        );
        assert_eq!(
            pose.set(&rig, "tool", 0.0),
            Err(PoseError::FixedJoint("tool".into()))
        );
        assert_eq!(
            pose.set(&rig, "root_link", 0.0),
            Err(PoseError::UnknownJoint("root_link".into()))
        );
        assert_eq!(pose.len(), 2);
    }

    #[test]
    fn test_rest_pose_respects_constraints() {
        let mut rig = arm_rig();
        rig.bone_mut("slide").unwrap().constraint = constrained(JointKind::Prismatic, 0.1, 0.5);
        let pose = RigPose::rest(&rig);
        assert_eq!(pose.len(), 7);
        assert_eq!(pose.get("joint_3"), Some(0.0));
        assert_eq!(pose.get("slide"), Some(0.1));
        assert_eq!(pose.get("tool"), None);
    }

    #[test]
    fn test_pose_from_json_is_validated() {
        let rig = arm_rig();
        let pose: RigPose = serde_json::from_str(r#"{"joint_2": -7.0, "slide": 0.25}"#).unwrap();
        let pose = pose.validated(&rig).unwrap();
        assert_eq!(pose.get("joint_2"), Some(-PI));

        let bad: RigPose = serde_json::from_str(r#"{"tool": 0.1}"#).unwrap();
        assert!(bad.validated(&rig).is_err());
    }

    #[test]
    fn test_opw_chain_recovers_pose() {
        let rig = arm_rig();
        let solver = kr6();
        let joints = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let target = solver.forward_kinematics(&joints);

        let mut current = RigPose::new();
        for (name, value) in CHAIN.iter().zip(joints) {
            current.set(&rig, name, value).unwrap();
        }
        current.set(&rig, "slide", 0.3).unwrap();

        let chain = OpwChain::new(&CHAIN, solver).unwrap();
        let solved = chain.solve(&rig, &current, &target).unwrap();
        for (name, expected) in CHAIN.iter().zip(joints) {
            assert!((solved.get(name).unwrap() - expected).abs() < 1e-4);
        }
        assert_eq!(solved.get("slide"), Some(0.3));
    }

    #[test]
    fn test_opw_chain_rejects_bad_joints() {
        let rig = arm_rig();
        assert_eq!(
            OpwChain::new(&CHAIN[..5], kr6()).err(),
            Some(PoseError::ChainLength { expected: 6, found: 5 })
        );

        let chain = OpwChain::new(
            &["joint_1", "joint_2", "joint_3", "joint_4", "joint_5", "slide"],
            kr6(),
        )
        .unwrap();
        let target = kr6().forward_kinematics(&[0.0; 6]);
        assert_eq!(
            chain.solve(&rig, &RigPose::new(), &target),
            Err(PoseError::NotRevolute("slide".into()))
        );
    }
}
