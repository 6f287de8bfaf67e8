use nalgebra::{Isometry3, Vector3};

pub mod error;
pub mod model;
pub mod opw_kinematics;
pub mod parser;
pub mod transform;
pub mod traversal;

pub use error::ModelError;
pub use model::{
    Geometry, Joint, JointDef, JointIndex, JointKind, KinematicModel, Link, LinkIndex,
    PositionLimits, RigidTransform, Visual,
};
pub use parser::{parse_file, parse_string};
pub use transform::LinkPoses;
pub use traversal::Traversal;

#[derive(Debug, Clone, Copy)]
pub struct JointState {
    pub angle: f64,
    pub velocity: f64,
    pub effort: f64,
}

impl Default for JointState {
    fn default() -> Self {
        Self {
            angle: 0.0,
            velocity: 0.0,
            effort: 0.0,
        }
    }
}

pub type Position = Vector3<f64>;

pub trait ForwardKinematics {
    /// Pose of `link` for the given joint states, indexed like the model's joints.
    fn forward_kinematics(
        &self,
        link: &str,
        joints: &[JointState],
    ) -> Result<Isometry3<f64>, ModelError>;
}

impl ForwardKinematics for KinematicModel {
    fn forward_kinematics(
        &self,
        link: &str,
        joints: &[JointState],
    ) -> Result<Isometry3<f64>, ModelError> {
        let q: Vec<f64> = joints.iter().map(|j| j.angle).collect();
        self.relative_transform(self.root_link(), link, &q)
    }
}
