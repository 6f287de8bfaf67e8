use nalgebra::{Unit, Vector3};

use crate::model::{JointIndex, KinematicModel, LinkIndex, RigidTransform};
use crate::traversal::Traversal;

/// Root-to-link transforms of every link for one joint configuration.
#[derive(Debug, Clone)]
pub struct LinkPoses {
    poses: Vec<RigidTransform>,
}

impl LinkPoses {
    pub fn compute(model: &KinematicModel, traversal: &Traversal, q: &[f64]) -> Self {
        let mut poses = vec![RigidTransform::identity(); model.links().len()];
        for &j in traversal.joint_order() {
            let joint = model.joint(j);
            let parent = traversal.parent_link_of(j);
            let child = traversal.child_link_of(j);
            let motion = joint.transform(q.get(j).copied().unwrap_or(0.0));
            // Joints walked against their declared direction contribute the inverse.
            poses[child] = if joint.parent == parent {
                poses[parent] * motion
            } else {
                poses[parent] * motion.inverse()
            };
        }
        Self { poses }
    }

    pub fn root_to(&self, link: LinkIndex) -> &RigidTransform {
        &self.poses[link]
    }

    pub fn to_root(&self, link: LinkIndex) -> RigidTransform {
        self.poses[link].inverse()
    }

    /// Transform from link `from` to link `to`.
    pub fn relative(&self, from: LinkIndex, to: LinkIndex) -> RigidTransform {
        self.poses[from].inverse() * self.poses[to]
    }

    pub fn position(&self, link: LinkIndex) -> Vector3<f64> {
        self.poses[link].translation.vector
    }

    /// Motion axis of joint `j` expressed in the root frame.
    pub fn joint_axis(&self, model: &KinematicModel, j: JointIndex) -> Unit<Vector3<f64>> {
        let joint = model.joint(j);
        Unit::new_normalize(self.poses[joint.child].rotation * joint.axis.into_inner())
    }
}
