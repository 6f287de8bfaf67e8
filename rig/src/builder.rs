//! Rig construction from a rooted traversal.
//!
//! Joints are visited parents first. Each one gets a bone named after it
//! that spans from the parent link origin to the child link origin;
//! revolute bones are then moved onto the child origin and pointed along
//! the joint axis. The root link gets a synthetic bone of its own.

use kinematics::{JointIndex, JointKind, KinematicModel, LinkIndex, LinkPoses, Traversal};
use log::debug;
use nalgebra::{Point3, Vector3};

use crate::bone::{LimitConstraint, LocalAxis};
use crate::limit::LimitTable;
use crate::skeleton::Rig;

/// Length floor of revolute bones, and the length of the root bone.
/// Link-span bones are only nudged when their ends coincide.
pub const MIN_BONE_LENGTH: f64 = 0.01;

/// Offset added to a link-span tail so that coincident links still give a
/// bone of non-zero length.
const TAIL_NUDGE: [f64; 3] = [-0.01, 0.0, 0.0];

pub struct RigBuilder<'a> {
    model: &'a KinematicModel,
    traversal: &'a Traversal,
    poses: &'a LinkPoses,
    limits: &'a LimitTable,
    rig: Rig,
}

impl<'a> RigBuilder<'a> {
    pub fn new(
        model: &'a KinematicModel,
        traversal: &'a Traversal,
        poses: &'a LinkPoses,
        limits: &'a LimitTable,
    ) -> Self {
        let root = model.link_name(traversal.root());
        let mut builder = Self {
            model,
            traversal,
            poses,
            limits,
            rig: Rig::new(model.name(), root),
        };
        builder.ensure_link_bone(traversal.root());
        builder
    }

    /// Place every joint in traversal order and hand over the rig.
    pub fn build(mut self) -> Rig {
        let traversal = self.traversal;
        for &j in traversal.joint_order() {
            self.place_joint(j);
        }
        self.rig
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    /// Bone of `link`, creating a placeholder one named after the link when
    /// the link is not bound yet.
    fn ensure_link_bone(&mut self, link: LinkIndex) -> String {
        let model = self.model;
        let link_name = model.link_name(link);
        if let Some(bone) = self.rig.bone_for_link(link_name) {
            return bone.name.clone();
        }
        let (bone, created) = self.rig.get_or_create(link_name, link_name);
        if created {
            bone.head = Point3::origin();
            bone.tail = Point3::new(0.0, 0.0, -MIN_BONE_LENGTH);
        }
        let name = bone.name.clone();
        self.rig.bind_link(link_name, &name);
        name
    }

    /// Create and place the bone of joint `j`. Returns `false`, leaving the
    /// rig untouched, when the bone already exists.
    pub fn place_joint(&mut self, j: JointIndex) -> bool {
        let model = self.model;
        let joint = model.joint(j);
        if self.rig.bone(&joint.name).is_some() {
            debug!("bone {} already placed", joint.name);
            return false;
        }

        let parent_link = self.traversal.parent_link_of(j);
        let child_link = self.traversal.child_link_of(j);
        let parent_bone = self.ensure_link_bone(parent_link);

        let parent_position = Point3::from(self.poses.position(parent_link));
        let child_position = Point3::from(self.poses.position(child_link));

        let mut head = parent_position;
        let mut tail = child_position + Vector3::from(TAIL_NUDGE);
        if joint.kind == JointKind::Revolute {
            let length = (tail - head).norm().max(MIN_BONE_LENGTH);
            let axis = self.poses.joint_axis(model, j);
            head = child_position;
            tail = head + axis.into_inner() * length;
        }
        if (tail - head).norm() < MIN_BONE_LENGTH * 1e-6 {
            tail = head + Vector3::from(TAIL_NUDGE);
        }

        let constraint = match (joint.kind, self.limits.get(&joint.name)) {
            (JointKind::Fixed, _) | (_, None) => None,
            (kind, Some(record)) => Some(LimitConstraint {
                axis: LocalAxis::Y,
                min: record.min,
                max: record.max,
                kind,
                software: record.is_software(),
            }),
        };

        let child_name = model.link_name(child_link);
        let (bone, _) = self.rig.get_or_create(&joint.name, child_name);
        bone.head = head;
        bone.tail = tail;
        bone.parent = Some(parent_bone);
        bone.kind = Some(joint.kind);
        bone.constraint = constraint;
        debug!(
            "bone {} ({}) head {:?} tail {:?}",
            joint.name, joint.kind, head, tail
        );
        self.rig.bind_link(child_name, &joint.name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinematics::{JointDef, Link, PositionLimits, RigidTransform};
    use limits::SoftwareLimits;

    fn def(name: &str, kind: JointKind, parent: &str, child: &str, x: f64) -> JointDef {
        JointDef {
            name: name.into(),
            kind,
            parent: parent.into(),
            child: child.into(),
            origin: RigidTransform::translation(x, 0.0, 0.0),
            axis: Vector3::y_axis(),
            limits: PositionLimits::new(-1.57, 1.57),
        }
    }

    fn branching() -> KinematicModel {
        KinematicModel::new(
            "torso",
            vec![
                Link::new("root_link"),
                Link::new("chest"),
                Link::new("l_arm"),
                Link::new("r_arm"),
            ],
            vec![
                def("waist", JointKind::Revolute, "root_link", "chest", 0.0),
                def("l_shoulder", JointKind::Revolute, "chest", "l_arm", 0.3),
                def("r_shoulder", JointKind::Prismatic, "chest", "r_arm", -0.3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_root_bone_and_branch_parents() {
        let model = branching();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let poses = model.link_poses(&traversal, &[]);
        let limits = LimitTable::resolve(&model, &SoftwareLimits::new());
        let rig = RigBuilder::new(&model, &traversal, &poses, &limits).build();

        assert_eq!(rig.len(), 4);
        let root = rig.bone("root_link").unwrap();
        assert_eq!(root.head, Point3::origin());
        assert_eq!(root.tail, Point3::new(0.0, 0.0, -0.01));
        assert!(root.parent.is_none());

        for name in ["l_shoulder", "r_shoulder"] {
            assert_eq!(rig.bone(name).unwrap().parent.as_deref(), Some("waist"));
        }
        assert_eq!(rig.bone_for_link("chest").unwrap().name, "waist");
    }

    #[test]
    fn test_revolute_bone_follows_axis() {
        let model = branching();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let poses = model.link_poses(&traversal, &[]);
        let limits = LimitTable::resolve(&model, &SoftwareLimits::new());
        let rig = RigBuilder::new(&model, &traversal, &poses, &limits).build();

        let bone = rig.bone("l_shoulder").unwrap();
        assert!((bone.head.x - 0.3).abs() < 1e-12);
        let direction = bone.direction().normalize();
        assert!((direction.y - 1.0).abs() < 1e-12);
        // span from chest to l_arm is 0.3 - 0.01
        assert!((bone.length() - 0.29).abs() < 1e-12);
    }

    #[test]
    fn test_prismatic_bone_spans_links() {
        let model = branching();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let poses = model.link_poses(&traversal, &[]);
        let limits = LimitTable::resolve(&model, &SoftwareLimits::new());
        let rig = RigBuilder::new(&model, &traversal, &poses, &limits).build();

        let bone = rig.bone("r_shoulder").unwrap();
        assert_eq!(bone.head, Point3::origin());
        assert!((bone.tail.x + 0.31).abs() < 1e-12);
        let constraint = bone.constraint.unwrap();
        assert_eq!(constraint.kind, JointKind::Prismatic);
        assert_eq!(constraint.axis, LocalAxis::Y);
    }

    #[test]
    fn test_coincident_links_keep_minimum_length() {
        let model = branching();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let poses = model.link_poses(&traversal, &[]);
        let limits = LimitTable::resolve(&model, &SoftwareLimits::new());
        let rig = RigBuilder::new(&model, &traversal, &poses, &limits).build();

        // waist joins two links at the same origin
        let waist = rig.bone("waist").unwrap();
        assert!(waist.length() >= MIN_BONE_LENGTH - 1e-12);
    }

    #[test]
    fn test_short_link_span_is_not_stretched() {
        let model = KinematicModel::new(
            "short",
            vec![Link::new("root_link"), Link::new("tip")],
            vec![def("f", JointKind::Fixed, "root_link", "tip", 0.015)],
        )
        .unwrap();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let poses = model.link_poses(&traversal, &[]);
        let limits = LimitTable::resolve(&model, &SoftwareLimits::new());
        let rig = RigBuilder::new(&model, &traversal, &poses, &limits).build();

        let bone = rig.bone("f").unwrap();
        assert!((bone.length() - 0.005).abs() < 1e-12);
        assert!(bone.constraint.is_none());
    }

    #[test]
    fn test_place_joint_twice_is_idempotent() {
        let model = branching();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let poses = model.link_poses(&traversal, &[]);
        let limits = LimitTable::resolve(&model, &SoftwareLimits::new());
        let mut builder = RigBuilder::new(&model, &traversal, &poses, &limits);

        let waist = model.joint_by_name("waist").unwrap();
        assert!(builder.place_joint(waist));
        let placed = builder.rig().bone("waist").unwrap().clone();
        assert!(!builder.place_joint(waist));
        assert_eq!(builder.rig().bone("waist").unwrap(), &placed);
        assert_eq!(builder.rig().len(), 2);
    }
}
