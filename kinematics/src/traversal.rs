//! Rooted traversal of the joint graph.
//!
//! Links are visited breadth-first from the requested root over the
//! undirected link/joint adjacency, so every joint gets a parent link (the
//! endpoint reached first) and a child link, and [`Traversal::joint_order`]
//! always lists a joint after the joint that reaches its parent link.

use std::collections::VecDeque;

use crate::error::ModelError;
use crate::model::{JointIndex, KinematicModel, LinkIndex};

#[derive(Debug, Clone)]
pub struct Traversal {
    root: LinkIndex,
    order: Vec<JointIndex>,
    links: Vec<LinkIndex>,
    /// `(parent, child)` per joint index.
    endpoints: Vec<(LinkIndex, LinkIndex)>,
    parent_joint: Vec<Option<JointIndex>>,
}

impl Traversal {
    /// Walk the model from the link named `root`.
    ///
    /// Fails when the root is unknown, when a joint closes a cycle, or when
    /// some link cannot be reached.
    pub fn compute(model: &KinematicModel, root: &str) -> Result<Self, ModelError> {
        let root_index = model
            .link_by_name(root)
            .ok_or_else(|| ModelError::MissingRoot(root.to_string()))?;

        let link_count = model.links().len();
        let mut adjacency: Vec<Vec<JointIndex>> = vec![Vec::new(); link_count];
        for (j, joint) in model.joints().iter().enumerate() {
            if joint.parent == joint.child {
                return Err(ModelError::Cycle(joint.name.clone()));
            }
            adjacency[joint.parent].push(j);
            adjacency[joint.child].push(j);
        }

        let mut visited_links = vec![false; link_count];
        let mut visited_joints = vec![false; model.joints().len()];
        let mut endpoints = vec![(root_index, root_index); model.joints().len()];
        let mut parent_joint = vec![None; link_count];
        let mut order = Vec::with_capacity(model.joints().len());
        let mut links = Vec::with_capacity(link_count);

        let mut queue = VecDeque::from([root_index]);
        visited_links[root_index] = true;
        while let Some(link) = queue.pop_front() {
            links.push(link);
            for &j in &adjacency[link] {
                if visited_joints[j] {
                    continue;
                }
                visited_joints[j] = true;
                let joint = model.joint(j);
                let other = if joint.parent == link {
                    joint.child
                } else {
                    joint.parent
                };
                if visited_links[other] {
                    return Err(ModelError::Cycle(joint.name.clone()));
                }
                visited_links[other] = true;
                endpoints[j] = (link, other);
                parent_joint[other] = Some(j);
                order.push(j);
                queue.push_back(other);
            }
        }

        let unreachable: Vec<String> = visited_links
            .iter()
            .enumerate()
            .filter(|(_, visited)| !**visited)
            .map(|(i, _)| model.link_name(i).to_string())
            .collect();
        if !unreachable.is_empty() {
            return Err(ModelError::Disconnected {
                root: root.to_string(),
                unreachable,
            });
        }

        Ok(Self {
            root: root_index,
            order,
            links,
            endpoints,
            parent_joint,
        })
    }

    pub fn root(&self) -> LinkIndex {
        self.root
    }

    /// Joints in visitation order, parents before children.
    pub fn joint_order(&self) -> &[JointIndex] {
        &self.order
    }

    /// Links in visitation order, starting with the root.
    pub fn link_order(&self) -> &[LinkIndex] {
        &self.links
    }

    pub fn parent_link_of(&self, joint: JointIndex) -> LinkIndex {
        self.endpoints[joint].0
    }

    pub fn child_link_of(&self, joint: JointIndex) -> LinkIndex {
        self.endpoints[joint].1
    }

    /// Joint connecting `link` to its traversal parent; `None` for the root.
    pub fn parent_joint_of(&self, link: LinkIndex) -> Option<JointIndex> {
        self.parent_joint[link]
    }

    /// Whether the traversal walks `joint` against its declared direction.
    pub fn is_reversed(&self, model: &KinematicModel, joint: JointIndex) -> bool {
        model.joint(joint).parent != self.endpoints[joint].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JointDef, JointKind, Link, PositionLimits, RigidTransform};
    use nalgebra::Vector3;

    fn def(name: &str, parent: &str, child: &str) -> JointDef {
        JointDef {
            name: name.into(),
            kind: JointKind::Revolute,
            parent: parent.into(),
            child: child.into(),
            origin: RigidTransform::identity(),
            axis: Vector3::z_axis(),
            limits: PositionLimits::new(-1.0, 1.0),
        }
    }

    fn links(names: &[&str]) -> Vec<Link> {
        names.iter().map(|n| Link::new(*n)).collect()
    }

    #[test]
    fn test_branching_tree_orders_parents_first() {
        let model = KinematicModel::new(
            "torso",
            links(&["root_link", "torso", "l_arm", "r_arm", "l_hand"]),
            vec![
                def("l_wrist", "l_arm", "l_hand"),
                def("torso_yaw", "root_link", "torso"),
                def("l_shoulder", "torso", "l_arm"),
                def("r_shoulder", "torso", "r_arm"),
            ],
        )
        .unwrap();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        assert_eq!(traversal.joint_order().len(), 4);
        assert_eq!(traversal.link_order()[0], 0);

        let position = |name: &str| {
            let j = model.joint_by_name(name).unwrap();
            traversal.joint_order().iter().position(|&o| o == j).unwrap()
        };
        assert!(position("torso_yaw") < position("l_shoulder"));
        assert!(position("l_shoulder") < position("l_wrist"));

        let wrist = model.joint_by_name("l_wrist").unwrap();
        assert_eq!(model.link_name(traversal.parent_link_of(wrist)), "l_arm");
        assert_eq!(model.link_name(traversal.child_link_of(wrist)), "l_hand");
        assert_eq!(traversal.parent_joint_of(0), None);
    }

    #[test]
    fn test_traversal_from_non_description_root() {
        let model = KinematicModel::new(
            "chain",
            links(&["base", "root_link", "tip"]),
            vec![def("a", "base", "root_link"), def("b", "root_link", "tip")],
        )
        .unwrap();
        let traversal = Traversal::compute(&model, "root_link").unwrap();
        let a = model.joint_by_name("a").unwrap();
        assert_eq!(model.link_name(traversal.parent_link_of(a)), "root_link");
        assert_eq!(model.link_name(traversal.child_link_of(a)), "base");
        assert!(traversal.is_reversed(&model, a));
    }

    #[test]
    fn test_missing_root() {
        let model = KinematicModel::new("one", links(&["base"]), Vec::new()).unwrap();
        let result = Traversal::compute(&model, "root_link");
        assert!(matches!(result, Err(ModelError::MissingRoot(_))));
    }

    #[test]
    fn test_disconnected_model() {
        let model = KinematicModel::new(
            "split",
            links(&["root_link", "a", "island"]),
            vec![def("j", "root_link", "a")],
        )
        .unwrap();
        match Traversal::compute(&model, "root_link") {
            Err(ModelError::Disconnected { unreachable, .. }) => {
                assert_eq!(unreachable, vec!["island".to_string()]);
            }
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_is_detected() {
        let model = KinematicModel::new(
            "loop",
            links(&["root_link", "a", "b"]),
            vec![
                def("j1", "root_link", "a"),
                def("j2", "a", "b"),
                def("j3", "root_link", "b"),
            ],
        )
        .unwrap();
        let result = Traversal::compute(&model, "root_link");
        assert!(matches!(result, Err(ModelError::Cycle(_))));
    }
}
