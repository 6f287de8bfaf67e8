//! In-memory kinematic model: links, joints and their visual descriptors.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;
use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::Serialize;

use crate::error::ModelError;
use crate::transform::LinkPoses;
use crate::traversal::Traversal;

pub type LinkIndex = usize;
pub type JointIndex = usize;

/// Position plus orientation; composes by multiplication.
pub type RigidTransform = Isometry3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JointKind {
    Revolute,
    Prismatic,
    Fixed,
}

impl JointKind {
    pub const fn is_movable(self) -> bool {
        !matches!(self, Self::Fixed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "REVOLUTE",
            Self::Prismatic => "PRISMATIC",
            Self::Fixed => "FIXED",
        }
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position limits in radians (revolute) or meters (prismatic).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PositionLimits {
    pub min: f64,
    pub max: f64,
}

impl PositionLimits {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Visual geometry as described in the robot description.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere { radius: f64 },
    Cylinder { radius: f64, length: f64 },
    Box { size: Vector3<f64> },
    Capsule { radius: f64, length: f64 },
    Mesh { filename: String, scale: Vector3<f64> },
}

impl Geometry {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Cylinder { .. } => "cylinder",
            Self::Box { .. } => "box",
            Self::Capsule { .. } => "capsule",
            Self::Mesh { .. } => "mesh",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    /// Link frame to geometry frame.
    pub origin: RigidTransform,
    pub geometry: Geometry,
    pub material: Option<String>,
    /// RGBA in `[0, 1]`.
    pub color: [f64; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    pub visuals: Vec<Visual>,
}

impl Link {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visuals: Vec::new(),
        }
    }
}

/// A joint whose endpoints are still named rather than indexed.
#[derive(Debug, Clone)]
pub struct JointDef {
    pub name: String,
    pub kind: JointKind,
    pub parent: String,
    pub child: String,
    pub origin: RigidTransform,
    pub axis: Unit<Vector3<f64>>,
    pub limits: PositionLimits,
}

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
    pub parent: LinkIndex,
    pub child: LinkIndex,
    /// Parent link frame to child link frame at zero position.
    pub origin: RigidTransform,
    /// Motion axis expressed in the child link frame.
    pub axis: Unit<Vector3<f64>>,
    pub limits: PositionLimits,
}

impl Joint {
    /// Parent link frame to child link frame with the joint at `position`.
    pub fn transform(&self, position: f64) -> RigidTransform {
        match self.kind {
            JointKind::Revolute => {
                self.origin * UnitQuaternion::from_axis_angle(&self.axis, position)
            }
            JointKind::Prismatic => {
                self.origin * Translation3::from(self.axis.into_inner() * position)
            }
            JointKind::Fixed => self.origin,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KinematicModel {
    name: String,
    links: Vec<Link>,
    joints: Vec<Joint>,
    root_link: LinkIndex,
    link_index: HashMap<String, LinkIndex>,
    joint_index: HashMap<String, JointIndex>,
}

impl KinematicModel {
    /// Build a model, resolving joint endpoints by link name.
    pub fn new(
        name: impl Into<String>,
        links: Vec<Link>,
        joints: Vec<JointDef>,
    ) -> Result<Self, ModelError> {
        let mut link_index = HashMap::with_capacity(links.len());
        for (i, link) in links.iter().enumerate() {
            if link_index.insert(link.name.clone(), i).is_some() {
                return Err(ModelError::DuplicateLink(link.name.clone()));
            }
        }

        let mut joint_index = HashMap::with_capacity(joints.len());
        let mut resolved = Vec::with_capacity(joints.len());
        for def in joints {
            let lookup = |link: &str| {
                link_index
                    .get(link)
                    .copied()
                    .ok_or_else(|| ModelError::UndefinedLink {
                        joint: def.name.clone(),
                        link: link.to_string(),
                    })
            };
            let parent = lookup(&def.parent)?;
            let child = lookup(&def.child)?;
            if joint_index.insert(def.name.clone(), resolved.len()).is_some() {
                return Err(ModelError::DuplicateJoint(def.name));
            }
            resolved.push(Joint {
                name: def.name,
                kind: def.kind,
                parent,
                child,
                origin: def.origin,
                axis: def.axis,
                limits: def.limits,
            });
        }

        // Root link = the first link that is never a child of any joint.
        let child_links: HashSet<LinkIndex> = resolved.iter().map(|j| j.child).collect();
        let root_link = (0..links.len())
            .find(|i| !child_links.contains(i))
            .ok_or(ModelError::NoRootLink)?;

        Ok(Self {
            name: name.into(),
            links,
            joints: resolved,
            root_link,
            link_index,
            joint_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn link(&self, index: LinkIndex) -> &Link {
        &self.links[index]
    }

    pub fn joint(&self, index: JointIndex) -> &Joint {
        &self.joints[index]
    }

    pub fn link_name(&self, index: LinkIndex) -> &str {
        &self.links[index].name
    }

    pub fn link_by_name(&self, name: &str) -> Option<LinkIndex> {
        self.link_index.get(name).copied()
    }

    pub fn joint_by_name(&self, name: &str) -> Option<JointIndex> {
        self.joint_index.get(name).copied()
    }

    /// The link that is never a child in the description.
    pub fn root_link(&self) -> &str {
        &self.links[self.root_link].name
    }

    /// Number of non-fixed joints.
    pub fn dofs(&self) -> usize {
        self.joints.iter().filter(|j| j.kind.is_movable()).count()
    }

    /// Root-to-link transforms for every link at the joint positions `q`,
    /// indexed by joint; missing entries count as zero.
    pub fn link_poses(&self, traversal: &Traversal, q: &[f64]) -> LinkPoses {
        LinkPoses::compute(self, traversal, q)
    }

    /// Transform from link `from` to link `to` at the joint positions `q`.
    pub fn relative_transform(
        &self,
        from: &str,
        to: &str,
        q: &[f64],
    ) -> Result<RigidTransform, ModelError> {
        let traversal = Traversal::compute(self, from)?;
        let target = self
            .link_by_name(to)
            .ok_or_else(|| ModelError::MissingLink(to.to_string()))?;
        Ok(*self.link_poses(&traversal, q).root_to(target))
    }

    /// Copy of the model with the named joints removed.
    ///
    /// The child link of every removed joint is lumped into its parent:
    /// visuals are re-expressed in the parent frame and outgoing joints are
    /// re-parented with composed origins. Returns the reduced model and the
    /// skip-list entries that name no joint of this model.
    pub fn reduced(&self, skip: &[String]) -> Result<(Self, Vec<String>), ModelError> {
        let mut unknown = Vec::new();
        let mut skipped_parent: HashMap<LinkIndex, JointIndex> = HashMap::new();
        for name in skip {
            match self.joint_by_name(name) {
                Some(j) => {
                    skipped_parent.insert(self.joints[j].child, j);
                }
                None => unknown.push(name.clone()),
            }
        }
        if skipped_parent.is_empty() {
            return Ok((self.clone(), unknown));
        }

        let lumped: Vec<(LinkIndex, RigidTransform)> = (0..self.links.len())
            .map(|link| self.lump(link, &skipped_parent))
            .collect::<Result<_, _>>()?;

        let mut links: Vec<Link> = Vec::new();
        let mut kept: HashMap<LinkIndex, usize> = HashMap::new();
        for (i, link) in self.links.iter().enumerate() {
            if lumped[i].0 == i {
                kept.insert(i, links.len());
                links.push(link.clone());
            }
        }
        for (i, link) in self.links.iter().enumerate() {
            let (target, target_h_link) = lumped[i];
            if target == i {
                continue;
            }
            debug!("lumping link {} into {}", link.name, self.links[target].name);
            let slot = kept[&target];
            links[slot]
                .visuals
                .extend(link.visuals.iter().map(|visual| Visual {
                    origin: target_h_link * visual.origin,
                    ..visual.clone()
                }));
        }

        let joints = self
            .joints
            .iter()
            .enumerate()
            .filter(|(j, joint)| skipped_parent.get(&joint.child) != Some(j))
            .map(|(_, joint)| {
                let (parent, parent_h_old) = lumped[joint.parent];
                let (child, child_h_old) = lumped[joint.child];
                JointDef {
                    name: joint.name.clone(),
                    kind: joint.kind,
                    parent: self.links[parent].name.clone(),
                    child: self.links[child].name.clone(),
                    origin: parent_h_old * joint.origin * child_h_old.inverse(),
                    axis: joint.axis,
                    limits: joint.limits,
                }
            })
            .collect();

        Ok((Self::new(self.name.clone(), links, joints)?, unknown))
    }

    /// Follow removed joints upwards from `link`; returns the surviving link
    /// and the transform from it to `link`.
    fn lump(
        &self,
        link: LinkIndex,
        skipped_parent: &HashMap<LinkIndex, JointIndex>,
    ) -> Result<(LinkIndex, RigidTransform), ModelError> {
        let mut current = link;
        let mut transform = RigidTransform::identity();
        for _ in 0..=self.joints.len() {
            match skipped_parent.get(&current) {
                Some(&j) => {
                    transform = self.joints[j].origin * transform;
                    current = self.joints[j].parent;
                }
                None => return Ok((current, transform)),
            }
        }
        Err(ModelError::Cycle(self.links[link].name.clone()))
    }
}
