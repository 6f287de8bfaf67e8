//! Placement of link visuals in the root frame.

use std::path::Path;

use kinematics::{Geometry, KinematicModel, LinkPoses, Visual};
use log::warn;
use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

use crate::skeleton::Rig;
use crate::warning::Warning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Stl,
    Ply,
    Dae,
}

impl MeshFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "stl" => Some(Self::Stl),
            "ply" => Some(Self::Ply),
            "dae" => Some(Self::Dae),
            _ => None,
        }
    }

    /// Scale applied on import; STL and PLY meshes are authored in millimetres
    /// while COLLADA carries its own units.
    pub const fn import_scale(self) -> f64 {
        match self {
            Self::Stl | Self::Ply => 0.001,
            Self::Dae => 1.0,
        }
    }
}

/// Reference to an externally imported mesh; the file is never read here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshHandle {
    pub filename: String,
    pub format: MeshFormat,
    /// Scale from the description times the format's import scale.
    pub scale: Vector3<f64>,
}

/// Shape to instantiate, one geometric parameter set each.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Sphere { radius: f64 },
    Cylinder { radius: f64, depth: f64 },
    Cube { size: f64 },
    Mesh(MeshHandle),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryPlacement {
    pub link: String,
    /// Position of the visual in the link's visual list.
    pub index: usize,
    /// Bone the geometry follows.
    pub bone: Option<String>,
    pub shape: Shape,
    /// Root frame position and orientation.
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub color: [f64; 4],
}

/// Map a visual descriptor to a shape, recording a warning when it has to
/// be approximated or cannot be represented.
pub fn shape_for(
    link: &str,
    index: usize,
    geometry: &Geometry,
    warnings: &mut Vec<Warning>,
) -> Option<Shape> {
    match geometry {
        Geometry::Sphere { radius } => Some(Shape::Sphere { radius: *radius }),
        Geometry::Cylinder { radius, length } => Some(Shape::Cylinder {
            radius: *radius,
            depth: *length,
        }),
        Geometry::Box { size } => {
            if size.x != size.y || size.x != size.z {
                let warning = Warning::NonUniformBox {
                    link: link.to_string(),
                    index,
                    size: [size.x, size.y, size.z],
                };
                warn!("{warning}");
                warnings.push(warning);
            }
            Some(Shape::Cube { size: size.x })
        }
        Geometry::Mesh { filename, scale } => match MeshFormat::from_path(filename) {
            Some(format) => Some(Shape::Mesh(MeshHandle {
                filename: filename.clone(),
                format,
                scale: *scale * format.import_scale(),
            })),
            None => {
                unsupported(link, index, format!("mesh {filename}"), warnings);
                None
            }
        },
        Geometry::Capsule { .. } => {
            unsupported(link, index, geometry.kind_name().to_string(), warnings);
            None
        }
    }
}

fn unsupported(link: &str, index: usize, shape: String, warnings: &mut Vec<Warning>) {
    let warning = Warning::UnsupportedShape {
        link: link.to_string(),
        index,
        shape,
    };
    warn!("{warning}");
    warnings.push(warning);
}

/// `root_H_geometry = root_H_link * link_H_geometry` for one visual.
pub fn place_visual(
    poses: &LinkPoses,
    link: usize,
    visual: &Visual,
) -> (Vector3<f64>, UnitQuaternion<f64>) {
    let root_h_geometry = poses.root_to(link) * visual.origin;
    let rotation = UnitQuaternion::new_normalize(root_h_geometry.rotation.into_inner());
    (root_h_geometry.translation.vector, rotation)
}

/// Place every visual of every link, binding each to the bone that moves
/// its link.
pub fn place_geometry(
    model: &KinematicModel,
    poses: &LinkPoses,
    rig: &Rig,
    warnings: &mut Vec<Warning>,
) -> Vec<GeometryPlacement> {
    let mut placements = Vec::new();
    for (l, link) in model.links().iter().enumerate() {
        for (index, visual) in link.visuals.iter().enumerate() {
            let Some(shape) = shape_for(&link.name, index, &visual.geometry, warnings) else {
                continue;
            };
            let (position, rotation) = place_visual(poses, l, visual);
            placements.push(GeometryPlacement {
                link: link.name.clone(),
                index,
                bone: rig.bone_for_link(&link.name).map(|b| b.name.clone()),
                shape,
                position,
                rotation,
                color: visual.color,
            });
        }
    }
    placements
}
