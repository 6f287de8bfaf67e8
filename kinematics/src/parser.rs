//! Robot-description loading using `urdf-rs`.
//!
//! Converts `urdf_rs` types into the crate's [`KinematicModel`].

use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;

use log::info;
use nalgebra::{Translation3, Unit, UnitQuaternion, Vector3};

use crate::error::ModelError;
use crate::model::{
    Geometry, JointDef, JointKind, KinematicModel, Link, PositionLimits, RigidTransform, Visual,
};

const DEFAULT_COLOR: [f64; 4] = [0.5, 0.5, 0.5, 1.0];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read and parse a robot-description file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<KinematicModel, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_string(&content).map_err(|e| e.with_path(path))
}

/// Parse robot-description XML.
pub fn parse_string(xml: &str) -> Result<KinematicModel, ModelError> {
    let robot = urdf_rs::read_from_string(xml).map_err(|e| ModelError::Parse(e.to_string()))?;
    let model = convert_robot(&robot)?;
    info!(
        "loaded robot {} with {} links and {} degrees of freedom",
        model.name(),
        model.links().len(),
        model.dofs()
    );
    Ok(model)
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn convert_robot(robot: &urdf_rs::Robot) -> Result<KinematicModel, ModelError> {
    let materials: HashMap<&str, [f64; 4]> = robot
        .materials
        .iter()
        .filter_map(|m| m.color.as_ref().map(|c| (m.name.as_str(), convert_color(c))))
        .collect();

    let links = robot
        .links
        .iter()
        .map(|l| convert_link(l, &materials))
        .collect();

    let joints = robot
        .joints
        .iter()
        .map(convert_joint)
        .collect::<Result<Vec<_>, _>>()?;

    KinematicModel::new(robot.name.clone(), links, joints)
}

fn convert_link(link: &urdf_rs::Link, materials: &HashMap<&str, [f64; 4]>) -> Link {
    Link {
        name: link.name.clone(),
        visuals: link
            .visual
            .iter()
            .map(|v| convert_visual(v, materials))
            .collect(),
    }
}

fn convert_visual(visual: &urdf_rs::Visual, materials: &HashMap<&str, [f64; 4]>) -> Visual {
    let material = visual.material.as_ref();
    let color = material
        .and_then(|m| {
            m.color
                .as_ref()
                .map(convert_color)
                .or_else(|| materials.get(m.name.as_str()).copied())
        })
        .unwrap_or(DEFAULT_COLOR);

    Visual {
        origin: convert_pose(&visual.origin),
        geometry: convert_geometry(&visual.geometry),
        material: material.map(|m| m.name.clone()).filter(|n| !n.is_empty()),
        color,
    }
}

fn convert_joint(joint: &urdf_rs::Joint) -> Result<JointDef, ModelError> {
    let (kind, limits) = match joint.joint_type {
        urdf_rs::JointType::Revolute => (
            JointKind::Revolute,
            PositionLimits::new(joint.limit.lower, joint.limit.upper),
        ),
        urdf_rs::JointType::Continuous => (JointKind::Revolute, PositionLimits::new(-PI, PI)),
        urdf_rs::JointType::Prismatic => (
            JointKind::Prismatic,
            PositionLimits::new(joint.limit.lower, joint.limit.upper),
        ),
        urdf_rs::JointType::Fixed => (JointKind::Fixed, PositionLimits::default()),
        ref other => {
            return Err(ModelError::UnsupportedJointType {
                joint: joint.name.clone(),
                kind: format!("{other:?}"),
            });
        }
    };

    let axis = Unit::try_new(vec3(&joint.axis.xyz), 1e-9).unwrap_or_else(Vector3::x_axis);

    Ok(JointDef {
        name: joint.name.clone(),
        kind,
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        origin: convert_pose(&joint.origin),
        axis,
        limits,
    })
}

fn convert_pose(pose: &urdf_rs::Pose) -> RigidTransform {
    let xyz = vec3(&pose.xyz);
    let rpy = vec3(&pose.rpy);
    RigidTransform::from_parts(
        Translation3::from(xyz),
        UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z),
    )
}

fn convert_geometry(geom: &urdf_rs::Geometry) -> Geometry {
    match geom {
        urdf_rs::Geometry::Sphere { radius } => Geometry::Sphere { radius: *radius },
        urdf_rs::Geometry::Box { size } => Geometry::Box { size: vec3(size) },
        urdf_rs::Geometry::Cylinder { radius, length } => Geometry::Cylinder {
            radius: *radius,
            length: *length,
        },
        urdf_rs::Geometry::Capsule { radius, length } => Geometry::Capsule {
            radius: *radius,
            length: *length,
        },
        urdf_rs::Geometry::Mesh { filename, scale } => Geometry::Mesh {
            filename: filename.clone(),
            scale: scale
                .as_ref()
                .map_or_else(|| Vector3::new(1.0, 1.0, 1.0), |s| vec3(s)),
        },
    }
}

fn convert_color(color: &urdf_rs::Color) -> [f64; 4] {
    [color.rgba[0], color.rgba[1], color.rgba[2], color.rgba[3]]
}

fn vec3(v: &[f64; 3]) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_URDF: &str = r#"
        <robot name="test_robot">
            <link name="root_link"/>
        </robot>
    "#;

    const ARM_URDF: &str = r#"
        <robot name="arm">
            <material name="blue">
                <color rgba="0 0 1 1"/>
            </material>
            <link name="root_link">
                <visual>
                    <geometry>
                        <cylinder radius="0.05" length="0.5"/>
                    </geometry>
                    <material name="blue"/>
                </visual>
            </link>
            <link name="link1">
                <visual>
                    <origin xyz="0 0 0.1" rpy="0 0 0"/>
                    <geometry>
                        <mesh filename="package://arm/meshes/link1.stl" scale="0.001 0.001 0.001"/>
                    </geometry>
                    <material name="red">
                        <color rgba="1 0 0 1"/>
                    </material>
                </visual>
            </link>
            <link name="link2"/>
            <link name="link3"/>
            <joint name="shoulder" type="revolute">
                <parent link="root_link"/>
                <child link="link1"/>
                <origin xyz="0 0 0.5" rpy="0 0 0"/>
                <axis xyz="0 1 0"/>
                <limit lower="-1.57" upper="1.57" effort="100" velocity="5"/>
            </joint>
            <joint name="wrist" type="continuous">
                <parent link="link1"/>
                <child link="link2"/>
                <axis xyz="0 0 2"/>
            </joint>
            <joint name="slider" type="prismatic">
                <parent link="link2"/>
                <child link="link3"/>
                <axis xyz="1 0 0"/>
                <limit lower="0" upper="0.2" effort="10" velocity="1"/>
            </joint>
        </robot>
    "#;

    #[test]
    fn test_parse_minimal() {
        let model = parse_string(MINIMAL_URDF).unwrap();
        assert_eq!(model.name(), "test_robot");
        assert_eq!(model.links().len(), 1);
        assert!(model.joints().is_empty());
        assert_eq!(model.root_link(), "root_link");
    }

    #[test]
    fn test_joint_kinds_and_limits() {
        let model = parse_string(ARM_URDF).unwrap();
        assert_eq!(model.dofs(), 3);

        let shoulder = model.joint(model.joint_by_name("shoulder").unwrap());
        assert_eq!(shoulder.kind, JointKind::Revolute);
        assert!((shoulder.limits.min + 1.57).abs() < 1e-12);
        assert!((shoulder.limits.max - 1.57).abs() < 1e-12);
        assert!((shoulder.axis.y - 1.0).abs() < 1e-12);
        assert!((shoulder.origin.translation.vector.z - 0.5).abs() < 1e-12);

        let wrist = model.joint(model.joint_by_name("wrist").unwrap());
        assert_eq!(wrist.kind, JointKind::Revolute);
        assert!((wrist.limits.max - PI).abs() < 1e-12);
        assert!((wrist.axis.z - 1.0).abs() < 1e-12);

        let slider = model.joint(model.joint_by_name("slider").unwrap());
        assert_eq!(slider.kind, JointKind::Prismatic);
        assert!((slider.limits.max - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_visuals_and_colors() {
        let model = parse_string(ARM_URDF).unwrap();

        let root = model.link(model.link_by_name("root_link").unwrap());
        assert_eq!(root.visuals.len(), 1);
        assert_eq!(root.visuals[0].color, [0.0, 0.0, 1.0, 1.0]);
        assert!(matches!(root.visuals[0].geometry, Geometry::Cylinder { .. }));

        let link1 = model.link(model.link_by_name("link1").unwrap());
        assert_eq!(link1.visuals[0].color, [1.0, 0.0, 0.0, 1.0]);
        match &link1.visuals[0].geometry {
            Geometry::Mesh { filename, scale } => {
                assert!(filename.ends_with("link1.stl"));
                assert!((scale.x - 0.001).abs() < 1e-12);
            }
            other => panic!("expected Mesh, got {other:?}"),
        }
        assert!((link1.visuals[0].origin.translation.vector.z - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_unsupported_joint_type() {
        let xml = r#"
            <robot name="free">
                <link name="root_link"/>
                <link name="body"/>
                <joint name="float" type="floating">
                    <parent link="root_link"/>
                    <child link="body"/>
                </joint>
            </robot>
        "#;
        let result = parse_string(xml);
        assert!(matches!(result, Err(ModelError::UnsupportedJointType { .. })));
    }

    #[test]
    fn test_parse_invalid_xml() {
        assert!(parse_string("<not valid urdf>").is_err());
    }

    #[test]
    fn test_parse_file_not_found() {
        let result = parse_file("/nonexistent/robot.urdf");
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }
}
