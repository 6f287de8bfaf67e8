use nalgebra::Isometry3;
use rs_opw_kinematics::kinematic_traits::Kinematics;
use rs_opw_kinematics::kinematics_impl::OPWKinematics;
use rs_opw_kinematics::parameters::opw_kinematics::Parameters;

use crate::model::PositionLimits;

/// Analytic inverse kinematics for six-axis arms with an orthogonal
/// parallel base and spherical wrist.
#[derive(Clone, Copy)]
pub struct OpwKinematicsSolver {
    parameters: Parameters,
}

impl OpwKinematicsSolver {
    pub fn new(c1: f64, c2: f64, c3: f64, c4: f64, a1: f64, a2: f64, b: f64) -> Self {
        let parameters = Parameters {
            c1, c2, c3, c4, a1, a2, b,
            offsets: [0.0; 6],
            sign_corrections: [1; 6],
            dof: 6,
        };
        Self { parameters }
    }

    pub fn inverse_kinematics(&self, pose: &Isometry3<f64>) -> Vec<[f64; 6]> {
        let solver = OPWKinematics::new(self.parameters);
        solver.inverse(pose)
    }

    pub fn forward_kinematics(&self, joints: &[f64; 6]) -> Isometry3<f64> {
        let solver = OPWKinematics::new(self.parameters);
        solver.forward(joints)
    }

    /// Solutions reaching `pose` with every joint inside its limits.
    pub fn inverse_kinematics_within(
        &self,
        pose: &Isometry3<f64>,
        limits: &[PositionLimits; 6],
    ) -> Vec<[f64; 6]> {
        self.inverse_kinematics(pose)
            .into_iter()
            .filter(|solution| {
                solution
                    .iter()
                    .zip(limits)
                    .all(|(value, limit)| value.is_finite() && limit.contains(*value))
            })
            .collect()
    }

    /// The admissible solution nearest to `current` in joint space.
    pub fn closest_solution(
        &self,
        pose: &Isometry3<f64>,
        current: &[f64; 6],
        limits: &[PositionLimits; 6],
    ) -> Option<[f64; 6]> {
        let distance = |solution: &[f64; 6]| -> f64 {
            solution
                .iter()
                .zip(current)
                .map(|(a, b)| (a - b) * (a - b))
                .sum()
        };
        self.inverse_kinematics_within(pose, limits)
            .into_iter()
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))
    }

    /// Verifies that the calculated joint angles result in the target pose
    /// using the transformation product T_{base}^{tip} = \prod_{i=1}^{6} A_{i}(\theta_i).
    /// This is effectively what forward_kinematics computes.
    pub fn verify_solution(&self, target_pose: &Isometry3<f64>, solution: &[f64; 6]) -> bool {
        let fk_pose = self.forward_kinematics(solution);
        let translation_diff = (target_pose.translation.vector - fk_pose.translation.vector).norm();
        let rotation_diff = target_pose.rotation.angle_to(&fk_pose.rotation);

        translation_diff < 1e-4 && rotation_diff < 1e-4
    }
}
