// src/motion/kinematics.rs - Joint space <-> cartesian space for the arm variants
use std::f64::consts::{FRAC_PI_2, PI};

use thiserror::Error;

use super::model::{ArmGeometry, ArmVariant};
use super::{Cartesian, JointAngles};

/// Slack allowed on law-of-cosines arguments before they count as out of range.
const ACOS_TOLERANCE: f64 = 1e-9;
/// Largest |y| a planar arm accepts as lying in its plane.
const PLANE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("Target ({x:.2}, {y:.2}, {z:.2}) is outside the reachable workspace")]
    Unreachable { x: f64, y: f64, z: f64 },
    #[error("Planar arm cannot reach y = {y:.3}, only points in its plane")]
    OutOfPlane { y: f64 },
    #[error("Expected {expected} joint angles, got {got}")]
    JointCountMismatch { expected: usize, got: usize },
}

/// Kinematics handler for one arm geometry. Angles are degrees, lengths mm.
pub trait Kinematics: Send + Sync + std::fmt::Debug {
    fn joint_count(&self) -> usize;

    /// Inverse kinematics.
    fn cartesian_to_joints(&self, cartesian: &Cartesian) -> Result<JointAngles, KinematicsError>;

    /// Forward kinematics.
    fn joints_to_cartesian(&self, joints: &[f64]) -> Result<Cartesian, KinematicsError>;

    fn is_valid_position(&self, cartesian: &Cartesian) -> bool {
        self.cartesian_to_joints(cartesian).is_ok()
    }
}

fn checked_acos(cosine: f64) -> Option<f64> {
    if !cosine.is_finite() || cosine.abs() > 1.0 + ACOS_TOLERANCE {
        return None;
    }
    Some(cosine.clamp(-1.0, 1.0).acos())
}

/// Solves the two-link chain for a point in its own plane.
///
/// `radial` is the horizontal distance from the shoulder, `z` the height.
/// Returns `[alpha, beta]` in degrees.
fn solve_planar(links: [f64; 2], radial: f64, z: f64) -> Option<[f64; 2]> {
    let [l1, l2] = links;
    let r = (radial * radial + z * z).sqrt();
    if r == 0.0 {
        return None;
    }
    let elbow = checked_acos((-l2 * l2 + l1 * l1 + r * r) / (2.0 * l1 * r))?;
    let shoulder = checked_acos((l1 * l1 + l2 * l2 - r * r) / (2.0 * l1 * l2))?;
    let atn = z.atan2(radial);

    Some([
        (PI - elbow - shoulder - atn).to_degrees(),
        (FRAC_PI_2 - elbow - atn).to_degrees(),
    ])
}

/// Composes both link vectors; returns `(radial, z)`.
fn compose_planar(links: [f64; 2], alpha: f64, beta: f64) -> (f64, f64) {
    let [l1, l2] = links;
    let q1 = FRAC_PI_2 - beta.to_radians();
    let q2 = -alpha.to_radians();
    (
        l1 * q1.cos() + l2 * q2.cos(),
        l1 * q1.sin() + l2 * q2.sin(),
    )
}

fn expect_joints(joints: &[f64], expected: usize) -> Result<(), KinematicsError> {
    if joints.len() != expected {
        return Err(KinematicsError::JointCountMismatch {
            expected,
            got: joints.len(),
        });
    }
    Ok(())
}

/// Two-joint arm working in the x/z plane.
#[derive(Debug, Clone)]
pub struct PlanarKinematics {
    links: [f64; 2],
}

impl PlanarKinematics {
    pub fn new(upper_arm: f64, forearm: f64) -> Self {
        Self {
            links: [upper_arm, forearm],
        }
    }
}

impl Kinematics for PlanarKinematics {
    fn joint_count(&self) -> usize {
        2
    }

    fn cartesian_to_joints(&self, cartesian: &Cartesian) -> Result<JointAngles, KinematicsError> {
        let [x, y, z] = *cartesian;
        if y.abs() > PLANE_TOLERANCE {
            return Err(KinematicsError::OutOfPlane { y });
        }
        solve_planar(self.links, x, z)
            .map(|angles| angles.to_vec())
            .ok_or(KinematicsError::Unreachable { x, y, z })
    }

    fn joints_to_cartesian(&self, joints: &[f64]) -> Result<Cartesian, KinematicsError> {
        expect_joints(joints, 2)?;
        let (x, z) = compose_planar(self.links, joints[0], joints[1]);
        Ok([x, 0.0, z])
    }
}

/// Three-joint arm: base yaw followed by the planar chain.
#[derive(Debug, Clone)]
pub struct YawPlanarKinematics {
    links: [f64; 2],
}

impl YawPlanarKinematics {
    pub fn new(upper_arm: f64, forearm: f64) -> Self {
        Self {
            links: [upper_arm, forearm],
        }
    }

    /// Base yaw in radians. Straight along ±y when x is exactly zero.
    fn base_yaw(x: f64, y: f64) -> f64 {
        if x != 0.0 {
            y.atan2(x)
        } else if y > 0.0 {
            FRAC_PI_2
        } else {
            -FRAC_PI_2
        }
    }
}

impl Kinematics for YawPlanarKinematics {
    fn joint_count(&self) -> usize {
        3
    }

    fn cartesian_to_joints(&self, cartesian: &Cartesian) -> Result<JointAngles, KinematicsError> {
        let [x, y, z] = *cartesian;
        let theta = Self::base_yaw(x, y);
        let radial = (x * x + y * y).sqrt();
        let [alpha, beta] =
            solve_planar(self.links, radial, z).ok_or(KinematicsError::Unreachable { x, y, z })?;
        Ok(vec![theta.to_degrees(), alpha, beta])
    }

    fn joints_to_cartesian(&self, joints: &[f64]) -> Result<Cartesian, KinematicsError> {
        expect_joints(joints, 3)?;
        let theta = joints[0].to_radians();
        let (radial, z) = compose_planar(self.links, joints[1], joints[2]);
        Ok([radial * theta.cos(), radial * theta.sin(), z])
    }
}

/// Factory for creating kinematics handlers
pub fn create_kinematics(variant: ArmVariant, geometry: &ArmGeometry) -> Box<dyn Kinematics> {
    match variant {
        ArmVariant::Planar => Box::new(PlanarKinematics::new(geometry.upper_arm, geometry.forearm)),
        ArmVariant::YawPlanar => {
            Box::new(YawPlanarKinematics::new(geometry.upper_arm, geometry.forearm))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn home_pose_is_forearm_out_upper_arm_up() {
        let kin = YawPlanarKinematics::new(250.0, 200.0);
        let pose = kin.joints_to_cartesian(&[0.0, 0.0, 0.0]).unwrap();
        assert!(close(pose[0], 200.0) && close(pose[1], 0.0) && close(pose[2], 250.0));

        let joints = kin.cartesian_to_joints(&[200.0, 0.0, 250.0]).unwrap();
        for angle in joints {
            assert!(angle.abs() < 1e-6, "expected home angles, got {angle}");
        }
    }

    #[test]
    fn base_yaw_on_the_y_axis() {
        let kin = YawPlanarKinematics::new(250.0, 200.0);
        let up = kin.cartesian_to_joints(&[0.0, 200.0, 250.0]).unwrap();
        assert!(close(up[0], 90.0));
        let down = kin.cartesian_to_joints(&[0.0, -200.0, 250.0]).unwrap();
        assert!(close(down[0], -90.0));
    }

    #[test]
    fn acos_tolerance_only_absorbs_noise() {
        assert_eq!(checked_acos(1.0 + 1e-12), Some(0.0));
        assert!(checked_acos(1.0 + 1e-6).is_none());
        assert!(checked_acos(f64::NAN).is_none());
    }

    #[test]
    fn planar_rejects_points_off_its_plane() {
        let kin = PlanarKinematics::new(250.0, 200.0);
        assert_eq!(
            kin.cartesian_to_joints(&[200.0, 5.0, 250.0]),
            Err(KinematicsError::OutOfPlane { y: 5.0 })
        );
    }

    #[test]
    fn shoulder_origin_is_unreachable() {
        let kin = PlanarKinematics::new(250.0, 200.0);
        assert!(matches!(
            kin.cartesian_to_joints(&[0.0, 0.0, 0.0]),
            Err(KinematicsError::Unreachable { .. })
        ));
    }
}
