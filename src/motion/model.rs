// src/motion/model.rs - Joint limits, link geometry and live step state
use serde::{Deserialize, Serialize};

use super::stepper::StepDirection;
use super::JointAngles;

/// Which mechanical arm the firmware drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmVariant {
    /// Two-joint planar chain (shoulder, elbow).
    Planar,
    /// Base yaw joint in front of the planar chain.
    YawPlanar,
}

impl ArmVariant {
    pub fn joint_count(self) -> usize {
        match self {
            ArmVariant::Planar => 2,
            ArmVariant::YawPlanar => 3,
        }
    }

    /// Single-letter joint labels used on the wire.
    pub fn joint_letters(self) -> &'static [char] {
        match self {
            ArmVariant::Planar => &['a', 'b'],
            ArmVariant::YawPlanar => &['t', 'a', 'b'],
        }
    }
}

impl std::fmt::Display for ArmVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArmVariant::Planar => write!(f, "planar"),
            ArmVariant::YawPlanar => write!(f, "yaw_planar"),
        }
    }
}

/// Read-only kinematic limits of one joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointLimits {
    pub steps_per_revolution: u32,
    /// deg/s
    pub max_speed: f64,
    /// deg/s²
    pub acceleration: f64,
    pub direction_inverted: bool,
}

impl JointLimits {
    /// Angular size of one step in degrees.
    pub fn step_angle(&self) -> f64 {
        360.0 / self.steps_per_revolution as f64
    }
}

/// Link lengths of the planar chain (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmGeometry {
    pub upper_arm: f64,
    pub forearm: f64,
    pub base_yaw: bool,
}

impl ArmGeometry {
    pub fn links(&self) -> [f64; 2] {
        [self.upper_arm, self.forearm]
    }

    /// Farthest reachable radius from the shoulder.
    pub fn max_reach(&self) -> f64 {
        self.upper_arm + self.forearm
    }

    pub fn min_reach(&self) -> f64 {
        (self.upper_arm - self.forearm).abs()
    }
}

/// One stepper-driven joint. The step counter is the only position state;
/// the angle is always derived from it.
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub limits: JointLimits,
    step_count: i64,
}

impl Joint {
    pub fn new(name: impl Into<String>, limits: JointLimits) -> Self {
        Self {
            name: name.into(),
            limits,
            step_count: 0,
        }
    }

    pub fn step_count(&self) -> i64 {
        self.step_count
    }

    pub fn angle(&self) -> f64 {
        self.step_count as f64 * 360.0 / self.limits.steps_per_revolution as f64
    }

    /// Direction the driver pin must see for a logical step direction.
    pub fn hardware_direction(&self, direction: StepDirection) -> StepDirection {
        if self.limits.direction_inverted {
            direction.reversed()
        } else {
            direction
        }
    }

    pub(crate) fn record_step(&mut self, direction: StepDirection) {
        self.step_count += direction.sign();
    }
}

/// Aggregate of all joint state plus the arm's geometry.
///
/// Owned by the executor for the whole process lifetime; everything else
/// reads snapshots through [`ArmModel::angles`].
#[derive(Debug, Clone)]
pub struct ArmModel {
    variant: ArmVariant,
    geometry: ArmGeometry,
    joints: Vec<Joint>,
}

impl ArmModel {
    pub fn new(variant: ArmVariant, geometry: ArmGeometry, joints: Vec<Joint>) -> Self {
        Self {
            variant,
            geometry,
            joints,
        }
    }

    pub fn variant(&self) -> ArmVariant {
        self.variant
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn limits(&self) -> Vec<JointLimits> {
        self.joints.iter().map(|j| j.limits.clone()).collect()
    }

    pub fn angles(&self) -> JointAngles {
        self.joints.iter().map(Joint::angle).collect()
    }

    pub fn step_counts(&self) -> Vec<i64> {
        self.joints.iter().map(Joint::step_count).collect()
    }

    pub(crate) fn joint_mut(&mut self, index: usize) -> Option<&mut Joint> {
        self.joints.get_mut(index)
    }
}
