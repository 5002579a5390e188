// src/motion/mod.rs - Motion core: model, kinematics, planning, paths, execution

pub mod executor;
pub mod kinematics;
pub mod model;
pub mod path;
pub mod stepper;
pub mod trajectory;

pub use executor::{ExecutorStats, MotionEvent, MotionExecutor, MotionState, PathSettings};
pub use kinematics::{Kinematics, KinematicsError, create_kinematics};
pub use model::{ArmGeometry, ArmModel, ArmVariant, Joint, JointLimits};
pub use path::{ActivePath, CirclePath, LinePath, smoothstep};
pub use stepper::{ActuatorError, ActuatorPort, RecordingActuator, StepCommand, StepDirection};
pub use trajectory::{JointProfile, TrajectoryError, TrajectoryPlan, TrajectoryPlanner};

use thiserror::Error;

/// Joint-space vector in degrees, one entry per joint.
pub type JointAngles = Vec<f64>;

/// End-effector position `[x, y, z]` in mm.
pub type Cartesian = [f64; 3];

/// A motion goal handed to the executor by the command collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionRequest {
    InterpolateToJoint(JointAngles),
    InterpolateToCartesian(Cartesian),
    LineTo(Cartesian),
    CircleAt { radius: f64, center_x: f64, center_z: f64 },
}

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),
    #[error("Trajectory planning failed: {0}")]
    Trajectory(#[from] TrajectoryError),
    #[error("Actuator failure: {0}")]
    Actuator(#[from] ActuatorError),
    #[error("Invalid motion request: {0}")]
    InvalidRequest(String),
}
