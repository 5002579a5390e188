//! Firmware core of a stepper-driven robotic arm.
//!
//! Motion goals (joint angles or cartesian points) become synchronized
//! joint trajectories or eased cartesian paths, which a fixed-cadence
//! executor turns into individual step pulses. Position is tracked purely
//! by counting the steps it emitted.

pub mod command;
pub mod communication;
pub mod config;
pub mod feedback;
pub mod host;
pub mod motion;
pub mod scheduler;

pub use command::{Command, CommandError, CommandParser};
pub use config::{Config, ConfigError, load_config};
pub use feedback::{FeedbackReporter, TelemetrySample};
pub use host::{ArmHost, HostOutput};
pub use motion::{
    ActivePath, ArmModel, ArmVariant, MotionError, MotionEvent, MotionExecutor, MotionRequest,
    MotionState,
};
pub use scheduler::{SimTime, StdTime, TimeInterface};
