//! Arm configuration: geometry, per-joint limits, timing and path speeds.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [arm]
//! name = "MiniArm"
//! variant = "planar"
//!
//! [geometry]
//! upper_arm = 250.0
//! forearm = 200.0
//!
//! [[joints]]
//! name = "alpha"
//! steps_per_revolution = 1600
//! max_speed = 40.0
//! acceleration = 100.0
//! invert_direction = true
//!
//! [[joints]]
//! name = "beta"
//! steps_per_revolution = 1600
//! max_speed = 40.0
//! acceleration = 100.0
//!
//! [paths]
//! line_speed = 30.0
//! ```
//!
//! Omitted sections fall back to the defaults of the selected variant; an
//! omitted `[[joints]]` list takes the variant's preset joints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::motion::executor::{DEFAULT_POLL_INTERVAL_US, PathSettings};
use crate::motion::model::{ArmGeometry, ArmModel, ArmVariant, Joint, JointLimits};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub arm: ArmConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub joints: Vec<JointConfig>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(ArmVariant::YawPlanar)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArmConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_variant")]
    pub variant: ArmVariant,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            name: None,
            variant: default_variant(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeometryConfig {
    #[serde(default = "default_upper_arm")]
    pub upper_arm: f64,
    #[serde(default = "default_forearm")]
    pub forearm: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            upper_arm: default_upper_arm(),
            forearm: default_forearm(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JointConfig {
    pub name: String,
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u32,
    pub max_speed: f64,
    pub acceleration: f64,
    #[serde(default)]
    pub invert_direction: bool,
}

impl JointConfig {
    fn new(name: &str, max_speed: f64, acceleration: f64, invert_direction: bool) -> Self {
        Self {
            name: name.to_string(),
            steps_per_revolution: default_steps_per_revolution(),
            max_speed,
            acceleration,
            invert_direction,
        }
    }

    pub fn limits(&self) -> JointLimits {
        JointLimits {
            steps_per_revolution: self.steps_per_revolution,
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            direction_inverted: self.invert_direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval_us")]
    pub poll_interval_us: u64,
    #[serde(default = "default_pulse_width_us")]
    pub pulse_width_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: default_poll_interval_us(),
            pulse_width_us: default_pulse_width_us(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_line_speed")]
    pub line_speed: f64,
    #[serde(default = "default_approach_speed")]
    pub approach_speed: f64,
    #[serde(default = "default_circle_speed")]
    pub circle_speed: f64,
    #[serde(default)]
    pub circle_plane_y: f64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            line_speed: default_line_speed(),
            approach_speed: default_approach_speed(),
            circle_speed: default_circle_speed(),
            circle_plane_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub include_time: bool,
    #[serde(default = "default_feedback_interval_us")]
    pub interval_us: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_time: true,
            interval_us: default_feedback_interval_us(),
        }
    }
}

impl Config {
    /// Stock configuration of either arm.
    pub fn preset(variant: ArmVariant) -> Self {
        let (name, joints) = match variant {
            ArmVariant::Planar => ("MiniArm", preset_joints(variant)),
            ArmVariant::YawPlanar => ("RoboticArm", preset_joints(variant)),
        };
        Self {
            arm: ArmConfig {
                name: Some(name.to_string()),
                variant,
            },
            geometry: GeometryConfig::default(),
            joints,
            timing: TimingConfig::default(),
            paths: PathsConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }

    /// Parses TOML, filling the joint list from the variant preset when absent.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        if config.joints.is_empty() {
            config.joints = preset_joints(config.arm.variant);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let variant = self.arm.variant;
        if self.joints.len() != variant.joint_count() {
            return Err(ConfigError::Invalid(format!(
                "{} arm needs {} joints, {} configured",
                variant,
                variant.joint_count(),
                self.joints.len()
            )));
        }
        for joint in &self.joints {
            if joint.steps_per_revolution == 0 {
                return Err(ConfigError::Invalid(format!(
                    "joint '{}': steps_per_revolution must be > 0",
                    joint.name
                )));
            }
            positive(&format!("joint '{}' max_speed", joint.name), joint.max_speed)?;
            positive(&format!("joint '{}' acceleration", joint.name), joint.acceleration)?;
        }
        positive("geometry.upper_arm", self.geometry.upper_arm)?;
        positive("geometry.forearm", self.geometry.forearm)?;
        positive("paths.line_speed", self.paths.line_speed)?;
        positive("paths.approach_speed", self.paths.approach_speed)?;
        positive("paths.circle_speed", self.paths.circle_speed)?;
        if variant == ArmVariant::Planar && self.paths.circle_plane_y != 0.0 {
            return Err(ConfigError::Invalid(
                "paths.circle_plane_y must be 0 for a planar arm".to_string(),
            ));
        }
        if self.timing.poll_interval_us == 0 {
            return Err(ConfigError::Invalid("timing.poll_interval_us must be > 0".to_string()));
        }
        if self.timing.pulse_width_us == 0 {
            return Err(ConfigError::Invalid("timing.pulse_width_us must be > 0".to_string()));
        }
        if self.feedback.interval_us == 0 {
            return Err(ConfigError::Invalid("feedback.interval_us must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn variant(&self) -> ArmVariant {
        self.arm.variant
    }

    pub fn geometry(&self) -> ArmGeometry {
        ArmGeometry {
            upper_arm: self.geometry.upper_arm,
            forearm: self.geometry.forearm,
            base_yaw: self.arm.variant == ArmVariant::YawPlanar,
        }
    }

    /// Fresh arm state with every step counter at zero.
    pub fn build_model(&self) -> ArmModel {
        let joints = self
            .joints
            .iter()
            .map(|j| Joint::new(j.name.clone(), j.limits()))
            .collect();
        ArmModel::new(self.arm.variant, self.geometry(), joints)
    }

    pub fn path_settings(&self) -> PathSettings {
        PathSettings {
            line_speed: self.paths.line_speed,
            approach_speed: self.paths.approach_speed,
            circle_speed: self.paths.circle_speed,
            circle_plane_y: self.paths.circle_plane_y,
        }
    }
}

fn preset_joints(variant: ArmVariant) -> Vec<JointConfig> {
    match variant {
        ArmVariant::Planar => vec![
            JointConfig::new("alpha", 40.0, 100.0, true),
            JointConfig::new("beta", 40.0, 100.0, false),
        ],
        ArmVariant::YawPlanar => vec![
            JointConfig::new("theta", 50.0, 20.0, true),
            JointConfig::new("alpha", 15.0, 10.0, false),
            JointConfig::new("beta", 15.0, 10.0, false),
        ],
    }
}

fn positive(what: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be > 0, got {}", what, value)))
    }
}

fn default_variant() -> ArmVariant { ArmVariant::YawPlanar }
fn default_upper_arm() -> f64 { 250.0 }
fn default_forearm() -> f64 { 200.0 }
fn default_steps_per_revolution() -> u32 { 8 * 200 }
fn default_poll_interval_us() -> u64 { DEFAULT_POLL_INTERVAL_US }
fn default_pulse_width_us() -> u32 { 4 }
fn default_line_speed() -> f64 { 50.0 }
fn default_approach_speed() -> f64 { 50.0 }
fn default_circle_speed() -> f64 { 150.0 }
fn default_feedback_interval_us() -> u64 { 50_000 }
fn default_true() -> bool { true }

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match Config::from_toml_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to load config '{}': {}", path, e);
                Err(e)
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}
