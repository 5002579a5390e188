//! Scenario files: which arm to simulate and what to type into it, when.

use serde::Deserialize;
use stepper_arm::motion::ArmVariant;
use stepper_arm::{Config, ConfigError, load_config};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub arm: ScenarioArm,
    /// Hard stop for the simulation clock.
    pub duration_ms: u64,
    /// End as soon as every command ran and the arm is idle again.
    #[serde(default = "default_true")]
    pub stop_when_idle: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub commands: Vec<ScheduledLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioArm {
    /// Arm configuration file. Takes precedence over `variant`.
    pub config: Option<String>,
    pub variant: Option<ArmVariant>,
}

/// One operator line delivered at `at_ms` into the run.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledLine {
    pub at_ms: u64,
    pub command: String,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }

    pub fn arm_config(&self) -> Result<Config, ConfigError> {
        match &self.arm.config {
            Some(path) => load_config(path),
            None => Ok(Config::preset(self.arm.variant.unwrap_or(ArmVariant::YawPlanar))),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    "sim_out".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_defaults() {
        let scenario = Scenario::from_toml_str(
            r#"
duration_ms = 1500

[arm]
variant = "planar"

[[commands]]
at_ms = 0
command = "ia30b10"

[[commands]]
at_ms = 400
command = "d"
"#,
        )
        .unwrap();
        assert_eq!(scenario.duration_ms, 1500);
        assert!(scenario.stop_when_idle);
        assert_eq!(scenario.output_dir, "sim_out");
        assert_eq!(scenario.commands.len(), 2);
        assert_eq!(scenario.commands[1].command, "d");
        assert_eq!(scenario.arm_config().unwrap().variant(), ArmVariant::Planar);
    }

    #[test]
    fn duration_is_required() {
        assert!(Scenario::from_toml_str("[arm]\nvariant = \"planar\"\n").is_err());
    }
}
