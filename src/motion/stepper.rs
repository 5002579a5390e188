// src/motion/stepper.rs - Step pulses and the actuator boundary
use std::io::Write;

use thiserror::Error;

use crate::scheduler::time_interface::TimeInterface;

/// Logical rotation direction of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepDirection {
    Forward,
    Backward,
}

impl StepDirection {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            StepDirection::Forward
        } else {
            StepDirection::Backward
        }
    }

    pub fn sign(self) -> i64 {
        match self {
            StepDirection::Forward => 1,
            StepDirection::Backward => -1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            StepDirection::Forward => StepDirection::Backward,
            StepDirection::Backward => StepDirection::Forward,
        }
    }

    /// Level of the DIR pin.
    pub fn is_high(self) -> bool {
        matches!(self, StepDirection::Forward)
    }
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("No actuator wired for joint {0}")]
    InvalidJoint(usize),
    #[error("Step output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One emitted pulse, direction already adjusted for joint inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCommand {
    pub joint: usize,
    pub direction: StepDirection,
}

impl StepCommand {
    pub fn to_mcu_command(&self) -> String {
        format!("step {} {}", self.joint, if self.direction.is_high() { 1 } else { 0 })
    }
}

/// The only side-effecting primitive the motion core needs.
///
/// Implementations own the pulse timing; the core only assumes the call
/// returns after a bounded, non-zero pulse width.
pub trait ActuatorPort {
    fn pulse(&mut self, joint: usize, direction: StepDirection) -> Result<(), ActuatorError>;
}

impl<A: ActuatorPort + ?Sized> ActuatorPort for Box<A> {
    fn pulse(&mut self, joint: usize, direction: StepDirection) -> Result<(), ActuatorError> {
        (**self).pulse(joint, direction)
    }
}

/// Keeps every pulse in memory. Used by the simulator and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    joint_count: usize,
    commands: Vec<StepCommand>,
}

impl RecordingActuator {
    pub fn new(joint_count: usize) -> Self {
        Self {
            joint_count,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[StepCommand] {
        &self.commands
    }

    pub fn pulses_for(&self, joint: usize) -> usize {
        self.commands.iter().filter(|c| c.joint == joint).count()
    }

    /// Sum of signed hardware pulses for a joint.
    pub fn net_steps(&self, joint: usize) -> i64 {
        self.commands
            .iter()
            .filter(|c| c.joint == joint)
            .map(|c| c.direction.sign())
            .sum()
    }

    pub fn drain(&mut self) -> Vec<StepCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl ActuatorPort for RecordingActuator {
    fn pulse(&mut self, joint: usize, direction: StepDirection) -> Result<(), ActuatorError> {
        if joint >= self.joint_count {
            return Err(ActuatorError::InvalidJoint(joint));
        }
        self.commands.push(StepCommand { joint, direction });
        Ok(())
    }
}

/// Streams `step <joint> <dir>` lines to a downstream pulse generator,
/// holding each pulse for the configured width.
pub struct StepStreamActuator<W: Write, T: TimeInterface> {
    out: W,
    time: T,
    joint_count: usize,
    pulse_width_us: u32,
}

impl<W: Write, T: TimeInterface> StepStreamActuator<W, T> {
    pub fn new(out: W, time: T, joint_count: usize, pulse_width_us: u32) -> Self {
        Self {
            out,
            time,
            joint_count,
            pulse_width_us,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write, T: TimeInterface> ActuatorPort for StepStreamActuator<W, T> {
    fn pulse(&mut self, joint: usize, direction: StepDirection) -> Result<(), ActuatorError> {
        if joint >= self.joint_count {
            return Err(ActuatorError::InvalidJoint(joint));
        }
        let command = StepCommand { joint, direction };
        writeln!(self.out, "{}", command.to_mcu_command())?;
        self.time.delay_micros(self.pulse_width_us);
        self.out.flush()?;
        Ok(())
    }
}
