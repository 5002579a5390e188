// src/motion/path.rs - Cartesian path samplers and the active path variant
use std::f64::consts::TAU;

use super::kinematics::{Kinematics, KinematicsError};
use super::trajectory::TrajectoryPlan;
use super::{Cartesian, JointAngles};

/// Cubic ease fraction in `[0, 1]`; zero slope at both ends.
pub fn ease_fraction(t: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    let s = (t / duration).clamp(0.0, 1.0);
    s * s * (3.0 - 2.0 * s)
}

/// Smoothstep rescaled to the path's own time axis: maps `[0, d]` onto `[0, d]`.
pub fn smoothstep(t: f64, duration: f64) -> f64 {
    duration.max(0.0) * ease_fraction(t, duration)
}

/// Straight cartesian segment eased with smoothstep.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePath {
    pub start: Cartesian,
    pub goal: Cartesian,
    pub duration: f64,
}

impl LinePath {
    pub fn new(start: Cartesian, goal: Cartesian, duration: f64) -> Self {
        Self { start, goal, duration }
    }

    pub fn position_at(&self, t: f64) -> Cartesian {
        let fraction = ease_fraction(t, self.duration);
        let mut point = [0.0; 3];
        for (i, p) in point.iter_mut().enumerate() {
            *p = self.start[i] + fraction * (self.goal[i] - self.start[i]);
        }
        point
    }

    pub fn sample(&self, t: f64, kinematics: &dyn Kinematics) -> Result<JointAngles, KinematicsError> {
        kinematics.cartesian_to_joints(&self.position_at(t))
    }
}

/// Full circle in the x/z plane, preceded by a straight blend-in from the
/// pose the arm had when the path started.
#[derive(Debug, Clone, PartialEq)]
pub struct CirclePath {
    pub approach: LinePath,
    pub center_x: f64,
    pub center_z: f64,
    pub radius: f64,
    pub plane_y: f64,
    pub circle_duration: f64,
}

impl CirclePath {
    /// Point on the circumference where circular motion begins.
    pub fn entry_point(center_x: f64, center_z: f64, radius: f64, plane_y: f64) -> Cartesian {
        [center_x + radius, plane_y, center_z]
    }

    pub fn blend_duration(&self) -> f64 {
        self.approach.duration
    }

    pub fn duration(&self) -> f64 {
        self.approach.duration + self.circle_duration
    }

    pub fn position_at(&self, t: f64) -> Cartesian {
        let blend = self.blend_duration();
        if t < blend {
            return self.approach.position_at(t);
        }
        let phase = TAU * ease_fraction(t - blend, self.circle_duration);
        [
            self.center_x + self.radius * phase.cos(),
            self.plane_y,
            self.center_z + self.radius * phase.sin(),
        ]
    }

    pub fn sample(&self, t: f64, kinematics: &dyn Kinematics) -> Result<JointAngles, KinematicsError> {
        kinematics.cartesian_to_joints(&self.position_at(t))
    }
}

/// The one path the executor is following. Replaced wholesale on every new request.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivePath {
    JointInterpolation(TrajectoryPlan),
    Line(LinePath),
    Circle(CirclePath),
}

impl ActivePath {
    pub fn duration(&self) -> f64 {
        match self {
            ActivePath::JointInterpolation(plan) => plan.total_duration,
            ActivePath::Line(line) => line.duration,
            ActivePath::Circle(circle) => circle.duration(),
        }
    }

    /// Joint targets at `t` seconds after the path started.
    pub fn target_at(&self, t: f64, kinematics: &dyn Kinematics) -> Result<JointAngles, KinematicsError> {
        match self {
            ActivePath::JointInterpolation(plan) => Ok(plan.sample(t)),
            ActivePath::Line(line) => line.sample(t, kinematics),
            ActivePath::Circle(circle) => circle.sample(t, kinematics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_hits_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0, 2.0), 0.0);
        assert!((smoothstep(1.0, 2.0) - 1.0).abs() < 1e-12);
        assert!((smoothstep(2.0, 2.0) - 2.0).abs() < 1e-12);
        assert!((smoothstep(5.0, 2.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_duration_jumps_to_goal() {
        assert_eq!(ease_fraction(0.0, 0.0), 1.0);
        let line = LinePath::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], 0.0);
        assert_eq!(line.position_at(0.0), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn line_eases_in_and_out() {
        let line = LinePath::new([0.0, 0.0, 0.0], [100.0, 0.0, 0.0], 1.0);
        let dt = 1e-4;
        let v_start = (line.position_at(dt)[0] - line.position_at(0.0)[0]) / dt;
        let v_end = (line.position_at(1.0)[0] - line.position_at(1.0 - dt)[0]) / dt;
        let v_mid = (line.position_at(0.5 + dt)[0] - line.position_at(0.5)[0]) / dt;
        assert!(v_start < 0.1 && v_end < 0.1);
        assert!((v_mid - 150.0).abs() < 0.1);
    }

    #[test]
    fn circle_starts_at_entry_and_closes() {
        let entry = CirclePath::entry_point(250.0, 200.0, 50.0, 0.0);
        let circle = CirclePath {
            approach: LinePath::new([200.0, 0.0, 250.0], entry, 0.5),
            center_x: 250.0,
            center_z: 200.0,
            radius: 50.0,
            plane_y: 0.0,
            circle_duration: 2.0,
        };
        assert_eq!(circle.duration(), 2.5);
        assert_eq!(circle.position_at(0.0), [200.0, 0.0, 250.0]);
        let at_blend = circle.position_at(0.5);
        assert!((at_blend[0] - 300.0).abs() < 1e-9 && (at_blend[2] - 200.0).abs() < 1e-9);
        // eased halfway through the circle phase is the far side
        let half = circle.position_at(1.5);
        assert!((half[0] - 200.0).abs() < 1e-9 && (half[2] - 200.0).abs() < 1e-9);
        let end = circle.position_at(2.5);
        assert!((end[0] - 300.0).abs() < 1e-9 && (end[2] - 200.0).abs() < 1e-9);
    }
}
