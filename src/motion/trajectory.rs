// src/motion/trajectory.rs - Synchronized trapezoidal joint interpolation
use thiserror::Error;

use super::JointAngles;
use super::model::JointLimits;

/// Floating noise below this magnitude is treated as exactly zero.
const NUMERIC_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrajectoryError {
    #[error("Start has {start} joints, goal has {goal}, limits cover {limits}")]
    LengthMismatch { start: usize, goal: usize, limits: usize },
    #[error("Joint {joint}: {what} must be positive and finite, got {value}")]
    InvalidLimit { joint: usize, what: &'static str, value: f64 },
    #[error("Joint {joint}: target angle {value} is not finite")]
    InvalidTarget { joint: usize, value: f64 },
}

/// Timing and boundary anchors of one joint inside a synchronized move.
#[derive(Debug, Clone, PartialEq)]
pub struct JointProfile {
    pub start_angle: f64,
    pub goal_angle: f64,
    /// +1.0 or -1.0
    pub sign: f64,
    pub acceleration: f64,
    pub peak_speed: f64,
    pub t_accel_end: f64,
    pub t_cruise_end: f64,
    pub t_stop: f64,
    pub angle_at_accel_end: f64,
    pub angle_at_cruise_end: f64,
}

impl JointProfile {
    /// Angle at time `t` seconds, held at the end of the move past `t_stop`.
    pub fn sample(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, self.t_stop);
        if t < self.t_accel_end {
            self.start_angle + self.sign * self.acceleration * t * t / 2.0
        } else if t < self.t_cruise_end {
            self.angle_at_accel_end + self.sign * self.peak_speed * (t - self.t_accel_end)
        } else {
            let dt = t - self.t_cruise_end;
            self.angle_at_cruise_end
                + self.sign * (self.peak_speed * dt - self.acceleration * dt * dt / 2.0)
        }
    }

    /// Signed velocity at time `t` (deg/s).
    pub fn velocity(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, self.t_stop);
        let speed = if t < self.t_accel_end {
            self.acceleration * t
        } else if t < self.t_cruise_end {
            self.peak_speed
        } else {
            (self.peak_speed - self.acceleration * (t - self.t_cruise_end)).max(0.0)
        };
        self.sign * speed
    }

    pub fn cruise_duration(&self) -> f64 {
        self.t_cruise_end - self.t_accel_end
    }

    pub fn is_triangular(&self) -> bool {
        self.cruise_duration() <= NUMERIC_EPSILON
    }
}

/// Per-joint profiles sharing one total duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPlan {
    pub joints: Vec<JointProfile>,
    pub total_duration: f64,
}

impl TrajectoryPlan {
    pub fn sample(&self, t: f64) -> JointAngles {
        self.joints.iter().map(|j| j.sample(t)).collect()
    }

    pub fn sample_joint(&self, joint: usize, t: f64) -> Option<f64> {
        self.joints.get(joint).map(|j| j.sample(t))
    }

    pub fn goal(&self) -> JointAngles {
        self.joints.iter().map(|j| j.goal_angle).collect()
    }
}

/// Shortest time a joint needs for `distance` under its own limits.
pub fn minimal_time(distance: f64, limits: &JointLimits) -> f64 {
    let v = limits.max_speed;
    let a = limits.acceleration;
    if distance < v * v / a {
        2.0 * (distance / a).sqrt()
    } else {
        distance / v + v / a
    }
}

/// Peak speed that covers `distance` in exactly `total` seconds with
/// symmetric ramps at `acceleration`. Smaller root of v² - aTv + ad = 0.
fn synchronized_peak_speed(distance: f64, acceleration: f64, total: f64) -> f64 {
    let at = acceleration * total;
    let mut discriminant = at * at - 4.0 * acceleration * distance;
    if discriminant < 0.0 {
        discriminant = 0.0;
    }
    (at - discriminant.sqrt()) / 2.0
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryPlanner;

impl TrajectoryPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plans a move where every joint arrives at the same time.
    pub fn plan(
        &self,
        start: &[f64],
        goal: &[f64],
        limits: &[JointLimits],
    ) -> Result<TrajectoryPlan, TrajectoryError> {
        if start.len() != goal.len() || goal.len() != limits.len() {
            return Err(TrajectoryError::LengthMismatch {
                start: start.len(),
                goal: goal.len(),
                limits: limits.len(),
            });
        }
        for (joint, (limit, target)) in limits.iter().zip(goal).enumerate() {
            check_positive(joint, "max speed", limit.max_speed)?;
            check_positive(joint, "acceleration", limit.acceleration)?;
            if !target.is_finite() {
                return Err(TrajectoryError::InvalidTarget { joint, value: *target });
            }
        }

        let distances: Vec<f64> = start.iter().zip(goal).map(|(s, g)| (g - s).abs()).collect();
        let total = distances
            .iter()
            .zip(limits)
            .map(|(d, l)| minimal_time(*d, l))
            .fold(0.0_f64, f64::max);

        let joints = start
            .iter()
            .zip(goal)
            .zip(distances.iter().zip(limits))
            .map(|((&start_angle, &goal_angle), (&distance, limit))| {
                let a = limit.acceleration;
                let sign = if goal_angle - start_angle >= 0.0 { 1.0 } else { -1.0 };

                let mut peak_speed = synchronized_peak_speed(distance, a, total);
                if -NUMERIC_EPSILON < peak_speed && peak_speed < 0.0 {
                    peak_speed = 0.0;
                }
                let t_accel = peak_speed / a;
                let mut t_cruise = total - 2.0 * t_accel;
                if -NUMERIC_EPSILON < t_cruise && t_cruise < 0.0 {
                    t_cruise = 0.0;
                }

                let angle_at_accel_end = start_angle + sign * peak_speed * peak_speed / (2.0 * a);
                JointProfile {
                    start_angle,
                    goal_angle,
                    sign,
                    acceleration: a,
                    peak_speed,
                    t_accel_end: t_accel,
                    t_cruise_end: t_accel + t_cruise,
                    t_stop: total,
                    angle_at_accel_end,
                    angle_at_cruise_end: angle_at_accel_end + sign * peak_speed * t_cruise,
                }
            })
            .collect();

        tracing::debug!("Planned synchronized move of {:.4}s across {} joints", total, limits.len());

        Ok(TrajectoryPlan {
            joints,
            total_duration: total,
        })
    }
}

fn check_positive(joint: usize, what: &'static str, value: f64) -> Result<(), TrajectoryError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TrajectoryError::InvalidLimit { joint, what, value })
    }
}
