// src/motion/executor.rs - Fixed-cadence path follower emitting step pulses
use std::f64::consts::TAU;

use super::kinematics::{Kinematics, create_kinematics};
use super::model::ArmModel;
use super::path::{ActivePath, CirclePath, LinePath};
use super::stepper::{ActuatorPort, StepDirection};
use super::trajectory::TrajectoryPlanner;
use super::{Cartesian, JointAngles, MotionError, MotionRequest};

/// Default poll cadence; faster calls to `tick` are no-ops.
pub const DEFAULT_POLL_INTERVAL_US: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Interpolating,
    DrawingLine,
    DrawingCircle,
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MotionState::Idle => "idle",
            MotionState::Interpolating => "interpolating",
            MotionState::DrawingLine => "drawing line",
            MotionState::DrawingCircle => "drawing circle",
        };
        f.write_str(name)
    }
}

impl ActivePath {
    pub fn state(&self) -> MotionState {
        match self {
            ActivePath::JointInterpolation(_) => MotionState::Interpolating,
            ActivePath::Line(_) => MotionState::DrawingLine,
            ActivePath::Circle(_) => MotionState::DrawingCircle,
        }
    }
}

/// Speeds used to derive cartesian path durations.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSettings {
    /// Joint-space speed of straight lines (deg/s).
    pub line_speed: f64,
    /// Joint-space speed of the circle blend-in (deg/s).
    pub approach_speed: f64,
    /// Speed along the circumference (mm/s).
    pub circle_speed: f64,
    /// Height of the circle plane along y (mm).
    pub circle_plane_y: f64,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            line_speed: 50.0,
            approach_speed: 50.0,
            circle_speed: 150.0,
            circle_plane_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MotionEvent {
    Started {
        state: MotionState,
        from: JointAngles,
        to: JointAngles,
        duration: f64,
    },
    /// A running path was discarded in favour of a new request.
    Preempted { state: MotionState, elapsed: f64 },
    Completed { state: MotionState, angles: JointAngles },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorStats {
    pub ticks: u64,
    pub pulses: Vec<u64>,
    pub completed_paths: u64,
    pub preempted_paths: u64,
    pub skipped_ticks: u64,
}

#[derive(Debug)]
struct RunningPath {
    path: ActivePath,
    started_us: u64,
}

/// Owns the arm state and the single active path.
///
/// `tick` is meant to be called from the host loop as often as it likes;
/// work only happens once per poll interval and at most one pulse per joint
/// is emitted per evaluated tick.
pub struct MotionExecutor<A: ActuatorPort> {
    model: ArmModel,
    kinematics: Box<dyn Kinematics>,
    actuator: A,
    planner: TrajectoryPlanner,
    settings: PathSettings,
    poll_interval_us: u64,
    last_poll_us: Option<u64>,
    active: Option<RunningPath>,
    stats: ExecutorStats,
}

impl<A: ActuatorPort> MotionExecutor<A> {
    pub fn new(model: ArmModel, actuator: A, settings: PathSettings, poll_interval_us: u64) -> Self {
        let kinematics = create_kinematics(model.variant(), model.geometry());
        let stats = ExecutorStats {
            pulses: vec![0; model.joint_count()],
            ..ExecutorStats::default()
        };
        Self {
            model,
            kinematics,
            actuator,
            planner: TrajectoryPlanner::new(),
            settings,
            poll_interval_us,
            last_poll_us: None,
            active: None,
            stats,
        }
    }

    pub fn state(&self) -> MotionState {
        self.active
            .as_ref()
            .map_or(MotionState::Idle, |running| running.path.state())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn model(&self) -> &ArmModel {
        &self.model
    }

    pub fn kinematics(&self) -> &dyn Kinematics {
        self.kinematics.as_ref()
    }

    pub fn angles(&self) -> JointAngles {
        self.model.angles()
    }

    /// Cartesian pose reconstructed from the step counters.
    pub fn current_pose(&self) -> Result<Cartesian, MotionError> {
        Ok(self.kinematics.joints_to_cartesian(&self.model.angles())?)
    }

    pub fn active_path(&self) -> Option<&ActivePath> {
        self.active.as_ref().map(|running| &running.path)
    }

    /// Seconds since the active path started.
    pub fn elapsed(&self, now_us: u64) -> Option<f64> {
        self.active
            .as_ref()
            .map(|running| micros_to_secs(now_us.saturating_sub(running.started_us)))
    }

    pub fn stats(&self) -> &ExecutorStats {
        &self.stats
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn poll_interval_us(&self) -> u64 {
        self.poll_interval_us
    }

    /// Starts a new path, replacing whatever is running.
    ///
    /// On error nothing changes: an idle arm stays idle and an active path
    /// keeps running.
    pub fn start(&mut self, request: &MotionRequest, now_us: u64) -> Result<Vec<MotionEvent>, MotionError> {
        let from = self.model.angles();
        let (path, to) = match self.build_path(request, &from) {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!("Rejected {:?}: {}", request, e);
                return Err(e);
            }
        };

        let mut events = Vec::with_capacity(2);
        if let Some(event) = self.preempt(now_us) {
            events.push(event);
        }

        let state = path.state();
        let duration = path.duration();
        tracing::info!(
            "Moving from {} to {} in {:.4} seconds ({})",
            format_angles(&from),
            format_angles(&to),
            duration,
            state
        );
        self.active = Some(RunningPath { path, started_us: now_us });
        events.push(MotionEvent::Started { state, from, to, duration });
        Ok(events)
    }

    /// Discards the running path without ramping down.
    ///
    /// This is the single point where an in-flight path is abandoned, so a
    /// decelerating cancel would hook in here.
    fn preempt(&mut self, now_us: u64) -> Option<MotionEvent> {
        let running = self.active.take()?;
        let elapsed = micros_to_secs(now_us.saturating_sub(running.started_us));
        let state = running.path.state();
        self.stats.preempted_paths += 1;
        tracing::info!("Preempted {} after {:.3}s", state, elapsed);
        Some(MotionEvent::Preempted { state, elapsed })
    }

    fn build_path(
        &self,
        request: &MotionRequest,
        current: &[f64],
    ) -> Result<(ActivePath, JointAngles), MotionError> {
        match request {
            MotionRequest::InterpolateToJoint(goal) => {
                if goal.len() != self.model.joint_count() {
                    return Err(MotionError::InvalidRequest(format!(
                        "expected {} joint angles, got {}",
                        self.model.joint_count(),
                        goal.len()
                    )));
                }
                let plan = self.planner.plan(current, goal, &self.model.limits())?;
                Ok((ActivePath::JointInterpolation(plan), goal.clone()))
            }
            MotionRequest::InterpolateToCartesian(target) => {
                let goal = self.kinematics.cartesian_to_joints(target)?;
                let plan = self.planner.plan(current, &goal, &self.model.limits())?;
                Ok((ActivePath::JointInterpolation(plan), goal))
            }
            MotionRequest::LineTo(target) => {
                let goal = self.kinematics.cartesian_to_joints(target)?;
                let start = self.kinematics.joints_to_cartesian(current)?;
                let duration = joint_distance(current, &goal) / self.settings.line_speed;
                Ok((ActivePath::Line(LinePath::new(start, *target, duration)), goal))
            }
            MotionRequest::CircleAt { radius, center_x, center_z } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(MotionError::InvalidRequest(format!(
                        "circle radius must be positive, got {radius}"
                    )));
                }
                let entry =
                    CirclePath::entry_point(*center_x, *center_z, *radius, self.settings.circle_plane_y);
                let entry_joints = self.kinematics.cartesian_to_joints(&entry)?;
                let start = self.kinematics.joints_to_cartesian(current)?;
                let blend = joint_distance(current, &entry_joints) / self.settings.approach_speed;
                let circle = CirclePath {
                    approach: LinePath::new(start, entry, blend),
                    center_x: *center_x,
                    center_z: *center_z,
                    radius: *radius,
                    plane_y: self.settings.circle_plane_y,
                    circle_duration: TAU * radius / self.settings.circle_speed,
                };
                Ok((ActivePath::Circle(circle), entry_joints))
            }
        }
    }

    /// Advances the active path. Returns `Completed` when it finishes.
    pub fn tick(&mut self, now_us: u64) -> Result<Option<MotionEvent>, MotionError> {
        let Some(running) = self.active.as_ref() else {
            return Ok(None);
        };
        if let Some(last) = self.last_poll_us {
            if now_us.saturating_sub(last) < self.poll_interval_us {
                return Ok(None);
            }
        }
        self.last_poll_us = Some(now_us);

        let elapsed = micros_to_secs(now_us.saturating_sub(running.started_us));
        if elapsed > running.path.duration() {
            let state = running.path.state();
            self.active = None;
            self.stats.completed_paths += 1;
            let angles = self.model.angles();
            tracing::info!("Completed at {}", format_angles(&angles));
            return Ok(Some(MotionEvent::Completed { state, angles }));
        }

        self.stats.ticks += 1;
        let targets = match running.path.target_at(elapsed, self.kinematics.as_ref()) {
            Ok(targets) => targets,
            Err(e) => {
                self.stats.skipped_ticks += 1;
                tracing::warn!("Skipping tick at {:.4}s: {}", elapsed, e);
                return Ok(None);
            }
        };
        self.step_towards(&targets)?;
        Ok(None)
    }

    /// Emits at most one pulse per joint toward `targets`.
    fn step_towards(&mut self, targets: &[f64]) -> Result<(), MotionError> {
        for (index, target) in targets.iter().enumerate() {
            let Some(joint) = self.model.joints().get(index) else {
                break;
            };
            let delta = target - joint.angle();
            if delta.abs() <= joint.limits.step_angle() {
                continue;
            }
            let direction = StepDirection::from_delta(delta);
            let hardware = joint.hardware_direction(direction);

            self.actuator.pulse(index, hardware)?;
            if let Some(joint) = self.model.joint_mut(index) {
                joint.record_step(direction);
            }
            if let Some(count) = self.stats.pulses.get_mut(index) {
                *count += 1;
            }
            tracing::trace!("Joint {} stepped {:?}", index, direction);
        }
        Ok(())
    }
}

fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1e6
}

/// Euclidean distance between two joint vectors (deg).
pub fn joint_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (y - x) * (y - x))
        .sum::<f64>()
        .sqrt()
}

pub fn format_angles(angles: &[f64]) -> String {
    let parts: Vec<String> = angles.iter().map(|a| format!("{:.2}", a)).collect();
    format!("[{}]", parts.join(", "))
}
