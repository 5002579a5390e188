// src/host.rs - Command, execution and telemetry glued into one owner
use std::fmt;

use crate::command::{Command, CommandParser};
use crate::config::Config;
use crate::feedback::{FeedbackReporter, TelemetrySample, completion_line, debug_lines};
use crate::motion::executor::format_angles;
use crate::motion::{ActuatorPort, MotionError, MotionEvent, MotionExecutor};

/// Anything the host sends back over the command channel.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOutput {
    Info(String),
    Event(MotionEvent),
    Telemetry(TelemetrySample),
}

impl fmt::Display for HostOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOutput::Info(text) => f.write_str(text),
            HostOutput::Telemetry(sample) => write!(f, "{}", sample),
            HostOutput::Event(MotionEvent::Started { from, to, duration, .. }) => write!(
                f,
                "Moving from {} to {} in {:.4} seconds.",
                format_angles(from),
                format_angles(to),
                duration
            ),
            HostOutput::Event(MotionEvent::Preempted { state, elapsed }) => {
                write!(f, "Interrupted {} after {:.3}s", state, elapsed)
            }
            HostOutput::Event(MotionEvent::Completed { angles, .. }) => {
                f.write_str(&completion_line(angles))
            }
        }
    }
}

/// Single owner of the arm state and the active path.
///
/// Everything that can mutate either goes through `&mut self`, so a path
/// replacement and a step emission can never interleave.
pub struct ArmHost<A: ActuatorPort> {
    executor: MotionExecutor<A>,
    parser: CommandParser,
    feedback: FeedbackReporter,
}

impl<A: ActuatorPort> ArmHost<A> {
    pub fn new(config: &Config, actuator: A) -> Self {
        let executor = MotionExecutor::new(
            config.build_model(),
            actuator,
            config.path_settings(),
            config.timing.poll_interval_us,
        );
        Self {
            executor,
            parser: CommandParser::new(config.variant()),
            feedback: FeedbackReporter::new(&config.feedback, config.variant()),
        }
    }

    pub fn executor(&self) -> &MotionExecutor<A> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut MotionExecutor<A> {
        &mut self.executor
    }

    pub fn greeting(&self) -> Vec<HostOutput> {
        self.parser.help().into_iter().map(HostOutput::Info).collect()
    }

    /// Parses one input line and acts on it. Bad input never reaches the executor.
    pub fn handle_line(&mut self, line: &str, now_us: u64) -> Vec<HostOutput> {
        if line.trim().is_empty() {
            return Vec::new();
        }
        let command = match self.parser.parse_line(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Bad command '{}': {}", line.trim(), e);
                return vec![HostOutput::Info(self.parser.usage_for(line))];
            }
        };

        match command {
            Command::Debug => {
                let pose = self.executor.current_pose().ok();
                debug_lines(&self.executor.angles(), pose)
                    .into_iter()
                    .map(HostOutput::Info)
                    .collect()
            }
            Command::Motion(request) => match self.executor.start(&request, now_us) {
                Ok(events) => events.into_iter().map(HostOutput::Event).collect(),
                Err(e) => vec![HostOutput::Info(format!("Error: {}", e))],
            },
        }
    }

    /// One pass of the host loop: advance motion, then maybe report.
    pub fn poll(&mut self, now_us: u64) -> Result<Vec<HostOutput>, MotionError> {
        let mut out = Vec::new();
        if let Some(event) = self.executor.tick(now_us)? {
            out.push(HostOutput::Event(event));
        }
        let angles = self.executor.angles();
        if let Some(sample) = self.feedback.poll(now_us, self.executor.elapsed(now_us), &angles) {
            out.push(HostOutput::Telemetry(sample));
        }
        Ok(out)
    }
}
