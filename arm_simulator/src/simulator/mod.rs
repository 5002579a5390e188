pub mod event_queue;
pub mod recorder;

use std::io::{self, Write};

use crate::scenario::Scenario;
use crate::simulator::event_queue::CommandQueue;
use crate::simulator::recorder::Recorder;
use stepper_arm::motion::RecordingActuator;
use stepper_arm::{ArmHost, Config, SimTime, TimeInterface};

/// What a finished run looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSummary {
    pub ticks: u64,
    pub end_us: u64,
    pub final_angles: Vec<f64>,
    pub pulses: Vec<u64>,
    pub completed_paths: u64,
    pub preempted_paths: u64,
}

/// Drives an `ArmHost` on a simulated clock, one poll interval at a time.
pub struct Simulator<C: Write, J: Write> {
    host: ArmHost<RecordingActuator>,
    clock: SimTime,
    queue: CommandQueue,
    recorder: Recorder<C, J>,
    poll_interval_us: u64,
    duration_us: u64,
    stop_when_idle: bool,
}

impl<C: Write, J: Write> Simulator<C, J> {
    pub fn new(config: &Config, scenario: &Scenario, recorder: Recorder<C, J>) -> Self {
        let mut queue = CommandQueue::new();
        for entry in &scenario.commands {
            queue.push(entry.at_ms * 1000, entry.command.clone());
        }
        let actuator = RecordingActuator::new(config.joints.len());
        tracing::info!(
            "Simulator initialized: {} arm, {} scheduled commands, {} ms",
            config.variant(),
            queue.len(),
            scenario.duration_ms
        );
        Self {
            host: ArmHost::new(config, actuator),
            clock: SimTime::new(),
            queue,
            recorder,
            poll_interval_us: config.timing.poll_interval_us,
            duration_us: scenario.duration_ms * 1000,
            stop_when_idle: scenario.stop_when_idle,
        }
    }

    pub fn run(mut self) -> io::Result<(SimSummary, Recorder<C, J>)> {
        let mut ticks = 0;
        loop {
            let now = self.clock.now_micros();

            for command in self.queue.pop_due(now) {
                tracing::info!("[{:.4}s] > {}", now as f64 / 1e6, command.line);
                self.recorder.event(now, "command", command.line.clone())?;
                for out in self.host.handle_line(&command.line, now) {
                    self.recorder.output(now, &out)?;
                }
            }

            for out in self.host.poll(now).map_err(io::Error::other)? {
                tracing::debug!("[{:.4}s] {}", now as f64 / 1e6, out);
                self.recorder.output(now, &out)?;
            }
            self.recorder.row(now, self.host.executor())?;
            ticks += 1;

            let settled = self.queue.is_empty() && self.host.executor().is_idle();
            if now >= self.duration_us || (self.stop_when_idle && settled) {
                break;
            }
            self.clock.advance(self.poll_interval_us);
        }

        let executor = self.host.executor();
        let stats = executor.stats();
        let summary = SimSummary {
            ticks,
            end_us: self.clock.now_micros(),
            final_angles: executor.angles(),
            pulses: stats.pulses.clone(),
            completed_paths: stats.completed_paths,
            preempted_paths: stats.preempted_paths,
        };
        tracing::info!(
            "Simulation finished after {} ticks, {} CSV rows",
            summary.ticks,
            self.recorder.rows()
        );
        Ok((summary, self.recorder))
    }
}
