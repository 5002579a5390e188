// src/feedback.rs - Periodic telemetry of the active path
use std::fmt;

use crate::config::FeedbackConfig;
use crate::motion::model::ArmVariant;
use crate::motion::{Cartesian, JointAngles};

/// Snapshot taken while a path is running.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub elapsed: Option<f64>,
    pub letters: &'static [char],
    pub angles: JointAngles,
}

impl fmt::Display for TelemetrySample {
    /// `d<elapsed>t<theta>a<alpha>b<beta>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(elapsed) = self.elapsed {
            write!(f, "d{:.3}", elapsed)?;
        }
        for (letter, angle) in self.letters.iter().zip(&self.angles) {
            write!(f, "{}{:.2}", letter, angle)?;
        }
        Ok(())
    }
}

/// Rate-limits telemetry to its own cadence, independent of the control tick.
/// Never touches motion state.
#[derive(Debug, Clone)]
pub struct FeedbackReporter {
    enabled: bool,
    include_time: bool,
    interval_us: u64,
    last_report_us: Option<u64>,
    letters: &'static [char],
}

impl FeedbackReporter {
    pub fn new(config: &FeedbackConfig, variant: ArmVariant) -> Self {
        Self {
            enabled: config.enabled,
            include_time: config.include_time,
            interval_us: config.interval_us,
            last_report_us: None,
            letters: variant.joint_letters(),
        }
    }

    /// `elapsed` is `None` while idle; nothing is reported then.
    pub fn poll(&mut self, now_us: u64, elapsed: Option<f64>, angles: &[f64]) -> Option<TelemetrySample> {
        if !self.enabled {
            return None;
        }
        let elapsed = elapsed?;
        if let Some(last) = self.last_report_us {
            if now_us.saturating_sub(last) < self.interval_us {
                return None;
            }
        }
        self.last_report_us = Some(now_us);
        Some(TelemetrySample {
            elapsed: self.include_time.then_some(elapsed),
            letters: self.letters,
            angles: angles.to_vec(),
        })
    }
}

pub fn completion_line(angles: &[f64]) -> String {
    format!("Completed at [{}]", join(angles, 2))
}

pub fn debug_lines(angles: &[f64], pose: Option<Cartesian>) -> Vec<String> {
    let mut lines = vec![format!("JS: [{}]", join(angles, 2))];
    match pose {
        Some(pose) => lines.push(format!("CS: [{}]", join(&pose, 2))),
        None => lines.push("CS: unavailable".to_string()),
    }
    lines
}

fn join(values: &[f64], precision: usize) -> String {
    values
        .iter()
        .map(|v| format!("{:.*}", precision, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter(include_time: bool) -> FeedbackReporter {
        let config = FeedbackConfig {
            enabled: true,
            include_time,
            interval_us: 50_000,
        };
        FeedbackReporter::new(&config, ArmVariant::YawPlanar)
    }

    #[test]
    fn sample_format_matches_wire_layout() {
        let mut feedback = reporter(true);
        let sample = feedback.poll(0, Some(0.25), &[10.0, -5.126, 3.0]).unwrap();
        assert_eq!(sample.to_string(), "d0.250t10.00a-5.13b3.00");

        let mut untimed = reporter(false);
        let sample = untimed.poll(0, Some(0.25), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(sample.to_string(), "t1.00a2.00b3.00");
    }

    #[test]
    fn reports_at_its_own_cadence_and_only_while_moving() {
        let mut feedback = reporter(true);
        assert!(feedback.poll(0, None, &[0.0; 3]).is_none());
        assert!(feedback.poll(1_000, Some(0.0), &[0.0; 3]).is_some());
        assert!(feedback.poll(30_000, Some(0.03), &[0.0; 3]).is_none());
        assert!(feedback.poll(51_000, Some(0.05), &[0.0; 3]).is_some());
    }

    #[test]
    fn completion_and_debug_lines() {
        assert_eq!(completion_line(&[30.0, -10.0]), "Completed at [30.00, -10.00]");
        let lines = debug_lines(&[0.0, 0.0], Some([200.0, 0.0, 250.0]));
        assert_eq!(lines, vec!["JS: [0.00, 0.00]", "CS: [200.00, 0.00, 250.00]"]);
    }
}
