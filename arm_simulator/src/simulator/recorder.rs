//! Output sinks: one CSV row per tick, one JSON object per host event.

use std::io::{self, Write};

use serde::Serialize;
use stepper_arm::HostOutput;
use stepper_arm::motion::{ActuatorPort, ArmVariant, MotionEvent, MotionExecutor};

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    time_s: f64,
    kind: &'a str,
    message: String,
}

pub struct Recorder<C: Write, J: Write> {
    csv: csv::Writer<C>,
    events: J,
    rows: u64,
}

impl<C: Write, J: Write> Recorder<C, J> {
    /// Writes the CSV header for the arm's joints.
    pub fn new(csv_out: C, events: J, variant: ArmVariant) -> io::Result<Self> {
        let mut csv = csv::Writer::from_writer(csv_out);
        let letters = variant.joint_letters();
        let mut header = vec!["time_s".to_string(), "state".to_string()];
        header.extend(letters.iter().map(|l| l.to_string()));
        header.extend(letters.iter().map(|l| format!("{}_steps", l)));
        csv.write_record(&header)?;
        Ok(Self { csv, events, rows: 0 })
    }

    pub fn row<A: ActuatorPort>(&mut self, now_us: u64, executor: &MotionExecutor<A>) -> io::Result<()> {
        let mut record = vec![format!("{:.4}", secs(now_us)), executor.state().to_string()];
        record.extend(executor.angles().iter().map(|a| format!("{:.4}", a)));
        record.extend(executor.model().step_counts().iter().map(|s| s.to_string()));
        self.csv.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    pub fn event(&mut self, now_us: u64, kind: &str, message: String) -> io::Result<()> {
        let record = EventRecord {
            time_s: secs(now_us),
            kind,
            message,
        };
        let json = serde_json::to_string(&record)?;
        writeln!(self.events, "{}", json)
    }

    pub fn output(&mut self, now_us: u64, output: &HostOutput) -> io::Result<()> {
        let kind = match output {
            HostOutput::Info(_) => "info",
            HostOutput::Telemetry(_) => "telemetry",
            HostOutput::Event(MotionEvent::Started { .. }) => "started",
            HostOutput::Event(MotionEvent::Preempted { .. }) => "preempted",
            HostOutput::Event(MotionEvent::Completed { .. }) => "completed",
        };
        self.event(now_us, kind, output.to_string())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes both sinks and hands them back.
    pub fn finish(mut self) -> io::Result<(C, J)> {
        self.csv.flush()?;
        self.events.flush()?;
        let csv_out = self
            .csv
            .into_inner()
            .map_err(|e| io::Error::other(e.error().to_string()))?;
        Ok((csv_out, self.events))
    }
}

fn secs(micros: u64) -> f64 {
    micros as f64 / 1e6
}
