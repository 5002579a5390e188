//! Offline arm simulator: replays a scenario of operator lines against the
//! motion core on a simulated clock and records what the arm did.

mod scenario;
mod simulator;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::scenario::Scenario;
use crate::simulator::Simulator;
use crate::simulator::recorder::Recorder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let scenario_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "arm_simulator/scenario.toml".to_string());
    let scenario = Scenario::load(&scenario_path)?;
    let config = scenario.arm_config()?;
    tracing::info!("Loaded scenario {} ({} commands)", scenario_path, scenario.commands.len());

    let output_dir = Path::new(&scenario.output_dir);
    fs::create_dir_all(output_dir)?;
    let csv_out = BufWriter::new(File::create(output_dir.join("results.csv"))?);
    let events = BufWriter::new(File::create(output_dir.join("results.jsonl"))?);
    let recorder = Recorder::new(csv_out, events, config.variant())?;

    let (summary, recorder) = Simulator::new(&config, &scenario, recorder).run()?;
    recorder.finish()?;

    println!(
        "Simulated {:.3}s in {} ticks: {} paths completed, {} preempted",
        summary.end_us as f64 / 1e6,
        summary.ticks,
        summary.completed_paths,
        summary.preempted_paths
    );
    println!("Final joints: {:?}", summary.final_angles);
    println!("Pulses per joint: {:?}", summary.pulses);
    println!("Results written to {}", output_dir.display());
    Ok(())
}
