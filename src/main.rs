// src/main.rs - arm-host: command channel in, step stream out
use std::time::Duration;

use clap::{Parser, ValueEnum};
use stepper_arm::communication::{forward_lines, open_serial};
use stepper_arm::motion::stepper::StepStreamActuator;
use stepper_arm::{ArmHost, ArmVariant, Config, StdTime, TimeInterface, load_config};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Planar,
    YawPlanar,
}

impl From<VariantArg> for ArmVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Planar => ArmVariant::Planar,
            VariantArg::YawPlanar => ArmVariant::YawPlanar,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "arm-host", version, about = "Motion host for a stepper-driven robotic arm")]
struct Args {
    /// TOML configuration; the built-in preset of --variant is used when absent
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, value_enum, default_value = "yaw-planar")]
    variant: VariantArg,

    /// Read commands from this serial device instead of stdin
    #[arg(long)]
    serial: Option<String>,

    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    // stdout carries the step stream and replies, logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting stepper arm host");

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            load_config(path)?
        }
        None => Config::preset(args.variant.into()),
    };

    tracing::info!(
        "Arm: {} ({}, {} joints)",
        config.arm.name.as_deref().unwrap_or("Unknown"),
        config.variant(),
        config.joints.len()
    );
    tracing::info!(
        "Links: L1 = {} mm, L2 = {} mm; poll every {} us",
        config.geometry.upper_arm,
        config.geometry.forearm,
        config.timing.poll_interval_us
    );

    let time = StdTime::new();
    let actuator = StepStreamActuator::new(
        std::io::stdout(),
        time.clone(),
        config.joints.len(),
        config.timing.pulse_width_us,
    );
    let mut host = ArmHost::new(&config, actuator);
    for line in host.greeting() {
        println!("{}", line);
    }

    let (tx, mut rx) = mpsc::channel::<String>(16);
    let reader = match &args.serial {
        Some(path) => {
            let port = open_serial(path, args.baud)?;
            tokio::spawn(forward_lines(port, tx))
        }
        None => tokio::spawn(forward_lines(tokio::io::stdin(), tx)),
    };

    let mut ticker = tokio::time::interval(Duration::from_micros(config.timing.poll_interval_us));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input_open = true;

    loop {
        tokio::select! {
            line = rx.recv(), if input_open => match line {
                Some(line) => {
                    for out in host.handle_line(&line, time.now_micros()) {
                        println!("{}", out);
                    }
                }
                None => {
                    tracing::info!("Command input closed");
                    input_open = false;
                }
            },
            _ = ticker.tick() => {
                for out in host.poll(time.now_micros())? {
                    println!("{}", out);
                }
                if !input_open && host.executor().is_idle() {
                    break;
                }
            }
        }
    }

    match reader.await {
        Ok(Ok(lines)) => tracing::info!("Processed {} command lines", lines),
        Ok(Err(e)) => tracing::error!("Command reader failed: {}", e),
        Err(e) => tracing::error!("Command reader task panicked: {}", e),
    }
    Ok(())
}
