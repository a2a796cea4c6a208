// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! chassis-fanctl: closed-loop fan control for BMC-managed chassis fans.
//! Reads zone temperatures through vendor tools and commands every fan
//! channel with one `ipmitool raw` call per change.

use anyhow::Context;
use clap::Parser;
use chassis_fanctl::actuator::{DryRunActuator, FanActuator, IpmiRawActuator};
use chassis_fanctl::channel::ChannelDrive;
use chassis_fanctl::config::{self, Config};
use chassis_fanctl::control::{Chassis, ControlLaw, ControlLoop};
use chassis_fanctl::sensor::{CommandSensorSource, SensorSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::time::{self, Duration, MissedTickBehavior};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "chassis-fanctl", about = "IPMI chassis fan controller")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log fan commands instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Validate the configuration, print the resolved layout and exit.
    #[arg(long)]
    check: bool,

    /// Run a single tick and exit.
    #[arg(long)]
    once: bool,

    /// Write the built-in default configuration to PATH and exit.
    #[arg(long, value_name = "PATH")]
    write_default: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run(cli).await.inspect_err(|e| log::error!("{e:#}"))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(path) = &cli.write_default {
        config::save_config(path, &Config::default())
            .with_context(|| format!("writing default config to {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config_path = config::resolve_config_path(Some(&cli.config));
    let cfg = config::load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let chassis = cfg
        .build_chassis()
        .with_context(|| format!("invalid configuration in {}", config_path.display()))?;

    if !cli.dry_run {
        cfg.check_tools().context("required tool missing")?;
    }

    if cli.check {
        print_summary(&cfg, &chassis);
        return Ok(());
    }

    if !cli.dry_run && !nix::unistd::geteuid().is_root() {
        log::warn!("Not running as root; ipmitool and smartctl will likely fail");
    }

    let timeout = cfg.daemon.read_timeout();
    let source: Arc<dyn SensorSource> =
        Arc::new(CommandSensorSource::new(cfg.tools.clone(), timeout));
    let raw = IpmiRawActuator::new(
        cfg.tools.clone(),
        cfg.actuator.raw_prefix.clone(),
        cfg.actuator.encoding,
        chassis.channels.len(),
        timeout,
    );
    let actuator: Box<dyn FanActuator> = if cli.dry_run {
        Box::new(DryRunActuator::new(raw))
    } else {
        Box::new(raw)
    };

    let mut control = ControlLoop::new(chassis, source, actuator);
    log::info!(
        "Loaded {}: {} zone(s), {} channel(s), tick {}ms{}",
        config_path.display(),
        control.chassis().zones.len(),
        control.chassis().channels.len(),
        cfg.daemon.tick_ms,
        if cli.dry_run { ", dry run" } else { "" }
    );

    // Installed before the first read so a signal at any point after this
    // is queued for the loop below.
    let mut signals = ShutdownSignals::install().context("installing signal handlers")?;

    if cfg.daemon.align_to_second && !cli.once {
        time::sleep(until_next_second()).await;
    }

    control.tick(Instant::now()).await;
    if cli.once {
        return Ok(());
    }

    let period = cfg.daemon.tick();
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                control.tick(Instant::now()).await;
            }
            name = signals.recv() => {
                log::info!("Received {name}");
                break;
            }
        }
    }

    if let Err(e) = control.shutdown(cfg.daemon.exit_duty).await {
        log::error!("Failed to set exit duty: {e}");
    }
    log::info!("Daemon shutting down");
    Ok(())
}

/// SIGINT and SIGTERM streams, registered once for the life of the process.
struct ShutdownSignals {
    sigint: Signal,
    sigterm: Signal,
}

impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for either signal. A signal delivered while nothing was waiting
    /// is returned by the next call.
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        }
    }
}

/// Time left until the next whole wall-clock second.
fn until_next_second() -> Duration {
    let subsec = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    Duration::from_nanos(u64::from(1_000_000_000 - subsec))
}

// ---------------------------------------------------------------------------
// --check output
// ---------------------------------------------------------------------------

fn print_summary(cfg: &Config, chassis: &Chassis) {
    println!("Zones:");
    for zone in &chassis.zones {
        let law = match &zone.law {
            ControlLaw::Curve(curve) => format!("curve '{}'", curve.name),
            ControlLaw::Pid(gains) => format!(
                "pid kp={} ki={} kd={} setpoint={}C",
                gains.kp, gains.ki, gains.kd, gains.setpoint
            ),
        };
        let sensors: Vec<String> = zone.sensors.iter().map(|s| s.to_string()).collect();
        println!(
            "  {:<10} every {:>4}s  ceiling {:.1}C  {law}  [{}]",
            zone.id,
            zone.poll_interval.as_secs(),
            zone.safety_ceiling,
            sensors.join(", ")
        );
    }

    println!("Channels:");
    for (i, channel) in chassis.channels.iter().enumerate() {
        let drive = match channel.drive {
            ChannelDrive::Zone(idx) => format!("zone {}", chassis.zones[idx].id),
            ChannelDrive::Fixed(duty) => format!("fixed {duty}%"),
        };
        println!("  {i}: {:<10} {drive}", channel.name);
    }

    println!(
        "Command: ipmitool {}raw {} <{} bytes, {:?}>",
        cfg.tools
            .ipmitool_args
            .iter()
            .map(|a| format!("{a} "))
            .collect::<String>(),
        cfg.actuator.raw_prefix.join(" "),
        chassis.channels.len(),
        cfg.actuator.encoding
    );
}
