use clap::{App, Arg, ArgMatches};
use colored::*;
use divesim::clock::{format_dive_time, MonotonicTimeSource};
use divesim::config::SimConfig;
use divesim::deco::ModelKind;
use divesim::driver::{SimulationDriver, StatusLine, TelemetryStatus};
use divesim::link::{self, DeviceTarget};
use divesim::logging;
use divesim::profile::ProfileSample;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

const COMMAND_QUEUE_SIZE: usize = 16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("divesim")
        .version("0.1.0")
        .author("Dive Systems Engineering Team")
        .about("🤿 Dive Simulator - drives a dive computer with a simulated depth profile")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("device")
                .short("d")
                .long("device")
                .value_name("TARGET")
                .help("Dive computer link: serial device path or tcp://host:port")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("target")
                .long("target")
                .value_name("METRES")
                .help("Initial target depth")
                .takes_value(true)
                .validator(validate_number),
        )
        .arg(
            Arg::with_name("rate")
                .long("rate")
                .value_name("M_PER_MIN")
                .help("Initial descent/ascent rate in metres per minute")
                .takes_value(true)
                .validator(validate_number),
        )
        .arg(
            Arg::with_name("tick")
                .long("tick-ms")
                .value_name("MS")
                .help("Simulation tick interval in milliseconds")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(ms) if ms > 0 => Ok(()),
                    _ => Err("Tick interval must be a positive integer".into()),
                }),
        )
        .arg(
            Arg::with_name("model")
                .short("m")
                .long("model")
                .value_name("MODEL")
                .help("Enable a decompression model")
                .takes_value(true)
                .multiple(true)
                .possible_values(&["dummy"]),
        )
        .arg(
            Arg::with_name("dummy-model")
                .long("dummy-model")
                .help("A dummy, single-compartment model with a 15 second tissue half-time. DO NOT USE FOR DIVE PLANNING OR EXECUTION - THIS MODEL HAS NO BASIS IN REALITY!"),
        )
        .arg(
            Arg::with_name("plot-profile")
                .long("plot-profile")
                .help("Record the depth profile for plotting"),
        )
        .arg(
            Arg::with_name("plot-update-time")
                .long("plot-update-time")
                .value_name("MINUTES")
                .help("Time axis step of the profile plot")
                .takes_value(true)
                .validator(validate_number),
        )
        .arg(
            Arg::with_name("plot-update-depth")
                .long("plot-update-depth")
                .value_name("METRES")
                .help("Depth axis step of the profile plot")
                .takes_value(true)
                .validator(validate_number),
        )
        .arg(
            Arg::with_name("plot-output")
                .long("plot-output")
                .value_name("FILE")
                .help("Write profile samples as JSON lines")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output"),
        )
        .get_matches();

    logging::init(matches.is_present("verbose"));

    let mut config = match matches.value_of("config") {
        Some(path) => SimConfig::load(Path::new(path))?,
        None => SimConfig::default(),
    };
    apply_overrides(&matches, &mut config)?;
    config.validate()?;

    println!("{}", "🤿 Dive Simulator".bright_blue().bold());
    println!("{}", "=================".bright_blue());
    println!(
        "   Target: {} m at {} m/min",
        config.dive.initial_target_depth_m, config.dive.initial_rate_m_per_min
    );
    for model in &config.models {
        println!("   Model: {} {}", model, "(not for dive planning)".yellow());
    }
    println!(
        "{} {}",
        "Commands:".dimmed(),
        "set depth <m> | set rate <m/min> | quit".bright_cyan()
    );

    let mut driver = SimulationDriver::new(&config, MonotonicTimeSource::new());

    if let Some(device) = config.device.as_deref() {
        match device.parse::<DeviceTarget>() {
            Ok(target) => match link::connect(&target).await {
                Ok(device_link) => driver.attach_link(Box::new(device_link), chrono::Utc::now()),
                Err(e) => driver.link_failed(&e),
            },
            Err(e) => driver.link_failed(&e),
        }
    }

    let (line_tx, mut line_rx) = mpsc::channel::<String>(COMMAND_QUEUE_SIZE);
    spawn_console_reader(line_tx.clone());
    spawn_interrupt_handler(line_tx);

    let mut profile_out = match (config.plot.enabled, config.plot.output.as_deref()) {
        (true, Some(path)) => match File::create(path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                warn!("Profile output {} unavailable: {}", path.display(), e);
                None
            }
        },
        _ => None,
    };

    let mut interval = time::interval(Duration::from_millis(config.dive.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while driver.is_running() {
        interval.tick().await;

        let Some(status) = driver.tick(&mut line_rx) else {
            break;
        };
        render_status(&status, driver.telemetry_status());

        let samples = driver.take_profile_samples();
        if let Some(out) = profile_out.as_mut() {
            if let Err(e) = write_samples(out, &samples) {
                warn!("Profile output stopped: {}", e);
                profile_out = None;
            }
        }
    }

    if let Some(mut out) = profile_out {
        out.flush()?;
    }

    let snapshot = driver.snapshot();
    println!();
    println!("{}", "🏁 Dive finished".bright_green().bold());
    println!("   Dive time: {}", format_dive_time(snapshot.dive_time_s).bright_white());
    println!("   Max depth: {:.1} m", snapshot.depth.max_depth_reached);
    println!(
        "   Frames sent: {} (dropped {})",
        snapshot.stats.frames_sent, snapshot.stats.frames_dropped
    );
    for model in &snapshot.models {
        for compartment in &model.compartments {
            println!(
                "   {} compartment {}: {:.3}",
                model.model, compartment.id, compartment.loading
            );
        }
    }
    if let Some(axes) = driver.profile_axes() {
        println!(
            "   Profile axes: {:.0} min x {:.0} m",
            axes.time_max_minutes, axes.depth_max_m
        );
    }

    info!("Simulation stopped after {} ticks", snapshot.stats.ticks);
    Ok(())
}

fn apply_overrides(matches: &ArgMatches<'_>, config: &mut SimConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(device) = matches.value_of("device") {
        config.device = Some(device.to_string());
    }
    if let Some(target) = matches.value_of("target") {
        config.dive.initial_target_depth_m = target.parse()?;
    }
    if let Some(rate) = matches.value_of("rate") {
        config.dive.initial_rate_m_per_min = rate.parse()?;
    }
    if let Some(tick) = matches.value_of("tick") {
        config.dive.tick_interval_ms = tick.parse()?;
    }
    if let Some(models) = matches.values_of("model") {
        for model in models {
            config.enable_model(model.parse::<ModelKind>()?);
        }
    }
    if matches.is_present("dummy-model") {
        config.enable_model(ModelKind::Dummy);
    }
    if matches.is_present("plot-profile") {
        config.plot.enabled = true;
    }
    if let Some(minutes) = matches.value_of("plot-update-time") {
        config.plot.time_axis_step_min = minutes.parse()?;
    }
    if let Some(metres) = matches.value_of("plot-update-depth") {
        config.plot.depth_axis_step_m = metres.parse()?;
    }
    if let Some(path) = matches.value_of("plot-output") {
        config.plot.enabled = true;
        config.plot.output = Some(path.into());
    }
    Ok(())
}

fn validate_number(v: String) -> Result<(), String> {
    match v.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(()),
        _ => Err("Value must be a finite number".into()),
    }
}

/// Reads operator lines on a detached thread so a pending stdin read never
/// holds up runtime shutdown.
fn spawn_console_reader(tx: mpsc::Sender<String>) {
    let spawned = thread::Builder::new()
        .name("console-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Console input closed: {}", e);
                        break;
                    }
                }
            }
        });

    if let Err(e) = spawned {
        warn!("Console input unavailable: {}", e);
    }
}

fn spawn_interrupt_handler(tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send("quit".to_string()).await;
        }
    });
}

fn render_status(status: &StatusLine, telemetry: TelemetryStatus) {
    let link = match telemetry {
        TelemetryStatus::Connected => "📡".green(),
        TelemetryStatus::Unavailable => "📴".yellow(),
        TelemetryStatus::Disabled => "".normal(),
    };
    print!("\r{} {}", status.to_string().bright_cyan(), link);
    let _ = io::stdout().flush();
}

fn write_samples<W: Write>(out: &mut W, samples: &[ProfileSample]) -> io::Result<()> {
    for sample in samples {
        serde_json::to_writer(&mut *out, sample)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
