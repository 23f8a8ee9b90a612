use clap::{App, Arg};
use colored::*;
use divesim::logging;
use divesim::protocol::TelemetryFrame;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "7000";

/// Stand-in dive computer: accepts the simulator's device link over TCP and
/// prints every frame it decodes.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("divesim-monitor")
        .version("0.1.0")
        .author("Dive Systems Engineering Team")
        .about("📟 Dive computer stand-in - decodes and displays simulator telemetry")
        .arg(
            Arg::with_name("host")
                .long("host")
                .value_name("HOST")
                .help("Address to listen on")
                .takes_value(true)
                .default_value(DEFAULT_HOST),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .takes_value(true)
                .default_value(DEFAULT_PORT),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output"),
        )
        .get_matches();

    logging::init(matches.is_present("verbose"));

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse::<u16>()?;
    let format = matches.value_of("format").unwrap_or("table").to_string();

    let listener = TcpListener::bind((host, port)).await?;
    println!("{}", "📟 Dive computer monitor".bright_blue().bold());
    println!(
        "{} {}",
        "Point the simulator at".dimmed(),
        format!("--device tcp://{}:{}", host, port).bright_cyan()
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("🔗 Simulator connected: {}", addr);
                let format = format.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_link(stream, &format).await {
                        warn!("Link {} error: {}", addr, e);
                    }
                    info!("🔌 Simulator {} disconnected", addr);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_link(stream: TcpStream, format: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut lines = BufReader::new(stream).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match TelemetryFrame::decode(&line) {
            Ok(frame) => print_frame(&frame, format)?,
            Err(e) => println!("{} {} ({})", "❌".red(), line.bright_red(), e),
        }
    }

    Ok(())
}

fn print_frame(frame: &TelemetryFrame, format: &str) -> Result<(), serde_json::Error> {
    match format {
        "json" => println!("{}", serde_json::to_string(frame)?),
        "compact" => println!("{}", frame.encode().as_str()),
        _ => match frame {
            TelemetryFrame::ClockSync { .. } => {
                let time = frame
                    .datetime()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_default();
                println!("{} {}", "⏱️  Clock sync".bright_green(), time.bright_white());
            }
            TelemetryFrame::DepthReport { decimeters } => {
                let depth = frame.depth_meters().unwrap_or_default();
                println!(
                    "{} {:>6.1} m {}",
                    "🌊 Depth".bright_cyan(),
                    depth,
                    format!("({} dm)", decimeters).dimmed()
                );
            }
        },
    }
    Ok(())
}
