//! teleinfo-collector: reads Teleinfo frames from a serial port, hands them
//! to an exporter and serves the most recent ones over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tokio::sync::mpsc;

use teleinfo_protocol::{Frame, FrameError, FrameReader, Mode};

mod database;
mod exporters;
mod logging;
mod metrics;
mod port;
mod ring;
mod web;

use exporters::{Exporter, ExporterSettings, Registry};
use metrics::CollectorMetrics;
use ring::FrameRing;
use web::WebState;

/// teleinfo-collector - Teleinfo frame collector and exporter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port to read frames from
    #[arg(short, long, default_value = "/dev/ttyUSB0")]
    device: String,

    /// Wire mode the meter emits: historic or standard
    #[arg(short, long, default_value = "historic")]
    mode: Mode,

    /// Exporter module name (see --list-exporters)
    #[arg(short, long)]
    export: Option<String>,

    /// List available exporters and exit
    #[arg(long)]
    list_exporters: bool,

    /// HTTP service listen address
    #[arg(short, long, default_value = "127.0.0.1:9000")]
    listen: SocketAddr,

    /// Number of Teleinfo frames to serve under /frames
    #[arg(long, default_value = "20")]
    frames_count: usize,

    /// Path to the database file (for the sqlite exporter)
    #[arg(long, default_value = "teleinfo-collector.db")]
    database: PathBuf,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory where log files are stored
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Number of days to keep log files
    #[arg(long, default_value = "7")]
    log_retention_days: u64,
}

/// Configuration file format.
#[derive(Debug, serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    serial: SerialSection,
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    export: ExportSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, serde::Deserialize, Default)]
struct SerialSection {
    device: Option<String>,
    mode: Option<Mode>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct ServerSection {
    listen: Option<SocketAddr>,
    frames_count: Option<usize>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct ExportSection {
    exporter: Option<String>,
    database: Option<PathBuf>,
}

#[derive(Debug, serde::Deserialize, Default)]
struct LoggingSection {
    log_dir: Option<String>,
    retention_days: Option<u64>,
    level: Option<String>,
}

fn load_config(path: &PathBuf) -> Result<ConfigFile, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Blocking read loop: decode frames and hand them to the consumer.
///
/// Recoverable decode errors are logged and counted, then the loop resumes
/// scanning from wherever the stream cursor is. Transport failures and
/// end-of-stream terminate the loop.
fn read_frames<R: std::io::Read>(mut reader: FrameReader<R>, frames_tx: mpsc::Sender<Frame>) {
    loop {
        match reader.read_frame() {
            Ok(frame) => {
                // Blocking send: stall rather than drop if consumers lag.
                if frames_tx.blocking_send(frame).is_err() {
                    info!("Frame consumer gone, stopping reader loop");
                    return;
                }
            }
            Err(FrameError::Io(err)) if err.kind() == std::io::ErrorKind::TimedOut => {
                warn!("Timed out waiting for Teleinfo data");
            }
            Err(err @ FrameError::Io(_)) => {
                error!("Fatal I/O error reading Teleinfo stream: {}", err);
                return;
            }
            Err(err) if err.is_eof() => {
                info!("Teleinfo stream ended");
                return;
            }
            Err(err) => {
                warn!("Error reading Teleinfo frame: {}", err);
            }
        }
    }
}

/// Consume decoded frames: publish into the ring and run the exporter.
async fn consume_frames(
    mut frames_rx: mpsc::Receiver<Frame>,
    ring: Arc<FrameRing>,
    mut exporter: Option<Box<dyn Exporter>>,
    metrics: Arc<CollectorMetrics>,
) {
    while let Some(frame) = frames_rx.recv().await {
        ring.push(frame.clone());
        if let Some(exporter) = exporter.as_mut() {
            match exporter.export_frame(&frame) {
                Ok(()) => metrics.record_frame_exported(),
                Err(err) => {
                    metrics.record_frame_export_error();
                    error!("Error exporting frame: {}", err);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let registry = Registry::builtin();
    if args.list_exporters {
        for name in registry.list() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Load config file: explicit path > auto-detect > default
    let config_path = args.config.clone().or_else(|| {
        let default_path = PathBuf::from("teleinfo-collector.toml");
        default_path.exists().then_some(default_path)
    });
    let file_config = if let Some(config_path) = &config_path {
        match load_config(config_path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", config_path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                return Err(e);
            }
        }
    } else {
        ConfigFile::default()
    };

    // Merge logging configs (command line takes precedence)
    let log_dir = if args.log_dir.to_string_lossy() != "logs" {
        args.log_dir.clone()
    } else {
        PathBuf::from(file_config.logging.log_dir.as_deref().unwrap_or("logs"))
    };
    let log_retention_days = if args.log_retention_days != 7 {
        args.log_retention_days
    } else {
        file_config.logging.retention_days.unwrap_or(7)
    };
    logging::init_logging(
        &log_dir,
        log_retention_days,
        args.verbose,
        file_config.logging.level.as_deref(),
    )
    .expect("Failed to initialize logging");

    let device = file_config.serial.device.unwrap_or(args.device);
    let mode = file_config.serial.mode.unwrap_or(args.mode);
    let listen_addr = file_config.server.listen.unwrap_or(args.listen);
    let frames_count = file_config.server.frames_count.unwrap_or(args.frames_count);
    let exporter_name = args.export.or(file_config.export.exporter);
    let settings = ExporterSettings {
        database_path: file_config.export.database.unwrap_or(args.database),
    };

    let exporter = match &exporter_name {
        Some(name) => match registry.create(name, &settings) {
            Ok(exporter) => {
                info!("Using exporter '{}'", name);
                Some(exporter)
            }
            Err(err) => {
                error!(
                    "{} (valid choices are {:?})",
                    err,
                    registry.list()
                );
                std::process::exit(1);
            }
        },
        None => None,
    };

    // A serial device that cannot be opened is fatal, not retried.
    let port = match port::open_port(&device) {
        Ok(port) => port,
        Err(err) => {
            error!("Error opening device '{}': {}", device, err);
            std::process::exit(1);
        }
    };

    let metrics = CollectorMetrics::new();
    let ring = Arc::new(FrameRing::new(frames_count));
    let reader = FrameReader::with_metrics(port, mode, metrics.clone());
    info!("Reading {} frames from {}", mode, device);

    let (frames_tx, frames_rx) = mpsc::channel::<Frame>(10);
    let reader_thread = std::thread::spawn(move || read_frames(reader, frames_tx));

    let consumer = tokio::spawn(consume_frames(
        frames_rx,
        ring.clone(),
        exporter,
        metrics.clone(),
    ));

    let state = WebState { ring, metrics };
    tokio::select! {
        result = web::start_web_server(listen_addr, state) => {
            if let Err(err) = result {
                error!("HTTP server error: {}", err);
            }
        }
        _ = consumer => {
            info!("Frame pipeline stopped");
        }
    }

    // The reader thread ends once its channel is closed or the stream dies.
    drop(reader_thread);
    Ok(())
}
