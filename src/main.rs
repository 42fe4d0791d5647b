//! LFP Display - streaming display buffer demo
//!
//! Runs a synthetic acquisition pipeline on a producer thread and a renderer
//! on a second thread, both sharing one display buffer.

use anyhow::{Context, Result};
use lfp_display::source::SyntheticSource;
use lfp_display::{
    BufferError, BufferLifecycleManager, DisplayConfig, LifecycleEvent, LifecycleEventKind,
    Marker, SnapshotReadPort, SnapshotReader, StreamingIngestPort,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Renderer refresh interval (~30 fps)
const RENDER_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug)]
struct Options {
    channels: usize,
    sample_rate: f64,
    window_seconds: Option<f64>,
    block_size: usize,
    duration: Duration,
    reconfigure: Option<usize>,
    config_path: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            channels: 8,
            sample_rate: lfp_display::DEFAULT_SAMPLE_RATE,
            window_seconds: None,
            block_size: lfp_display::DEFAULT_BLOCK_SIZE,
            duration: Duration::from_secs(10),
            reconfigure: None,
            config_path: None,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lfp_display=info".parse()?)
                .add_directive("lfp_display_core=info".parse()?),
        )
        .init();

    let Some(options) = parse_args(std::env::args().skip(1))? else {
        return Ok(());
    };

    run(options)
}

fn print_help() {
    println!("Usage: lfp-display [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --channels N        Channel count (default: 8)");
    println!("  -r, --rate HZ           Sample rate (default: 44100)");
    println!("  -w, --window SECONDS    History window (default: from config, 5.0)");
    println!("  -b, --block N           Samples per block (default: 128)");
    println!("  -d, --duration SECONDS  Run time (default: 10)");
    println!("      --reconfigure N     Switch to N channels halfway through");
    println!("      --config PATH       Load display config from a JSON file");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("{} requires a value", name))
        };
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-v" => {
                println!(
                    "lfp-display {} (built {})",
                    lfp_display::VERSION,
                    lfp_display::BUILD_DATE
                );
                return Ok(None);
            }
            "--channels" | "-c" => {
                let raw = value(arg.as_str())?;
                options.channels = raw.parse().context("invalid channel count")?;
            }
            "--rate" | "-r" => {
                let raw = value(arg.as_str())?;
                options.sample_rate = raw.parse().context("invalid sample rate")?;
            }
            "--window" | "-w" => {
                let window: f64 = value(arg.as_str())?.parse().context("invalid window")?;
                options.window_seconds = Some(window);
            }
            "--block" | "-b" => {
                let raw = value(arg.as_str())?;
                options.block_size = raw.parse().context("invalid block size")?;
                if options.block_size == 0 {
                    anyhow::bail!("block size must be at least 1 sample");
                }
            }
            "--duration" | "-d" => {
                let secs: f64 = value(arg.as_str())?.parse().context("invalid duration")?;
                options.duration = Duration::try_from_secs_f64(secs).context("invalid duration")?;
            }
            "--reconfigure" => {
                options.reconfigure =
                    Some(value(arg.as_str())?.parse().context("invalid channel count")?);
            }
            "--config" => {
                options.config_path = Some(PathBuf::from(value(arg.as_str())?));
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                return Ok(None);
            }
        }
    }

    Ok(Some(options))
}

fn run(options: Options) -> Result<()> {
    let mut config = options
        .config_path
        .as_deref()
        .map(DisplayConfig::load)
        .unwrap_or_default();
    if let Some(window) = options.window_seconds {
        config.window_seconds = window;
    }

    let mut manager = BufferLifecycleManager::with_config(config)?;
    manager.subscribe(|event: &LifecycleEvent| {
        info!(
            event = %serde_json::to_string(event).unwrap_or_default(),
            "Lifecycle event"
        );
    });
    let producer_events = manager.subscribe_channel();

    manager.configure(options.channels, options.sample_rate)?;
    let capacity = manager.enable()?;
    info!(
        channels = options.channels,
        sample_rate = options.sample_rate,
        capacity,
        "Display buffer ready"
    );

    let mut ingest = manager
        .take_ingest()
        .context("ingest handle already taken")?;
    let mut marker_drain = manager
        .take_marker_drain()
        .context("marker drain already taken")?;
    let reader = manager.reader();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    // Producer: simulated acquisition pipeline, paced in real time
    let producer_running = Arc::clone(&running);
    let sample_rate = options.sample_rate;
    let block_size = options.block_size;
    let mut channels = options.channels;
    let producer = std::thread::Builder::new()
        .name("acquisition".into())
        .spawn(move || {
            let mut source = SyntheticSource::new(channels, sample_rate, block_size);
            let block_period = Duration::from_secs_f64(block_size as f64 / sample_rate);
            let mut next_deadline = Instant::now();

            while producer_running.load(Ordering::Relaxed) {
                for event in producer_events.try_iter() {
                    if let LifecycleEventKind::Resized { channels: c, .. } = event.kind {
                        channels = c;
                        source = SyntheticSource::new(channels, sample_rate, block_size);
                    }
                }

                let base = ingest.position();
                let block = source.next_block();
                match ingest.write(block, block_size) {
                    Ok(()) => {
                        for edge in source.edges() {
                            let marker = Marker::new(base + edge.offset as u64, 0, edge.rising);
                            match ingest.push_marker(marker) {
                                Ok(()) => {}
                                Err(BufferError::MarkerQueueFull) => {
                                    debug!(
                                        sample = marker.sample_number,
                                        "Marker queue full, dropping marker"
                                    );
                                }
                                Err(e) => debug!(error = %e, "Marker rejected"),
                            }
                        }
                    }
                    Err(e) if e.is_transient() => {}
                    Err(e) => warn!(error = %e, "Block rejected"),
                }

                next_deadline += block_period;
                if let Some(wait) = next_deadline.checked_duration_since(Instant::now()) {
                    std::thread::sleep(wait);
                }
            }
            ingest.stats()
        })
        .context("spawning acquisition thread")?;

    // Renderer: reads the whole window every tick
    let renderer_running = Arc::clone(&running);
    let renderer = std::thread::Builder::new()
        .name("renderer".into())
        .spawn(move || {
            let mut markers = Vec::new();
            let mut frames = 0u64;
            let mut last_report = Instant::now();
            while renderer_running.load(Ordering::Relaxed) {
                marker_drain.drain(&mut markers);
                if render_tick(&reader) {
                    frames += 1;
                }
                if last_report.elapsed() >= Duration::from_secs(1) {
                    report(&reader, frames, markers.len());
                    markers.clear();
                    last_report = Instant::now();
                }
                std::thread::sleep(RENDER_INTERVAL);
            }
            frames
        })
        .context("spawning renderer thread")?;

    // Main thread: configuration path
    let started = Instant::now();
    let mut reconfigure = options.reconfigure;
    while running.load(Ordering::SeqCst) && started.elapsed() < options.duration {
        if started.elapsed() >= options.duration / 2 {
            if let Some(new_channels) = reconfigure.take() {
                info!(channels = new_channels, "Reconfiguring stream");
                if let Err(e) = manager.configure(new_channels, options.sample_rate) {
                    error!(error = %e, "Reconfiguration failed");
                }
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    running.store(false, Ordering::SeqCst);
    manager.disable();

    let ingest_stats = producer
        .join()
        .map_err(|_| anyhow::anyhow!("acquisition thread panicked"))?;
    let frames = renderer
        .join()
        .map_err(|_| anyhow::anyhow!("renderer thread panicked"))?;

    info!(frames, "Stopped");
    println!("{}", serde_json::to_string_pretty(&ingest_stats)?);
    Ok(())
}

/// Fetch the visible window; `false` means nothing to draw this tick
fn render_tick(reader: &SnapshotReader) -> bool {
    match reader.read_window() {
        Ok(snapshot) => !snapshot.is_empty(),
        Err(e) if e.is_transient() => false,
        Err(e) => {
            warn!(error = %e, "Render read failed");
            false
        }
    }
}

fn report(reader: &SnapshotReader, frames: u64, markers: usize) {
    let Ok(snapshot) = reader.read(0, reader.capacity_samples().min(4096)) else {
        return;
    };
    let peaks: Vec<String> = snapshot
        .channels
        .iter()
        .map(|chan| {
            let peak = chan.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
            format!("{:.2}", peak)
        })
        .collect();
    info!(
        frames,
        markers,
        end_sample = snapshot.end_sample,
        generation = snapshot.generation,
        peaks = %peaks.join(" "),
        "Render status"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse_args(args(&[])).unwrap().unwrap();
        assert_eq!(options.channels, 8);
        assert_eq!(options.block_size, lfp_display::DEFAULT_BLOCK_SIZE);
        assert!(options.reconfigure.is_none());
    }

    #[test]
    fn test_parse_options() {
        let options = parse_args(args(&[
            "-c", "16", "--rate", "30000", "-w", "2.5", "--reconfigure", "4", "-d", "1.5",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(options.channels, 16);
        assert_eq!(options.sample_rate, 30000.0);
        assert_eq!(options.window_seconds, Some(2.5));
        assert_eq!(options.reconfigure, Some(4));
        assert_eq!(options.duration, Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&["--channels"])).is_err());
        assert!(parse_args(args(&["--rate", "fast"])).is_err());
        assert!(parse_args(args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_empty_block() {
        assert!(parse_args(args(&["--block", "0"])).is_err());
        let options = parse_args(args(&["-b", "1"])).unwrap().unwrap();
        assert_eq!(options.block_size, 1);
    }
}
