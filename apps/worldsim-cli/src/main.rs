use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use worldsim_client::{ClientConfig, RefreshClock, RenderClient};
use worldsim_common::{Entity, Frame};
use worldsim_render::{DebugTextRenderer, RasterRenderer, Renderer, Surface};
use worldsim_stream::{ServerEvent, TcpChannel, decode_line};

#[derive(Parser)]
#[command(name = "worldsim-cli", about = "Headless tool for the worldsim viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Paint a frame read from a JSON file
    Render {
        /// Update payload, `update` envelope, or a bare array of characters
        #[arg(short, long)]
        input: PathBuf,
        /// Write the painted surface as a PPM image
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print a text dump of the frame
        #[arg(long)]
        text: bool,
        #[arg(long, default_value = "500")]
        width: u32,
        #[arg(long, default_value = "500")]
        height: u32,
    },
    /// Run the client against a live snapshot source without a window
    Watch {
        /// Address of the snapshot source
        #[arg(short, long, default_value = "127.0.0.1:5000")]
        server: String,
        /// Number of display refreshes to run the request loop for
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Simulated display refresh rate
        #[arg(long, default_value = "60")]
        hz: u32,
        /// Write the final surface as a PPM image
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "500")]
        width: u32,
        #[arg(long, default_value = "500")]
        height: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("worldsim-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", worldsim_common::crate_info());
            println!("render: {}", worldsim_render::crate_info());
            println!("stream: {}", worldsim_stream::crate_info());
            println!("client: {}", worldsim_client::crate_info());
        }
        Commands::Render {
            input,
            output,
            text,
            width,
            height,
        } => {
            let frame = load_frame(&input)?;

            if text {
                print!("{}", DebugTextRenderer::new().render(&frame));
            }

            let mut raster = RasterRenderer::new(Surface::new(width, height)?);
            let stats = raster.render(&frame);
            println!(
                "Rendered {} entities: painted={} skipped={}",
                frame.len(),
                stats.painted,
                stats.skipped
            );

            if let Some(path) = output {
                write_ppm(raster.surface(), &path)?;
                println!("Wrote {}", path.display());
            }
        }
        Commands::Watch {
            server,
            frames,
            hz,
            output,
            width,
            height,
        } => {
            let config = ClientConfig {
                server,
                surface_width: width,
                surface_height: height,
                ..ClientConfig::default()
            };
            let channel = TcpChannel::open(config.server.clone())?;
            let mut client = RenderClient::from_config(&config, channel, RefreshClock::new())?;
            let interval = Duration::from_secs_f64(1.0 / hz.max(1) as f64);

            tracing::info!(server = %config.server, frames, hz, "watching");
            client.start();
            run_refreshes(&mut client, frames, interval);
            client.pause();
            // Requests already in flight may still be answered.
            run_refreshes(&mut client, u64::from(hz.max(1) / 4).max(1), interval);

            let stats = client.stats();
            println!(
                "Requests: {} (failed {}), frames painted: {}, invalid: {}, connection losses: {}",
                stats.requests_emitted,
                stats.emit_failures,
                stats.frames_painted,
                stats.invalid_frames,
                stats.connection_losses
            );
            println!(
                "Last frame: date={} {}",
                client.last_date().unwrap_or("unknown"),
                client.last_census()
            );

            if let Some(path) = output {
                write_ppm(client.surface(), &path)?;
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

fn run_refreshes(
    client: &mut RenderClient<TcpChannel, RefreshClock>,
    count: u64,
    interval: Duration,
) {
    for _ in 0..count {
        let began = Instant::now();
        client.refresh();
        thread::sleep(interval.saturating_sub(began.elapsed()));
    }
}

/// Accepts an update payload, a full `update` envelope, or a bare character
/// array as written by the simulation's progress snapshots.
fn load_frame(path: &Path) -> Result<Frame> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    if value.is_array() {
        let entities: Vec<Entity> = serde_json::from_value(value)?;
        return Ok(Frame::new(entities));
    }
    if value.get("event").is_some() {
        return match decode_line(&raw)? {
            ServerEvent::Update(frame) => Ok(frame),
            ServerEvent::Other(name) => anyhow::bail!("expected an `update` event, found `{name}`"),
        };
    }
    Ok(serde_json::from_value(value)?)
}

fn write_ppm(surface: &Surface, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    surface.write_ppm(BufWriter::new(file))?;
    Ok(())
}
