//! Replays a navigation script against a scroll container and writes every rendered frame as a PNG.
//!
//! Each non-empty line of the script is one tick; several events on one tick are separated by `;`, and `#` starts a comment:
//!
//! ```text
//! # pan, then load the new neighborhood
//! drag-start 0 0; drag-end -40 10
//! recenter
//! scroll -8 ctrl; recenter
//! ```

use scroll_lattice::core::{Point3i, PointN};
use scroll_lattice::navigation::{
    is_valid_zoom, FrameOutcome, InputEvent, Navigator, NavigatorConfig, Presenter, Raster,
    ScriptedEvents, MAX_CANVAS_PAD, MAX_ZOOM, MIN_ZOOM,
};
use scroll_lattice::storage::{StoreConfig, VolumeStore};

use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "scroll-navigate")]
#[command(about = "Render oblique slices of a scroll container from an event script")]
struct Cli {
    /// Container directory
    #[arg(long, default_value = "scroll.db")]
    container: PathBuf,

    /// Starting position as y,x,z in base voxels. Defaults to the center of the volume.
    #[arg(long, value_parser = parse_position)]
    position: Option<Point3i>,

    /// Display pixels per base voxel
    #[arg(long, default_value_t = 1.0, value_parser = parse_zoom)]
    zoom: f64,

    /// Half the edge length of the rendered frames
    #[arg(long, default_value_t = 150, value_parser = clap::value_parser!(i32).range(0..=MAX_CANVAS_PAD as i64))]
    canvas_pad: i32,

    /// Event script. Without one, a single frame is rendered.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Where frames are written. Without one, frames are only rendered.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

fn parse_position(text: &str) -> Result<Point3i, String> {
    let coords = text
        .split(',')
        .map(|c| c.trim().parse::<i32>().map_err(|e| format!("{:?}: {}", text, e)))
        .collect::<Result<Vec<_>, _>>()?;

    match coords[..] {
        [y, x, z] => Ok(PointN([y, x, z])),
        _ => Err(format!("{:?}: expected y,x,z", text)),
    }
}

fn parse_zoom(text: &str) -> Result<f64, String> {
    let zoom = text
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("{:?}: {}", text, e))?;
    if !is_valid_zoom(zoom) {
        return Err(format!("{} is outside [{}, {}]", zoom, MIN_ZOOM, MAX_ZOOM));
    }

    Ok(zoom)
}

fn parse_script(text: &str) -> Result<Vec<Vec<InputEvent>>, Box<dyn Error>> {
    let mut ticks = Vec::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let events = line
            .split(';')
            .map(|event| event.parse::<InputEvent>())
            .collect::<Result<Vec<_>, _>>()?;
        ticks.push(events);
    }

    Ok(ticks)
}

/// Saves every frame as a grayscale PNG, numbered by tick.
struct PngPresenter {
    output_dir: Option<PathBuf>,
    tick: usize,
}

impl Presenter for PngPresenter {
    fn present(&mut self, frame: Option<&Raster<u8>>, outcome: &FrameOutcome) {
        let tick = self.tick;
        self.tick += 1;

        if let FrameOutcome::CannotRender(e) = outcome {
            warn!("Tick {} shows the previous frame: {}", tick, e);
        }
        let (dir, frame) = match (&self.output_dir, frame) {
            (Some(dir), Some(frame)) => (dir, frame),
            _ => return,
        };

        let path = dir.join(format!("frame_{:05}.png", tick));
        let image = image::GrayImage::from_raw(
            frame.cols() as u32,
            frame.rows() as u32,
            frame.pixels().to_vec(),
        );
        match image.map(|image| image.save(&path)) {
            Some(Ok(())) => info!("Wrote {:?}", path),
            Some(Err(e)) => warn!("Failed to write {:?}: {}", path, e),
            None => warn!("Frame {} has inconsistent dimensions", tick),
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let ticks = match &cli.script {
        Some(path) => parse_script(&fs::read_to_string(path)?)?,
        None => vec![Vec::new()],
    };
    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)?;
    }

    let config = NavigatorConfig {
        canvas_pad: cli.canvas_pad,
        tick_interval: Duration::from_millis(cli.tick_ms),
        ..Default::default()
    };
    let store = VolumeStore::open_existing(&StoreConfig::at_path(&cli.container))?;
    let navigator = Navigator::new(store, config, cli.position, cli.zoom)?;
    info!(
        "Navigating {:?} from {:?}",
        cli.container,
        navigator.state().position().0
    );

    let mut events = ScriptedEvents::new(ticks);
    let mut presenter = PngPresenter {
        output_dir: cli.output_dir,
        tick: 0,
    };
    navigator.run(&mut events, &mut presenter)?;

    Ok(())
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
