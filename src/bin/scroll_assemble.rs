//! Fills a scroll container from tile artifacts.
//!
//! Tiles covering the ROI are fetched from the mirror into the download directory, then written into every resolution level
//! of the container, depending on `--actions`.

use scroll_lattice::core::{parse_shape_xyz, Point3i, Roi};
use scroll_lattice::storage::{
    process_roi, AssemblyMode, LocalMirror, PyramidAssembler, PyramidConfig, RawTileDecoder,
    StoreConfig, TileArtifacts, VolumeStore,
};

use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Actions {
    /// Only download missing tiles.
    Fetch,
    /// Download missing tiles and write the newly downloaded ones into the container.
    FetchApply,
    /// Write every tile of the ROI into the container. All tiles must already be downloaded.
    Apply,
    /// Log what would be downloaded.
    DryRun,
}

impl From<Actions> for AssemblyMode {
    fn from(actions: Actions) -> Self {
        match actions {
            Actions::Fetch => AssemblyMode::FetchOnly,
            Actions::FetchApply => AssemblyMode::FetchAndApply,
            Actions::Apply => AssemblyMode::Apply,
            Actions::DryRun => AssemblyMode::DryRun,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "scroll-assemble")]
#[command(about = "Fetch scroll tiles and assemble them into a multi-resolution container")]
struct Cli {
    #[arg(long, value_enum, default_value = "fetch-apply")]
    actions: Actions,

    /// Tile mirror, as a directory or a file:// URL
    #[arg(long)]
    url: String,

    /// Where downloaded tiles are kept. Must exist.
    #[arg(long)]
    download_dir: PathBuf,

    /// Container directory
    #[arg(long, default_value = "scroll.db")]
    container: PathBuf,

    /// Region of interest as x0-x1,y0-y1,z0-z1
    #[arg(long, value_parser = Roi::parse_xyz)]
    roi_xyz: Roi,

    /// Full volume shape as width,height,slices. Only needed for a new container.
    #[arg(long, value_parser = parse_shape_xyz)]
    scroll_size_xyz: Option<Point3i>,

    /// Scale factors of the resolution levels
    #[arg(long, value_delimiter = ',', default_value = "1,2,4")]
    levels: Vec<i32>,

    /// File extension of the tile artifacts
    #[arg(long, default_value = "raw")]
    extension: String,
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
    let mode = AssemblyMode::from(cli.actions);
    let config = PyramidConfig {
        scales: cli.levels,
        ..Default::default()
    };
    let artifacts = TileArtifacts::new(
        &cli.download_dir,
        &cli.extension,
        LocalMirror::from_url(&cli.url),
    )?;

    let report = if mode.writes_store() {
        info!("Opening container {:?}", cli.container);
        let mut store = VolumeStore::open(&StoreConfig::at_path(&cli.container))?;
        let report = {
            let assembler = PyramidAssembler::new(&mut store, config, cli.scroll_size_xyz)?;
            assembler.assemble_roi(&cli.roi_xyz, mode, &artifacts, &RawTileDecoder)?
        };
        store.close()?;

        report
    } else {
        process_roi(
            config.grid(),
            &cli.roi_xyz,
            mode,
            &artifacts,
            &RawTileDecoder,
            None::<&PyramidAssembler>,
        )?
    };

    info!(
        "Visited {} tiles: {} fetched, {} assembled, {} skipped",
        report.visited, report.fetched, report.assembled, report.skipped
    );

    Ok(())
}
