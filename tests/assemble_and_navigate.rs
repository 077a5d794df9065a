use scroll_lattice::prelude::*;
use scroll_lattice::storage::{LocalMirror, RawTileDecoder};

use pretty_assertions::assert_eq;
use std::time::Duration;
use tempdir::TempDir;
use utilities::compare::max_abs_difference;
use utilities::data_sets::{gradient_value, gradient_volume, write_gradient_tiles};

const SHAPE: Point3i = PointN([41, 36, 20]);

fn config() -> PyramidConfig {
    PyramidConfig {
        tile_edge: 16,
        chunk_shape: Point3i::fill(8),
        ..Default::default()
    }
}

fn whole_volume(shape: Point3i) -> Roi {
    Roi::new(0, shape.y(), 0, shape.x(), 0, shape.z())
}

/// Mirrors gradient tiles for a whole volume of `shape` and assembles them into the container of `dirs`.
fn assemble_gradient(dirs: &Dirs, config: PyramidConfig, shape: Point3i) -> AssemblyReport {
    let volume = Extent3i::from_min_and_shape(Point3i::ZERO, shape);
    let roi = whole_volume(shape);
    write_gradient_tiles(dirs.mirror.path(), config.grid(), &roi, &volume, "raw").unwrap();

    let mut store = VolumeStore::open(&StoreConfig::at_path(dirs.container_path())).unwrap();
    let report = {
        let assembler = PyramidAssembler::new(&mut store, config, Some(shape)).unwrap();
        let artifacts =
            TileArtifacts::new(dirs.download.path(), "raw", LocalMirror::new(dirs.mirror.path()))
                .unwrap();
        assembler
            .assemble_roi(&roi, AssemblyMode::FetchAndApply, &artifacts, &RawTileDecoder)
            .unwrap()
    };
    store.close().unwrap();

    report
}

/// The base level must be the gradient exactly. Every coarser voxel must be the rounded mean of the base voxels it covers;
/// coarse levels may be built from each other, so one unit of rounding drift is allowed.
fn check_gradient_pyramid(store: &VolumeStore, shape: Point3i, coarse_scales: &[i32]) {
    let base = Extent3i::from_min_and_shape(Point3i::ZERO, shape);
    assert_eq!(store.dataset(1).unwrap().bounds(), base);
    let level1 = store.read_box(1, &base).unwrap();
    assert_eq!(max_abs_difference(&level1, &gradient_volume(base)), 0);

    for &scale in coarse_scales.iter() {
        let schema = store.dataset(scale).unwrap();
        assert_eq!(schema.shape, shape.scalar_div_ceil(scale));

        let level = store.read_box(scale, &schema.bounds()).unwrap();
        let expected = Array3::fill_with(schema.bounds(), |q| {
            let block = Extent3i::from_min_and_shape(q * scale, Point3i::fill(scale)).intersection(&base);
            let sum: f64 = block.iter_points().map(|p| f64::from(gradient_value(p))).sum();
            (sum / block.num_points() as f64).round() as u16
        });
        let difference = max_abs_difference(&level, &expected);
        assert!(difference <= 1, "scale {} is off by {}", scale, difference);
    }
}

struct Dirs {
    mirror: TempDir,
    download: TempDir,
    container: TempDir,
}

impl Dirs {
    fn new() -> Self {
        Self {
            mirror: TempDir::new("mirror").unwrap(),
            download: TempDir::new("download").unwrap(),
            container: TempDir::new("container").unwrap(),
        }
    }

    fn container_path(&self) -> std::path::PathBuf {
        self.container.path().join("scroll.db")
    }

    fn assemble(&self) -> AssemblyReport {
        assemble_gradient(self, config(), SHAPE)
    }
}

#[test]
fn gradient_pyramid_end_to_end() {
    let dirs = Dirs::new();

    let report = dirs.assemble();
    assert_eq!(
        report,
        AssemblyReport {
            visited: 18,
            fetched: 18,
            assembled: 18,
            skipped: 0
        }
    );

    let store = VolumeStore::open_existing(&StoreConfig::at_path(dirs.container_path())).unwrap();
    assert_eq!(store.dataset_scales(), vec![1, 2, 4]);
    // Tile edges are multiples of every scale, so no block straddles two tiles.
    check_gradient_pyramid(&store, SHAPE, &[2, 4]);
}

// Full-size tiles and chunks, with a volume that is not a multiple of the tile edge on two axes. Slow, and needs a few hundred
// MB of scratch space.
#[test]
#[ignore]
fn default_geometry_pyramid() {
    let shape = PointN([520, 510, 260]);
    let dirs = Dirs::new();

    let report = assemble_gradient(&dirs, PyramidConfig::default(), shape);
    assert_eq!(
        report,
        AssemblyReport {
            visited: 4,
            fetched: 4,
            assembled: 4,
            skipped: 0
        }
    );

    let store = VolumeStore::open_existing(&StoreConfig::at_path(dirs.container_path())).unwrap();
    assert_eq!(store.dataset_scales(), vec![1, 2, 4]);
    check_gradient_pyramid(&store, shape, &[2, 4]);
}

#[test]
fn second_pass_only_skips() {
    let dirs = Dirs::new();
    dirs.assemble();

    let report = dirs.assemble();

    assert_eq!(
        report,
        AssemblyReport {
            visited: 18,
            fetched: 0,
            assembled: 0,
            skipped: 18
        }
    );
}

fn navigator_config() -> NavigatorConfig {
    NavigatorConfig {
        canvas_pad: 6,
        tick_interval: Duration::from_millis(0),
        color_window: ColorWindow { min: 0, max: 255 },
        face_marker: None,
        ..Default::default()
    }
}

#[test]
fn navigate_assembled_container() {
    let dirs = Dirs::new();
    dirs.assemble();
    let store = VolumeStore::open_existing(&StoreConfig::at_path(dirs.container_path())).unwrap();

    let mut navigator = Navigator::new(store, navigator_config(), None, 1.0).unwrap();
    assert_eq!(navigator.state().position(), PointN([20, 18, 10]));

    assert!(matches!(navigator.tick(Vec::new()), FrameOutcome::Rendered));
    let frame = navigator.last_frame().unwrap();
    assert_eq!(u16::from(*frame.get(6, 6)), gradient_value(PointN([20, 18, 10])));

    // Zooming out far enough switches to the half-resolution level, which shows the same neighborhood.
    navigator.tick(vec![
        InputEvent::Scroll {
            delta: -8,
            modifiers: Modifiers::CTRL,
        },
        InputEvent::Recenter,
    ]);
    assert_eq!(navigator.window().unwrap().scale(), 2);
    let center = f64::from(*navigator.last_frame().unwrap().get(6, 6));
    assert!((center - f64::from(gradient_value(PointN([20, 18, 10])))).abs() <= 4.0);
}

#[test]
fn double_recenter_changes_nothing() {
    let dirs = Dirs::new();
    dirs.assemble();
    let store = VolumeStore::open_existing(&StoreConfig::at_path(dirs.container_path())).unwrap();
    let mut navigator = Navigator::new(store, navigator_config(), None, 1.0).unwrap();

    navigator.tick(vec![
        InputEvent::Scroll {
            delta: 3,
            modifiers: Modifiers::SHIFT,
        },
        InputEvent::DragStart {
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::NONE,
        },
        InputEvent::DragEnd { x: 3.0, y: -2.0 },
        InputEvent::Recenter,
    ]);
    let first = (navigator.state().clone(), navigator.render_raw().unwrap());

    navigator.tick(vec![InputEvent::Recenter]);

    assert_eq!(navigator.state(), &first.0);
    assert_eq!(navigator.render_raw().unwrap(), first.1);
}

#[test]
fn scripted_session_closes_store() {
    let dirs = Dirs::new();
    dirs.assemble();
    let store = VolumeStore::open_existing(&StoreConfig::at_path(dirs.container_path())).unwrap();
    let navigator = Navigator::new(store, navigator_config(), Some(PointN([8, 8, 8])), 1.0).unwrap();

    struct Count(usize);
    impl Presenter for Count {
        fn present(&mut self, frame: Option<&Raster<u8>>, _outcome: &FrameOutcome) {
            assert!(frame.is_some());
            self.0 += 1;
        }
    }

    let mut events = scroll_lattice::navigation::ScriptedEvents::new(vec![
        vec!["rotate90 z".parse::<InputEvent>().unwrap()],
        vec!["scroll 1".parse::<InputEvent>().unwrap(), InputEvent::Recenter],
    ]);
    let mut count = Count(0);
    navigator.run(&mut events, &mut count).unwrap();
    assert_eq!(count.0, 2);

    // The container can be reopened once the navigator has closed it.
    assert!(VolumeStore::open_existing(&StoreConfig::at_path(dirs.container_path())).is_ok());
}
