//! Demo renderer — slices synthetic volumes to PNG files.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --settings <FILE>  JSON view settings (see ViewSettings)
//!   --out <DIR>        Output directory (default: "slices")
//!
//! Output:
//!   <out>/orthogonal.png   axis-aligned slice
//!   <out>/oblique.png      rotated slice through the same coordinate
//!   <out>/montage.png      grid of parallel slices

use std::path::PathBuf;

use glam::Vec3;

use voxslice::color::{LayerColoring, LinearColorMap, LabelTable, ThresholdRule};
use voxslice::core::types::Result;
use voxslice::slice::{
    EdgeMasking, Layer, LayerStack, MontageLayout, SliceRenderer, SliceView, ViewSettings,
};
use voxslice::volume::{DataKind, IndexTransform, Volume};

const DIMS: [usize; 3] = [64, 64, 64];

fn main() {
    voxslice::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let settings_path = parse_str_arg(&args, "--settings");
    let out_dir = PathBuf::from(parse_str_arg(&args, "--out").unwrap_or_else(|| "slices".to_string()));

    if let Err(e) = run(settings_path, out_dir) {
        log::error!("demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(settings_path: Option<String>, out_dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&out_dir)?;

    let settings = match settings_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<ViewSettings>(&text) {
                Ok(s) => {
                    log::info!("loaded view settings from {path}");
                    s
                }
                Err(e) => {
                    log::warn!("bad settings file {path}: {e}; using defaults");
                    default_settings()
                }
            }
        }
        None => default_settings(),
    };

    let anatomy = scalar_volume();
    let regions = label_volume();
    let activity = activity_volume();
    let confidence = confidence_volume();

    let anatomy_map = LinearColorMap::grayscale(0.0, 1.0);
    let activity_map = LinearColorMap {
        min: 0.2,
        max: 1.0,
        low_color: [32, 0, 64],
        high_color: [255, 220, 0],
        transparent_zero: true,
    };
    let labels = region_table();

    let mut stack = LayerStack::new();
    stack.push(Layer::new(
        anatomy.grid(0).expect("anatomy map"),
        LayerColoring::Palette(&anatomy_map),
        1.0,
    ));
    stack.push(
        Layer::new(
            activity.grid(0).expect("activity map"),
            LayerColoring::Palette(&activity_map),
            0.8,
        )
        .with_threshold(
            confidence.grid(0).expect("confidence map"),
            ThresholdRule::show_inside(0.5, 1.0),
        ),
    );
    stack.push(Layer::new(
        regions.grid(0).expect("region map"),
        LayerColoring::Label(&labels),
        0.6,
    ));

    // Axis-aligned slice
    let ortho = SliceRenderer::new(settings.clone()).draw(&stack);
    save(&ortho, &out_dir.join("orthogonal.png"))?;

    // Rotated slice through the same coordinate
    let mut oblique_settings = ViewSettings::oblique(
        settings.view,
        settings.slice_coordinate(),
        [20.0, 0.0, 35.0],
    );
    oblique_settings.edge_masking = EdgeMasking::Loose;
    let oblique = SliceRenderer::new(oblique_settings).draw(&stack);
    save(&oblique, &out_dir.join("oblique.png"))?;

    // Montage of parallel slices
    let layout = MontageLayout {
        rows: 2,
        cols: 3,
        slice_step: 12,
    };
    let montage = SliceRenderer::new(settings.clone()).draw_montage(&stack, &layout);
    save_montage(&montage, &out_dir.join("montage.png"))?;

    // Picking demo: the voxel behind the image center
    let (row, col) = (ortho.rows() / 2, ortho.cols() / 2);
    match ortho.query(row, col) {
        Some(key) => log::info!(
            "center pixel ({row},{col}) -> layer {} voxel {:?}",
            key.volume_index,
            key.ijk
        ),
        None => log::info!("center pixel ({row},{col}) -> nothing drawn"),
    }

    let xyz = settings.slice_coordinate();
    log::info!(
        "wrote {} (slices through ({}, {}, {}))",
        out_dir.display(),
        xyz.x,
        xyz.y,
        xyz.z
    );
    Ok(())
}

fn default_settings() -> ViewSettings {
    let center = DIMS[0] as f32 / 2.0;
    ViewSettings::orthogonal(SliceView::Axial, Vec3::splat(center))
}

fn identity_mm() -> IndexTransform {
    IndexTransform::from_spacing_origin(Vec3::ONE, Vec3::ZERO).expect("axis-aligned transform")
}

/// Radial gradient "anatomy" underlay
fn scalar_volume() -> Volume {
    let center = Vec3::splat(DIMS[0] as f32 / 2.0);
    let radius = DIMS[0] as f32 / 2.0;
    Volume::from_fn("anatomy", DIMS, DataKind::PaletteScalar, identity_mm(), |i, j, k, _| {
        let p = Vec3::new(i as f32, j as f32, k as f32);
        (1.0 - (p - center).length() / radius).max(0.0)
    })
    .expect("anatomy volume")
}

/// Blocky "region" label overlay in one octant
fn label_volume() -> Volume {
    let half = DIMS[0] / 2;
    Volume::from_fn("regions", DIMS, DataKind::Label, identity_mm(), |i, j, k, _| {
        if i >= half && j >= half {
            (1 + (i / 8 % 2) + 2 * (k / 8 % 2)) as f32
        } else {
            0.0
        }
    })
    .expect("region volume")
}

/// Off-center hot spot of "activity"
fn activity_volume() -> Volume {
    let spot = Vec3::new(20.0, 40.0, 32.0);
    Volume::from_fn("activity", DIMS, DataKind::PaletteScalar, identity_mm(), |i, j, k, _| {
        let p = Vec3::new(i as f32, j as f32, k as f32);
        (1.0 - (p - spot).length() / 12.0).max(0.0)
    })
    .expect("activity volume")
}

/// Gate volume: high confidence only near the hot spot core
fn confidence_volume() -> Volume {
    let spot = Vec3::new(20.0, 40.0, 32.0);
    Volume::from_fn("confidence", DIMS, DataKind::PaletteScalar, identity_mm(), |i, j, k, _| {
        let p = Vec3::new(i as f32, j as f32, k as f32);
        if (p - spot).length() < 8.0 { 0.9 } else { 0.1 }
    })
    .expect("confidence volume")
}

fn region_table() -> LabelTable {
    let mut table = LabelTable::new();
    table.insert(1, "region a", [220, 60, 60, 255]);
    table.insert(2, "region b", [60, 200, 90, 255]);
    table.insert(3, "region c", [70, 110, 230, 255]);
    table.insert(4, "region d", [230, 180, 60, 255]);
    table
}

fn save(image: &voxslice::slice::CompositeImage, path: &PathBuf) -> Result<()> {
    image
        .to_image()
        .save(path)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Lay montage cells out in one PNG with a small gap between cells
fn save_montage(montage: &voxslice::slice::Montage, path: &PathBuf) -> Result<()> {
    let gap = 2u32;
    let cell = montage
        .cells()
        .first()
        .map(|c| (c.image.cols() as u32, c.image.rows() as u32))
        .unwrap_or((1, 1));
    let width = montage.cols() as u32 * (cell.0 + gap) - gap;
    let height = montage.rows() as u32 * (cell.1 + gap) - gap;
    let mut sheet = image::RgbaImage::new(width, height);

    for mc in montage.cells() {
        let img = mc.image.to_image();
        let x0 = mc.grid_col as u32 * (cell.0 + gap);
        let y0 = mc.grid_row as u32 * (cell.1 + gap);
        for (x, y, pixel) in img.enumerate_pixels() {
            if x0 + x < width && y0 + y < height {
                sheet.put_pixel(x0 + x, y0 + y, *pixel);
            }
        }
    }

    sheet
        .save(path)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn parse_str_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
