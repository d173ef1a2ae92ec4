//! Per-layer sampling of the slice grid

use crate::core::types::Vec3;
use crate::slice::grid::SlicePlane;
use crate::slice::layer::Layer;
use crate::slice::Interpolation;
use crate::volume::{DataKind, VoxelGrid};

/// Result of one layer's lookup at one grid position.
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    /// Raw component values; unused components stay zero
    pub values: [f32; 4],
    /// False when the position fell outside the volume (or was masked)
    pub valid: bool,
    /// Enclosing voxel index, always nearest-neighbor
    pub ijk: [i64; 3],
    /// Co-sampled threshold volume value, when the layer has a gate
    pub threshold: Option<f32>,
}

impl Sample {
    fn invalid() -> Self {
        Self {
            values: [0.0; 4],
            valid: false,
            ijk: [-1, -1, -1],
            threshold: None,
        }
    }
}

/// One layer's samples across the whole slice grid, row-major.
pub struct LayerSamples {
    rows: usize,
    cols: usize,
    samples: Vec<Sample>,
    /// True when RGB components were detected as 0-255 rather than 0-1
    byte_range: bool,
}

impl LayerSamples {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn byte_range(&self) -> bool {
        self.byte_range
    }

    pub fn get(&self, row: usize, col: usize) -> &Sample {
        &self.samples[row * self.cols + col]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.valid).count()
    }

    pub(crate) fn get_mut(&mut self, row: usize, col: usize) -> &mut Sample {
        &mut self.samples[row * self.cols + col]
    }
}

/// Walk the slice grid for one layer, fetching values per the layer's
/// data kind.
///
/// Out-of-bounds positions produce invalid samples; that is the normal
/// state at slice corners, not an error. Labels always sample
/// nearest-neighbor. Scalar layers honor `interpolation`, but the
/// recorded voxel index is the nearest neighbor either way, so
/// identification does not depend on the interpolation mode.
pub fn sample_layer(
    layer: &Layer<'_>,
    plane: &SlicePlane,
    interpolation: Interpolation,
) -> LayerSamples {
    let grid = &layer.grid;
    let rows = plane.rows();
    let cols = plane.cols();
    let mut samples = Vec::with_capacity(rows * cols);

    for (_, _, xyz) in plane.positions() {
        samples.push(sample_at(grid, layer, xyz, interpolation));
    }

    let byte_range = match grid.kind() {
        DataKind::Rgb | DataKind::Rgba => samples
            .iter()
            .filter(|s| s.valid)
            .any(|s| s.values[..3].iter().any(|v| *v > 1.0)),
        _ => false,
    };

    // RGB has no stored alpha; synthesize fully opaque in whichever
    // range the data turned out to be
    if grid.kind() == DataKind::Rgb {
        let opaque = if byte_range { 255.0 } else { 1.0 };
        for s in samples.iter_mut().filter(|s| s.valid) {
            s.values[3] = opaque;
        }
    }

    LayerSamples {
        rows,
        cols,
        samples,
        byte_range,
    }
}

fn sample_at(
    grid: &VoxelGrid<'_>,
    layer: &Layer<'_>,
    xyz: Vec3,
    interpolation: Interpolation,
) -> Sample {
    let ijk = grid.enclosing_voxel(xyz);
    if !grid.index_valid(ijk) {
        return Sample::invalid();
    }

    let mut values = [0.0f32; 4];
    let valid = match grid.kind() {
        DataKind::Label => match grid.value_at(ijk, 0) {
            Some(v) => {
                values[0] = v;
                true
            }
            None => false,
        },
        DataKind::PaletteScalar => {
            let fetched = match interpolation {
                Interpolation::Nearest => grid.value_at(ijk, 0),
                Interpolation::Trilinear => grid.sample_trilinear(xyz, 0),
            };
            match fetched {
                Some(v) => {
                    values[0] = v;
                    true
                }
                None => false,
            }
        }
        DataKind::Rgb | DataKind::Rgba => {
            let mut ok = true;
            for c in 0..grid.kind().components() {
                match grid.value_at(ijk, c) {
                    Some(v) => values[c] = v,
                    None => {
                        ok = false;
                        break;
                    }
                }
            }
            ok
        }
    };

    if !valid {
        return Sample::invalid();
    }

    // The gate volume has its own geometry; sample it at the same
    // world position, not the same index
    let threshold = layer
        .threshold
        .as_ref()
        .and_then(|gate| gate.grid.sample_nearest(xyz, 0));

    Sample {
        values,
        valid,
        ijk,
        threshold,
    }
}
