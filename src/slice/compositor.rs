//! Layer compositing into the final slice image

use bytemuck::{Pod, Zeroable};

use crate::slice::identification::{IdentificationIndexer, VoxelKey};
use crate::slice::sampler::LayerSamples;
use crate::slice::EdgeMasking;

/// Single output pixel - exactly 4 bytes, safe to hand to a rasterizer
/// as a raw byte buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8 {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Composited slice: RGBA pixels plus the parallel identification
/// buffer mapping each visible pixel back to its source voxel.
///
/// Row 0 is the bottom row of the slice grid. Owned by one draw; the
/// caller keeps it for rasterization and for picking queries against
/// the drawn frame, and rebuilds it on any state change.
pub struct CompositeImage {
    rows: usize,
    cols: usize,
    pixels: Vec<Rgba8>,
    identification: IdentificationIndexer,
}

impl CompositeImage {
    /// Fully transparent image with an empty identification buffer
    pub fn transparent(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            pixels: vec![Rgba8::TRANSPARENT; rows * cols],
            identification: IdentificationIndexer::new(rows, cols),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn pixel(&self, row: usize, col: usize) -> Rgba8 {
        self.pixels[row * self.cols + col]
    }

    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// Raw bytes, row-major RGBA
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn identification(&self) -> &IdentificationIndexer {
        &self.identification
    }

    /// Picking query for one pixel of this drawn frame
    pub fn query(&self, row: usize, col: usize) -> Option<VoxelKey> {
        self.identification.query(row, col)
    }

    /// Convert for PNG output. The slice grid's row 0 is at the bottom
    /// while image rows run top-down, so rows are flipped here.
    pub fn to_image(&self) -> image::RgbaImage {
        let mut img = image::RgbaImage::new(self.cols as u32, self.rows as u32);
        for (row, col, pixel) in self
            .pixels
            .iter()
            .enumerate()
            .map(|(i, p)| (i / self.cols, i % self.cols, p))
        {
            let y = (self.rows - 1 - row) as u32;
            img.put_pixel(col as u32, y, image::Rgba(pixel.to_array()));
        }
        img
    }
}

/// Accumulates layers back-to-front into a [`CompositeImage`].
///
/// Layers must share the slice's grid dimensions; a mismatched layer is
/// a programming error upstream and is skipped defensively in release
/// builds.
pub struct SliceCompositor {
    rows: usize,
    cols: usize,
    /// Premultiplied RGB + alpha accumulator
    accum: Vec<[f32; 4]>,
    identification: IdentificationIndexer,
}

impl SliceCompositor {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            accum: vec![[0.0; 4]; rows * cols],
            identification: IdentificationIndexer::new(rows, cols),
        }
    }

    /// Blend one layer over the accumulated image.
    ///
    /// `colors` holds the layer's resolved RGBA per grid position,
    /// row-major, aligned with `samples`. Pixels contributing alpha
    /// also overwrite the identification entry, so after all layers the
    /// entry reflects the topmost visible layer.
    pub fn add_layer(
        &mut self,
        volume_index: usize,
        map_index: usize,
        samples: &LayerSamples,
        colors: &[[u8; 4]],
    ) {
        debug_assert_eq!(samples.rows(), self.rows);
        debug_assert_eq!(samples.cols(), self.cols);
        debug_assert_eq!(colors.len(), self.rows * self.cols);
        if samples.rows() != self.rows
            || samples.cols() != self.cols
            || colors.len() != self.rows * self.cols
        {
            log::warn!(
                "layer {} grid {}x{} does not match slice {}x{}; skipped",
                volume_index,
                samples.rows(),
                samples.cols(),
                self.rows,
                self.cols
            );
            return;
        }

        for row in 0..self.rows {
            for col in 0..self.cols {
                let idx = row * self.cols + col;
                let rgba = colors[idx];
                if rgba[3] == 0 {
                    continue;
                }
                let sample = samples.get(row, col);
                if !sample.valid {
                    continue;
                }

                let alpha = rgba[3] as f32 / 255.0;
                let acc = &mut self.accum[idx];
                let keep = 1.0 - alpha;
                acc[0] = rgba[0] as f32 / 255.0 * alpha + acc[0] * keep;
                acc[1] = rgba[1] as f32 / 255.0 * alpha + acc[1] * keep;
                acc[2] = rgba[2] as f32 / 255.0 * alpha + acc[2] * keep;
                acc[3] = alpha + acc[3] * keep;

                self.identification.record(
                    row,
                    col,
                    VoxelKey {
                        volume_index,
                        map_index,
                        ijk: sample.ijk,
                    },
                );
            }
        }
    }

    /// Resolve the accumulator into the final image
    pub fn finish(self) -> CompositeImage {
        let pixels = self
            .accum
            .iter()
            .map(|acc| {
                let a = acc[3];
                if a <= 0.0 {
                    Rgba8::TRANSPARENT
                } else {
                    // Un-premultiply back to straight alpha
                    let to_byte = |v: f32| (v / a * 255.0).round().clamp(0.0, 255.0) as u8;
                    Rgba8::new(
                        to_byte(acc[0]),
                        to_byte(acc[1]),
                        to_byte(acc[2]),
                        (a * 255.0).round().clamp(0.0, 255.0) as u8,
                    )
                }
            })
            .collect();

        CompositeImage {
            rows: self.rows,
            cols: self.cols,
            pixels,
            identification: self.identification,
        }
    }
}

/// Invalidate samples whose neighborhood reaches outside the layer's
/// volume, hiding the hard edge interpolation would otherwise produce
/// at slice boundaries.
///
/// `Loose` checks the 4 edge-adjacent grid neighbors, `Tight` all 8.
/// Neighbors beyond the sampling grid itself are ignored; only the
/// layer's own bounds can mask. Masking never turns an invalid sample
/// valid, so the valid set can only shrink as masking tightens.
pub fn apply_edge_mask(samples: &mut LayerSamples, masking: EdgeMasking) {
    let offsets: &[(i64, i64)] = match masking {
        EdgeMasking::Off => return,
        EdgeMasking::Loose => &[(0, 1), (0, -1), (1, 0), (-1, 0)],
        EdgeMasking::Tight => &[
            (0, 1),
            (0, -1),
            (1, 0),
            (-1, 0),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ],
    };

    let rows = samples.rows() as i64;
    let cols = samples.cols() as i64;
    let mut masked = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if !samples.get(row as usize, col as usize).valid {
                continue;
            }
            let exposed = offsets.iter().any(|(dr, dc)| {
                let (nr, nc) = (row + dr, col + dc);
                nr >= 0
                    && nr < rows
                    && nc >= 0
                    && nc < cols
                    && !samples.get(nr as usize, nc as usize).valid
            });
            if exposed {
                masked.push((row as usize, col as usize));
            }
        }
    }
    for (row, col) in masked {
        samples.get_mut(row, col).valid = false;
    }
}
