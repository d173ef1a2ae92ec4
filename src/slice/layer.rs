//! Layer configuration for compositing

use crate::color::{LayerColoring, ThresholdRule};
use crate::core::types::{Result, Vec3};
use crate::core::Error;
use crate::math::Aabb;
use crate::volume::{DataKind, VoxelGrid};

/// Gate a layer's visibility on a second volume's values.
///
/// The threshold volume is sampled at the same world position as the
/// color source through its own grid; the two may differ in dimensions
/// and spacing.
pub struct ThresholdGate<'a> {
    pub grid: VoxelGrid<'a>,
    pub rule: ThresholdRule,
}

/// One volume layer to be composited onto a slice.
pub struct Layer<'a> {
    pub grid: VoxelGrid<'a>,
    pub coloring: LayerColoring<'a>,
    pub opacity: f32,
    pub threshold: Option<ThresholdGate<'a>>,
}

impl<'a> Layer<'a> {
    pub fn new(grid: VoxelGrid<'a>, coloring: LayerColoring<'a>, opacity: f32) -> Self {
        Self {
            grid,
            coloring,
            opacity,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, grid: VoxelGrid<'a>, rule: ThresholdRule) -> Self {
        self.threshold = Some(ThresholdGate { grid, rule });
        self
    }

    /// Check that the coloring mode can render the grid's data kind
    pub fn validate(&self) -> Result<()> {
        match (self.grid.kind(), &self.coloring) {
            (DataKind::Label, LayerColoring::Label(_))
            | (DataKind::PaletteScalar, LayerColoring::Palette(_))
            | (DataKind::Rgb, LayerColoring::PassThrough)
            | (DataKind::Rgba, LayerColoring::PassThrough) => Ok(()),
            (kind, _) => Err(Error::UnsupportedDataType(format!(
                "{kind:?} data cannot be drawn with the configured coloring"
            ))),
        }
    }
}

/// Layers for one slice in back-to-front draw order: the underlay is
/// first, overlays follow. The order is supplied by the caller and is
/// never reordered; both blending and identification depend on it.
#[derive(Default)]
pub struct LayerStack<'a> {
    layers: Vec<Layer<'a>>,
}

impl<'a> LayerStack<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn push(&mut self, layer: Layer<'a>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Back-to-front iteration
    pub fn iter(&self) -> impl Iterator<Item = &Layer<'a>> {
        self.layers.iter()
    }

    /// Union of all layers' world bounds
    pub fn combined_bounds(&self) -> Option<Aabb> {
        self.layers
            .iter()
            .map(|l| l.grid.bounds())
            .reduce(|a, b| a.merged(&b))
    }

    /// Smallest voxel spacing across all layers, used as the sampling
    /// step so no layer is undersampled
    pub fn min_spacing(&self) -> Option<f32> {
        self.layers
            .iter()
            .map(|l| {
                let s: Vec3 = l.grid.spacing();
                s.x.min(s.y).min(s.z)
            })
            .filter(|s| *s > 0.0)
            .reduce(f32::min)
    }
}
