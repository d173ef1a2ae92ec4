//! Slice extraction pipeline: plane geometry, per-layer sampling,
//! compositing, and pixel-to-voxel identification.

pub mod grid;
pub mod layer;
pub mod sampler;
pub mod compositor;
pub mod identification;
pub mod renderer;

pub use grid::SlicePlane;
pub use layer::{Layer, LayerStack, ThresholdGate};
pub use sampler::{LayerSamples, Sample};
pub use compositor::{CompositeImage, Rgba8, SliceCompositor};
pub use identification::{IdentificationIndexer, VoxelKey};
pub use renderer::{Montage, MontageLayout, SliceRenderer, ViewSettings};

use serde::{Deserialize, Serialize};

/// Anatomical view plane a slice is taken along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceView {
    /// XY plane, normal along +Z
    Axial,
    /// XZ plane, normal along +Y
    Coronal,
    /// YZ plane, normal along +X
    Parasagittal,
}

/// How the cutting plane is oriented relative to the volume axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceProjection {
    /// Plane aligned to the volume axes at the slice coordinate
    #[default]
    Orthogonal,
    /// Plane rotated by the current viewing rotation
    Oblique,
}

/// Value interpolation when sampling scalar volumes.
///
/// Label volumes always sample nearest-neighbor; identification reports
/// the nearest voxel regardless of this setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Nearest,
    Trilinear,
}

/// Suppression of samples near a volume boundary, where interpolation
/// against missing data produces visible edge artifacts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMasking {
    /// Only the sample's own bounds check applies
    #[default]
    Off,
    /// Invalidate samples with an out-of-bounds edge-adjacent neighbor
    Loose,
    /// Invalidate samples with any out-of-bounds neighbor, diagonals included
    Tight,
}
