//! Volume data model: owned voxel storage and per-draw read-only views

pub mod kind;
pub mod transform;
pub mod volume;
pub mod grid;

pub use kind::DataKind;
pub use transform::IndexTransform;
pub use volume::Volume;
pub use grid::VoxelGrid;
