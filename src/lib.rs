//! Voxslice - oblique volume slice rendering engine
//!
//! Resamples layered 3D voxel volumes along an arbitrary cutting plane
//! into a composited RGBA image, with a per-pixel identification buffer
//! for picking the source voxel behind any visible pixel.

pub mod core;
pub mod math;
pub mod volume;
pub mod color;
pub mod slice;
