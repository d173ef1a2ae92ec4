//! Owned volume data

use crate::core::types::{Result, Vec3};
use crate::core::Error;
use crate::volume::grid::VoxelGrid;
use crate::volume::kind::DataKind;
use crate::volume::transform::IndexTransform;

/// One loaded volume: voxel values for one or more maps plus the
/// geometry needed to place them in world space.
///
/// Storage layout is map-major, then k, j, i, with components innermost.
/// File parsing lives outside this crate; volumes are constructed from
/// already-decoded values.
pub struct Volume {
    name: String,
    dims: [usize; 3],
    kind: DataKind,
    map_count: usize,
    transform: IndexTransform,
    data: Vec<f32>,
}

impl Volume {
    /// Create a volume from raw values.
    ///
    /// `data` holds `map_count` frames of `dims[0] * dims[1] * dims[2] *
    /// kind.components()` values each, i fastest, components innermost.
    pub fn new(
        name: impl Into<String>,
        dims: [usize; 3],
        kind: DataKind,
        map_count: usize,
        transform: IndexTransform,
        data: Vec<f32>,
    ) -> Result<Self> {
        if dims[0] == 0 || dims[1] == 0 || dims[2] == 0 || map_count == 0 {
            return Err(Error::MismatchedDimensions(format!(
                "volume dims {:?} x {} maps must be positive",
                dims, map_count
            )));
        }
        let expected = dims[0] * dims[1] * dims[2] * kind.components() * map_count;
        if data.len() != expected {
            return Err(Error::MismatchedDimensions(format!(
                "expected {} values for dims {:?}, got {}",
                expected,
                dims,
                data.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            dims,
            kind,
            map_count,
            transform,
            data,
        })
    }

    /// Create a single-map volume by evaluating a function at every voxel.
    /// The function receives (i, j, k, component).
    pub fn from_fn(
        name: impl Into<String>,
        dims: [usize; 3],
        kind: DataKind,
        transform: IndexTransform,
        mut f: impl FnMut(usize, usize, usize, usize) -> f32,
    ) -> Result<Self> {
        let components = kind.components();
        let mut data = Vec::with_capacity(dims[0] * dims[1] * dims[2] * components);
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    for c in 0..components {
                        data.push(f(i, j, k, c));
                    }
                }
            }
        }
        Self::new(name, dims, kind, 1, transform, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn map_count(&self) -> usize {
        self.map_count
    }

    pub fn transform(&self) -> &IndexTransform {
        &self.transform
    }

    /// Per-axis voxel spacing in world units
    pub fn spacing(&self) -> Vec3 {
        self.transform.spacing()
    }

    /// Raw value lookup. Returns None when any index is out of range.
    pub fn value(
        &self,
        i: usize,
        j: usize,
        k: usize,
        component: usize,
        map: usize,
    ) -> Option<f32> {
        if i >= self.dims[0]
            || j >= self.dims[1]
            || k >= self.dims[2]
            || component >= self.kind.components()
            || map >= self.map_count
        {
            return None;
        }
        let components = self.kind.components();
        let frame = self.dims[0] * self.dims[1] * self.dims[2] * components;
        let offset = map * frame
            + ((k * self.dims[1] + j) * self.dims[0] + i) * components
            + component;
        Some(self.data[offset])
    }

    /// Borrow a read-only sampling view over one map
    pub fn grid(&self, map: usize) -> Option<VoxelGrid<'_>> {
        VoxelGrid::new(self, map)
    }
}
