//! Read-only per-draw sampling view over one volume map

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::volume::kind::DataKind;
use crate::volume::transform::IndexTransform;
use crate::volume::volume::Volume;

/// Borrowed view of one map of a [`Volume`] used during a single draw
/// pass. Holds no state beyond the borrow; constructing one is free.
#[derive(Clone, Copy)]
pub struct VoxelGrid<'a> {
    volume: &'a Volume,
    map: usize,
}

impl<'a> VoxelGrid<'a> {
    /// View over `map` of `volume`; None when the map does not exist.
    pub fn new(volume: &'a Volume, map: usize) -> Option<Self> {
        if map >= volume.map_count() {
            return None;
        }
        Some(Self { volume, map })
    }

    pub fn name(&self) -> &str {
        self.volume.name()
    }

    pub fn kind(&self) -> DataKind {
        self.volume.kind()
    }

    pub fn dims(&self) -> [usize; 3] {
        self.volume.dims()
    }

    pub fn map_index(&self) -> usize {
        self.map
    }

    pub fn transform(&self) -> &IndexTransform {
        self.volume.transform()
    }

    pub fn spacing(&self) -> Vec3 {
        self.volume.spacing()
    }

    /// Value lookup with signed indices; out of bounds yields None.
    pub fn value_at(&self, ijk: [i64; 3], component: usize) -> Option<f32> {
        if !self.index_valid(ijk) {
            return None;
        }
        self.volume.value(
            ijk[0] as usize,
            ijk[1] as usize,
            ijk[2] as usize,
            component,
            self.map,
        )
    }

    /// True when the index addresses a voxel inside the volume
    pub fn index_valid(&self, ijk: [i64; 3]) -> bool {
        let dims = self.volume.dims();
        ijk[0] >= 0
            && ijk[1] >= 0
            && ijk[2] >= 0
            && (ijk[0] as usize) < dims[0]
            && (ijk[1] as usize) < dims[1]
            && (ijk[2] as usize) < dims[2]
    }

    /// Index of the voxel enclosing a world position (unclamped)
    pub fn enclosing_voxel(&self, xyz: Vec3) -> [i64; 3] {
        self.volume.transform().enclosing_voxel(xyz)
    }

    /// World position of a voxel center
    pub fn index_to_world(&self, ijk: [i64; 3]) -> Vec3 {
        self.volume.transform().index_to_world(ijk)
    }

    /// Nearest-neighbor sample at a world position
    pub fn sample_nearest(&self, xyz: Vec3, component: usize) -> Option<f32> {
        self.value_at(self.enclosing_voxel(xyz), component)
    }

    /// Trilinear sample at a world position.
    ///
    /// Requires the full 8-voxel neighborhood to be in bounds; near the
    /// volume boundary this returns None rather than blending against
    /// data that does not exist.
    pub fn sample_trilinear(&self, xyz: Vec3, component: usize) -> Option<f32> {
        let idx = self.volume.transform().world_to_index(xyz);
        let base = [
            idx.x.floor() as i64,
            idx.y.floor() as i64,
            idx.z.floor() as i64,
        ];
        let frac = Vec3::new(
            idx.x - base[0] as f32,
            idx.y - base[1] as f32,
            idx.z - base[2] as f32,
        );

        let mut corners = [0.0f32; 8];
        for (n, corner) in corners.iter_mut().enumerate() {
            let ijk = [
                base[0] + (n as i64 & 1),
                base[1] + ((n as i64 >> 1) & 1),
                base[2] + ((n as i64 >> 2) & 1),
            ];
            *corner = self.value_at(ijk, component)?;
        }

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let x00 = lerp(corners[0], corners[1], frac.x);
        let x10 = lerp(corners[2], corners[3], frac.x);
        let x01 = lerp(corners[4], corners[5], frac.x);
        let x11 = lerp(corners[6], corners[7], frac.x);
        let y0 = lerp(x00, x10, frac.y);
        let y1 = lerp(x01, x11, frac.y);
        Some(lerp(y0, y1, frac.z))
    }

    /// World-space box spanned by the voxel cells (half a voxel beyond
    /// the outermost centers on every axis)
    pub fn bounds(&self) -> Aabb {
        let dims = self.volume.dims();
        let half = self.spacing() * 0.5;
        let mut aabb = Aabb::new(Vec3::splat(f32::MAX), Vec3::splat(f32::MIN));
        for corner in 0..8u8 {
            let ijk = [
                if corner & 1 != 0 { dims[0] as i64 - 1 } else { 0 },
                if corner & 2 != 0 { dims[1] as i64 - 1 } else { 0 },
                if corner & 4 != 0 { dims[2] as i64 - 1 } else { 0 },
            ];
            aabb.expand(self.index_to_world(ijk));
        }
        Aabb::new(aabb.min - half, aabb.max + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mat4;

    fn scalar_volume() -> Volume {
        let t = IndexTransform::from_matrix(Mat4::IDENTITY).unwrap();
        Volume::from_fn("s", [4, 4, 4], DataKind::PaletteScalar, t, |i, j, k, _| {
            (i + j + k) as f32
        })
        .unwrap()
    }

    #[test]
    fn test_nearest_in_bounds() {
        let v = scalar_volume();
        let g = v.grid(0).unwrap();
        assert_eq!(g.sample_nearest(Vec3::new(1.2, 2.4, 3.4), 0), Some(6.0));
    }

    #[test]
    fn test_one_step_beyond_max_is_invalid() {
        let v = scalar_volume();
        let g = v.grid(0).unwrap();
        // One voxel step past the last index on each axis
        assert_eq!(g.sample_nearest(Vec3::new(4.0, 0.0, 0.0), 0), None);
        assert_eq!(g.sample_nearest(Vec3::new(0.0, 4.0, 0.0), 0), None);
        assert_eq!(g.sample_nearest(Vec3::new(0.0, 0.0, 4.0), 0), None);
        assert_eq!(g.sample_nearest(Vec3::new(-1.0, 0.0, 0.0), 0), None);
    }

    #[test]
    fn test_trilinear_matches_linear_field() {
        let v = scalar_volume();
        let g = v.grid(0).unwrap();
        // The field i+j+k is linear, so trilinear must reproduce it exactly
        let p = Vec3::new(1.25, 2.5, 0.75);
        let got = g.sample_trilinear(p, 0).unwrap();
        assert!((got - (p.x + p.y + p.z)).abs() < 1e-5);
    }

    #[test]
    fn test_trilinear_needs_full_neighborhood() {
        let v = scalar_volume();
        let g = v.grid(0).unwrap();
        // Past the last voxel center: the upper corner row is missing
        assert_eq!(g.sample_trilinear(Vec3::new(3.5, 0.0, 0.0), 0), None);
        // Nearest still resolves there
        assert_eq!(g.sample_nearest(Vec3::new(3.4, 0.0, 0.0), 0), Some(3.0));
    }

    #[test]
    fn test_bounds_extends_half_voxel() {
        let v = scalar_volume();
        let g = v.grid(0).unwrap();
        let b = g.bounds();
        assert_eq!(b.min, Vec3::splat(-0.5));
        assert_eq!(b.max, Vec3::splat(3.5));
    }
}
