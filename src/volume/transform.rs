//! Index <-> world affine transform

use crate::core::types::{Mat4, Result, Vec3};
use crate::core::Error;

/// Invertible affine transform between voxel index space and world space.
///
/// Index space treats voxel (i, j, k) as the point (i, j, k); the voxel's
/// sample is located at its center, so world positions round to the
/// nearest index when mapped back.
#[derive(Clone, Copy, Debug)]
pub struct IndexTransform {
    index_to_world: Mat4,
    world_to_index: Mat4,
}

impl IndexTransform {
    /// Wrap an index-to-world matrix, computing its inverse.
    pub fn from_matrix(index_to_world: Mat4) -> Result<Self> {
        let det = index_to_world.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return Err(Error::NonInvertibleTransform);
        }
        Ok(Self {
            index_to_world,
            world_to_index: index_to_world.inverse(),
        })
    }

    /// Axis-aligned transform from per-axis spacing and the world
    /// position of voxel (0, 0, 0).
    pub fn from_spacing_origin(spacing: Vec3, origin: Vec3) -> Result<Self> {
        Self::from_matrix(Mat4::from_translation(origin) * Mat4::from_scale(spacing))
    }

    /// World position of a voxel center
    pub fn index_to_world(&self, ijk: [i64; 3]) -> Vec3 {
        self.index_to_world.transform_point3(Vec3::new(
            ijk[0] as f32,
            ijk[1] as f32,
            ijk[2] as f32,
        ))
    }

    /// Continuous (unrounded) index coordinates of a world position
    pub fn world_to_index(&self, xyz: Vec3) -> Vec3 {
        self.world_to_index.transform_point3(xyz)
    }

    /// Index of the voxel whose cell encloses the world position.
    /// Rounds to nearest; does NOT clamp, so the result may lie outside
    /// the volume and must be bounds-checked by the caller.
    pub fn enclosing_voxel(&self, xyz: Vec3) -> [i64; 3] {
        let idx = self.world_to_index(xyz);
        [
            idx.x.round() as i64,
            idx.y.round() as i64,
            idx.z.round() as i64,
        ]
    }

    /// Per-axis world-space distance between adjacent voxel centers.
    /// Always positive, even for flipped axes.
    pub fn spacing(&self) -> Vec3 {
        let o = self.index_to_world([0, 0, 0]);
        Vec3::new(
            (self.index_to_world([1, 0, 0]) - o).length(),
            (self.index_to_world([0, 1, 0]) - o).length(),
            (self.index_to_world([0, 0, 1]) - o).length(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_round_trip() {
        let t = IndexTransform::from_matrix(Mat4::IDENTITY).unwrap();
        assert_eq!(t.enclosing_voxel(Vec3::new(1.2, 2.0, 2.8)), [1, 2, 3]);
        assert_eq!(t.index_to_world([4, 5, 6]), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_spacing_origin() {
        let t = IndexTransform::from_spacing_origin(
            Vec3::new(0.5, 1.0, 2.0),
            Vec3::new(-10.0, 0.0, 5.0),
        )
        .unwrap();
        assert_eq!(t.index_to_world([0, 0, 0]), Vec3::new(-10.0, 0.0, 5.0));
        assert_eq!(t.index_to_world([2, 0, 1]), Vec3::new(-9.0, 0.0, 7.0));
        assert_eq!(t.enclosing_voxel(Vec3::new(-9.1, 0.4, 6.9)), [2, 0, 1]);
        assert_eq!(t.spacing(), Vec3::new(0.5, 1.0, 2.0));
    }

    #[test]
    fn test_negative_spacing_positive_extent() {
        let t = IndexTransform::from_spacing_origin(
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::ZERO,
        )
        .unwrap();
        assert_eq!(t.spacing(), Vec3::ONE);
        assert_eq!(t.enclosing_voxel(Vec3::new(-3.0, 0.0, 0.0)), [3, 0, 0]);
    }

    #[test]
    fn test_singular_rejected() {
        let m = Mat4::from_scale(Vec3::new(1.0, 1.0, 0.0));
        assert!(IndexTransform::from_matrix(m).is_err());
    }

    #[test]
    fn test_unclamped_outside() {
        let t = IndexTransform::from_matrix(Mat4::IDENTITY).unwrap();
        assert_eq!(t.enclosing_voxel(Vec3::new(-5.0, 100.0, 0.0)), [-5, 100, 0]);
    }
}
