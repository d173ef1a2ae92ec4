//! Cutting plane and its sampling grid

use crate::core::types::{Mat4, Vec3};
use crate::math::{Aabb, Plane};
use crate::slice::SliceView;

/// A cutting plane through world space together with the grid of sample
/// positions used to rasterize it.
///
/// Row 0 is the bottom row; columns advance along `step_right`, rows
/// along `step_up`. Computed once per slice and shared read-only by
/// every layer composited onto it, so all layers stay pixel-aligned.
#[derive(Clone, Copy, Debug)]
pub struct SlicePlane {
    plane: Plane,
    origin: Vec3,
    step_right: Vec3,
    step_up: Vec3,
    rows: usize,
    cols: usize,
}

impl SlicePlane {
    /// Build the plane for a view at a slice coordinate.
    ///
    /// The grid spans `bounds` with one sample per `sample_spacing`
    /// world units (callers pass the smallest voxel spacing of the
    /// layers being drawn, so a voxel is never skipped over).
    /// `rotation` orients the plane for oblique viewing; pass identity
    /// for an axis-aligned slice. Rotation pivots about `slice_xyz`.
    ///
    /// Returns None when the bounds or rotation degenerate to a zero
    /// extent in either grid direction.
    pub fn for_view(
        view: SliceView,
        rotation: Mat4,
        slice_xyz: Vec3,
        bounds: &Aabb,
        sample_spacing: f32,
    ) -> Option<Self> {
        if sample_spacing <= 0.0 {
            return None;
        }

        // Screen-aligned corners of the slice rectangle before rotation:
        // bottom-left, bottom-right, top-left.
        let (bl, br, tl) = match view {
            SliceView::Axial => (
                Vec3::new(bounds.min.x, bounds.min.y, slice_xyz.z),
                Vec3::new(bounds.max.x, bounds.min.y, slice_xyz.z),
                Vec3::new(bounds.min.x, bounds.max.y, slice_xyz.z),
            ),
            SliceView::Coronal => (
                Vec3::new(bounds.min.x, slice_xyz.y, bounds.min.z),
                Vec3::new(bounds.max.x, slice_xyz.y, bounds.min.z),
                Vec3::new(bounds.min.x, slice_xyz.y, bounds.max.z),
            ),
            SliceView::Parasagittal => (
                Vec3::new(slice_xyz.x, bounds.min.y, bounds.min.z),
                Vec3::new(slice_xyz.x, bounds.max.y, bounds.min.z),
                Vec3::new(slice_xyz.x, bounds.min.y, bounds.max.z),
            ),
        };

        // Rotate the corners about the slice coordinate
        let rotate = |p: Vec3| slice_xyz + rotation.transform_vector3(p - slice_xyz);
        let bl = rotate(bl);
        let br = rotate(br);
        let tl = rotate(tl);

        let right = br - bl;
        let up = tl - bl;
        let width = right.length();
        let height = up.length();
        if width < f32::EPSILON || height < f32::EPSILON {
            return None;
        }

        let normal = right.cross(up);
        let plane = Plane::from_normal_point(normal, bl)?;

        // Guard the basis against numerical drift off the plane
        let step_right = plane.orthogonalize(right / width * sample_spacing)?;
        let step_up = plane.orthogonalize(up / height * sample_spacing)?;

        let cols = ((width / sample_spacing).round() as usize).max(1);
        let rows = ((height / sample_spacing).round() as usize).max(1);

        Some(Self {
            plane,
            origin: bl,
            step_right,
            step_up,
            rows,
            cols,
        })
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn normal(&self) -> Vec3 {
        self.plane.normal()
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn step_right(&self) -> Vec3 {
        self.step_right
    }

    pub fn step_up(&self) -> Vec3 {
        self.step_up
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// World position of a grid cell's sample point (the cell center)
    pub fn center(&self, row: usize, col: usize) -> Vec3 {
        self.origin
            + self.step_right * (col as f32 + 0.5)
            + self.step_up * (row as f32 + 0.5)
    }

    /// Row-major walk over all sample positions, bottom row first
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize, Vec3)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).map(move |col| (row, col, self.center(row, col)))
        })
    }
}
