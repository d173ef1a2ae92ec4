//! Infinite plane and in-plane basis handling

use crate::core::types::Vec3;

/// Tolerance for treating a basis vector as orthogonal to the normal
const ORTHO_TOLERANCE: f32 = 1e-4;

/// A plane in Hessian normal form: all points p with dot(normal, p) + d == 0
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    normal: Vec3,
    d: f32,
}

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and a point on it.
    /// Returns None if the normal has no usable length.
    pub fn from_normal_point(normal: Vec3, point: Vec3) -> Option<Self> {
        let len = normal.length();
        if len < f32::EPSILON {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            d: -normal.dot(point),
        })
    }

    /// Unit normal vector
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance coefficient (Ax + By + Cz + D = 0)
    pub fn d(&self) -> f32 {
        self.d
    }

    /// Signed distance from a point to the plane
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// Project a vector into the plane, removing any normal component.
    ///
    /// Returns the input unchanged when it is already orthogonal to the
    /// normal within tolerance; logs when numerical drift required a fix.
    /// Returns None when the vector is (nearly) parallel to the normal and
    /// no in-plane direction can be recovered.
    pub fn orthogonalize(&self, v: Vec3) -> Option<Vec3> {
        let len = v.length();
        if len < f32::EPSILON {
            return None;
        }
        let deviation = self.normal.dot(v / len).abs();
        if deviation <= ORTHO_TOLERANCE {
            return Some(v);
        }

        // Gram-Schmidt: subtract the normal component, preserve length
        let projected = v - self.normal * self.normal.dot(v);
        let projected_len = projected.length();
        if projected_len < f32::EPSILON {
            return None;
        }
        log::warn!(
            "slice basis drifted off-plane by {:.6}; re-orthogonalized",
            deviation
        );
        Some(projected * (len / projected_len))
    }
}
