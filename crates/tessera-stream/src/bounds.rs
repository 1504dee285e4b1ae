//! World-space chunk bounds and a view frustum to test them against.
//!
//! Only the optional frustum-priority scorer needs these; nearest-first
//! scheduling works on chunk coordinates alone.

use glam::{Mat4, UVec3, Vec3, Vec4};

use crate::coord::ChunkCoord;

/// Axis-aligned bounding box of a chunk in world units.
///
/// Invariant: `min <= max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl ChunkBounds {
    /// Creates bounds from two corners, sorting components so `min <= max`.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounds of the chunk at `coord` with `size` voxels of `voxel_size` each.
    pub fn for_chunk(coord: ChunkCoord, size: UVec3, voxel_size: Vec3) -> Self {
        let extent = size.as_vec3() * voxel_size;
        let min = Vec3::new(coord.x as f32, coord.y as f32, coord.z as f32) * extent;
        Self::new(min, min + extent)
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns `true` if `p` lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Result of testing bounds against a [`Frustum`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intersection {
    /// Entirely inside.
    Inside,
    /// Entirely outside.
    Outside,
    /// Straddles one or more planes.
    Intersecting,
}

/// A view frustum as six inward-facing planes.
///
/// Each plane is `(normal, distance)` packed in a [`Vec4`]; a point `p` is
/// inside a plane when `normal.dot(p) + distance >= 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the planes of a view-projection matrix with a `[0, 1]` depth
    /// range (the `glam::Mat4::perspective_*` convention).
    pub fn from_view_projection(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self {
            planes: [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2],
        }
    }

    /// Classifies `bounds` using the p-vertex / n-vertex test.
    pub fn intersects(&self, bounds: &ChunkBounds) -> Intersection {
        let mut result = Intersection::Inside;
        for plane in &self.planes {
            let n = plane.truncate();
            let pick = |toward: bool, lo: f32, hi: f32| if toward { hi } else { lo };
            let p_vertex = Vec3::new(
                pick(n.x >= 0.0, bounds.min.x, bounds.max.x),
                pick(n.y >= 0.0, bounds.min.y, bounds.max.y),
                pick(n.z >= 0.0, bounds.min.z, bounds.max.z),
            );
            if n.dot(p_vertex) + plane.w < 0.0 {
                return Intersection::Outside;
            }
            let n_vertex = Vec3::new(
                pick(n.x < 0.0, bounds.min.x, bounds.max.x),
                pick(n.y < 0.0, bounds.min.y, bounds.max.y),
                pick(n.z < 0.0, bounds.min.z, bounds.max.z),
            );
            if n.dot(n_vertex) + plane.w < 0.0 {
                result = Intersection::Intersecting;
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_neg_z() -> Frustum {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        Frustum::from_view_projection(proj * view)
    }

    #[test]
    fn test_bounds_for_chunk() {
        let b = ChunkBounds::for_chunk(ChunkCoord::new(1, -1, 0), UVec3::splat(16), Vec3::ONE);
        assert_eq!(b.min, Vec3::new(16.0, -16.0, 0.0));
        assert_eq!(b.max, Vec3::new(32.0, 0.0, 16.0));
        assert_eq!(b.center(), Vec3::new(24.0, -8.0, 8.0));
    }

    #[test]
    fn test_bounds_new_sorts_corners() {
        let b = ChunkBounds::new(Vec3::new(1.0, 5.0, -2.0), Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(b.min, Vec3::new(0.0, 2.0, -2.0));
        assert!(b.contains_point(Vec3::new(0.5, 3.0, 0.0)));
        assert!(!b.contains_point(Vec3::new(0.5, 6.0, 0.0)));
    }

    #[test]
    fn test_box_in_front_is_inside() {
        let f = looking_down_neg_z();
        let b = ChunkBounds::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
        assert_eq!(f.intersects(&b), Intersection::Inside);
    }

    #[test]
    fn test_box_behind_is_outside() {
        let f = looking_down_neg_z();
        let b = ChunkBounds::new(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0));
        assert_eq!(f.intersects(&b), Intersection::Outside);
    }

    #[test]
    fn test_box_past_far_plane_is_outside() {
        let f = looking_down_neg_z();
        let b = ChunkBounds::new(Vec3::new(-1.0, -1.0, -300.0), Vec3::new(1.0, 1.0, -200.0));
        assert_eq!(f.intersects(&b), Intersection::Outside);
    }

    #[test]
    fn test_box_across_side_plane_intersects() {
        let f = looking_down_neg_z();
        // At z = -10 the half-width of a 90° frustum is 10.
        let b = ChunkBounds::new(Vec3::new(8.0, -1.0, -11.0), Vec3::new(12.0, 1.0, -9.0));
        assert_eq!(f.intersects(&b), Intersection::Intersecting);
    }
}
