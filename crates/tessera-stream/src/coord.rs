//! Chunk-space coordinates and the biased distance metric used for scheduling.

use std::fmt;

use glam::UVec3;

/// Identifies a chunk's position in chunk space.
///
/// One unit is one whole chunk along that axis. Equality is an exact
/// component match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Y coordinate (vertical).
    pub y: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate offset by `(dx, dy, dz)` chunks.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Squared distance to `other` with the vertical delta scaled by
    /// `vertical_bias` before squaring.
    ///
    /// A bias above 1 makes chunks above or below the viewpoint rank as
    /// farther than chunks at the same height.
    /// Saturates at `i64::MAX` for coordinates at opposite ends of the grid.
    pub fn biased_distance_sq(&self, other: &ChunkCoord, vertical_bias: i32) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = (self.y as i64 - other.y as i64).saturating_mul(vertical_bias as i64);
        let dz = self.z as i64 - other.z as i64;
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Returns `true` if this coordinate lies in the half-open window
    /// `[center - distance, center + distance)` on every axis.
    pub fn in_window(&self, center: &ChunkCoord, distance: UVec3) -> bool {
        let within = |v: i32, c: i32, d: u32| {
            let d = d as i64;
            let (v, c) = (v as i64, c as i64);
            v >= c - d && v < c + d
        };
        within(self.x, center.x, distance.x)
            && within(self.y, center.y, distance.y)
            && within(self.z, center.z, distance.z)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

/// Iterates every coordinate of the half-open load window around `center`.
///
/// Yields `2·dx · 2·dy · 2·dz` coordinates, x-major then y then z, each axis
/// ascending. This order is the pending set's insertion order. Parts of the
/// window beyond the `i32` grid are skipped.
pub fn window_coords(center: ChunkCoord, distance: UVec3) -> impl Iterator<Item = ChunkCoord> {
    let span = |c: i32, d: u32| {
        let (c, d) = (c as i64, d as i64);
        let lo = (c - d).max(i32::MIN as i64);
        let hi = (c + d).min(i32::MAX as i64 + 1);
        (lo..hi).map(|v| v as i32)
    };
    let (xs, ys, zs) = (
        span(center.x, distance.x),
        span(center.y, distance.y),
        span(center.z, distance.z),
    );
    xs.flat_map(move |x| {
        let zs = zs.clone();
        ys.clone()
            .flat_map(move |y| zs.clone().map(move |z| ChunkCoord::new(x, y, z)))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let coords: Vec<_> = window_coords(ChunkCoord::new(5, 5, 5), UVec3::ONE).collect();
        assert_eq!(coords.len(), 8);
        for c in &coords {
            assert!((4..=5).contains(&c.x));
            assert!((4..=5).contains(&c.y));
            assert!((4..=5).contains(&c.z));
        }
        assert!(!coords.contains(&ChunkCoord::new(6, 5, 5)));
    }

    #[test]
    fn test_window_iteration_order_is_x_major() {
        let coords: Vec<_> = window_coords(ChunkCoord::new(0, 0, 0), UVec3::ONE).collect();
        assert_eq!(coords[0], ChunkCoord::new(-1, -1, -1));
        assert_eq!(coords[1], ChunkCoord::new(-1, -1, 0));
        assert_eq!(coords[2], ChunkCoord::new(-1, 0, -1));
        assert_eq!(coords[7], ChunkCoord::new(0, 0, 0));
    }

    #[test]
    fn test_window_size_per_axis() {
        let count = window_coords(ChunkCoord::new(-3, 10, 2), UVec3::new(3, 1, 2)).count();
        assert_eq!(count, 6 * 2 * 4);
    }

    #[test]
    fn test_zero_distance_window_is_empty() {
        let count = window_coords(ChunkCoord::new(0, 0, 0), UVec3::new(4, 0, 4)).count();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_vertical_bias_ranks_height_as_farther() {
        let center = ChunkCoord::new(5, 5, 5);
        let above = ChunkCoord::new(5, 4, 5);
        let beside = ChunkCoord::new(4, 5, 5);
        assert_eq!(above.biased_distance_sq(&center, 4), 16);
        assert_eq!(beside.biased_distance_sq(&center, 4), 1);
        assert_eq!(above.biased_distance_sq(&center, 1), 1);
    }

    #[test]
    fn test_in_window_matches_iterator() {
        let center = ChunkCoord::new(2, -1, 0);
        let distance = UVec3::new(2, 1, 3);
        for c in window_coords(center, distance) {
            assert!(c.in_window(&center, distance));
        }
        assert!(!ChunkCoord::new(4, -1, 0).in_window(&center, distance));
        assert!(ChunkCoord::new(0, -2, -3).in_window(&center, distance));
    }

    #[test]
    fn test_window_clamped_at_grid_edge() {
        let edge = ChunkCoord::new(i32::MAX, i32::MIN, 0);
        let coords: Vec<_> = window_coords(edge, UVec3::new(2, 2, 1)).collect();
        // x keeps MAX-2..=MAX, y keeps MIN and MIN+1.
        assert_eq!(coords.len(), 3 * 2 * 2);
        assert!(coords.iter().all(|c| c.in_window(&edge, UVec3::new(2, 2, 1))));
        assert_eq!(coords[0], ChunkCoord::new(i32::MAX - 2, i32::MIN, -1));
    }

    #[test]
    fn test_huge_distance_does_not_overflow() {
        let count = window_coords(ChunkCoord::new(7, 0, 0), UVec3::new(1 << 31, 1, 1))
            .take(3)
            .count();
        assert_eq!(count, 3);

        let far = ChunkCoord::new(i32::MAX, i32::MIN, i32::MAX);
        let near = ChunkCoord::new(i32::MIN, i32::MAX, i32::MIN);
        assert_eq!(far.biased_distance_sq(&near, i32::MAX), i64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(ChunkCoord::new(1, -2, 3).to_string(), "(1, -2, 3)");
    }
}
