//! The pending set: coordinates that should be resident but are not yet.
//!
//! Owned by the streaming worker alone. It is rebuilt from scratch on every
//! refresh and drained one nearest coordinate at a time.

use glam::UVec3;

use crate::coord::{ChunkCoord, window_coords};
use crate::scoring::PriorityScorer;
use crate::world::ChunkWorld;

/// Insertion-ordered set of coordinates awaiting production.
#[derive(Clone, Debug, Default)]
pub struct PendingSet {
    coords: Vec<ChunkCoord>,
}

impl PendingSet {
    /// Creates an empty pending set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with every coordinate of the load window around
    /// `center` for which `is_excluded` returns `false`.
    ///
    /// Insertion order follows [`window_coords`].
    pub fn rebuild(
        &mut self,
        center: ChunkCoord,
        distance: UVec3,
        mut is_excluded: impl FnMut(ChunkCoord) -> bool,
    ) {
        self.coords.clear();
        self.coords
            .extend(window_coords(center, distance).filter(|c| !is_excluded(*c)));
    }

    /// Removes and returns the coordinate with the lowest score.
    ///
    /// The score is the squared distance to `center`, with the vertical
    /// delta multiplied by `vertical_bias`, passed through `scorer`. Ties go
    /// to the earliest-inserted coordinate.
    pub fn take_nearest(
        &mut self,
        center: ChunkCoord,
        vertical_bias: i32,
        scorer: &dyn PriorityScorer,
        world: &dyn ChunkWorld,
    ) -> Option<ChunkCoord> {
        let mut best: Option<(usize, f64)> = None;
        for (i, coord) in self.coords.iter().enumerate() {
            let distance_sq = coord.biased_distance_sq(&center, vertical_bias);
            let score = scorer.score(*coord, distance_sq, world);
            if best.is_none_or(|(_, lowest)| score < lowest) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| self.coords.remove(i))
    }

    /// Returns `true` if `coord` is pending.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.coords.contains(&coord)
    }

    /// Pending coordinates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.coords.iter()
    }

    /// Number of pending coordinates.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Drops every pending coordinate.
    pub fn clear(&mut self) {
        self.coords.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::NearestFirst;
    use crate::world::ResidentWorld;
    use glam::Vec3;

    fn world() -> ResidentWorld {
        ResidentWorld::new(UVec3::splat(4), Vec3::ONE)
    }

    fn c(x: i32, y: i32, z: i32) -> ChunkCoord {
        ChunkCoord::new(x, y, z)
    }

    #[test]
    fn test_rebuild_fills_whole_window() {
        let mut pending = PendingSet::new();
        pending.rebuild(c(5, 5, 5), UVec3::ONE, |_| false);
        assert_eq!(pending.len(), 8);
        for x in 4..=5 {
            for y in 4..=5 {
                for z in 4..=5 {
                    assert!(pending.contains(c(x, y, z)));
                }
            }
        }
    }

    #[test]
    fn test_rebuild_skips_excluded() {
        let mut pending = PendingSet::new();
        let resident = c(4, 4, 4);
        let produced = c(5, 5, 5);
        pending.rebuild(c(5, 5, 5), UVec3::ONE, |coord| coord == resident || coord == produced);
        assert_eq!(pending.len(), 6);
        assert!(!pending.contains(resident));
        assert!(!pending.contains(produced));
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut pending = PendingSet::new();
        pending.rebuild(c(0, 0, 0), UVec3::ONE, |_| false);
        pending.rebuild(c(10, 0, 0), UVec3::ONE, |_| false);
        assert_eq!(pending.len(), 8);
        assert!(pending.iter().all(|p| p.in_window(&c(10, 0, 0), UVec3::ONE)));
    }

    #[test]
    fn test_take_nearest_order_with_vertical_bias() {
        let w = world();
        let center = c(5, 5, 5);
        let mut pending = PendingSet::new();
        pending.rebuild(center, UVec3::ONE, |_| false);

        let order: Vec<_> =
            std::iter::from_fn(|| pending.take_nearest(center, 4, &NearestFirst, &w)).collect();
        assert_eq!(
            order,
            vec![
                c(5, 5, 5),
                c(4, 5, 5),
                c(5, 5, 4),
                c(4, 5, 4),
                c(5, 4, 5),
                c(4, 4, 5),
                c(5, 4, 4),
                c(4, 4, 4),
            ]
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn test_same_height_beats_vertical_neighbour() {
        let w = world();
        let center = c(0, 0, 0);
        let mut pending = PendingSet::new();
        pending.rebuild(center, UVec3::new(3, 2, 3), |coord| coord == center);

        // Every coordinate at the center's height within a squared distance
        // below 16 must come out before the first vertical neighbour.
        let mut first_vertical = None;
        let mut produced = 0;
        while let Some(next) = pending.take_nearest(center, 4, &NearestFirst, &w) {
            if next.y != 0 && first_vertical.is_none() {
                first_vertical = Some(produced);
            }
            if next.y == 0 && first_vertical.is_some() {
                let d = next.biased_distance_sq(&center, 4);
                assert!(d >= 16, "{next} at {d} came after a vertical neighbour");
            }
            produced += 1;
        }
        assert!(first_vertical.is_some());
    }

    #[test]
    fn test_ties_prefer_insertion_order() {
        let w = world();
        let center = c(0, 0, 0);
        let mut pending = PendingSet::new();
        pending.rebuild(center, UVec3::new(1, 1, 1), |coord| coord == center);
        // (-1, 0, 0) and (0, 0, -1) tie at distance 1; (-1, 0, 0) comes first
        // in x-major order.
        let first = pending.take_nearest(center, 4, &NearestFirst, &w);
        assert_eq!(first, Some(c(-1, 0, 0)));
        let second = pending.take_nearest(center, 4, &NearestFirst, &w);
        assert_eq!(second, Some(c(0, 0, -1)));
    }

    #[test]
    fn test_take_nearest_on_empty_is_none() {
        let w = world();
        let mut pending = PendingSet::new();
        assert!(
            pending
                .take_nearest(c(0, 0, 0), 4, &NearestFirst, &w)
                .is_none()
        );
    }
}
