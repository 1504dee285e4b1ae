//! The simulated viewpoint.

use glam::{IVec3, Mat4, UVec3, Vec3};
use tessera_stream::{ChunkCoord, Frustum};

const FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
const ASPECT: f32 = 16.0 / 9.0;
const NEAR: f32 = 0.1;

/// A viewpoint moving at constant velocity through chunk space.
#[derive(Clone, Debug)]
pub struct Flight {
    position: Vec3,
    velocity: Vec3,
    chunk_extent: Vec3,
    far: f32,
}

impl Flight {
    /// Starts in the middle of `start`, with chunks `chunk_extent` world
    /// units wide. The frustum reaches to the edge of the load window.
    pub fn new(start: ChunkCoord, velocity: Vec3, chunk_extent: Vec3, load_distance: UVec3) -> Self {
        let start = IVec3::new(start.x, start.y, start.z).as_vec3();
        Self {
            position: (start + Vec3::splat(0.5)) * chunk_extent,
            velocity,
            chunk_extent,
            far: (load_distance.as_vec3() * chunk_extent).max_element().max(NEAR * 2.0),
        }
    }

    /// Advances one frame.
    pub fn step(&mut self) {
        self.position += self.velocity;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The chunk containing the viewpoint.
    pub fn chunk(&self) -> ChunkCoord {
        let c = (self.position / self.chunk_extent).floor().as_ivec3();
        ChunkCoord::new(c.x, c.y, c.z)
    }

    /// Frustum looking along the direction of travel, or down -Z when still.
    pub fn frustum(&self) -> Frustum {
        let forward = self.velocity.try_normalize().unwrap_or(Vec3::NEG_Z);
        let up = if forward.abs().dot(Vec3::Y) > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(self.position, self.position + forward, up);
        let proj = Mat4::perspective_rh(FOV_Y, ASPECT, NEAR, self.far);
        Frustum::from_view_projection(proj * view)
    }
}
