//! Heightmap terrain generator for streamed chunks.
//!
//! Column heights come from fractal Brownian motion over simplex noise, so
//! neighbouring chunks line up without sharing any state.

use noise::{NoiseFn, Simplex};
use tessera_stream::{Chunk, ChunkGenerator, GenerateError, VoxelId};

/// Solid rock below the surface layer.
pub const STONE: VoxelId = VoxelId(1);
/// The top few voxels of each column.
pub const SOIL: VoxelId = VoxelId(2);

const SOIL_DEPTH: f64 = 3.0;

/// fBm parameters for [`NoiseGenerator`].
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub octaves: u32,
    pub lacunarity: f64,
    pub persistence: f64,
    /// Frequency of the broadest octave, in cycles per world unit.
    pub base_frequency: f64,
    /// Height contribution of the broadest octave, in world units.
    pub amplitude: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
            amplitude: 24.0,
        }
    }
}

/// Fills chunks with rock and soil below a noise heightmap.
pub struct NoiseGenerator {
    noise: Simplex,
    params: TerrainParams,
}

impl NoiseGenerator {
    pub fn new(params: TerrainParams) -> Self {
        Self {
            noise: Simplex::new(params.seed),
            params,
        }
    }

    /// Surface height at world-space `(x, z)`.
    pub fn height_at(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;
        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, z * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }
        total
    }
}

impl ChunkGenerator for NoiseGenerator {
    fn generate(&self, chunk: &mut Chunk) -> Result<(), GenerateError> {
        let size = chunk.size();
        let voxel = chunk.voxel_size().as_dvec3();
        let origin = chunk.world_origin().as_dvec3();

        for x in 0..size.x {
            for z in 0..size.z {
                let wx = origin.x + (x as f64 + 0.5) * voxel.x;
                let wz = origin.z + (z as f64 + 0.5) * voxel.z;
                let height = self.height_at(wx, wz);
                if !height.is_finite() {
                    return Err(GenerateError::new(
                        chunk.coord(),
                        format!("non-finite height at ({wx}, {wz})"),
                    ));
                }
                for y in 0..size.y {
                    let wy = origin.y + (y as f64 + 0.5) * voxel.y;
                    if wy >= height {
                        break;
                    }
                    let voxel_id = if height - wy <= SOIL_DEPTH { SOIL } else { STONE };
                    chunk.set(x, y, z, voxel_id);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
