//! Immutable streamer configuration.

use std::num::NonZeroU32;
use std::time::Duration;

use glam::{UVec3, Vec3};

use crate::chunk::Chunk;
use crate::error::StreamError;

/// Multiplier applied to the vertical delta before squaring, so chunks at
/// the viewpoint's height load before chunks above or below it.
pub const DEFAULT_VERTICAL_BIAS: i32 = 4;

/// How long the worker waits for a pool release before re-checking.
pub const DEFAULT_POOL_RETRY: Duration = Duration::from_millis(10);

/// Largest load window the worker will enumerate, in chunks.
pub const MAX_WINDOW_LEN: u64 = 1 << 24;

/// Scheduling priority requested for the worker thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkerPriority {
    /// Background work; yields to the foreground.
    #[default]
    Low,
    /// Same as any other thread.
    Normal,
}

/// Periodic pause inserted between productions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YieldThrottle {
    /// Sleep after every `every` chunks.
    pub every: NonZeroU32,
    /// How long to sleep.
    pub pause: Duration,
}

/// Configuration fixed when a [`ChunkStreamer`](crate::ChunkStreamer) starts.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamerConfig {
    /// Per-axis half-extent of the residency window, in chunks.
    pub load_distance: UVec3,
    /// Voxels per chunk along each axis.
    pub chunk_size: UVec3,
    /// World units per voxel along each axis.
    pub voxel_size: Vec3,
    /// See [`DEFAULT_VERTICAL_BIAS`].
    pub vertical_bias: i32,
    /// Upper bound on a single wait for a free pool slot.
    pub pool_retry_interval: Duration,
    /// Logical core the worker should prefer. `None` picks
    /// [`default_worker_core`].
    pub worker_core: Option<usize>,
    /// Requested worker priority.
    pub worker_priority: WorkerPriority,
    /// Optional pacing of the worker. Off by default.
    pub yield_throttle: Option<YieldThrottle>,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            load_distance: UVec3::new(8, 4, 8),
            chunk_size: UVec3::splat(16),
            voxel_size: Vec3::ONE,
            vertical_bias: DEFAULT_VERTICAL_BIAS,
            pool_retry_interval: DEFAULT_POOL_RETRY,
            worker_core: None,
            worker_priority: WorkerPriority::Low,
            yield_throttle: None,
        }
    }
}

impl StreamerConfig {
    /// Checks the configuration for values the worker cannot run with.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.load_distance.max_element() > i32::MAX as u32 {
            return Err(StreamError::InvalidConfig(format!(
                "load_distance must fit the chunk grid, got {}",
                self.load_distance
            )));
        }
        if self.window_len_u64() > MAX_WINDOW_LEN {
            return Err(StreamError::InvalidConfig(format!(
                "load window of {} chunks exceeds the limit of {MAX_WINDOW_LEN}",
                self.window_len_u64()
            )));
        }
        if self.chunk_size.cmpeq(UVec3::ZERO).any() {
            return Err(StreamError::InvalidConfig(format!(
                "chunk_size must be non-zero on every axis, got {}",
                self.chunk_size
            )));
        }
        if !self.voxel_size.cmpgt(Vec3::ZERO).all() || !self.voxel_size.is_finite() {
            return Err(StreamError::InvalidConfig(format!(
                "voxel_size must be positive and finite, got {}",
                self.voxel_size
            )));
        }
        if self.vertical_bias < 1 {
            return Err(StreamError::InvalidConfig(format!(
                "vertical_bias must be at least 1, got {}",
                self.vertical_bias
            )));
        }
        if self.pool_retry_interval.is_zero() {
            return Err(StreamError::InvalidConfig(
                "pool_retry_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Voxels in one chunk.
    pub fn chunk_volume(&self) -> usize {
        Chunk::volume_of(self.chunk_size)
    }

    /// Number of coordinates in a full load window.
    pub fn window_len(&self) -> usize {
        usize::try_from(self.window_len_u64()).unwrap_or(usize::MAX)
    }

    fn window_len_u64(&self) -> u64 {
        let d = self.load_distance.as_u64vec3() * 2;
        d.x.saturating_mul(d.y).saturating_mul(d.z)
    }

    /// The core the worker is bound to, resolving `None` to the default.
    pub fn resolved_core(&self) -> usize {
        self.worker_core.unwrap_or_else(default_worker_core)
    }
}

/// The second logical core, wrapped to the machine's core count, so the
/// worker stays off the core the main thread usually starts on.
pub fn default_worker_core() -> usize {
    1 % num_cpus::get().max(1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(StreamerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_axis_rejected() {
        let config = StreamerConfig {
            chunk_size: UVec3::new(16, 0, 16),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StreamError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_voxel_size_rejected() {
        let config = StreamerConfig {
            voxel_size: Vec3::new(1.0, -1.0, 1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_bias_rejected() {
        let config = StreamerConfig {
            vertical_bias: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_distance_beyond_grid_rejected() {
        let config = StreamerConfig {
            load_distance: UVec3::new(1 << 31, 1, 1),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("load_distance"));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let config = StreamerConfig {
            load_distance: UVec3::new(1 << 12, 1 << 12, 1),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StreamError::InvalidConfig(_))));
        assert_eq!(config.window_len(), 1 << 27);
    }

    #[test]
    fn test_window_len_and_volume() {
        let config = StreamerConfig {
            load_distance: UVec3::new(1, 2, 3),
            chunk_size: UVec3::new(2, 4, 8),
            ..Default::default()
        };
        assert_eq!(config.window_len(), 2 * 4 * 6);
        assert_eq!(config.chunk_volume(), 64);
    }

    #[test]
    fn test_default_core_within_machine() {
        assert!(default_worker_core() < num_cpus::get().max(1));
        let pinned = StreamerConfig {
            worker_core: Some(3),
            ..Default::default()
        };
        assert_eq!(pinned.resolved_core(), 3);
    }
}
