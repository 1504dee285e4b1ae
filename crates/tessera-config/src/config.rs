//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Largest load window accepted by [`Config::validate`], in chunks.
pub const MAX_WINDOW_CHUNKS: u64 = 1 << 24;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Chunk streamer settings.
    pub streaming: StreamingConfig,
    /// Settings for the simulated viewpoint.
    pub simulation: SimulationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Chunk streamer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Half-extent of the load window in chunks, per axis.
    pub load_distance: [u32; 3],
    /// Voxels per chunk, per axis.
    pub chunk_size: [u32; 3],
    /// World units per voxel, per axis.
    pub voxel_size: [f32; 3],
    /// Number of chunk buffers preallocated in the pool.
    pub pool_capacity: usize,
    /// Weight applied to vertical distance when ordering chunks.
    pub vertical_bias: i32,
    /// Longest single wait for a pool slot, in milliseconds.
    pub pool_retry_ms: u64,
    /// Preferred core for the worker. `None` picks the second core.
    pub worker_core: Option<usize>,
    /// Run the worker below normal OS priority.
    pub low_priority_worker: bool,
    /// Load chunks in view before equally distant chunks out of view.
    pub frustum_priority: bool,
    /// Pause the worker after this many chunks (0 = never).
    pub yield_every: u32,
    /// Length of each pause in milliseconds.
    pub yield_ms: u64,
}

/// The simulated viewpoint flying through the world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the terrain noise.
    pub seed: u32,
    /// Chunk the viewpoint starts in.
    pub start_chunk: [i32; 3],
    /// Frames to simulate before shutting down.
    pub frames: u32,
    /// Target frame time in milliseconds.
    pub frame_ms: u64,
    /// Viewpoint velocity in world units per frame.
    pub velocity: [f32; 3],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log streamer counters every this many frames (0 = never).
    pub stats_every_frames: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_distance: [8, 4, 8],
            chunk_size: [16, 16, 16],
            voxel_size: [1.0, 1.0, 1.0],
            pool_capacity: 2048,
            vertical_bias: 4,
            pool_retry_ms: 10,
            worker_core: None,
            low_priority_worker: true,
            frustum_priority: false,
            yield_every: 0,
            yield_ms: 5,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_chunk: [0, 0, 0],
            frames: 600,
            frame_ms: 16,
            velocity: [4.0, 0.0, 2.0],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_every_frames: 60,
        }
    }
}

impl StreamingConfig {
    /// Number of chunks in a full load window.
    pub fn window_len(&self) -> u64 {
        self.load_distance
            .iter()
            .fold(1u64, |len, &d| len.saturating_mul(2 * d as u64))
    }
}

/// Platform config directory for Tessera, e.g. `~/.config/tessera`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tessera"))
}

// --- Load / Save / Reload / Validate ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects values the streamer or the pool cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.streaming;
        if s.load_distance.iter().any(|&d| d > i32::MAX as u32) {
            return Err(ConfigError::InvalidValue {
                field: "streaming.load_distance",
                reason: format!("every axis must be at most {}, got {:?}", i32::MAX, s.load_distance),
            });
        }
        if s.window_len() > MAX_WINDOW_CHUNKS {
            return Err(ConfigError::InvalidValue {
                field: "streaming.load_distance",
                reason: format!(
                    "window of {} chunks exceeds the limit of {MAX_WINDOW_CHUNKS}",
                    s.window_len()
                ),
            });
        }
        if s.chunk_size.contains(&0) {
            return Err(ConfigError::InvalidValue {
                field: "streaming.chunk_size",
                reason: format!("every axis must be non-zero, got {:?}", s.chunk_size),
            });
        }
        if s.voxel_size.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "streaming.voxel_size",
                reason: format!("every axis must be positive, got {:?}", s.voxel_size),
            });
        }
        if s.pool_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "streaming.pool_capacity",
                reason: "the pool needs at least one slot".to_string(),
            });
        }
        if s.vertical_bias < 1 {
            return Err(ConfigError::InvalidValue {
                field: "streaming.vertical_bias",
                reason: format!("must be at least 1, got {}", s.vertical_bias),
            });
        }
        if s.pool_retry_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "streaming.pool_retry_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        if (s.pool_capacity as u64) < s.window_len() {
            log::warn!(
                "pool_capacity {} is smaller than the load window ({} chunks); streaming will stall until chunks are retired",
                s.pool_capacity,
                s.window_len()
            );
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}
