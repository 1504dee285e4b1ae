//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Tessera streaming demo command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "tessera", about = "Streams a noise world around a moving viewpoint")]
pub struct CliArgs {
    /// Horizontal load distance in chunks (x and z).
    #[arg(long)]
    pub load_distance: Option<u32>,

    /// Vertical load distance in chunks.
    #[arg(long)]
    pub load_height: Option<u32>,

    /// Number of chunk buffers in the pool.
    #[arg(long)]
    pub pool_capacity: Option<usize>,

    /// Frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Terrain seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Prefer chunks inside the view frustum.
    #[arg(long)]
    pub frustum_priority: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(d) = args.load_distance {
            self.streaming.load_distance[0] = d;
            self.streaming.load_distance[2] = d;
        }
        if let Some(h) = args.load_height {
            self.streaming.load_distance[1] = h;
        }
        if let Some(capacity) = args.pool_capacity {
            self.streaming.pool_capacity = capacity;
        }
        if let Some(frames) = args.frames {
            self.simulation.frames = frames;
        }
        if let Some(seed) = args.seed {
            self.simulation.seed = seed;
        }
        if let Some(frustum) = args.frustum_priority {
            self.streaming.frustum_priority = frustum;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
