//! Demo binary that flies a viewpoint through a noise world while the chunk
//! streamer keeps the surrounding window loaded.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p tessera-demo -- --frames 300 --load-distance 4`.

mod flight;
mod terrain;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::{IVec3, UVec3, Vec3};
use parking_lot::RwLock;
use tessera_config::{CliArgs, Config, StreamingConfig, default_config_dir};
use tessera_stream::{
    Chunk, ChunkCoord, ChunkPool, ChunkStreamer, ChunkWorld, FrustumPriority, ResidentWorld,
    StreamerConfig, WorkerPriority, YieldThrottle,
};
use tracing::{error, info, warn};

use crate::flight::Flight;
use crate::terrain::{NoiseGenerator, TerrainParams};

/// Maps the persisted settings onto the streamer's configuration.
fn streamer_config(streaming: &StreamingConfig) -> StreamerConfig {
    StreamerConfig {
        load_distance: UVec3::from_array(streaming.load_distance),
        chunk_size: UVec3::from_array(streaming.chunk_size),
        voxel_size: Vec3::from_array(streaming.voxel_size),
        vertical_bias: streaming.vertical_bias,
        pool_retry_interval: Duration::from_millis(streaming.pool_retry_ms),
        worker_core: streaming.worker_core,
        worker_priority: if streaming.low_priority_worker {
            WorkerPriority::Low
        } else {
            WorkerPriority::Normal
        },
        yield_throttle: std::num::NonZeroU32::new(streaming.yield_every).map(|every| {
            YieldThrottle {
                every,
                pause: Duration::from_millis(streaming.yield_ms),
            }
        }),
        ..Default::default()
    }
}

/// Returns a chunk's buffer to the pool.
fn recycle(pool: &ChunkPool, chunk: Chunk) {
    let coord = chunk.coord();
    if let Err(e) = pool.release(chunk.into_slot()) {
        warn!(%coord, error = %e, "could not return chunk to the pool");
    }
}

/// Moves finished chunks into the world. Chunks that fell out of the window
/// while queued are recycled instead.
fn integrate_ready(
    streamer: &ChunkStreamer,
    world: &ResidentWorld,
    pool: &ChunkPool,
    load_distance: UVec3,
) -> usize {
    let center = world.center();
    let mut integrated = 0;
    while let Some(loaded) = streamer.consume_loaded_chunk() {
        if !loaded.coord.in_window(&center, load_distance) {
            recycle(pool, loaded.chunk);
            continue;
        }
        if let Some(displaced) = world.integrate(loaded) {
            recycle(pool, displaced);
        }
        integrated += 1;
    }
    integrated
}

fn run(config: &Config) -> Result<(), tessera_stream::StreamError> {
    let stream_config = streamer_config(&config.streaming);
    let chunk_extent = stream_config.chunk_size.as_vec3() * stream_config.voxel_size;
    let load_distance = stream_config.load_distance;

    let start = IVec3::from_array(config.simulation.start_chunk);
    let mut flight = Flight::new(
        ChunkCoord::new(start.x, start.y, start.z),
        Vec3::from_array(config.simulation.velocity),
        chunk_extent,
        load_distance,
    );

    let world = Arc::new(ResidentWorld::new(
        stream_config.chunk_size,
        stream_config.voxel_size,
    ));
    world.set_center(flight.chunk());

    let pool = ChunkPool::new(
        config.streaming.pool_capacity,
        stream_config.chunk_volume(),
    );
    let generator = Arc::new(NoiseGenerator::new(TerrainParams {
        seed: config.simulation.seed,
        ..Default::default()
    }));
    let frustum = Arc::new(RwLock::new(flight.frustum()));

    let mut builder = ChunkStreamer::builder(
        stream_config,
        world.clone(),
        generator,
        pool.clone(),
    );
    if config.streaming.frustum_priority {
        builder = builder.scorer(FrustumPriority::new(frustum.clone()));
    }
    let mut streamer = builder.start()?;
    streamer.request_refresh();

    let frame_time = Duration::from_millis(config.simulation.frame_ms);
    let stats_every = config.debug.stats_every_frames;
    let started = Instant::now();
    let mut integrated = 0;

    for frame in 0..config.simulation.frames {
        let frame_start = Instant::now();

        flight.step();
        *frustum.write() = flight.frustum();
        let center = flight.chunk();
        if world.set_center(center) {
            for chunk in world.retire_outside(center, load_distance) {
                recycle(&pool, chunk);
            }
            streamer.request_refresh();
        }

        integrated += integrate_ready(&streamer, &world, &pool, load_distance);

        if stats_every > 0 && frame % stats_every == 0 {
            let stats = streamer.stats();
            info!(
                frame,
                %center,
                mode = ?streamer.mode(),
                pending = streamer.pending_len(),
                ready = streamer.ready_len(),
                resident = world.resident_count(),
                pool_free = pool.available(),
                produced = stats.produced,
                failed = stats.failed,
                stalls = stats.pool_stalls,
                "streaming"
            );
        }

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    streamer.shutdown();
    integrated += integrate_ready(&streamer, &world, &pool, load_distance);

    let stats = streamer.stats();
    info!(
        frames = config.simulation.frames,
        elapsed_ms = started.elapsed().as_millis() as u64,
        integrated,
        resident = world.resident_count(),
        refreshes = stats.refreshes,
        produced = stats.produced,
        failed = stats.failed,
        stalls = stats.pool_stalls,
        "demo finished"
    );
    if pool.outstanding() != world.resident_count() {
        warn!(
            outstanding = pool.outstanding(),
            resident = world.resident_count(),
            "pool and world disagree on live chunks"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".tessera"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    if let Some(log_file) =
        tessera_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config))
    {
        info!(path = %log_file.display(), "writing JSON log");
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "chunk streamer failed to start");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streamer_config_mapping() {
        let mut streaming = StreamingConfig::default();
        streaming.load_distance = [3, 1, 2];
        streaming.yield_every = 5;
        streaming.yield_ms = 7;
        streaming.worker_core = Some(2);
        streaming.low_priority_worker = false;

        let mapped = streamer_config(&streaming);
        assert_eq!(mapped.load_distance, UVec3::new(3, 1, 2));
        assert_eq!(mapped.chunk_size, UVec3::splat(16));
        assert_eq!(mapped.worker_core, Some(2));
        assert_eq!(mapped.worker_priority, WorkerPriority::Normal);
        let throttle = mapped.yield_throttle.expect("throttle enabled");
        assert_eq!(throttle.every.get(), 5);
        assert_eq!(throttle.pause, Duration::from_millis(7));
        assert!(mapped.validate().is_ok());
    }

    #[test]
    fn test_default_mapping_has_no_throttle() {
        let mapped = streamer_config(&StreamingConfig::default());
        assert!(mapped.yield_throttle.is_none());
        assert_eq!(mapped.worker_priority, WorkerPriority::Low);
        assert_eq!(mapped.vertical_bias, 4);
        assert_eq!(mapped.pool_retry_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_short_run_completes() {
        let mut config = Config::default();
        config.streaming.load_distance = [1, 1, 1];
        config.streaming.chunk_size = [4, 4, 4];
        config.streaming.pool_capacity = 32;
        config.simulation.frames = 20;
        config.simulation.frame_ms = 1;
        config.simulation.velocity = [1.0, 0.0, 0.0];
        config.debug.stats_every_frames = 0;
        assert!(run(&config).is_ok());
    }
}
