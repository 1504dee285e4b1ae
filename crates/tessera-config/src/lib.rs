//! Configuration for the Tessera streaming demo.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line. Unknown or missing fields fall back to defaults, so older
//! and newer files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, SimulationConfig, StreamingConfig, default_config_dir,
};
pub use error::ConfigError;
