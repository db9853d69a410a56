//! Configuration for the Formation tool server.
//! Settings are layered from command-line flags, environment variables, an
//! optional YAML file and built-in defaults, in that order of precedence.

mod io;
mod model;
mod validation;

pub use io::{default_config_paths, env_layer, expand_tilde, file_layer, load_config};
pub use model::{
    ConfigError, ConfigLayer, DEFAULT_POLL_INTERVAL_SECS, FormationConfig, LogLevel, MAX_POLL_INTERVAL_SECS,
};
pub use validation::validate_config;
