//! CLI command implementations.

pub mod config;
pub mod serve;

use vibedj_core::{Config, ConfigError};

/// Load the config file (explicit path or the default location), then apply
/// overrides from the process environment.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => Config::load_from(&Config::expand_path(path))?,
        None => Config::load()?,
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}
