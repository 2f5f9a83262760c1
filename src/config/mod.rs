mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./rmdemux.toml",
        "~/.config/rmdemux/config.toml",
        "/etc/rmdemux/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.demux.max_streams == 0 {
        anyhow::bail!("demux.max_streams must be greater than 0");
    }

    if config.demux.max_resync_attempts == 0 {
        anyhow::bail!("demux.max_resync_attempts must be greater than 0");
    }

    if config.output.directory.as_os_str().is_empty() {
        anyhow::bail!("output.directory cannot be empty");
    }

    Ok(())
}
