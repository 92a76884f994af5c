use serde::Deserialize;
use std::path::Path;

/// Process-wide engine configuration, loaded once at startup.
///
/// Everything here is a deployment choice, not part of the on-disk queue
/// format: moving `base_dir` or raising `h_max` does not change how an
/// existing queue directory is laid out, so old queues keep working
/// unmodified after a config change.
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    /// Directory under which queue directories (one per named queue) live.
    #[serde(default = "defaults::base_dir")]
    pub base_dir: String,

    /// Maximum number of queues this process may have open at once
    /// (spec §3 `H_max`; default 10, matching the spec's stated default).
    #[serde(default = "defaults::h_max")]
    pub h_max: usize,

    /// Default log verbosity for the `tracing` subscriber a binary sets up.
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn base_dir() -> String {
        "/tmp/dataqueue".into()
    }

    pub fn h_max() -> usize {
        10
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_dir: defaults::base_dir(),
            h_max: defaults::h_max(),
            log_level: defaults::log_level(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let cfg: EngineConfig = toml::from_str(&toml_str)?;
        Ok(cfg)
    }
}
